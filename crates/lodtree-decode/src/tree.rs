//! The decoded tree: an arena of nodes plus per-decode side data.

use std::fmt;

use crate::error::DecodeError;
use crate::node::Node;
use crate::types::{NodeKind, TypeStream};

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Absolute byte position of one field of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub node: NodeId,
    pub field: &'static str,
    pub position: u64,
}

/// A recoverable problem found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The node being decoded, if the problem belongs to one.
    pub node: Option<NodeId>,
    pub error: DecodeError,
}

/// One decoded scene graph.
///
/// Nodes are stored in decode order, which is also the order their tags
/// appear in the type stream, so `nodes()[i]` was decoded from tag `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub(crate) start_offset: u64,
    pub(crate) anchor: i64,
    pub(crate) types: TypeStream,
    pub(crate) nodes: Vec<Node>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Tree {
    /// Where the tree header starts.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// The anchor in effect when decoding finished.
    #[must_use]
    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    /// Kind tags read from the tree header.
    #[must_use]
    pub fn tags(&self) -> &[i32] {
        &self.types.tags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Ids of all nodes in decode order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// The first decoded node.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind() == kind).count()
    }

    /// Direct structural children of `id`: the head of its subtree chain,
    /// switch children and splitter branches, in traversal order.
    #[must_use]
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|node| node.links.descendants().collect())
            .unwrap_or_default()
    }

    /// The sibling chain starting at `id`, `id` included.
    pub fn siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), |current| {
            self.get(*current).and_then(|node| node.links.sibling)
        })
    }

    /// Field positions recorded for `id` when decoded with annotations on.
    pub fn annotations_for(&self, id: NodeId) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.node == id)
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Recoverable problems met during decode.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether the decode used exactly as many tags as the header declared.
    #[must_use]
    pub fn is_fully_consumed(&self) -> bool {
        self.nodes.len() == self.types.len()
    }

    /// Walk the tree in pre-order from the root, following sibling chains
    /// and structural links.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        if let Some(root) = self.root() {
            self.walk_chain(root, 0, visitor);
        }
    }

    fn walk_chain<V: Visitor + ?Sized>(&self, head: NodeId, depth: usize, visitor: &mut V) {
        for id in self.siblings(head) {
            let Some(node) = self.get(id) else {
                return;
            };
            visitor.enter(self, id, depth);
            for child in node.links.descendants() {
                self.walk_chain(child, depth + 1, visitor);
            }
            visitor.leave(self, id, depth);
        }
    }
}

/// Callbacks for [`Tree::walk`].
///
/// `depth` counts nested chains; siblings share a depth.
pub trait Visitor {
    fn enter(&mut self, tree: &Tree, id: NodeId, depth: usize);

    fn leave(&mut self, _tree: &Tree, _id: NodeId, _depth: usize) {}
}
