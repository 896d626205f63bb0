//! Tree traversal.
//!
//! A `TreeWalker` owns the reader and the [`TypeCursor`] for one tree and
//! walks sibling chains, recursing into subtree chains, switch children and
//! splitter branches. Every recursion shares the one cursor, so tags are
//! consumed in exactly the order node bytes are visited.

use crate::decode::read_node;
use crate::error::{DecodeError, DecodeResult, TreeError};
use crate::node::{Links, Node, NodeBody};
use crate::reader::ByteReader;
use crate::tree::{Annotation, Diagnostic, NodeId, Tree};
use crate::types::{NodeKind, TypeCursor, TypeStream, read_tags};

/// Tunables for a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest allowed chain nesting.
    pub max_depth: usize,
    /// Record the byte position of every decoded field.
    pub annotate: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: crate::DEFAULT_MAX_DEPTH,
            annotate: false,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }
}

/// Walker progress for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Init,
    ReadHeader,
    Descend,
    Done,
}

/// Decode the tree whose header starts at `start_offset`.
///
/// # Errors
///
/// Fatal errors come back as a [`TreeError`] holding every node decoded
/// before the failure.
///
/// # Example
///
/// ```
/// use lodtree_decode::{NodeKind, decode_tree};
///
/// let mut bytes = Vec::new();
/// // one Root node, all lists empty, no sibling
/// for word in [1i32, 2, 0, -1, -1, 0, 0, -1, -1, 0, -1, -1, 0, 0] {
///     bytes.extend_from_slice(&word.to_le_bytes());
/// }
/// let tree = decode_tree(&bytes, 0).unwrap();
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree.count_kind(NodeKind::Root), 1);
/// ```
pub fn decode_tree(buffer: &[u8], start_offset: usize) -> Result<Tree, TreeError> {
    decode_tree_with(buffer, start_offset, &DecodeOptions::default())
}

/// [`decode_tree`] with explicit options.
///
/// # Errors
///
/// See [`decode_tree`].
pub fn decode_tree_with(
    buffer: &[u8],
    start_offset: usize,
    options: &DecodeOptions,
) -> Result<Tree, TreeError> {
    let mut reader = ByteReader::new(buffer).annotated(options.annotate);
    let mut state = WalkState::Init;
    let mut types = TypeStream::default();
    let mut tree = Tree {
        start_offset: start_offset as u64,
        ..Tree::default()
    };

    loop {
        state = match state {
            WalkState::Init => {
                reader.seek(start_offset as u64);
                WalkState::ReadHeader
            }
            WalkState::ReadHeader => match read_tags(&mut reader) {
                Ok(stream) => {
                    types = stream;
                    reader.take_spans();
                    WalkState::Descend
                }
                Err(error) => return Err(TreeError::new(tree, error)),
            },
            WalkState::Descend => {
                let start = reader.position();
                let mut walker = TreeWalker::new(&mut reader, types.cursor(), start, options);
                let outcome = walker.walk_chain(start, 0);
                let consumed = walker.cursor.consumed();
                let remaining = walker.cursor.remaining();
                tree.anchor = walker.anchor;
                tree.nodes = walker.nodes;
                tree.annotations = walker.annotations;
                tree.diagnostics = walker.diagnostics;
                tree.types = types.clone();
                if let Err(error) = outcome {
                    return Err(TreeError::new(tree, error));
                }
                if remaining > 0 {
                    let error = DecodeError::UnconsumedTags {
                        consumed,
                        count: types.len(),
                    };
                    tracing::warn!(start_offset, "{error}");
                    tree.diagnostics.push(Diagnostic { node: None, error });
                }
                WalkState::Done
            }
            WalkState::Done => break,
        };
    }

    tracing::debug!(
        start_offset,
        nodes = tree.len(),
        anchor = tree.anchor,
        "decoded tree"
    );
    Ok(tree)
}

/// Decode several independent trees from one buffer.
///
/// Each start offset gets its own cursor and anchor; a failure in one tree
/// does not affect the others.
pub fn decode_trees(
    buffer: &[u8],
    start_offsets: &[usize],
    options: &DecodeOptions,
) -> Vec<Result<Tree, TreeError>> {
    start_offsets
        .iter()
        .map(|&start| decode_tree_with(buffer, start, options))
        .collect()
}

/// Recursive walker state for one tree.
pub(crate) struct TreeWalker<'r, 'a, 't> {
    reader: &'r mut ByteReader<'a>,
    cursor: TypeCursor<'t>,
    anchor: i64,
    max_depth: usize,
    nodes: Vec<Node>,
    annotations: Vec<Annotation>,
    diagnostics: Vec<Diagnostic>,
}

impl<'r, 'a, 't> TreeWalker<'r, 'a, 't> {
    pub(crate) fn new(
        reader: &'r mut ByteReader<'a>,
        cursor: TypeCursor<'t>,
        anchor: u64,
        options: &DecodeOptions,
    ) -> Self {
        Self {
            reader,
            cursor,
            anchor: anchor as i64,
            max_depth: options.max_depth,
            nodes: Vec::new(),
            annotations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Decode the chain starting at `start` and everything nested under it.
    /// Returns the id of the chain's first node.
    pub(crate) fn walk_chain(&mut self, start: u64, depth: usize) -> DecodeResult<NodeId> {
        if depth > self.max_depth {
            return Err(DecodeError::RecursionLimitExceeded {
                limit: self.max_depth,
            });
        }

        let head = self.step(start, depth)?;
        let mut current = head;
        while let Some(next) = self.nodes[current.index()].sibling.target {
            let id = self.next_id();
            let outcome = self.step(next, depth);
            self.link(current, id, |links, id| links.sibling = Some(id));
            outcome?;
            current = id;
        }
        Ok(head)
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    /// Point `from` at `to` if `to` made it into the arena. Partial trees
    /// stay linked up to the failing node.
    fn link(&mut self, from: NodeId, to: NodeId, set: impl FnOnce(&mut Links, NodeId)) {
        if to.index() < self.nodes.len() {
            set(&mut self.nodes[from.index()].links, to);
        }
    }

    fn walk_nested(
        &mut self,
        parent: NodeId,
        target: u64,
        depth: usize,
        set: impl FnOnce(&mut Links, NodeId),
    ) -> DecodeResult<()> {
        let head = self.next_id();
        let outcome = self.walk_chain(target, depth + 1);
        self.link(parent, head, set);
        outcome.map(|_| ())
    }

    /// Decode one node, then descend into its nested chains.
    fn step(&mut self, position: u64, depth: usize) -> DecodeResult<NodeId> {
        let tag = self.cursor.next_tag()?;
        if tag == NodeKind::Root.tag() {
            self.anchor = position as i64;
        }
        self.reader.seek(position);
        let decoded = read_node(self.reader, self.anchor, tag);
        let id = NodeId(self.nodes.len() as u32);
        self.collect_side_data(id);
        let node = decoded?;
        tracing::trace!(
            id = id.0,
            kind = %node.kind(),
            position,
            depth,
            "decoded node"
        );
        self.nodes.push(node);
        self.descend(id, depth)?;
        Ok(id)
    }

    fn collect_side_data(&mut self, id: NodeId) {
        self.annotations
            .extend(self.reader.take_spans().into_iter().map(|span| Annotation {
                node: id,
                field: span.field,
                position: span.position,
            }));
        self.diagnostics
            .extend(self.reader.take_findings().into_iter().map(|error| Diagnostic {
                node: Some(id),
                error,
            }));
    }

    fn descend(&mut self, id: NodeId, depth: usize) -> DecodeResult<()> {
        let body = &self.nodes[id.index()].body;
        let subtree = body.subtree_link().and_then(|offset| offset.target);
        let children: Vec<u64> = body
            .switch()
            .map(|switch| {
                switch
                    .children
                    .entries
                    .iter()
                    .filter_map(|entry| entry.target)
                    .collect()
            })
            .unwrap_or_default();
        let branches = match body {
            NodeBody::Splitter(splitter) | NodeBody::Culled(splitter) => {
                (splitter.front.target, splitter.back.target)
            }
            _ => (None, None),
        };

        if let Some(target) = subtree {
            self.walk_nested(id, target, depth, |links, child| links.subtree = Some(child))?;
        }
        for target in children {
            self.walk_nested(id, target, depth, |links, child| links.children.push(child))?;
        }
        if let Some(target) = branches.0 {
            self.walk_nested(id, target, depth, |links, child| links.front = Some(child))?;
        }
        if let Some(target) = branches.1 {
            self.walk_nested(id, target, depth, |links, child| links.back = Some(child))?;
        }
        Ok(())
    }
}

/// Decode a single chain at `position` using tags from `types`, with the
/// anchor fixed at `anchor` until a Root node is met.
///
/// This is the building block behind [`decode_tree`]; it is useful for
/// decoding a nested chain in isolation, such as a splitter branch.
///
/// # Errors
///
/// As for [`decode_tree`].
pub fn decode_chain(
    buffer: &[u8],
    types: &TypeStream,
    position: usize,
    anchor: i64,
    options: &DecodeOptions,
) -> Result<Tree, TreeError> {
    let mut reader = ByteReader::new(buffer).annotated(options.annotate);
    let mut walker = TreeWalker::new(&mut reader, types.cursor(), 0, options);
    walker.anchor = anchor;
    let outcome = walker.walk_chain(position as u64, 0);
    let tree = Tree {
        start_offset: position as u64,
        anchor: walker.anchor,
        types: types.clone(),
        nodes: walker.nodes,
        annotations: walker.annotations,
        diagnostics: walker.diagnostics,
    };
    match outcome {
        Ok(_) => Ok(tree),
        Err(error) => Err(TreeError::new(tree, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn options_builder() {
        let options = DecodeOptions::default()
            .with_max_depth(4)
            .with_annotations(true);
        assert_eq!(options.max_depth, 4);
        assert!(options.annotate);
        assert_eq!(DecodeOptions::default().max_depth, 256);
    }

    #[test]
    fn generic_chain_links_siblings() {
        // count 3, three Generic nodes at 16, 24, 32 chained by sibling
        // offsets relative to the node-stream start (16)
        let data = words(&[3, 0, 0, 0, 0, 8, 0, 16, 0, -1]);
        let tree = decode_tree(&data, 0).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.anchor(), 16);
        assert_eq!(tree.nodes()[0].links.sibling, Some(NodeId(1)));
        assert_eq!(tree.nodes()[1].links.sibling, Some(NodeId(2)));
        assert_eq!(tree.nodes()[2].links.sibling, None);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn sibling_cycle_exhausts_the_type_stream() {
        // one Generic whose sibling points back at itself
        let data = words(&[1, 0, 0, 0]);
        let err = decode_tree(&data, 0).unwrap_err();
        assert_eq!(err.error, DecodeError::TypeStreamExhausted { count: 1 });
        assert_eq!(err.partial.len(), 1);
    }

    #[test]
    fn leftover_tags_are_a_warning() {
        let data = words(&[2, 0, 0, 0, -1]);
        let tree = decode_tree(&data, 0).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_fully_consumed());
        assert_eq!(
            tree.diagnostics()[0].error,
            DecodeError::UnconsumedTags {
                consumed: 1,
                count: 2,
            }
        );
    }

    #[test]
    fn annotations_record_field_positions() {
        let data = words(&[1, 0, 7, -1]);
        let options = DecodeOptions::default().with_annotations(true);
        let tree = decode_tree_with(&data, 0, &options).unwrap();
        let fields: Vec<_> = tree
            .annotations_for(NodeId(0))
            .map(|a| (a.field, a.position))
            .collect();
        assert_eq!(fields, vec![("vft", 8), ("sibling", 12)]);
    }

    #[test]
    fn decode_trees_keeps_failures_separate() {
        let mut data = words(&[1, 0, 0, -1]);
        data.extend(words(&[1, 99, 0, -1]));
        let results = decode_trees(&data, &[0, 16], &DecodeOptions::default());
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1].as_ref().unwrap_err().error,
            DecodeError::UnknownNodeKind { tag: 99, .. }
        ));
    }
}
