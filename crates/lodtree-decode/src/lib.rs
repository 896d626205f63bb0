//! Decode LOD scene-graph trees from flight-sim model files.
//!
//! A LOD file stores a forest of BSP scene graphs. Each tree begins with a
//! node count and a pre-order list of node-kind tags, followed by node
//! payloads that point at each other through offsets relative to the
//! tree's Root node. This crate turns one such tree into a [`Tree`]: an
//! arena of typed [`Node`]s with their structural links resolved.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Bounded**: Recursion depth is capped by [`DecodeOptions::max_depth`]
//! - **Partial results**: Fatal errors still return the nodes decoded so far
//!
//! # Key functions
//!
//! - [`decode_tree`]: Decode one tree from its start offset
//! - [`decode_trees`]: Decode several independent trees from one buffer
//! - [`decode_node`]: Decode a single node payload
//! - [`decode_primitive`]: Decode a single polygon/primitive record
//! - [`read_count_and_tags`]: Read a tree's type stream
//! - [`resolve`]: Resolve a root-relative offset
//! - [`encode_tree`]: Write a decoded tree back to bytes

mod decode;
mod error;
mod reader;

pub mod encode;
pub mod node;
pub mod offset;
pub mod primitive;
pub mod tree;
pub mod types;
pub mod walker;

pub use decode::decode_node;
pub use encode::encode_tree;
pub use error::{DecodeError, DecodeResult, TreeError};
pub use node::{
    ChildTable, DegreeOfFreedom, DofRange, LightString, Links, LitPrimitive, MathControl,
    MathOperands, Node, NodeBody, PrimitiveRef, RenderControl, Root, Slot, SpecialTransform,
    Splitter, SubTree, Switch, TransformType, VecList,
};
pub use offset::{Offset, SENTINEL, resolve};
pub use primitive::{
    Plane, Polygon, Primitive, PrimitiveFamily, PrimitiveShape, TextureRef, decode_primitive,
};
pub use tree::{Annotation, Diagnostic, NodeId, Tree, Visitor};
pub use types::{NodeKind, TypeCursor, TypeStream, read_count_and_tags};
pub use walker::{DecodeOptions, WalkState, decode_chain, decode_tree, decode_tree_with, decode_trees};

/// Default cap on nested chain depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Number of node kinds in the format.
pub const NODE_KIND_COUNT: usize = 18;
