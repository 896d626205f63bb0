//! Decode error types.

use thiserror::Error;

use crate::tree::Tree;

/// Errors raised while decoding a LOD tree.
///
/// Most variants are fatal for the tree being decoded. The recoverable ones
/// ([`DecodeError::is_recoverable`]) never abort a decode; they are recorded as
/// [`Diagnostic`](crate::Diagnostic)s on the resulting [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes remain than a field or declared count requires.
    #[error("truncated input reading {field} at {position}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        field: &'static str,
        position: u64,
        needed: u64,
        available: u64,
    },

    /// A root-relative offset resolved outside the buffer.
    #[error("{field} offset {raw} resolves to {resolved}, outside buffer of {len} bytes")]
    OffsetOutOfBounds {
        field: &'static str,
        raw: i32,
        resolved: i64,
        len: usize,
    },

    /// A type tag outside the known node kinds.
    #[error("unknown node kind {tag} for node at {position}")]
    UnknownNodeKind { tag: i32, position: u64 },

    /// Nested subtree decodes went deeper than the configured limit.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },

    /// The walker needed another node tag but all of them were consumed.
    #[error("type stream exhausted after {count} tags")]
    TypeStreamExhausted { count: usize },

    /// A declared element count is negative.
    #[error("invalid {field} count {count}")]
    InvalidCount { field: &'static str, count: i32 },

    /// A primitive record carries a variant code with no known layout.
    #[error("unknown primitive variant {code} at {position}")]
    UnknownPrimitiveVariant { code: i32, position: u64 },

    /// A render-control node carries a mode with no known payload shape.
    #[error("unknown render control mode {mode} at {position}")]
    UnknownRenderControl { mode: i32, position: u64 },

    /// A switch child table entry holds the sentinel, so that child is skipped.
    #[error("switch child {index} at {position} is absent")]
    AbsentSwitchChild { index: usize, position: u64 },

    /// The node chain ended before every declared tag was used.
    #[error("only {consumed} of {count} node tags were consumed")]
    UnconsumedTags { consumed: usize, count: usize },
}

impl DecodeError {
    /// Whether decoding carries on past this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownPrimitiveVariant { .. }
                | Self::UnknownRenderControl { .. }
                | Self::AbsentSwitchChild { .. }
                | Self::UnconsumedTags { .. }
        )
    }
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A fatal decode failure together with everything decoded before it.
#[derive(Debug, Clone, Error)]
#[error("{error} (after {} decoded nodes)", .partial.len())]
pub struct TreeError {
    /// Nodes decoded before the failure, fully linked as far as they got.
    pub partial: Box<Tree>,
    /// The first fatal error encountered.
    #[source]
    pub error: DecodeError,
}

impl TreeError {
    pub(crate) fn new(partial: Tree, error: DecodeError) -> Self {
        Self {
            partial: Box::new(partial),
            error,
        }
    }
}
