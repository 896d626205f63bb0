//! Error types for the lodtree crate.

use std::io;
use std::path::PathBuf;

use lodtree_decode::TreeError;
use thiserror::Error;

/// Errors that can occur when loading or decoding a LOD file.
#[derive(Debug, Error)]
pub enum Error {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A tree failed to decode. The partial tree is kept.
    #[error(transparent)]
    Decode(#[from] TreeError),
}

impl Error {
    /// The partially decoded tree, for decode failures.
    #[must_use]
    pub fn partial_tree(&self) -> Option<&lodtree_decode::Tree> {
        match self {
            Self::Decode(err) => Some(&err.partial),
            Self::Io { .. } => None,
        }
    }
}

/// Result type alias for lodtree operations.
pub type Result<T> = std::result::Result<T, Error>;
