//! Load LOD model files and inspect their decoded scene-graph trees.
//!
//! This crate is the host side of [`lodtree_decode`]: it owns file bytes,
//! decodes trees by start offset with optional caching, and renders decoded
//! trees as text.
//!
//! # Example
//!
//! ```no_run
//! use lodtree::{LodFile, MemoryCache, RenderOptions, render_text};
//!
//! # fn main() -> lodtree::Result<()> {
//! let file = LodFile::open("KoreaObj.LOD")?.with_cache(MemoryCache::new());
//! let tree = file.tree(0)?;
//! print!("{}", render_text(&tree, &RenderOptions::default()));
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod file;
mod render;

pub use cache::{Cache, MemoryCache, NoCache};
pub use error::{Error, Result};
pub use file::LodFile;
pub use render::{RenderOptions, render_text};

pub use lodtree_decode as decode;
