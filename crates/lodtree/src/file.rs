//! LOD file access.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lodtree_decode::{DecodeOptions, Tree, decode_tree_with};

use crate::cache::{Cache, NoCache};
use crate::error::{Error, Result};

/// The bytes of one LOD file, decoded tree by tree on demand.
///
/// Tree start offsets come from the file's header table, which is read
/// elsewhere; this type only decodes the trees they point at.
#[derive(Debug)]
pub struct LodFile<C: Cache = NoCache> {
    path: Option<PathBuf>,
    bytes: Vec<u8>,
    options: DecodeOptions,
    cache: C,
}

impl LodFile<NoCache> {
    /// Read a LOD file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), len = bytes.len(), "loaded LOD file");
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::from_bytes(bytes)
        })
    }

    /// Wrap bytes already in memory.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            path: None,
            bytes,
            options: DecodeOptions::default(),
            cache: NoCache,
        }
    }
}

impl<C: Cache> LodFile<C> {
    /// Replace the tree cache.
    #[must_use]
    pub fn with_cache<D: Cache>(self, cache: D) -> LodFile<D> {
        LodFile {
            path: self.path,
            bytes: self.bytes,
            options: self.options,
            cache,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Decode (or fetch from cache) the tree starting at `start_offset`.
    pub fn tree(&self, start_offset: usize) -> Result<Arc<Tree>> {
        if let Some(tree) = self.cache.get(start_offset) {
            tracing::debug!(start_offset, "tree cache hit");
            return Ok(tree);
        }
        let tree = Arc::new(decode_tree_with(&self.bytes, start_offset, &self.options)?);
        self.cache.insert(start_offset, Arc::clone(&tree));
        Ok(tree)
    }

    /// Decode every tree in `start_offsets`, each independently.
    pub fn trees(&self, start_offsets: &[usize]) -> Vec<Result<Arc<Tree>>> {
        start_offsets
            .iter()
            .map(|&start| self.tree(start))
            .collect()
    }
}
