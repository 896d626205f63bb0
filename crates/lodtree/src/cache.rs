//! Decoded-tree caches keyed by start offset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use lodtree_decode::Tree;

/// Storage for trees that already decoded successfully.
pub trait Cache: Send + Sync {
    fn get(&self, start_offset: usize) -> Option<Arc<Tree>>;

    fn insert(&self, start_offset: usize, tree: Arc<Tree>);
}

/// Cache that stores nothing; every lookup decodes again.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _start_offset: usize) -> Option<Arc<Tree>> {
        None
    }

    fn insert(&self, _start_offset: usize, _tree: Arc<Tree>) {}
}

/// In-memory cache shared across threads.
#[derive(Debug, Default)]
pub struct MemoryCache {
    trees: Mutex<HashMap<usize, Arc<Tree>>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.trees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Cache for MemoryCache {
    fn get(&self, start_offset: usize) -> Option<Arc<Tree>> {
        self.trees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&start_offset)
            .cloned()
    }

    fn insert(&self, start_offset: usize, tree: Arc<Tree>) {
        self.trees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(start_offset, tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.get(8).is_none());
        let tree = Arc::new(Tree::default());
        cache.insert(8, Arc::clone(&tree));
        assert!(Arc::ptr_eq(&cache.get(8).unwrap(), &tree));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn no_cache_forgets() {
        NoCache.insert(0, Arc::new(Tree::default()));
        assert!(NoCache.get(0).is_none());
    }
}
