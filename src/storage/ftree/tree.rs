use std::cmp::Ordering;
use std::sync::Arc;

use super::image::{MemStore, TreeImage};
use super::key::KeyComparator;
use crate::primitives::cache::{CacheOptions, NodeCache, NodeStore};
use crate::types::{block_fullhash, BlockNum, FullHash, Result};

/// Handle on one fractal tree: its node cache, root block, and key order.
pub struct FtTree {
    cache: NodeCache,
    root: BlockNum,
    file_id: u32,
    comparator: Arc<dyn KeyComparator>,
}

impl FtTree {
    /// Opens a tree whose nodes live in `store`.
    pub fn new(
        store: Arc<dyn NodeStore>,
        root: BlockNum,
        file_id: u32,
        comparator: Arc<dyn KeyComparator>,
        cache: CacheOptions,
    ) -> Self {
        Self {
            cache: NodeCache::new(store, cache),
            root,
            file_id,
            comparator,
        }
    }

    /// Opens a tree backed by an in-memory copy of `image`.
    pub fn from_image(
        image: TreeImage,
        comparator: Arc<dyn KeyComparator>,
        cache: CacheOptions,
    ) -> Result<Self> {
        let store = MemStore::from_nodes(image.nodes)?;
        Ok(Self::new(
            Arc::new(store),
            image.root,
            image.file_id,
            comparator,
            cache,
        ))
    }

    /// Root block recorded in the tree header.
    pub fn root(&self) -> BlockNum {
        self.root
    }

    /// Tree file identifier.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Expected hash for `block` in this tree.
    pub fn fullhash(&self, block: BlockNum) -> FullHash {
        block_fullhash(self.file_id, block)
    }

    /// Node cache backing this tree.
    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// Comparator the tree was built with.
    pub fn comparator(&self) -> &dyn KeyComparator {
        self.comparator.as_ref()
    }

    /// Compares two keys with the tree's comparator.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.comparator.compare(a, b)
    }
}
