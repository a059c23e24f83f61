use std::sync::Arc;

use crate::primitives::cache::CacheOptions;
use crate::storage::ftree::{Bytewise, KeyComparator};

/// Common options used when opening a tree for administrative commands.
#[derive(Clone)]
pub struct AdminOpenOptions {
    /// Node cache configuration.
    pub cache: CacheOptions,
    /// Key order the tree was built with.
    pub comparator: Arc<dyn KeyComparator>,
}

impl Default for AdminOpenOptions {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            comparator: Arc::new(Bytewise),
        }
    }
}
