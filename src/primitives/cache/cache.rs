use std::ops::Deref;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error};

use super::frame::Frame;
use crate::storage::ftree::FtNode;
use crate::types::{BlockNum, FtError, FullHash, Result};

/// Source of decoded nodes sitting underneath the cache.
pub trait NodeStore: Send + Sync + 'static {
    /// Reads and decodes the node stored at `block`.
    fn read_node(&self, block: BlockNum) -> Result<FtNode>;
}

/// Configuration for [`NodeCache`].
#[derive(Clone, Debug)]
pub struct CacheOptions {
    /// Number of nodes kept resident before unpinned ones are evicted.
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Counters describing cache activity since creation.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CacheStats {
    /// Pins served from a resident frame.
    pub hits: u64,
    /// Pins that had to read from the store.
    pub misses: u64,
    /// Unpinned frames dropped to make room.
    pub evictions: u64,
    /// Total successful pins.
    pub pins: u64,
    /// Total successful unpins.
    pub unpins: u64,
}

struct CacheInner {
    frames: LruCache<BlockNum, Frame>,
    stats: CacheStats,
}

/// Pin-counting cache of decoded nodes.
///
/// A pinned frame is never evicted. Every successful [`NodeCache::fetch_and_pin`]
/// must be paired with exactly one unpin, either through [`PinnedNode::release`]
/// or by dropping the guard.
pub struct NodeCache {
    store: Arc<dyn NodeStore>,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl NodeCache {
    /// Creates an empty cache over `store`.
    pub fn new(store: Arc<dyn NodeStore>, opts: CacheOptions) -> Self {
        Self {
            store,
            capacity: opts.capacity.max(1),
            inner: Mutex::new(CacheInner {
                frames: LruCache::unbounded(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Materializes `block` and pins it until the returned guard is released.
    pub fn fetch_and_pin(&self, block: BlockNum, fullhash: FullHash) -> Result<PinnedNode<'_>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let node = match inner.frames.get_mut(&block) {
            Some(frame) => {
                if frame.fullhash != fullhash {
                    return Err(FtError::fatal(format!(
                        "block {block} pinned with hash {fullhash}, resident as {}",
                        frame.fullhash
                    )));
                }
                frame.pin_count += 1;
                inner.stats.hits += 1;
                Arc::clone(&frame.node)
            }
            None => {
                let node = self.store.read_node(block)?;
                if node.block != block {
                    return Err(FtError::Corruption("store returned a node for another block"));
                }
                inner.stats.misses += 1;
                self.evict_unpinned(inner);
                let node = Arc::new(node);
                let mut frame = Frame::new(Arc::clone(&node), fullhash);
                frame.pin_count = 1;
                inner.frames.put(block, frame);
                node
            }
        };
        inner.stats.pins += 1;
        Ok(PinnedNode {
            cache: self,
            pinned_block: block,
            pinned_hash: fullhash,
            node,
            released: false,
        })
    }

    /// Drops one pin on `block`.
    ///
    /// Unpinning a block that is not resident or not pinned means the pin
    /// bookkeeping is broken, which is reported as [`FtError::Fatal`].
    pub fn unpin(&self, block: BlockNum, fullhash: FullHash) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let frame = inner
            .frames
            .peek_mut(&block)
            .ok_or_else(|| FtError::fatal(format!("unpin of non-resident block {block}")))?;
        if frame.fullhash != fullhash {
            return Err(FtError::fatal(format!(
                "unpin of block {block} with hash {fullhash}, resident as {}",
                frame.fullhash
            )));
        }
        if frame.pin_count == 0 {
            return Err(FtError::fatal(format!("unpin of unpinned block {block}")));
        }
        frame.pin_count -= 1;
        inner.stats.unpins += 1;
        Ok(())
    }

    /// Number of resident nodes holding at least one pin.
    pub fn count_pinned(&self) -> usize {
        let inner = self.inner.lock();
        inner.frames.iter().filter(|(_, frame)| frame.is_pinned()).count()
    }

    /// Number of resident nodes.
    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    /// Returns true when nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    fn evict_unpinned(&self, inner: &mut CacheInner) {
        while inner.frames.len() >= self.capacity {
            let victim = inner
                .frames
                .iter()
                .rev()
                .find(|(_, frame)| !frame.is_pinned())
                .map(|(block, _)| *block);
            match victim {
                Some(block) => {
                    inner.frames.pop(&block);
                    inner.stats.evictions += 1;
                }
                None => {
                    debug!(
                        target: "ftree::cache",
                        resident = inner.frames.len(),
                        capacity = self.capacity,
                        "all frames pinned; growing past capacity"
                    );
                    break;
                }
            }
        }
    }
}

/// A node pinned in the cache; unpins when released or dropped.
pub struct PinnedNode<'a> {
    cache: &'a NodeCache,
    pinned_block: BlockNum,
    pinned_hash: FullHash,
    node: Arc<FtNode>,
    released: bool,
}

impl PinnedNode<'_> {
    /// Block the pin was taken on.
    pub fn pinned_block(&self) -> BlockNum {
        self.pinned_block
    }

    /// Hash the pin was taken with.
    pub fn pinned_hash(&self) -> FullHash {
        self.pinned_hash
    }

    /// Unpins now, surfacing bookkeeping failures to the caller.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.cache.unpin(self.pinned_block, self.pinned_hash)
    }
}

impl Deref for PinnedNode<'_> {
    type Target = FtNode;

    fn deref(&self) -> &FtNode {
        &self.node
    }
}

impl Drop for PinnedNode<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.cache.unpin(self.pinned_block, self.pinned_hash) {
            error!(target: "ftree::cache", block = self.pinned_block.0, %err, "unpin on drop failed");
        }
    }
}
