use std::sync::Arc;

use super::basement::Basement;
use super::image::TreeImage;
use super::key::{Bytewise, Key, KeyComparator};
use super::node::{ChildBuffer, FtNode, NodeBody};
use super::tree::FtTree;
use crate::primitives::cache::CacheOptions;
use crate::types::{block_fullhash, BlockNum, FullHash, Msn, Result};

/// Assembles trees node by node, bottom-up.
///
/// The builder stamps block numbers and hashes but checks no ordering, so it can
/// describe corrupt trees as easily as healthy ones.
pub struct TreeBuilder {
    file_id: u32,
    next_block: u64,
    nodes: Vec<FtNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::with_file_id(1)
    }
}

impl TreeBuilder {
    /// Builder for file id 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for a specific file id.
    pub fn with_file_id(file_id: u32) -> Self {
        Self {
            file_id,
            next_block: 1,
            nodes: Vec::new(),
        }
    }

    /// Reserves the next block number.
    pub fn allocate(&mut self) -> BlockNum {
        let block = BlockNum(self.next_block);
        self.next_block += 1;
        block
    }

    /// Hash the tree will expect for `block`.
    pub fn fullhash(&self, block: BlockNum) -> FullHash {
        block_fullhash(self.file_id, block)
    }

    /// Adds a leaf with the given basements.
    pub fn leaf(&mut self, msn: Msn, pivots: Vec<Key>, basements: Vec<Basement>) -> BlockNum {
        self.node(msn, pivots, NodeBody::Leaf { basements })
    }

    /// Adds a leaf holding a single basement built from `keys`.
    pub fn leaf_keys<I, K>(&mut self, msn: Msn, keys: I) -> BlockNum
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.leaf(msn, Vec::new(), vec![Basement::from_keys(keys)])
    }

    /// Adds an internal node at `height` over `children`.
    pub fn internal(
        &mut self,
        height: u32,
        msn: Msn,
        pivots: Vec<Key>,
        children: Vec<ChildBuffer>,
    ) -> BlockNum {
        self.node(msn, pivots, NodeBody::Internal { height, children })
    }

    /// Adds a hand-made node verbatim, hash and block included.
    pub fn push(&mut self, node: FtNode) {
        self.next_block = self.next_block.max(node.block.0 + 1);
        self.nodes.push(node);
    }

    /// Mutable access to an already-added node.
    pub fn node_mut(&mut self, block: BlockNum) -> Option<&mut FtNode> {
        self.nodes.iter_mut().find(|node| node.block == block)
    }

    /// Finishes into a serializable image rooted at `root`.
    pub fn into_image(self, root: BlockNum) -> TreeImage {
        TreeImage {
            file_id: self.file_id,
            root,
            nodes: self.nodes,
        }
    }

    /// Finishes into a bytewise-ordered tree with default cache settings.
    pub fn build(self, root: BlockNum) -> Result<FtTree> {
        self.build_with(root, Arc::new(Bytewise), CacheOptions::default())
    }

    /// Finishes into a tree using `comparator` and `cache`.
    pub fn build_with(
        self,
        root: BlockNum,
        comparator: Arc<dyn KeyComparator>,
        cache: CacheOptions,
    ) -> Result<FtTree> {
        FtTree::from_image(self.into_image(root), comparator, cache)
    }

    fn node(&mut self, msn: Msn, pivots: Vec<Key>, body: NodeBody) -> BlockNum {
        let block = self.allocate();
        let fullhash = self.fullhash(block);
        self.nodes.push(FtNode {
            block,
            fullhash,
            max_msn_applied: msn,
            pivots,
            body,
        });
        block
    }
}
