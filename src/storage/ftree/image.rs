use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

use super::node::FtNode;
use crate::primitives::cache::NodeStore;
use crate::types::{BlockNum, FtError, Result};

/// Serializable snapshot of a whole tree: header fields plus every node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeImage {
    /// Identifier of the tree file; feeds the block hash.
    pub file_id: u32,
    /// Root block.
    pub root: BlockNum,
    /// All nodes, in any order.
    pub nodes: Vec<FtNode>,
}

impl TreeImage {
    /// Decodes an image from JSON.
    pub fn read_from(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Encodes the image as pretty-printed JSON.
    pub fn write_to(&self, writer: impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

/// In-memory [`NodeStore`]; every read hands out a fresh decoded copy.
#[derive(Default)]
pub struct MemStore {
    nodes: HashMap<BlockNum, FtNode>,
    reads: AtomicU64,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `nodes`, rejecting malformed shapes and duplicate blocks.
    pub fn from_nodes(nodes: impl IntoIterator<Item = FtNode>) -> Result<Self> {
        let mut store = Self::new();
        for node in nodes {
            store.insert(node)?;
        }
        Ok(store)
    }

    /// Adds one node.
    pub fn insert(&mut self, node: FtNode) -> Result<()> {
        node.check_shape()?;
        if self.nodes.contains_key(&node.block) {
            return Err(FtError::Invalid("duplicate block in node store"));
        }
        self.nodes.insert(node.block, node);
        Ok(())
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(AtomicOrdering::Relaxed)
    }
}

impl NodeStore for MemStore {
    fn read_node(&self, block: BlockNum) -> Result<FtNode> {
        self.reads.fetch_add(1, AtomicOrdering::Relaxed);
        self.nodes.get(&block).cloned().ok_or(FtError::NotFound(block))
    }
}
