use serde::{Deserialize, Serialize};

use super::basement::Basement;
use super::key::Key;
use super::message::MessageBuffer;
use crate::types::{BlockNum, FullHash, Msn, Result, FtError};

/// An internal node's link to one child plus the messages buffered for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChildBuffer {
    /// Block of the child node.
    pub block: BlockNum,
    /// Pending messages, oldest first.
    #[serde(default)]
    pub buffer: MessageBuffer,
}

impl ChildBuffer {
    /// Child link with nothing buffered.
    pub fn empty(block: BlockNum) -> Self {
        Self {
            block,
            buffer: MessageBuffer::new(),
        }
    }

    /// Child link with the given buffer.
    pub fn with_buffer(block: BlockNum, buffer: impl Into<MessageBuffer>) -> Self {
        Self {
            block,
            buffer: buffer.into(),
        }
    }
}

/// Partitions of a node; the variant is fixed by the node's height.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeBody {
    /// Height 0: every partition is a basement of materialized entries.
    Leaf {
        /// Basements in key order.
        basements: Vec<Basement>,
    },
    /// Height > 0: every partition is a child link with its message buffer.
    Internal {
        /// Distance to the leaf level.
        height: u32,
        /// Child links in key order.
        children: Vec<ChildBuffer>,
    },
}

/// Decoded tree node as handed out by the cache.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FtNode {
    /// Block this node was read from.
    pub block: BlockNum,
    /// Hash recorded for the block when the node was written.
    pub fullhash: FullHash,
    /// Highest MSN already incorporated into this node on disk.
    pub max_msn_applied: Msn,
    /// `n_children - 1` separators; pivot `i` is the inclusive upper bound of child `i`.
    #[serde(default)]
    pub pivots: Vec<Key>,
    /// Child partitions.
    pub body: NodeBody,
}

impl FtNode {
    /// Height of the node, 0 for leaves.
    pub fn height(&self) -> u32 {
        match &self.body {
            NodeBody::Leaf { .. } => 0,
            NodeBody::Internal { height, .. } => *height,
        }
    }

    /// Number of partitions.
    pub fn n_children(&self) -> usize {
        match &self.body {
            NodeBody::Leaf { basements } => basements.len(),
            NodeBody::Internal { children, .. } => children.len(),
        }
    }

    /// Returns true for height-0 nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    /// Checks the structural shape a decoder guarantees: pivot count matches the
    /// partition count and internal nodes sit above the leaf level.
    pub fn check_shape(&self) -> Result<()> {
        let n = self.n_children();
        let expected_pivots = n.saturating_sub(1);
        if self.pivots.len() != expected_pivots {
            return Err(FtError::Corruption("pivot count does not match child count"));
        }
        if let NodeBody::Internal { height, children } = &self.body {
            if *height == 0 {
                return Err(FtError::Corruption("internal node at height 0"));
            }
            if children.is_empty() {
                return Err(FtError::Corruption("internal node without children"));
            }
        }
        Ok(())
    }
}
