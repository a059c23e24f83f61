use std::sync::Arc;

use crate::storage::ftree::FtNode;
use crate::types::FullHash;

/// One cached node and its pin bookkeeping.
pub struct Frame {
    pub node: Arc<FtNode>,
    pub fullhash: FullHash,
    pub pin_count: u32,
}

impl Frame {
    pub fn new(node: Arc<FtNode>, fullhash: FullHash) -> Self {
        Self {
            node,
            fullhash,
            pin_count: 0,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }
}
