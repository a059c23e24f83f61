use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::primitives::cache::CacheStats;
use crate::storage::ftree::{FtTree, NodeBody};
use crate::types::{BlockNum, Msn};

use crate::admin::Result;

/// Shape summary of a tree.
#[derive(Debug, Clone, Serialize)]
pub struct TreeStats {
    /// Root block.
    pub root: BlockNum,
    /// Height of the root.
    pub root_height: u32,
    /// Watermark of the root.
    pub root_msn: Msn,
    /// Reachable node count keyed by height.
    pub nodes_per_height: BTreeMap<u32, u64>,
    /// Buffered messages across all internal nodes.
    pub messages: u64,
    /// Basements across all leaves.
    pub basements: u64,
    /// Materialized entries across all basements.
    pub leaf_entries: u64,
    /// Cache counters after the walk.
    pub cache: CacheStats,
}

/// Walks every node reachable from the root and summarizes the tree's shape.
///
/// Blocks referenced twice are counted once.
pub fn stats(tree: &FtTree) -> Result<TreeStats> {
    let root = tree.root();
    let mut nodes_per_height = BTreeMap::new();
    let mut messages = 0u64;
    let mut basements = 0u64;
    let mut leaf_entries = 0u64;
    let mut root_height = 0;
    let mut root_msn = Msn::ZERO;

    let mut seen = HashSet::new();
    let mut pending = vec![root];
    while let Some(block) = pending.pop() {
        if !seen.insert(block) {
            continue;
        }
        let node = tree.cache().fetch_and_pin(block, tree.fullhash(block))?;
        if block == root {
            root_height = node.height();
            root_msn = node.max_msn_applied;
        }
        *nodes_per_height.entry(node.height()).or_insert(0u64) += 1;
        match &node.body {
            NodeBody::Internal { children, .. } => {
                for child in children {
                    messages += child.buffer.len() as u64;
                    pending.push(child.block);
                }
            }
            NodeBody::Leaf { basements: parts } => {
                basements += parts.len() as u64;
                leaf_entries += parts.iter().map(|b| b.len() as u64).sum::<u64>();
            }
        }
        node.release()?;
    }

    Ok(TreeStats {
        root,
        root_height,
        root_msn,
        nodes_per_height,
        messages,
        basements,
        leaf_entries,
        cache: tree.cache().stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ftree::{ChildBuffer, Message, TreeBuilder};

    #[test]
    fn stats_count_shape() {
        let mut builder = TreeBuilder::new();
        let left = builder.leaf_keys(Msn(2), ["a", "b", "c"]);
        let right = builder.leaf_keys(Msn(2), ["n", "z"]);
        let root = builder.internal(
            1,
            Msn(9),
            vec!["m".into()],
            vec![
                ChildBuffer::with_buffer(left, vec![Message::insert(Msn(8), "d", "v")]),
                ChildBuffer::empty(right),
            ],
        );
        let tree = builder.build(root).expect("tree");
        let summary = stats(&tree).expect("stats");
        assert_eq!(summary.root_height, 1);
        assert_eq!(summary.root_msn, Msn(9));
        assert_eq!(summary.nodes_per_height.get(&0), Some(&2));
        assert_eq!(summary.nodes_per_height.get(&1), Some(&1));
        assert_eq!(summary.messages, 1);
        assert_eq!(summary.leaf_entries, 5);
        assert_eq!(tree.cache().count_pinned(), 0);
    }
}
