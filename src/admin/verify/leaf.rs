use std::cmp::Ordering;
use std::ops::ControlFlow;

use super::bounds::KeyBounds;
use super::node::NodeScan;
use super::report::VerifyCheck;
use crate::storage::ftree::{Basement, KeyComparator, LeafEntry};
use crate::types::Msn;

/// Checks one basement: the leaf watermark against the root's, then every
/// entry against `bounds` and against its predecessor.
pub(super) fn check_basement(
    cmp: &dyn KeyComparator,
    scan: &mut NodeScan<'_>,
    child: usize,
    basement: &Basement,
    bounds: KeyBounds<'_>,
    root_msn: Msn,
    node_msn: Msn,
) -> ControlFlow<()> {
    scan.tally().counts.basements_checked += 1;
    scan.require(root_msn >= node_msn, child, VerifyCheck::LeafMsnCeiling, || {
        format!("leaf msn {node_msn} above root msn {root_msn}")
    })?;

    let mut prev: Option<&LeafEntry> = None;
    for (pos, entry) in basement.entries().iter().enumerate() {
        scan.tally().counts.leaf_entries_checked += 1;
        let inside = bounds.contains(cmp, &entry.key);
        scan.require(inside, child, VerifyCheck::LeafBounds, || {
            format!("entry {pos} key {} outside bounds {bounds}", entry.key)
        })?;
        if let Some(prev) = prev {
            let ordered = cmp.compare(&prev.key, &entry.key) == Ordering::Less;
            scan.require(ordered, child, VerifyCheck::LeafOrder, || {
                format!("entry {pos} key {} follows key {}", entry.key, prev.key)
            })?;
        }
        prev = Some(entry);
    }
    ControlFlow::Continue(())
}
