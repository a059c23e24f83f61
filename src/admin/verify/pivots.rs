use std::cmp::Ordering;
use std::ops::ControlFlow;

use super::bounds::KeyBounds;
use super::node::NodeScan;
use super::report::VerifyCheck;
use crate::storage::ftree::{Key, KeyComparator};

/// Pivots must be strictly increasing and each must lie inside `bounds`.
pub(super) fn check_pivots(
    cmp: &dyn KeyComparator,
    scan: &mut NodeScan<'_>,
    pivots: &[Key],
    bounds: KeyBounds<'_>,
) -> ControlFlow<()> {
    for (idx, pair) in pivots.windows(2).enumerate() {
        let ordered = cmp.compare(&pair[0], &pair[1]) == Ordering::Less;
        scan.require(ordered, idx, VerifyCheck::PivotOrder, || {
            format!("pivot {idx} {} vs pivot {} {}", pair[0], idx + 1, pair[1])
        })?;
    }
    for (idx, pivot) in pivots.iter().enumerate() {
        let inside = bounds.contains(cmp, pivot);
        scan.require(inside, idx, VerifyCheck::PivotBounds, || {
            format!("pivot {idx} {pivot} outside bounds {bounds}")
        })?;
    }
    ControlFlow::Continue(())
}
