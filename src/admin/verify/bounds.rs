use std::cmp::Ordering;
use std::fmt;

use crate::storage::ftree::{Key, KeyComparator, KeyDisplay};

/// Key range inherited from the ancestors' pivots: `(lesser, greatereq]`.
///
/// A missing side is unbounded.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyBounds<'a> {
    /// Exclusive lower bound.
    pub lesser: Option<&'a [u8]>,
    /// Inclusive upper bound.
    pub greatereq: Option<&'a [u8]>,
}

impl<'a> KeyBounds<'a> {
    /// No constraint on either side.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounds from explicit sides.
    pub fn new(lesser: Option<&'a [u8]>, greatereq: Option<&'a [u8]>) -> Self {
        Self { lesser, greatereq }
    }

    /// Returns true when `key` lies inside the range.
    pub fn contains(&self, cmp: &dyn KeyComparator, key: &[u8]) -> bool {
        within_bounds(cmp, key, self.lesser, self.greatereq)
    }

    /// Narrows the range to child `idx` of a node with `n_children` partitions.
    ///
    /// Child 0 keeps the inherited lower bound and the last child keeps the
    /// inherited upper bound; every other side comes from the adjacent pivot.
    pub fn for_child<'b>(&self, pivots: &'b [Key], idx: usize, n_children: usize) -> KeyBounds<'b>
    where
        'a: 'b,
    {
        let lesser = if idx == 0 {
            self.lesser
        } else {
            pivots.get(idx - 1).map(|pivot| pivot.as_bytes())
        };
        let greatereq = if idx + 1 >= n_children {
            self.greatereq
        } else {
            pivots.get(idx).map(|pivot| pivot.as_bytes())
        };
        KeyBounds { lesser, greatereq }
    }
}

impl fmt::Display for KeyBounds<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lesser {
            Some(lo) => write!(f, "({}", KeyDisplay(lo))?,
            None => write!(f, "(-inf")?,
        }
        match self.greatereq {
            Some(hi) => write!(f, ", {}]", KeyDisplay(hi)),
            None => write!(f, ", +inf)"),
        }
    }
}

/// Decides whether `key` lies in `(lesser, greatereq]` under `cmp`.
///
/// `lesser` excludes keys at or below it, `greatereq` excludes keys above it.
pub fn within_bounds(
    cmp: &dyn KeyComparator,
    key: &[u8],
    lesser: Option<&[u8]>,
    greatereq: Option<&[u8]>,
) -> bool {
    if let Some(lo) = lesser {
        if cmp.compare(lo, key) != Ordering::Less {
            return false;
        }
    }
    if let Some(hi) = greatereq {
        if cmp.compare(hi, key) == Ordering::Less {
            return false;
        }
    }
    true
}
