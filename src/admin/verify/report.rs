use serde::Serialize;

use crate::types::BlockNum;

/// Aggregate outcome of a verification run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyStatus {
    /// Every visited invariant held.
    Clean,
    /// Data-level corruption was found; the process itself is healthy.
    NeedsRepair,
    /// The progress callback asked to stop with a non-zero code.
    Aborted {
        /// Value returned by the callback.
        code: i32,
    },
}

impl VerifyStatus {
    /// Returns true for [`VerifyStatus::Clean`].
    pub fn is_clean(self) -> bool {
        matches!(self, VerifyStatus::Clean)
    }
}

/// Invariant a finding refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyCheck {
    /// Parent watermark must be at least the child's.
    MsnDescent,
    /// Pivots must be strictly increasing.
    PivotOrder,
    /// Pivots must lie inside the inherited bounds.
    PivotBounds,
    /// Buffered message must carry a real MSN and, if keyed, a key inside the child's bounds.
    MessagePlacement,
    /// Buffered MSNs must strictly increase in enqueue order.
    MessageMsnOrder,
    /// Buffered MSNs must not exceed the node's watermark.
    MessageMsnCeiling,
    /// Leaf entries must lie inside the basement's bounds.
    LeafBounds,
    /// Leaf entries must be strictly increasing.
    LeafOrder,
    /// A leaf's watermark must not exceed the root's.
    LeafMsnCeiling,
}

impl VerifyCheck {
    /// Short description of the violated rule.
    pub fn describe(self) -> &'static str {
        match self {
            VerifyCheck::MsnDescent => "node msn must descend down the tree, newest messages at top",
            VerifyCheck::PivotOrder => "pivot is >= the next pivot",
            VerifyCheck::PivotBounds => "pivot is outside the inherited bounds",
            VerifyCheck::MessagePlacement => "a message in the buffer is out of place",
            VerifyCheck::MessageMsnOrder => {
                "msn per message must increase toward newer messages in the buffer"
            }
            VerifyCheck::MessageMsnCeiling => {
                "message msn exceeds the node's max applied msn"
            }
            VerifyCheck::LeafBounds => "leaf entry is outside the inherited bounds",
            VerifyCheck::LeafOrder => "adjacent leaf entries are out of order",
            VerifyCheck::LeafMsnCeiling => "leaf msn may be latest but cannot exceed the root msn",
        }
    }
}

/// One violated invariant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VerifyFinding {
    /// Node the violation was seen in.
    pub block: BlockNum,
    /// Height of that node.
    pub height: u32,
    /// Child partition (or pivot index) involved.
    pub child: usize,
    /// Which invariant failed.
    pub check: VerifyCheck,
    /// Human-readable detail.
    pub message: String,
}

/// Work done during a run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Nodes pinned and examined.
    pub nodes_visited: u64,
    /// Buffered messages examined.
    pub messages_checked: u64,
    /// Basements examined.
    pub basements_checked: u64,
    /// Leaf entries examined.
    pub leaf_entries_checked: u64,
}

/// Result of [`verify`](super::verify).
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// Worst outcome observed.
    pub status: VerifyStatus,
    /// Recorded violations, in discovery order.
    pub findings: Vec<VerifyFinding>,
    /// Violations beyond the recording cap.
    pub findings_dropped: u64,
    /// Work counters.
    pub counts: VerifyCounts,
    /// Pinned nodes in the cache before the run.
    pub pinned_before: usize,
    /// Pinned nodes in the cache after the run.
    pub pinned_after: usize,
}

impl VerifyReport {
    /// Returns true when nothing was wrong.
    pub fn is_clean(&self) -> bool {
        self.status.is_clean()
    }

    /// Returns true when corruption was found.
    pub fn needs_repair(&self) -> bool {
        self.status == VerifyStatus::NeedsRepair
    }

    /// Returns true when the pinned count is unchanged by the run.
    pub fn pins_balanced(&self) -> bool {
        self.pinned_before == self.pinned_after
    }

    /// Total violations seen, recorded or not.
    pub fn violation_count(&self) -> u64 {
        self.findings.len() as u64 + self.findings_dropped
    }
}

#[derive(Default)]
pub(super) struct Tally {
    pub findings: Vec<VerifyFinding>,
    pub dropped: u64,
    pub counts: VerifyCounts,
}

impl Tally {
    pub fn record(&mut self, finding: VerifyFinding, cap: usize) {
        if self.findings.len() < cap {
            self.findings.push(finding);
        } else {
            self.dropped += 1;
        }
    }
}
