//! Consistency verification for fractal trees.
//!
//! The walk pins each node, checks what the node alone can prove (pivot order,
//! bounds inherited from ancestors, buffered message placement and sequencing,
//! leaf entry order), then descends with narrowed bounds. Broken preconditions
//! such as a hash or height mismatch abort with [`FtError::Fatal`](crate::types::FtError::Fatal);
//! data corruption is reported as [`VerifyStatus::NeedsRepair`].

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::admin::Result;
use crate::storage::ftree::FtTree;

mod bounds;
mod leaf;
mod message;
mod node;
mod pivots;
mod report;


pub use bounds::{within_bounds, KeyBounds};
pub use message::{check_message, MessageFault};
pub use report::{VerifyCheck, VerifyCounts, VerifyFinding, VerifyReport, VerifyStatus};

use node::Verifier;

/// Value handed to the progress callback for every node.
///
/// This is a constant, not a fraction of the tree covered.
pub const PROGRESS_PLACEHOLDER: f32 = 0.0;

const MAX_FINDINGS: usize = 32;

/// Controls how far verification goes after a violation.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyOptions {
    /// Log every violation through `tracing` as it is found.
    pub verbose: bool,
    /// Keep checking after a needs-repair violation instead of stopping at the first.
    pub keep_going: bool,
    /// Descend into children; when false only the root is checked.
    pub recurse: bool,
    /// Maximum number of findings kept in the report.
    pub max_findings: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            keep_going: false,
            recurse: true,
            max_findings: MAX_FINDINGS,
        }
    }
}

/// Verifies every invariant reachable from the tree's root.
///
/// `progress` is called once per node whose subtree checked clean; a non-zero
/// return stops the walk and is reported as [`VerifyStatus::Aborted`].
///
/// # Errors
///
/// Returns [`AdminError::Core`](crate::admin::AdminError::Core) wrapping
/// [`FtError::Fatal`](crate::types::FtError::Fatal) when a block cannot be
/// pinned, its hash or height disagrees with what its parent implies, or pin
/// bookkeeping is broken.
pub fn verify(
    tree: &FtTree,
    progress: Option<&mut dyn FnMut(f32) -> i32>,
    opts: &VerifyOptions,
) -> Result<VerifyReport> {
    let root = tree.root();
    let pinned_before = tree.cache().count_pinned();
    let started = Instant::now();

    let mut verifier = Verifier::new(tree, opts, progress);
    let status = verifier.verify_node(root, None, KeyBounds::unbounded(), None)?;
    let tally = verifier.into_tally();

    let pinned_after = tree.cache().count_pinned();
    if pinned_before != pinned_after {
        warn!(
            target: "ftree::verify",
            pinned_before,
            pinned_after,
            "pinned node count changed across verification"
        );
    }
    info!(
        target: "ftree::verify",
        root = root.0,
        ?status,
        nodes = tally.counts.nodes_visited,
        findings = tally.findings.len() as u64 + tally.dropped,
        elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0,
        "verification finished"
    );

    Ok(VerifyReport {
        status,
        findings: tally.findings,
        findings_dropped: tally.dropped,
        counts: tally.counts,
        pinned_before,
        pinned_after,
    })
}

/// [`verify`] with no progress callback and default options.
pub fn verify_tree(tree: &FtTree) -> Result<VerifyReport> {
    verify(tree, None, &VerifyOptions::default())
}
