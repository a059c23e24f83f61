use std::ops::ControlFlow;

use tracing::{debug, warn};

use super::bounds::KeyBounds;
use super::leaf::check_basement;
use super::message::check_buffer;
use super::pivots::check_pivots;
use super::report::{Tally, VerifyCheck, VerifyFinding, VerifyStatus};
use super::{VerifyOptions, PROGRESS_PLACEHOLDER};
use crate::storage::ftree::{FtNode, FtTree, KeyComparator, NodeBody};
use crate::types::{BlockNum, FtError, Msn, Result};

/// Watermarks threaded down the recursion by value.
#[derive(Clone, Copy, Debug)]
pub(super) struct MsnCeilings {
    /// Root watermark, fixed once the root has been read.
    pub root: Msn,
    /// Watermark of the immediate parent.
    pub parent: Msn,
}

/// Per-node failure bookkeeping for the local checks.
pub(super) struct NodeScan<'r> {
    block: BlockNum,
    height: u32,
    opts: &'r VerifyOptions,
    tally: &'r mut Tally,
    failed: bool,
}

impl<'r> NodeScan<'r> {
    fn new(block: BlockNum, height: u32, opts: &'r VerifyOptions, tally: &'r mut Tally) -> Self {
        Self {
            block,
            height,
            opts,
            tally,
            failed: false,
        }
    }

    pub fn tally(&mut self) -> &mut Tally {
        self.tally
    }

    /// Records a violation when `ok` is false. Breaks unless keep-going is set.
    pub fn require<F>(&mut self, ok: bool, child: usize, check: VerifyCheck, detail: F) -> ControlFlow<()>
    where
        F: FnOnce() -> String,
    {
        if ok {
            return ControlFlow::Continue(());
        }
        self.failed = true;
        let message = detail();
        if self.opts.verbose {
            warn!(
                target: "ftree::verify",
                block = self.block.0,
                child,
                ?check,
                "looking at child {child} of block {}: {}: {message}",
                self.block,
                check.describe()
            );
        }
        self.tally.record(
            VerifyFinding {
                block: self.block,
                height: self.height,
                child,
                check,
                message,
            },
            self.opts.max_findings,
        );
        if self.opts.keep_going {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn status(&self) -> VerifyStatus {
        if self.failed {
            VerifyStatus::NeedsRepair
        } else {
            VerifyStatus::Clean
        }
    }
}

/// Recursive walker; owns the findings and the optional progress callback.
pub(super) struct Verifier<'t, 'p> {
    tree: &'t FtTree,
    opts: &'t VerifyOptions,
    progress: Option<&'p mut dyn FnMut(f32) -> i32>,
    tally: Tally,
}

impl<'t, 'p> Verifier<'t, 'p> {
    pub fn new(
        tree: &'t FtTree,
        opts: &'t VerifyOptions,
        progress: Option<&'p mut dyn FnMut(f32) -> i32>,
    ) -> Self {
        Self {
            tree,
            opts,
            progress,
            tally: Tally::default(),
        }
    }

    pub fn into_tally(self) -> Tally {
        self.tally
    }

    /// Verifies `block` and, when recursing, its subtree.
    ///
    /// The node stays pinned for the local checks and the descent into its
    /// children, and is unpinned on every return path. `expected_height` and
    /// `ceilings` are `None` only for the root.
    pub fn verify_node(
        &mut self,
        block: BlockNum,
        expected_height: Option<u32>,
        bounds: KeyBounds<'_>,
        ceilings: Option<MsnCeilings>,
    ) -> Result<VerifyStatus> {
        let tree = self.tree;
        let fullhash = tree.fullhash(block);
        let node = tree
            .cache()
            .fetch_and_pin(block, fullhash)
            .map_err(|err| match err {
                FtError::Fatal(_) => err,
                other => FtError::fatal(format!("cannot pin block {block}: {other}")),
            })?;
        self.tally.counts.nodes_visited += 1;

        if node.fullhash != fullhash {
            return Err(FtError::fatal(format!(
                "block {block} carries hash {}, expected {fullhash}",
                node.fullhash
            )));
        }
        let height = node.height();
        if let Some(expected) = expected_height {
            if height != expected {
                return Err(FtError::fatal(format!(
                    "block {block} has height {height}, expected {expected}"
                )));
            }
        }
        let this_msn = node.max_msn_applied;
        let ceilings = ceilings.unwrap_or(MsnCeilings {
            root: this_msn,
            parent: this_msn,
        });
        debug!(
            target: "ftree::verify",
            block = block.0,
            height,
            msn = this_msn.0,
            children = node.n_children(),
            "verifying node"
        );

        let (flow, mut status) = {
            let mut scan = NodeScan::new(block, height, self.opts, &mut self.tally);
            let flow = check_local(tree.comparator(), &mut scan, &node, bounds, ceilings);
            (flow, scan.status())
        };

        if flow.is_continue() && self.opts.recurse {
            if let NodeBody::Internal { children, .. } = &node.body {
                let n_children = children.len();
                let child_ceilings = MsnCeilings {
                    root: ceilings.root,
                    parent: this_msn,
                };
                for (idx, child) in children.iter().enumerate() {
                    let child_bounds = bounds.for_child(&node.pivots, idx, n_children);
                    let outcome = self.verify_node(
                        child.block,
                        Some(height.saturating_sub(1)),
                        child_bounds,
                        Some(child_ceilings),
                    )?;
                    if outcome.is_clean() {
                        continue;
                    }
                    status = outcome;
                    if !self.opts.keep_going || outcome != VerifyStatus::NeedsRepair {
                        break;
                    }
                }
            }
        }

        node.release()?;

        if status.is_clean() {
            if let Some(progress) = self.progress.as_mut() {
                let code = progress(PROGRESS_PLACEHOLDER);
                if code != 0 {
                    debug!(target: "ftree::verify", block = block.0, code, "progress callback requested stop");
                    status = VerifyStatus::Aborted { code };
                }
            }
        }
        Ok(status)
    }
}

/// Checks everything that can be decided from one node: sequence descent,
/// pivots, and every child partition against its narrowed bounds.
fn check_local(
    cmp: &dyn KeyComparator,
    scan: &mut NodeScan<'_>,
    node: &FtNode,
    bounds: KeyBounds<'_>,
    ceilings: MsnCeilings,
) -> ControlFlow<()> {
    let this_msn = node.max_msn_applied;
    if !node.is_leaf() {
        scan.require(ceilings.parent >= this_msn, 0, VerifyCheck::MsnDescent, || {
            format!("parent msn {} below node msn {this_msn}", ceilings.parent)
        })?;
    }

    check_pivots(cmp, scan, &node.pivots, bounds)?;

    let n_children = node.n_children();
    match &node.body {
        NodeBody::Internal { children, .. } => {
            for (idx, child) in children.iter().enumerate() {
                let child_bounds = bounds.for_child(&node.pivots, idx, n_children);
                check_buffer(cmp, scan, idx, &child.buffer, child_bounds, this_msn)?;
            }
        }
        NodeBody::Leaf { basements } => {
            for (idx, basement) in basements.iter().enumerate() {
                let child_bounds = bounds.for_child(&node.pivots, idx, n_children);
                check_basement(
                    cmp,
                    scan,
                    idx,
                    basement,
                    child_bounds,
                    ceilings.root,
                    this_msn,
                )?;
            }
        }
    }
    ControlFlow::Continue(())
}
