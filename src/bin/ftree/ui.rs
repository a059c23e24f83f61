//! Terminal rendering for `ftree verify` and `ftree inspect`.

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use ftree::admin::{TreeStats, VerifyCheck, VerifyFinding, VerifyReport, VerifyStatus};
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

/// When text output is coloured.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Spinner layout. `{pos}` advances only for nodes that finished clean, since
/// that is when the verifier reports progress.
pub const PROGRESS_TEMPLATE: &str = "{spinner} {msg} ({pos} clean nodes)";

pub struct Ui {
    paint: bool,
    quiet: bool,
}

impl Ui {
    /// `quiet` is set for JSON output: no colour and no spinner.
    pub fn new(color: ColorMode, quiet: bool) -> Self {
        let paint = !quiet
            && match color {
                ColorMode::Always => true,
                ColorMode::Never => false,
                ColorMode::Auto => std::io::stdout().is_terminal(),
            };

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        Self { paint, quiet }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.paint {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn print_report(&self, report: &VerifyReport, run: &VerifyRun) {
        println!(
            "{}",
            self.paint(status_style(report.status), &status_line(report))
        );
        println!("  {}", counts_line(report, run));
        if !report.pins_balanced() {
            let line = format!(
                "pinned nodes changed during the run: {} -> {}",
                report.pinned_before, report.pinned_after
            );
            println!("  {}", self.paint(Color::Red.bold(), &line));
        }
        if report.findings.is_empty() {
            return;
        }

        let tally = area_tally(&report.findings)
            .into_iter()
            .map(|(area, count)| format!("{area} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  by area: {tally}");
        for finding in &report.findings {
            let tag = format!("[{}]", check_area(finding.check));
            println!(
                "  {} {}",
                self.paint(Color::Yellow.bold(), &tag),
                finding_line(finding)
            );
        }
        if report.findings_dropped > 0 {
            println!("  ... {} more not recorded", report.findings_dropped);
        }
    }

    pub fn print_stats(&self, summary: &TreeStats) {
        let title = format!(
            "root {} at height {}, msn {}",
            summary.root, summary.root_height, summary.root_msn
        );
        println!("{}", self.paint(Style::new().bold(), &title));
        let heights = summary
            .nodes_per_height
            .iter()
            .rev()
            .map(|(height, count)| format!("h{height}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("  nodes: {heights}");
        println!(
            "  buffered messages: {}, basements: {}, leaf entries: {}",
            summary.messages, summary.basements, summary.leaf_entries
        );
        println!(
            "  cache: {} hits, {} misses, {} evictions",
            summary.cache.hits, summary.cache.misses, summary.cache.evictions
        );
    }

    /// Starts a spinner on stderr. Hidden when quiet or when stderr is not a terminal.
    pub fn progress(&self, image: &Path) -> VerifyProgress {
        let bar = if self.quiet || !std::io::stderr().is_terminal() {
            None
        } else {
            let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            let bar = ProgressBar::new_spinner();
            bar.set_style(style);
            bar.set_message(format!("verifying {}", image.display()));
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        };
        VerifyProgress {
            bar,
            clean_nodes: 0,
            start: Instant::now(),
        }
    }
}

/// Spinner plus the count of progress callbacks seen.
pub struct VerifyProgress {
    bar: Option<ProgressBar>,
    clean_nodes: u64,
    start: Instant,
}

impl VerifyProgress {
    /// Records one node whose subtree verified clean.
    pub fn node_clean(&mut self) {
        self.clean_nodes += 1;
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(mut self) -> VerifyRun {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        VerifyRun {
            clean_nodes: self.clean_nodes,
            elapsed: self.start.elapsed(),
        }
    }
}

impl Drop for VerifyProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

/// What the spinner observed over one run.
#[derive(Clone, Copy, Debug)]
pub struct VerifyRun {
    pub clean_nodes: u64,
    pub elapsed: Duration,
}

fn status_style(status: VerifyStatus) -> Style {
    match status {
        VerifyStatus::Clean => Color::Green.bold(),
        VerifyStatus::NeedsRepair => Color::Yellow.bold(),
        VerifyStatus::Aborted { .. } => Color::Red.bold(),
    }
}

pub fn status_line(report: &VerifyReport) -> String {
    match report.status {
        VerifyStatus::Clean => "clean: tree is consistent".to_string(),
        VerifyStatus::NeedsRepair => match report.violation_count() {
            1 => "needs repair: 1 violation".to_string(),
            n => format!("needs repair: {n} violations"),
        },
        VerifyStatus::Aborted { code } => {
            format!("aborted: progress callback returned {code}")
        }
    }
}

fn counts_line(report: &VerifyReport, run: &VerifyRun) -> String {
    let counts = &report.counts;
    format!(
        "{} nodes visited ({} clean), {} messages, {} basements, {} entries in {:.2?}",
        counts.nodes_visited,
        run.clean_nodes,
        counts.messages_checked,
        counts.basements_checked,
        counts.leaf_entries_checked,
        run.elapsed
    )
}

/// Part of a node a check looks at.
pub fn check_area(check: VerifyCheck) -> &'static str {
    match check {
        VerifyCheck::MsnDescent | VerifyCheck::LeafMsnCeiling => "msn",
        VerifyCheck::PivotOrder | VerifyCheck::PivotBounds => "pivots",
        VerifyCheck::MessagePlacement
        | VerifyCheck::MessageMsnOrder
        | VerifyCheck::MessageMsnCeiling => "buffer",
        VerifyCheck::LeafBounds | VerifyCheck::LeafOrder => "leaf",
    }
}

pub fn area_tally(findings: &[VerifyFinding]) -> BTreeMap<&'static str, usize> {
    let mut tally = BTreeMap::new();
    for finding in findings {
        *tally.entry(check_area(finding.check)).or_insert(0) += 1;
    }
    tally
}

pub fn finding_line(finding: &VerifyFinding) -> String {
    format!(
        "block {} h{} child {}: {} ({})",
        finding.block,
        finding.height,
        finding.child,
        finding.check.describe(),
        finding.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftree::admin::VerifyCounts;
    use ftree::types::BlockNum;

    fn finding(check: VerifyCheck) -> VerifyFinding {
        VerifyFinding {
            block: BlockNum(4),
            height: 0,
            child: 1,
            check,
            message: "key \"k\"".to_string(),
        }
    }

    fn report(status: VerifyStatus, findings: Vec<VerifyFinding>, dropped: u64) -> VerifyReport {
        VerifyReport {
            status,
            findings,
            findings_dropped: dropped,
            counts: VerifyCounts::default(),
            pinned_before: 0,
            pinned_after: 0,
        }
    }

    #[test]
    fn status_line_counts_dropped_findings() {
        let one = report(
            VerifyStatus::NeedsRepair,
            vec![finding(VerifyCheck::LeafOrder)],
            0,
        );
        assert_eq!(status_line(&one), "needs repair: 1 violation");

        let capped = report(
            VerifyStatus::NeedsRepair,
            vec![finding(VerifyCheck::LeafOrder)],
            4,
        );
        assert_eq!(status_line(&capped), "needs repair: 5 violations");

        let aborted = report(VerifyStatus::Aborted { code: 7 }, Vec::new(), 0);
        assert_eq!(status_line(&aborted), "aborted: progress callback returned 7");
    }

    #[test]
    fn finding_line_names_node_and_rule() {
        let line = finding_line(&finding(VerifyCheck::LeafBounds));
        assert_eq!(
            line,
            "block 4 h0 child 1: leaf entry is outside the inherited bounds (key \"k\")"
        );
    }

    #[test]
    fn findings_are_tallied_by_area() {
        let findings = vec![
            finding(VerifyCheck::MessageMsnOrder),
            finding(VerifyCheck::LeafOrder),
            finding(VerifyCheck::MessagePlacement),
            finding(VerifyCheck::LeafMsnCeiling),
        ];
        let tally: Vec<_> = area_tally(&findings).into_iter().collect();
        assert_eq!(tally, vec![("buffer", 2), ("leaf", 1), ("msn", 1)]);
    }

    #[test]
    fn progress_counts_clean_nodes_without_a_terminal() {
        assert!(PROGRESS_TEMPLATE.contains("clean nodes"));
        assert!(ProgressStyle::with_template(PROGRESS_TEMPLATE).is_ok());

        let ui = Ui::new(ColorMode::Never, true);
        let mut progress = ui.progress(Path::new("tree.json"));
        progress.node_clean();
        progress.node_clean();
        let run = progress.finish();
        assert_eq!(run.clean_nodes, 2);
    }
}
