//! Per-domain console output and the progress bar.

use std::time::Duration;

use favicon_core::{DomainOutcome, DomainReport};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

/// Marker printed for domains without a favicon.
pub const NOT_FOUND_MARKER: &str = "!! Not found";

/// How reports are surfaced while the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMode {
    /// Print one stdout line per domain.
    pub lines: bool,
    /// Show a progress bar on stderr.
    pub bar: bool,
    /// Prefix each line with its domain; set when lines can arrive out of
    /// input order.
    pub tag_domain: bool,
}

/// Returns true when `TERM=dumb`.
pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

/// Decides whether to draw the progress bar.
pub(crate) fn should_use_progress_bar(
    stderr_is_terminal: bool,
    quiet: bool,
    json: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !json && !dumb_terminal
}

/// Returns the stdout line for `report`, if it gets one.
///
/// Resolved domains print their favicon URL, even when the transfer then
/// failed. Cancelled domains print nothing.
#[must_use]
pub fn console_line(report: &DomainReport) -> Option<String> {
    match &report.outcome {
        DomainOutcome::Downloaded { url, .. } | DomainOutcome::TransferFailed { url, .. } => {
            Some(url.clone())
        }
        DomainOutcome::NotFound | DomainOutcome::Rejected { .. } => {
            Some(NOT_FOUND_MARKER.to_string())
        }
        DomainOutcome::Cancelled => None,
    }
}

/// Formats the stdout line for `report`, prefixed with `{domain}\t` when
/// `tag_domain` is set.
#[must_use]
pub fn report_line(report: &DomainReport, tag_domain: bool) -> Option<String> {
    let line = console_line(report)?;
    if tag_domain {
        Some(format!("{}\t{line}", report.domain))
    } else {
        Some(line)
    }
}

/// Consumes reports until every sender is dropped.
pub(crate) fn spawn_report_printer(
    mut reports: mpsc::UnboundedReceiver<DomainReport>,
    mode: ReportMode,
    total: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = mode.bar.then(|| progress_bar(total));

        while let Some(report) = reports.recv().await {
            if let Some(bar) = &bar {
                bar.set_message(report.domain.clone());
                bar.inc(1);
            }
            if !mode.lines {
                continue;
            }
            if let Some(line) = report_line(&report, mode.tag_domain) {
                match &bar {
                    Some(bar) => bar.suspend(|| println!("{line}")),
                    None => println!("{line}"),
                }
            }
        }

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
