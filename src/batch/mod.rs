//! Batch runner: normalize, resolve and download a list of domains.
//!
//! Each distinct normalized domain runs in its own Tokio task; a semaphore
//! bounds how many run at once. Within one domain the probe steps stay
//! strictly sequential. A domain that fails never aborts the batch.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use favicon_core::batch::BatchRunner;
//! use favicon_core::download::{DownloadOptions, FaviconDownloader};
//! use favicon_core::probe::HttpProber;
//! use favicon_core::resolver::FaviconResolver;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = FaviconResolver::new(Arc::new(HttpProber::new(Duration::from_secs(5))?));
//! let downloader = FaviconDownloader::new(DownloadOptions::default())?;
//! let runner = BatchRunner::new(
//!     Arc::new(resolver),
//!     Arc::new(downloader),
//!     PathBuf::from("./favicon_ico"),
//!     1,
//! )?;
//! let domains = vec!["*.example.com".to_string()];
//! let summary = runner.run(&domains, &CancellationToken::new()).await?;
//! println!("downloaded {}", summary.totals.downloaded);
//! # Ok(())
//! # }
//! ```

mod filename;
mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::normalize;
use crate::download::FaviconDownloader;
use crate::resolver::{FaviconResolver, ResolveOutcome};

pub use filename::{ICON_EXTENSION, icon_file_name};
pub use report::{BatchStats, BatchSummary, BatchTotals, DomainOutcome, DomainReport};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 64;

/// Default concurrency: one domain at a time.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Error type for batch operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// A domain queued for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedDomain {
    raw: String,
    domain: String,
}

/// Drives resolution and download over a list of domains.
#[derive(Debug)]
pub struct BatchRunner {
    resolver: Arc<FaviconResolver>,
    downloader: Arc<FaviconDownloader>,
    output_dir: PathBuf,
    concurrency: usize,
    semaphore: Arc<Semaphore>,
    progress: Option<mpsc::UnboundedSender<DomainReport>>,
}

impl BatchRunner {
    /// Creates a runner writing into `output_dir` with at most `concurrency`
    /// domains in flight.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] if the value is outside
    /// `MIN_CONCURRENCY..=MAX_CONCURRENCY`.
    #[instrument(level = "debug", skip(resolver, downloader), fields(output_dir = %output_dir.display()))]
    pub fn new(
        resolver: Arc<FaviconResolver>,
        downloader: Arc<FaviconDownloader>,
        output_dir: PathBuf,
        concurrency: usize,
    ) -> Result<Self, BatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(BatchError::InvalidConcurrency { value: concurrency });
        }
        debug!(concurrency, "creating batch runner");

        Ok(Self {
            resolver,
            downloader,
            output_dir,
            concurrency,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            progress: None,
        })
    }

    /// Sends every finished [`DomainReport`] to `sender` as soon as it is
    /// known, in completion order.
    #[must_use]
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<DomainReport>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processes `raw_domains`.
    ///
    /// Domains are normalized first; later entries normalizing to an already
    /// seen domain are dropped so each output file has a single writer. The
    /// output directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::OutputDir`] if the output directory cannot be
    /// created and [`BatchError::SemaphoreClosed`] if the semaphore is closed.
    /// Per-domain failures are reported in the summary, never as errors.
    #[instrument(skip_all, fields(domains = raw_domains.len(), output_dir = %self.output_dir.display()))]
    pub async fn run(
        &self,
        raw_domains: &[String],
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        let planned = plan_domains(raw_domains);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| BatchError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        info!(distinct = planned.len(), "starting batch");

        let stats = Arc::new(BatchStats::new());
        let mut slots: Vec<Slot> = Vec::with_capacity(planned.len());

        for entry in planned {
            if cancel.is_cancelled() {
                slots.push(Slot::Done(self.finish(&stats, entry, DomainOutcome::Cancelled)));
                continue;
            }

            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                permit = self.semaphore.clone().acquire_owned() => {
                    Some(permit.map_err(|_| BatchError::SemaphoreClosed)?)
                }
            };
            let Some(permit) = permit else {
                slots.push(Slot::Done(self.finish(&stats, entry, DomainOutcome::Cancelled)));
                continue;
            };

            let resolver = Arc::clone(&self.resolver);
            let downloader = Arc::clone(&self.downloader);
            let output_dir = self.output_dir.clone();
            let stats = Arc::clone(&stats);
            let progress = self.progress.clone();
            let cancel = cancel.clone();

            slots.push(Slot::Running(tokio::spawn(async move {
                let _permit = permit;
                let outcome =
                    process_domain(&resolver, &downloader, &output_dir, &entry.domain, &cancel)
                        .await;
                report(&stats, progress.as_ref(), entry, outcome)
            })));
        }

        debug!(task_count = slots.len(), "waiting for domains to complete");

        let mut reports = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Done(report) => reports.push(report),
                Slot::Running(handle) => match handle.await {
                    Ok(report) => reports.push(report),
                    Err(e) => warn!(error = %e, "domain task panicked"),
                },
            }
        }

        let totals = stats.totals();
        info!(
            downloaded = totals.downloaded,
            not_found = totals.not_found,
            transfer_failed = totals.transfer_failed,
            rejected = totals.rejected,
            cancelled = totals.cancelled,
            "batch complete"
        );

        Ok(BatchSummary { reports, totals })
    }

    fn finish(&self, stats: &BatchStats, entry: PlannedDomain, outcome: DomainOutcome) -> DomainReport {
        report(stats, self.progress.as_ref(), entry, outcome)
    }
}

enum Slot {
    Done(DomainReport),
    Running(tokio::task::JoinHandle<DomainReport>),
}

/// Normalizes and deduplicates `raw_domains`, keeping first occurrences.
fn plan_domains(raw_domains: &[String]) -> Vec<PlannedDomain> {
    let mut seen = HashSet::new();
    let mut planned = Vec::new();
    for raw in raw_domains {
        let domain = normalize(raw);
        if domain.is_empty() {
            continue;
        }
        if !seen.insert(domain.to_ascii_lowercase()) {
            debug!(raw = %raw, domain = %domain, "duplicate after normalization; skipping");
            continue;
        }
        planned.push(PlannedDomain {
            raw: raw.trim().to_string(),
            domain,
        });
    }
    planned
}

#[instrument(skip(resolver, downloader, output_dir, cancel))]
async fn process_domain(
    resolver: &FaviconResolver,
    downloader: &FaviconDownloader,
    output_dir: &Path,
    domain: &str,
    cancel: &CancellationToken,
) -> DomainOutcome {
    let Some(file_name) = icon_file_name(domain) else {
        warn!("domain cannot name an output file");
        return DomainOutcome::Rejected {
            reason: format!("{domain:?} is not usable as a file name"),
        };
    };

    let found = match resolver.resolve_with_cancel(domain, cancel).await {
        ResolveOutcome::Found(found) => found,
        ResolveOutcome::NotFound => {
            info!("no favicon found");
            return DomainOutcome::NotFound;
        }
        ResolveOutcome::Cancelled => return DomainOutcome::Cancelled,
    };

    let path = output_dir.join(file_name);
    match downloader.download_to_file(&found.url, &path, cancel).await {
        Ok(bytes) => DomainOutcome::Downloaded {
            url: found.url,
            path,
            bytes,
        },
        Err(e) if e.is_cancelled() => DomainOutcome::Cancelled,
        Err(e) => {
            warn!(url = %found.url, error = %e, "favicon transfer failed");
            DomainOutcome::TransferFailed {
                url: found.url,
                error: e.to_string(),
            }
        }
    }
}

fn report(
    stats: &BatchStats,
    progress: Option<&mpsc::UnboundedSender<DomainReport>>,
    entry: PlannedDomain,
    outcome: DomainOutcome,
) -> DomainReport {
    stats.record(&outcome);
    let report = DomainReport {
        raw: entry.raw,
        domain: entry.domain,
        outcome,
    };
    if let Some(sender) = progress {
        // Receiver gone means nobody is watching; the summary still has it.
        let _ = sender.send(report.clone());
    }
    report
}
