//! Per-domain outcomes and batch totals.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// What happened to one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DomainOutcome {
    /// A favicon was resolved and saved.
    Downloaded {
        /// Resolved favicon URL.
        url: String,
        /// File the favicon was written to.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// No probe produced an `.ico` candidate.
    NotFound,
    /// A favicon was resolved but the transfer failed.
    TransferFailed {
        /// Resolved favicon URL.
        url: String,
        /// Rendered transfer error.
        error: String,
    },
    /// The domain cannot name an output file.
    Rejected {
        /// Why the domain was rejected.
        reason: String,
    },
    /// The batch was cancelled before this domain finished.
    Cancelled,
}

impl DomainOutcome {
    /// Returns the resolved favicon URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Downloaded { url, .. } | Self::TransferFailed { url, .. } => Some(url),
            Self::NotFound | Self::Rejected { .. } | Self::Cancelled => None,
        }
    }
}

/// Outcome for one input domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    /// Domain as it appeared in the input.
    pub raw: String,
    /// Domain after wildcard normalization.
    pub domain: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: DomainOutcome,
}

/// Running counters updated from concurrent domain tasks.
#[derive(Debug, Default)]
pub struct BatchStats {
    downloaded: AtomicUsize,
    not_found: AtomicUsize,
    transfer_failed: AtomicUsize,
    rejected: AtomicUsize,
    cancelled: AtomicUsize,
}

impl BatchStats {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `outcome` against its category.
    pub fn record(&self, outcome: &DomainOutcome) {
        let counter = match outcome {
            DomainOutcome::Downloaded { .. } => &self.downloaded,
            DomainOutcome::NotFound => &self.not_found,
            DomainOutcome::TransferFailed { .. } => &self.transfer_failed,
            DomainOutcome::Rejected { .. } => &self.rejected,
            DomainOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns a point-in-time copy of the counters.
    #[must_use]
    pub fn totals(&self) -> BatchTotals {
        BatchTotals {
            downloaded: self.downloaded.load(Ordering::SeqCst),
            not_found: self.not_found.load(Ordering::SeqCst),
            transfer_failed: self.transfer_failed.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
        }
    }
}

/// Snapshot of [`BatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    /// Favicons saved.
    pub downloaded: usize,
    /// Domains without an `.ico` favicon.
    pub not_found: usize,
    /// Resolved favicons whose transfer failed.
    pub transfer_failed: usize,
    /// Domains that could not name an output file.
    pub rejected: usize,
    /// Domains abandoned by cancellation.
    pub cancelled: usize,
}

impl BatchTotals {
    /// Number of domains accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.not_found + self.transfer_failed + self.rejected + self.cancelled
    }
}

/// Result of a batch run, reports in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// One report per distinct normalized domain.
    pub reports: Vec<DomainReport>,
    /// Totals across `reports`.
    pub totals: BatchTotals,
}
