//! Favicon Core Library
//!
//! This library resolves, for a list of domain names, a canonical `.ico`
//! favicon URL and downloads it, despite sites that declare their icons
//! inconsistently or not at all.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`domain`] - Domain list loading, wildcard normalization, registered domains
//! - [`probe`] - Page probing and icon candidate extraction
//! - [`resolver`] - Ordered HTTPS/HTTP, host/registered-domain fallback
//! - [`download`] - Streaming favicon download
//! - [`batch`] - Bounded-concurrency batch runner tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod domain;
pub mod download;
mod http_client;
pub mod probe;
pub mod resolver;
#[cfg(test)]
mod test_support;
pub(crate) mod user_agent;
mod utils;

// Re-export commonly used types
pub use batch::{
    BatchError, BatchRunner, BatchSummary, BatchTotals, DEFAULT_CONCURRENCY, DomainOutcome,
    DomainReport, MAX_CONCURRENCY,
};
pub use domain::{
    ListLayout, SourceError, load_domain_file, normalize, parse_domain_list, registered_domain,
};
pub use download::{DownloadError, DownloadOptions, FaviconDownloader, PartialFilePolicy};
pub use probe::{DEFAULT_PROBE_TIMEOUT, HttpProber, IconCandidate, ProbeError, Prober};
pub use resolver::{FaviconResolver, ResolveOutcome, ResolvedFavicon, probe_budget_for};
