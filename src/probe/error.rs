//! Error types for page probes.
//!
//! Probe errors never leave the resolver: every variant collapses to
//! "no candidate" for the probe that raised it. They exist so the failure
//! reason can be logged.

use thiserror::Error;

/// Errors that can occur while probing one page for icon declarations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The page URL could not be parsed.
    #[error("invalid probe URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// Network-level failure (DNS, refused connection, TLS, ...).
    #[error("network error probing {url}: {source}")]
    Network {
        /// The page URL being probed.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The probe exceeded its time budget.
    #[error("timeout probing {url}")]
    Timeout {
        /// The page URL being probed.
        url: String,
    },

    /// The page answered with a non-success status.
    #[error("HTTP {status} probing {url}")]
    HttpStatus {
        /// The page URL being probed.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// The page body could not be read or decoded.
    #[error("unreadable page body at {url}: {source}")]
    Body {
        /// The page URL being probed.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Classifies a client error as timeout or network failure.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }
}
