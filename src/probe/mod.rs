//! Page probing: discover a page's declared icons and pick the `.ico` one.
//!
//! # Architecture
//!
//! - [`Prober`] - async trait that fetches a page and lists its [`IconCandidate`]s
//! - [`HttpProber`] - the real implementation over HTTP
//! - [`select_favicon`] - the selection rule (format `"ico"` and `.ico` suffix)
//! - [`probe_url`] - one total, non-failing probe: candidates, then selection
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use favicon_core::probe::{HttpProber, probe_url};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let prober = HttpProber::new(Duration::from_secs(5))?;
//! if let Some(url) = probe_url(&prober, "https://example.com/", Duration::from_secs(12)).await {
//!     println!("favicon: {url}");
//! }
//! # Ok(())
//! # }
//! ```

mod candidate;
mod error;
mod extract;
mod http;

pub use candidate::{
    ICO_FORMAT, ICO_SUFFIX, IconCandidate, select_favicon, sort_largest_first,
};
pub use error::ProbeError;
pub use extract::{extract_icon_links, format_from_url};
pub use http::{DEFAULT_PROBE_TIMEOUT, HttpProber};

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Trait implemented by page probers.
///
/// # Object Safety
///
/// Uses `async_trait` so the resolver can hold an `Arc<dyn Prober>`; tests
/// substitute recording fakes through the same seam.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns the prober's name for logging.
    fn name(&self) -> &str;

    /// Fetches `page_url` and returns every icon candidate it declares, in
    /// the order the selection rule should scan them.
    async fn candidates(&self, page_url: &str) -> Result<Vec<IconCandidate>, ProbeError>;
}

/// Probes one page and returns the selected `.ico` URL, if any.
///
/// Total: network errors, timeouts (the whole probe is bounded by `budget`),
/// bad statuses and pages without a matching candidate all return `None`.
pub async fn probe_url(prober: &dyn Prober, page_url: &str, budget: Duration) -> Option<String> {
    let result = match tokio::time::timeout(budget, prober.candidates(page_url)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::timeout(page_url)),
    };

    match result {
        Ok(candidates) => {
            let selected = select_favicon(&candidates).map(|c| c.url.clone());
            debug!(
                prober = prober.name(),
                page_url,
                candidates = candidates.len(),
                selected = selected.as_deref().unwrap_or("-"),
                "probe finished"
            );
            selected
        }
        Err(error) => {
            debug!(prober = prober.name(), page_url, error = %error, "probe failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct StaticProber(Vec<IconCandidate>);

    #[async_trait]
    impl Prober for StaticProber {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn candidates(&self, _page_url: &str) -> Result<Vec<IconCandidate>, ProbeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProber;

    #[async_trait]
    impl Prober for FailingProber {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn candidates(&self, page_url: &str) -> Result<Vec<IconCandidate>, ProbeError> {
            Err(ProbeError::http_status(page_url, 500))
        }
    }

    struct StalledProber;

    #[async_trait]
    impl Prober for StalledProber {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn candidates(&self, _page_url: &str) -> Result<Vec<IconCandidate>, ProbeError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![IconCandidate::new("http://x/late.ico", "ico")])
        }
    }

    const BUDGET: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_probe_url_selects_matching_candidate() {
        let prober = StaticProber(vec![
            IconCandidate::new("http://x/icon.png", "ico"),
            IconCandidate::new("http://x/icon.ico", "png"),
            IconCandidate::new("http://x/favicon.ico", "ico"),
        ]);
        let url = probe_url(&prober, "http://x/", BUDGET).await;
        assert_eq!(url.as_deref(), Some("http://x/favicon.ico"));
    }

    #[tokio::test]
    async fn test_probe_url_without_match_is_none() {
        let prober = StaticProber(vec![IconCandidate::new("http://x/icon.png", "png")]);
        assert!(probe_url(&prober, "http://x/", BUDGET).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_url_swallows_errors() {
        assert!(probe_url(&FailingProber, "http://x/", BUDGET).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_url_enforces_budget() {
        let started = std::time::Instant::now();
        let url = probe_url(&StalledProber, "http://x/", Duration::from_millis(50)).await;
        assert!(url.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
