//! Favicon resolution: the ordered HTTPS/HTTP, host/registered-domain fallback.
//!
//! For a normalized domain the resolver probes, stopping at the first hit:
//!
//! 1. `https://{domain}/`
//! 2. `http://{domain}/`
//! 3. compute the registered domain; stop if it equals `domain` (or there is none)
//! 4. `https://{registered}/`
//! 5. `http://{registered}/`
//!
//! Probe failures of any kind count as "no candidate". Resolution itself never
//! fails: the outcome is found, not found, or cancelled.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use favicon_core::probe::HttpProber;
//! use favicon_core::resolver::FaviconResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let prober = Arc::new(HttpProber::new(Duration::from_secs(5))?);
//! let resolver = FaviconResolver::new(prober);
//! match resolver.resolve("www.example.com").await.url() {
//!     Some(url) => println!("{url}"),
//!     None => println!("!! Not found"),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::domain::{is_registered_domain, registered_domain};
use crate::probe::{DEFAULT_PROBE_TIMEOUT, Prober, probe_url};

/// Slack added on top of the two per-request timeouts of one probe.
const PROBE_BUDGET_SLACK: Duration = Duration::from_secs(2);

/// Budget for a whole probe (page GET plus favicon HEAD) given the
/// per-request timeout.
#[must_use]
pub fn probe_budget_for(request_timeout: Duration) -> Duration {
    request_timeout
        .saturating_mul(2)
        .saturating_add(PROBE_BUDGET_SLACK)
}

/// Transport scheme tried by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Tried first.
    Https,
    /// Fallback when HTTPS yields nothing.
    Http,
}

impl Scheme {
    /// Scheme order within one host.
    pub const ORDER: [Self; 2] = [Self::Https, Self::Http];

    /// URL scheme label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }

    /// Root page URL for `host` under this scheme.
    #[must_use]
    pub fn page_url(self, host: &str) -> String {
        format!("{}://{host}/", self.as_str())
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A favicon URL found by the resolver, with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFavicon {
    /// The selected `.ico` URL.
    pub url: String,
    /// The page whose probe produced it.
    pub page_url: String,
    /// 1-based position of the successful probe (1..=4).
    pub attempt: usize,
}

/// Result of resolving one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// A favicon URL was found.
    Found(ResolvedFavicon),
    /// Every applicable probe came back empty.
    NotFound,
    /// Resolution stopped because the cancellation token fired.
    Cancelled,
}

impl ResolveOutcome {
    /// Returns the favicon URL when found.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Found(found) => Some(&found.url),
            Self::NotFound | Self::Cancelled => None,
        }
    }

    /// Returns true when a favicon was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Result of one probe step.
enum Step {
    Found(String),
    Empty,
    Cancelled,
}

/// Resolves domains to favicon URLs through the fallback sequence.
pub struct FaviconResolver {
    prober: Arc<dyn Prober>,
    probe_budget: Duration,
}

impl FaviconResolver {
    /// Creates a resolver over `prober` with a probe budget derived from the
    /// default request timeout.
    #[must_use]
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            probe_budget: probe_budget_for(DEFAULT_PROBE_TIMEOUT),
        }
    }

    /// Overrides the time budget of a single probe.
    #[must_use]
    pub fn with_probe_budget(mut self, probe_budget: Duration) -> Self {
        self.probe_budget = probe_budget;
        self
    }

    /// Returns the time budget of a single probe.
    #[must_use]
    pub fn probe_budget(&self) -> Duration {
        self.probe_budget
    }

    /// Resolves `domain` without external cancellation.
    pub async fn resolve(&self, domain: &str) -> ResolveOutcome {
        self.resolve_with_cancel(domain, &CancellationToken::new())
            .await
    }

    /// Resolves `domain`, abandoning in-flight and remaining probes as soon
    /// as `cancel` fires.
    #[instrument(skip(self, cancel), fields(prober = self.prober.name()))]
    pub async fn resolve_with_cancel(
        &self,
        domain: &str,
        cancel: &CancellationToken,
    ) -> ResolveOutcome {
        let domain = domain.trim();

        if let Some(outcome) = self.probe_host(domain, 1, cancel).await {
            return outcome;
        }

        let registered = match registered_domain(domain) {
            None => {
                debug!(domain, "no registered domain; stopping");
                return ResolveOutcome::NotFound;
            }
            Some(_) if is_registered_domain(domain) => {
                debug!(domain, "already a registered domain; stopping");
                return ResolveOutcome::NotFound;
            }
            Some(registered) => registered,
        };

        debug!(domain, registered = %registered, "falling back to registered domain");
        if let Some(outcome) = self
            .probe_host(&registered, Scheme::ORDER.len() + 1, cancel)
            .await
        {
            return outcome;
        }

        ResolveOutcome::NotFound
    }

    /// Probes `host` over HTTPS then HTTP. Returns `None` when both come back
    /// empty, otherwise the final outcome.
    async fn probe_host(
        &self,
        host: &str,
        first_attempt: usize,
        cancel: &CancellationToken,
    ) -> Option<ResolveOutcome> {
        for (offset, scheme) in Scheme::ORDER.into_iter().enumerate() {
            let page_url = scheme.page_url(host);
            match self.probe_step(&page_url, cancel).await {
                Step::Found(url) => {
                    let attempt = first_attempt + offset;
                    info!(page_url = %page_url, url = %url, attempt, "favicon found");
                    return Some(ResolveOutcome::Found(ResolvedFavicon {
                        url,
                        page_url,
                        attempt,
                    }));
                }
                Step::Cancelled => {
                    debug!(page_url = %page_url, "resolution cancelled");
                    return Some(ResolveOutcome::Cancelled);
                }
                Step::Empty => {}
            }
        }
        None
    }

    async fn probe_step(&self, page_url: &str, cancel: &CancellationToken) -> Step {
        if cancel.is_cancelled() {
            return Step::Cancelled;
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => Step::Cancelled,
            found = probe_url(self.prober.as_ref(), page_url, self.probe_budget) => {
                found.map_or(Step::Empty, Step::Found)
            }
        }
    }
}

impl fmt::Debug for FaviconResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaviconResolver")
            .field("prober", &self.prober.name())
            .field("probe_budget", &self.probe_budget)
            .finish()
    }
}
