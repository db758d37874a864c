//! Shared HTTP client construction for the prober and the downloader.
//!
//! Both components build their own [`reqwest::Client`] once and reuse it, with
//! the same User-Agent, compression and proxy handling. Only the timeouts
//! differ between them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

/// Timeouts applied to every request issued by one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Time allowed to establish the TCP/TLS connection.
    pub connect: Duration,
    /// Total time allowed for one request, body included.
    pub request: Duration,
}

impl HttpTimeouts {
    /// Uses one budget for both connect and the whole request.
    #[must_use]
    pub fn uniform(budget: Duration) -> Self {
        Self {
            connect: budget,
            request: budget,
        }
    }
}

/// Builds an HTTP client with the crate's networking defaults.
///
/// Some sandboxed environments panic while reading system proxy settings.
/// In that case the client is rebuilt with system lookup disabled and the
/// `*_PROXY` environment variables applied by hand.
///
/// # Errors
///
/// Returns the builder error when the client cannot be constructed.
pub(crate) fn build_http_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    match try_build(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildFailure::Build(error)) => Err(error),
        Err(BuildFailure::Panic) => {
            warn!("HTTP client builder panicked on system proxy lookup; using env-proxy fallback");
            match try_build(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildFailure::Build(error)) => Err(error),
                // Last resort: no proxy support at all.
                Err(BuildFailure::Panic) => base_builder(timeouts).no_proxy().build(),
            }
        }
    }
}

enum BuildFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build(timeouts: HttpTimeouts, env_proxy_only: bool) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if env_proxy_only {
            builder = apply_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
