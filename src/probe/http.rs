//! HTTP prober: fetches a page and collects its icon candidates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument};
use url::Url;

use super::candidate::{ICO_FORMAT, IconCandidate, sort_largest_first};
use super::extract::extract_icon_links;
use super::{ProbeError, Prober};
use crate::http_client::{HttpTimeouts, build_http_client};

/// Per-request budget used when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Prober backed by a real HTTP client.
///
/// One probe issues a GET for the page (redirects followed) and a HEAD for
/// the conventional `/favicon.ico` of the final page URL. Candidates are
/// returned largest first; the conventional location, having no declared
/// size, sorts after any sized declaration.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Creates a prober whose requests each time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(HttpTimeouts::uniform(timeout))?,
            timeout,
        })
    }

    /// Returns the configured per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks `/favicon.ico` next to the page; a final 200 yields a candidate
    /// tagged `"ico"` at the post-redirect URL.
    async fn conventional_icon(&self, page_url: &Url) -> Option<IconCandidate> {
        let favicon_url = page_url.join("/favicon.ico").ok()?;
        match self.client.head(favicon_url.clone()).send().await {
            Ok(response) if response.status().as_u16() == 200 => {
                Some(IconCandidate::new(response.url().as_str(), ICO_FORMAT))
            }
            Ok(response) => {
                debug!(url = %favicon_url, status = response.status().as_u16(), "no conventional favicon");
                None
            }
            Err(error) => {
                debug!(url = %favicon_url, error = %error, "conventional favicon check failed");
                None
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self), fields(prober = "http"))]
    async fn candidates(&self, page_url: &str) -> Result<Vec<IconCandidate>, ProbeError> {
        let parsed = Url::parse(page_url).map_err(|_| ProbeError::invalid_url(page_url))?;

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, HTML_ACCEPT)
            .send()
            .await
            .map_err(|e| ProbeError::from_request(page_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::http_status(page_url, status.as_u16()));
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::timeout(page_url)
            } else {
                ProbeError::body(page_url, e)
            }
        })?;

        let mut candidates = Vec::new();
        if let Some(conventional) = self.conventional_icon(&final_url).await {
            candidates.push(conventional);
        }
        candidates.extend(extract_icon_links(&final_url, &html));
        sort_largest_first(&mut candidates);

        debug!(
            final_url = %final_url,
            count = candidates.len(),
            "collected icon candidates"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn prober() -> HttpProber {
        HttpProber::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_candidates_include_declared_and_conventional_icons() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head>
                    <link rel="icon" sizes="32x32" href="/assets/icon-32.png">
                    <link rel="shortcut icon" href="/assets/site.ico">
                </head></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let page = format!("{}/", server.uri());
        let candidates = prober().candidates(&page).await.unwrap();
        let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();

        assert_eq!(
            urls,
            vec![
                format!("{}/assets/icon-32.png", server.uri()),
                format!("{}/favicon.ico", server.uri()),
                format!("{}/assets/site.ico", server.uri()),
            ]
        );
        assert_eq!(candidates[1].format, "ico");
    }

    #[tokio::test]
    async fn test_missing_conventional_icon_is_not_a_candidate() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/favicon.ico"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let candidates = prober()
            .candidates(&format!("{}/", server.uri()))
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_probe_failure() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = prober().candidates(&format!("{}/", server.uri())).await;
        assert!(matches!(
            result,
            Err(ProbeError::HttpStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_page_times_out() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_millis(200)).unwrap();
        let result = prober.candidates(&format!("{}/", server.uri())).await;
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_invalid_url_is_probe_failure() {
        let result = prober().candidates("not a url").await;
        assert!(matches!(result, Err(ProbeError::InvalidUrl { .. })));
    }
}
