//! Single-URL fetch client
//!
//! Combines UA/proxy selection, a randomized pre-dispatch delay, two
//! transport strategies mixed probabilistically, retry with backoff, and
//! paywall-triggered archive fallback. Failures are signaled through the
//! returned [`FetchResult`], never raised, so batch and traversal callers
//! can keep processing other URLs.

use crate::bypass::BypassPool;
use crate::config::{Config, FetchConfig};
use crate::retry::{with_retry, RetryPolicy};
use crate::{DriftnetError, FetchError};
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Parameters for a single fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The URL to fetch; must have an http or https scheme
    pub url: String,

    /// Overall timeout for each dispatch attempt
    pub timeout: Duration,

    /// Try archive mirrors when the body looks paywalled
    pub prefer_archive_on_paywall: bool,
}

impl FetchRequest {
    /// Creates a request with the default timeout and archive fallback on
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            prefer_archive_on_paywall: true,
        }
    }

    /// Sets the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the paywall archive fallback
    pub fn with_archive_fallback(mut self, enabled: bool) -> Self {
        self.prefer_archive_on_paywall = enabled;
        self
    }
}

/// Outcome of a fetch: content on success, a cause string on failure
///
/// `success == true` implies `content` is present, with archive fallback
/// already applied when it was requested and a mirror delivered.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,

    /// The fetched body, absent on failure
    pub content: Option<String>,

    /// Whether the fetch delivered content
    pub success: bool,

    /// Human-readable cause when the fetch failed
    pub error: Option<String>,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// A successful result carrying content
    pub fn ok(url: impl Into<String>, content: String) -> Self {
        Self {
            url: url.into(),
            content: Some(content),
            success: true,
            error: None,
            fetched_at: Utc::now(),
        }
    }

    /// A failed result carrying the causing error
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: None,
            success: false,
            error: Some(error.into()),
            fetched_at: Utc::now(),
        }
    }
}

/// The two dispatch strategies
///
/// Stealth carries a browser-like header set that passes simple anti-bot
/// checks; plain is a bare client. The probabilistic mix between them is an
/// evasion heuristic with a tunable ratio, not a correctness requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Plain,
    Stealth,
}

/// Client for retrieving the textual content of single URLs
#[derive(Debug)]
pub struct FetchClient {
    fetch_config: FetchConfig,
    retry_policy: RetryPolicy,
    bypass: Arc<BypassPool>,
    plain: Client,
    stealth: Client,
}

impl FetchClient {
    /// Creates a fetch client sharing the given bypass pool
    pub fn new(config: &Config, bypass: Arc<BypassPool>) -> Result<Self, DriftnetError> {
        let plain = build_plain_client(&config.fetch)?;
        let stealth = build_stealth_client(&config.fetch)?;

        Ok(Self {
            fetch_config: config.fetch.clone(),
            retry_policy: config.retry.clone(),
            bypass,
            plain,
            stealth,
        })
    }

    /// The bypass pool this client draws from
    pub fn bypass(&self) -> &Arc<BypassPool> {
        &self.bypass
    }

    /// Fetches a URL with the configured default timeout
    pub async fn fetch_url(&self, url: &str) -> FetchResult {
        let request = FetchRequest::new(url)
            .with_timeout(Duration::from_secs(self.fetch_config.timeout_secs));
        self.fetch(request).await
    }

    /// Retrieves the content of one URL
    ///
    /// 1. Validate the URL (malformed or non-HTTP URLs fail immediately)
    /// 2. Select a user agent and proxy from the bypass pool
    /// 3. Sleep a randomized delay to blunt request-rate fingerprinting
    /// 4. Dispatch through a probabilistically chosen transport, retried
    ///    with backoff on transient failures
    /// 5. On a paywalled body, walk the archive mirrors for a clean copy
    ///
    /// Never raises for network or content failures; the result carries
    /// the outcome either way.
    pub async fn fetch(&self, request: FetchRequest) -> FetchResult {
        let url = match Url::parse(&request.url) {
            Ok(u) => u,
            Err(e) => {
                return FetchResult::failed(
                    request.url.clone(),
                    FetchError::InvalidUrl {
                        url: request.url.clone(),
                        message: e.to_string(),
                    }
                    .to_string(),
                );
            }
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            return FetchResult::failed(
                request.url.clone(),
                FetchError::UnsupportedScheme {
                    url: request.url.clone(),
                    scheme: url.scheme().to_string(),
                }
                .to_string(),
            );
        }

        self.bypass.refresh_if_stale().await;

        let ua = self.bypass.select_user_agent();
        let proxy = self.bypass.select_proxy();
        let transport = self.choose_transport();

        self.predispatch_delay().await;

        tracing::debug!(
            "Dispatching {} via {:?} (proxy: {})",
            request.url,
            transport,
            proxy.as_deref().unwrap_or("direct")
        );

        let dispatched = with_retry(&self.retry_policy, "fetch", || {
            self.dispatch(
                url.as_str(),
                transport,
                &ua,
                proxy.as_deref(),
                request.timeout,
            )
        })
        .await;

        match dispatched {
            Ok(content) => {
                let content = if request.prefer_archive_on_paywall
                    && self.bypass.detect_paywall(&content)
                {
                    tracing::info!("Paywall detected at {}, trying archive mirrors", request.url);
                    self.archive_fallback(url.as_str(), &ua, request.timeout, content)
                        .await
                } else {
                    content
                };

                FetchResult::ok(request.url, content)
            }
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", request.url, e);
                FetchResult::failed(request.url, e.to_string())
            }
        }
    }

    /// One dispatch attempt: send, classify the status, read the body
    async fn dispatch(
        &self,
        url: &str,
        transport: Transport,
        user_agent: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let client = match proxy {
            Some(endpoint) => self.proxied_client(transport, endpoint, url)?,
            None => match transport {
                Transport::Plain => self.plain.clone(),
                Transport::Stealth => self.stealth.clone(),
            },
        };

        let response = client
            .get(url)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Walks the archive mirrors for a non-paywalled copy
    ///
    /// Keeps the last body fetched when no mirror delivers clean content,
    /// so the caller still gets the best available (possibly paywalled)
    /// text rather than nothing.
    async fn archive_fallback(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
        original: String,
    ) -> String {
        let mut last = original;

        for candidate in self.bypass.archive_candidates(url) {
            match self
                .dispatch(&candidate, Transport::Plain, user_agent, None, timeout)
                .await
            {
                Ok(body) => {
                    let clean = !self.bypass.detect_paywall(&body);
                    last = body;
                    if clean {
                        tracing::info!("Bypassed paywall for {} via {}", url, candidate);
                        break;
                    }
                    tracing::debug!("Archive mirror {} still paywalled", candidate);
                }
                Err(e) => {
                    tracing::debug!("Archive mirror {} failed: {}", candidate, e);
                }
            }
        }

        last
    }

    /// Builds an ephemeral client routed through the given proxy
    ///
    /// reqwest binds proxies to clients rather than requests, so a proxied
    /// dispatch gets its own short-lived client mirroring the transport's
    /// configuration.
    fn proxied_client(
        &self,
        transport: Transport,
        endpoint: &str,
        url: &str,
    ) -> Result<Client, FetchError> {
        let proxy = reqwest::Proxy::all(format!("http://{}", endpoint)).map_err(|e| {
            FetchError::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.fetch_config.timeout_secs))
            .connect_timeout(Duration::from_secs(self.fetch_config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .proxy(proxy);

        if transport == Transport::Stealth {
            builder = builder.default_headers(stealth_headers());
        }

        builder.build().map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })
    }

    /// Picks the transport for this dispatch
    fn choose_transport(&self) -> Transport {
        if rand::thread_rng().gen::<f64>() < self.fetch_config.stealth_probability {
            Transport::Stealth
        } else {
            Transport::Plain
        }
    }

    /// Sleeps a uniform-random delay before dispatch
    async fn predispatch_delay(&self) {
        let min = self.fetch_config.min_predispatch_delay_ms;
        let max = self.fetch_config.max_predispatch_delay_ms;

        if max == 0 {
            return;
        }

        let ms = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// Builds the plain transport client
fn build_plain_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the stealth transport client with browser-like headers
fn build_stealth_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .default_headers(stealth_headers())
        .build()
}

/// The header set a real browser sends on navigation
fn stealth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        "upgrade-insecure-requests",
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers
}

/// Classifies a reqwest send error into the fetch error taxonomy
fn classify_send_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BypassConfig;

    fn offline_client(stealth_probability: f64) -> FetchClient {
        let mut config = Config::default();
        config.fetch.stealth_probability = stealth_probability;
        config.fetch.min_predispatch_delay_ms = 0;
        config.fetch.max_predispatch_delay_ms = 0;
        config.bypass = BypassConfig {
            proxy_sources: vec![],
            fallback_proxies: vec![],
            auto_refresh_proxies: false,
            ..BypassConfig::default()
        };

        let bypass = Arc::new(BypassPool::new(config.bypass.clone()).unwrap());
        FetchClient::new(&config, bypass).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let request = FetchRequest::new("https://example.com/");
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert!(request.prefer_archive_on_paywall);
    }

    #[test]
    fn test_request_builder() {
        let request = FetchRequest::new("https://example.com/")
            .with_timeout(Duration::from_secs(5))
            .with_archive_fallback(false);
        assert_eq!(request.timeout, Duration::from_secs(5));
        assert!(!request.prefer_archive_on_paywall);
    }

    #[test]
    fn test_result_ok_invariant() {
        let result = FetchResult::ok("https://example.com/", "<html></html>".to_string());
        assert!(result.success);
        assert!(result.content.is_some());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_result_failed_invariant() {
        let result = FetchResult::failed("https://example.com/", "connection refused");
        assert!(!result.success);
        assert!(result.content.is_none());
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_transport_choice_extremes() {
        let always_plain = offline_client(0.0);
        for _ in 0..50 {
            assert_eq!(always_plain.choose_transport(), Transport::Plain);
        }

        let always_stealth = offline_client(1.0);
        for _ in 0..50 {
            assert_eq!(always_stealth.choose_transport(), Transport::Stealth);
        }
    }

    #[tokio::test]
    async fn test_malformed_url_fails_without_network() {
        let client = offline_client(0.0);
        let result = client.fetch(FetchRequest::new("not a url")).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid URL"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_fails_without_network() {
        let client = offline_client(0.0);
        let result = client.fetch(FetchRequest::new("ftp://example.com/file")).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unsupported scheme"));
    }
}
