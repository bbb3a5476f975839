use crate::config::BypassConfig;
use crate::DriftnetError;
use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::Client;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Public proxy-list pages scraped for `ip:port` candidates
pub const DEFAULT_PROXY_SOURCES: &[&str] = &[
    "https://free-proxy-list.net/",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
    "https://raw.githubusercontent.com/sunny9577/proxy-scraper/master/proxies.txt",
];

/// Matches `ip:port` candidates in arbitrary proxy-list markup
const CANDIDATE_PATTERN: &str = r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d+)";

/// Timeout for fetching a proxy-list source page
const SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable view of the pool at one point in time
///
/// Selection clones the inner `Arc`, so a concurrent refresh swapping in a
/// new snapshot never invalidates an in-progress selection.
#[derive(Debug, Clone)]
struct ProxySnapshot {
    endpoints: Arc<Vec<String>>,
    refreshed_at: Option<Instant>,
}

/// Rotating pool of `host:port` proxy endpoints
///
/// The pool is scraped from public proxy-list sources, each candidate
/// validated by a short liveness probe before admission. An empty pool
/// means "connect directly"; it is never an error.
#[derive(Debug)]
pub struct ProxyPool {
    config: BypassConfig,
    snapshot: RwLock<ProxySnapshot>,
    candidate_re: Regex,
    client: Client,
}

impl ProxyPool {
    /// Creates an empty pool with the given configuration
    pub fn new(config: BypassConfig) -> Result<Self, DriftnetError> {
        let candidate_re = Regex::new(CANDIDATE_PATTERN)
            .map_err(|e| crate::ConfigError::Validation(format!("proxy pattern: {}", e)))?;

        let client = Client::builder().timeout(SOURCE_TIMEOUT).build()?;

        Ok(Self {
            config,
            snapshot: RwLock::new(ProxySnapshot {
                endpoints: Arc::new(Vec::new()),
                refreshed_at: None,
            }),
            candidate_re,
            client,
        })
    }

    /// Picks a proxy uniformly at random, or None if the pool is empty
    pub fn select(&self) -> Option<String> {
        let endpoints = {
            let guard = self.snapshot.read().ok()?;
            guard.endpoints.clone()
        };
        endpoints.choose(&mut rand::thread_rng()).cloned()
    }

    /// Current number of pooled endpoints
    pub fn size(&self) -> usize {
        self.snapshot
            .read()
            .map(|guard| guard.endpoints.len())
            .unwrap_or(0)
    }

    /// Whether the pool is due for a refresh
    ///
    /// True when the pool has never been refreshed, its age exceeds the
    /// refresh interval, or it has shrunk below the viable floor.
    pub fn is_stale(&self) -> bool {
        let guard = match self.snapshot.read() {
            Ok(g) => g,
            Err(_) => return true,
        };

        let interval = Duration::from_secs(self.config.proxy_refresh_interval_secs);
        match guard.refreshed_at {
            None => true,
            Some(at) => at.elapsed() >= interval || guard.endpoints.len() < self.config.proxy_pool_floor,
        }
    }

    /// Rebuilds the pool from the configured sources
    ///
    /// No-op while the pool is fresh. Every source failure degrades to
    /// "skip this source"; this method never returns an error. When no
    /// source yields a validated proxy, the configured fallback list is
    /// admitted unprobed (it may itself be dead; fetches through it can
    /// still fail and callers fall back to direct connection on the next
    /// selection round).
    pub async fn refresh(&self, target_count: usize) {
        if !self.is_stale() {
            return;
        }

        let started = Instant::now();
        let mut validated: Vec<String> = Vec::new();

        for source in &self.config.proxy_sources {
            let body = match self.client.get(source).send().await {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Failed to read proxy source {}: {}", source, e);
                        continue;
                    }
                },
                Ok(resp) => {
                    tracing::warn!("Proxy source {} returned HTTP {}", source, resp.status());
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch proxy source {}: {}", source, e);
                    continue;
                }
            };

            let candidates: Vec<String> = self
                .candidate_re
                .find_iter(&body)
                .map(|m| m.as_str().to_string())
                .take(self.config.candidates_per_source)
                .collect();

            let mut from_source = 0;
            for candidate in candidates {
                if self.probe(&candidate).await {
                    validated.push(candidate);
                    from_source += 1;
                }
            }

            tracing::info!("Found {} valid proxies from {}", from_source, source);
        }

        if validated.is_empty() {
            tracing::warn!(
                "No proxies validated from any source, using {} fallback entries",
                self.config.fallback_proxies.len()
            );
            validated = self.config.fallback_proxies.clone();
        }

        validated.truncate(target_count);

        if let Ok(mut guard) = self.snapshot.write() {
            // Another caller may have committed while we were scraping;
            // the newer snapshot wins.
            if let Some(at) = guard.refreshed_at {
                if at > started {
                    return;
                }
            }
            tracing::info!("Proxy pool refreshed: {} entries", validated.len());
            *guard = ProxySnapshot {
                endpoints: Arc::new(validated),
                refreshed_at: Some(Instant::now()),
            };
        }
    }

    /// Probes a candidate by fetching the probe URL through it
    async fn probe(&self, endpoint: &str) -> bool {
        let proxy = match reqwest::Proxy::all(format!("http://{}", endpoint)) {
            Ok(p) => p,
            Err(_) => return false,
        };

        let client = match Client::builder()
            .proxy(proxy)
            .timeout(Duration::from_secs(self.config.proxy_probe_timeout_secs))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };

        match client.get(&self.config.proxy_probe_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Extracts `ip:port` candidates from a proxy-list page body
    #[cfg(test)]
    fn extract_candidates(&self, body: &str) -> Vec<String> {
        self.candidate_re
            .find_iter(body)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Replaces the pool contents directly, bypassing source scraping
    #[cfg(test)]
    pub fn set_endpoints(&self, endpoints: Vec<String>) {
        if let Ok(mut guard) = self.snapshot.write() {
            *guard = ProxySnapshot {
                endpoints: Arc::new(endpoints),
                refreshed_at: Some(Instant::now()),
            };
        }
    }
}
