//! Bypass resources: user-agent rotation, proxy rotation, paywall fallback
//!
//! Everything here exists to raise fetch success rates against anti-bot
//! defenses and paywalls. The [`BypassPool`] bundles the individual pieces
//! behind one shared handle; the fetch client, batch retrieval, and the
//! traversal engine all draw from the same pool.
//!
//! Failure semantics: no operation in this module propagates a network
//! error. Sources that fail are skipped, exhausted mirrors yield `None`,
//! and an empty proxy pool means "connect directly".

mod paywall;
mod proxy;
mod user_agents;

pub use paywall::{ArchiveResolver, PaywallDetector};
pub use proxy::{ProxyPool, DEFAULT_PROXY_SOURCES};
pub use user_agents::UserAgentSet;

use crate::config::BypassConfig;
use crate::DriftnetError;
use std::time::Duration;

/// Shared pool of bypass resources for outbound requests
///
/// Process-wide shared state: wrap in an `Arc` and hand clones to every
/// engine component. Selection reads are lock-free snapshots; only the
/// explicit proxy refresh mutates state, by atomic snapshot swap.
#[derive(Debug)]
pub struct BypassPool {
    user_agents: UserAgentSet,
    proxies: ProxyPool,
    paywall: PaywallDetector,
    archives: ArchiveResolver,
    auto_refresh: bool,
    target_count: usize,
}

impl BypassPool {
    /// Creates a pool from the given bypass configuration
    pub fn new(config: BypassConfig) -> Result<Self, DriftnetError> {
        let user_agents = UserAgentSet::new(config.user_agents.clone());
        let paywall = PaywallDetector::new(config.paywall_indicators.clone());
        let archives = ArchiveResolver::new(
            config.archive_mirrors.clone(),
            Duration::from_secs(config.archive_timeout_secs),
        )?;
        let auto_refresh = config.auto_refresh_proxies;
        let target_count = config.proxy_target_count;
        let proxies = ProxyPool::new(config)?;

        Ok(Self {
            user_agents,
            proxies,
            paywall,
            archives,
            auto_refresh,
            target_count,
        })
    }

    /// Picks a user agent uniformly at random. Never fails.
    pub fn select_user_agent(&self) -> String {
        self.user_agents.select().to_string()
    }

    /// Picks a proxy uniformly at random, or None for a direct connection
    pub fn select_proxy(&self) -> Option<String> {
        self.proxies.select()
    }

    /// Refreshes the proxy pool, keeping up to `target_count` proxies
    ///
    /// No-op while the pool is fresh; safe to call concurrently with
    /// selection and with other refreshes.
    pub async fn refresh_proxy_pool(&self, target_count: usize) {
        self.proxies.refresh(target_count).await;
    }

    /// Refreshes the proxy pool only when auto-refresh is on and the pool
    /// is stale. Called by the engines before fetches and traversals.
    pub async fn refresh_if_stale(&self) {
        if self.auto_refresh && self.proxies.is_stale() {
            self.proxies.refresh(self.target_count).await;
        }
    }

    /// Number of proxies currently pooled
    pub fn proxy_pool_size(&self) -> usize {
        self.proxies.size()
    }

    /// Returns true if the content matches any paywall indicator
    pub fn detect_paywall(&self, content: &str) -> bool {
        self.paywall.detect(content)
    }

    /// Archive-mirror URLs for the original URL, in priority order
    pub fn archive_candidates(&self, url: &str) -> Vec<String> {
        self.archives.candidates(url)
    }

    /// Finds the first archive mirror serving a non-paywalled copy
    pub async fn resolve_archive_url(&self, url: &str) -> Option<String> {
        self.archives.resolve(url, &self.paywall).await
    }

    /// Replaces the proxy pool contents directly (test hook)
    #[cfg(test)]
    pub fn set_proxies(&self, endpoints: Vec<String>) {
        self.proxies.set_endpoints(endpoints);
    }
}
