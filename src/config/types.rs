use crate::retry::RetryPolicy;
use crate::traverse::TraversalConfig;
use serde::Deserialize;

/// Realistic browser user agents rotated across requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
];

/// Body fragments that mark a page as paywalled
///
/// Case-insensitive substring matches. False positives only cost an extra
/// archive-mirror attempt.
pub const DEFAULT_PAYWALL_INDICATORS: &[&str] = &[
    "subscribe",
    "paywall",
    "sign in to read",
    "become a member",
    "login to continue",
    "subscribe to continue",
    "premium content",
    "exclusive access",
    "member only",
    "login required",
    "registration required",
    "limited access",
    "premium article",
    "subscriber only",
    "pay to read",
    "purchase article",
    "upgrade to read",
    "premium subscription",
    "digital subscription",
    "unlock article",
    "member exclusive",
];

/// Archive/mirror service prefixes, tried in order against paywalled pages
pub const DEFAULT_ARCHIVE_MIRRORS: &[&str] = &[
    "https://archive.is/?url=",
    "https://12ft.io/proxy?q=",
    "https://webcache.googleusercontent.com/search?q=cache:",
];

/// Local proxies used when no public source yields a working proxy
pub const DEFAULT_FALLBACK_PROXIES: &[&str] = &["127.0.0.1:8080", "127.0.0.1:1080"];

/// Main configuration structure for driftnet
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub retry: RetryPolicy,
    pub bypass: BypassConfig,
    pub traversal: TraversalConfig,
}

/// Fetch client behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Overall request timeout in seconds
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Probability of dispatching through the stealth transport.
    /// A tunable evasion constant, not a correctness guarantee.
    pub stealth_probability: f64,

    /// Lower bound of the randomized pre-dispatch delay (milliseconds)
    pub min_predispatch_delay_ms: u64,

    /// Upper bound of the randomized pre-dispatch delay (milliseconds)
    pub max_predispatch_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            stealth_probability: 0.3,
            min_predispatch_delay_ms: 500,
            max_predispatch_delay_ms: 2000,
        }
    }
}

/// Bypass resource configuration: user agents, proxies, paywall handling
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BypassConfig {
    /// User agents to rotate; must not be empty
    pub user_agents: Vec<String>,

    /// Public proxy-list pages scraped for `ip:port` candidates
    pub proxy_sources: Vec<String>,

    /// Proxies admitted unprobed when every source comes up empty
    pub fallback_proxies: Vec<String>,

    /// Minimum age before the proxy pool is scraped again (seconds)
    pub proxy_refresh_interval_secs: u64,

    /// Pool sizes below this force a refresh regardless of age
    pub proxy_pool_floor: usize,

    /// Maximum validated proxies kept after a refresh
    pub proxy_target_count: usize,

    /// Candidates probed per source page
    pub candidates_per_source: usize,

    /// URL fetched through each candidate as a liveness probe
    pub proxy_probe_url: String,

    /// Liveness probe timeout in seconds
    pub proxy_probe_timeout_secs: u64,

    /// Body fragments that mark a page as paywalled
    pub paywall_indicators: Vec<String>,

    /// Mirror prefixes tried, in order, against paywalled pages
    pub archive_mirrors: Vec<String>,

    /// Timeout for each archive-mirror fetch (seconds)
    pub archive_timeout_secs: u64,

    /// Refresh the proxy pool automatically when it goes stale
    pub auto_refresh_proxies: bool,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            proxy_sources: crate::bypass::DEFAULT_PROXY_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback_proxies: DEFAULT_FALLBACK_PROXIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            proxy_refresh_interval_secs: 1800,
            proxy_pool_floor: 5,
            proxy_target_count: 20,
            candidates_per_source: 10,
            proxy_probe_url: "http://httpbin.org/ip".to_string(),
            proxy_probe_timeout_secs: 5,
            paywall_indicators: DEFAULT_PAYWALL_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            archive_mirrors: DEFAULT_ARCHIVE_MIRRORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            archive_timeout_secs: 10,
            auto_refresh_proxies: true,
        }
    }
}
