//! Traversal module: breadth-first site crawling
//!
//! Starting from one URL, the [`Traverser`] expands through discovered
//! links in strict breadth-first order, bounded by depth and page budgets,
//! deduplicating by normalized URL and admitting links through domain,
//! pattern, and file-extension rules.

mod admission;
mod engine;

pub use admission::{LinkFilter, EXCLUDED_EXTENSIONS};
pub use engine::{TraversalAbort, Traverser};

use crate::fetch::FetchClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for one traversal run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TraversalConfig {
    /// Maximum link depth from the start URL (0 = starting page only)
    pub max_depth: u32,

    /// Maximum number of pages fetched, successes and failures combined
    pub max_pages: usize,

    /// Stored page content is truncated beyond this many bytes
    pub max_content_per_page: usize,

    /// Only follow links on the start URL's host. When set,
    /// `follow_external_links` has no effect: the same-domain check is
    /// stricter.
    pub same_domain_only: bool,

    /// Follow links to other hosts (only meaningful with
    /// `same_domain_only` off)
    pub follow_external_links: bool,

    /// If non-empty, a link must match at least one of these patterns
    pub include_patterns: Vec<String>,

    /// A link must match none of these patterns
    pub exclude_patterns: Vec<String>,

    /// Politeness delay before each fetch after the first (milliseconds)
    pub delay_between_requests_ms: u64,

    /// Ceiling on pending queue entries, bounding memory on link-dense
    /// sites
    pub max_queue_size: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 10,
            max_content_per_page: 3000,
            same_domain_only: true,
            follow_external_links: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            delay_between_requests_ms: 500,
            max_queue_size: 100,
        }
    }
}

/// One fetched (or failed) page in a traversal run
///
/// Created when a queued URL is dequeued and fetched; immutable
/// thereafter. Failures are recorded, not discarded.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalPage {
    /// The fetched URL
    pub url: String,

    /// Page title, `"Untitled"` when none could be extracted
    pub title: String,

    /// Page content, truncated to the configured maximum
    pub content: String,

    /// Outbound links discovered on the page
    pub links_found: Vec<String>,

    /// Link depth from the start URL
    pub depth: u32,

    /// Whether the fetch delivered content
    pub success: bool,

    /// Human-readable cause when the fetch failed
    pub error: Option<String>,
}

/// Aggregate outcome of a traversal run
#[derive(Debug, Clone, Serialize)]
pub struct TraversalReport {
    /// The URL the run started from
    pub start_url: String,

    /// Every page record, successes and failures, in fetch order
    pub pages: Vec<TraversalPage>,

    /// Number of successfully fetched pages
    pub pages_fetched: usize,

    /// Total fetch attempts, including failures
    pub total_attempts: usize,

    /// Count of distinct links discovered across successful pages
    pub unique_links_found: usize,

    /// Deepest depth that produced a page record
    pub max_depth_reached: u32,
}

/// Runs a complete traversal with the given configuration
///
/// This is the one-call entry point for crawling a site.
///
/// # Example
///
/// ```no_run
/// use driftnet::{traverse_website, BypassPool, Config, FetchClient, TraversalConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> driftnet::Result<()> {
/// let config = Config::default();
/// let bypass = Arc::new(BypassPool::new(config.bypass.clone())?);
/// let client = Arc::new(FetchClient::new(&config, bypass)?);
///
/// let report = traverse_website(
///     client,
///     "https://docs.example.com/",
///     TraversalConfig {
///         max_depth: 1,
///         max_pages: 20,
///         ..TraversalConfig::default()
///     },
/// )
/// .await?;
///
/// println!("fetched {} pages", report.pages_fetched);
/// # Ok(())
/// # }
/// ```
pub async fn traverse_website(
    client: Arc<FetchClient>,
    start_url: &str,
    config: TraversalConfig,
) -> crate::Result<TraversalReport> {
    Traverser::new(client, config)?.run(start_url).await
}
