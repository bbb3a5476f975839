use crate::fetch::FetchClient;
use crate::html::parse_page;
use crate::traverse::{LinkFilter, TraversalConfig, TraversalPage, TraversalReport};
use crate::url::{normalize_url, url_authority};
use crate::{ConfigError, DriftnetError, UrlError};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Content exceeding the per-page limit ends with this marker
const TRUNCATION_MARKER: &str = "...[truncated]";

/// Cooperative cancellation handle for a traversal run
///
/// Aborting stops the run from dequeuing further work; an in-flight fetch
/// completes normally and its page is still recorded.
#[derive(Debug, Clone)]
pub struct TraversalAbort(Arc<AtomicBool>);

impl TraversalAbort {
    /// Requests that the traversal stop
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether an abort has been requested
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Breadth-first site traversal engine
///
/// Pages are fetched in strict breadth-first order from an explicit work
/// queue. The visited set and result list belong to each `run` call, so one
/// `Traverser` can serve concurrent runs over different start URLs.
#[derive(Debug)]
pub struct Traverser {
    client: Arc<FetchClient>,
    config: TraversalConfig,
    filter: LinkFilter,
    abort: Arc<AtomicBool>,
}

impl Traverser {
    /// Creates a traverser, validating the configuration
    ///
    /// Contract violations (zero page budget, non-compiling patterns) fail
    /// here rather than mid-crawl.
    pub fn new(client: Arc<FetchClient>, config: TraversalConfig) -> Result<Self, DriftnetError> {
        if config.max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "max-pages must be >= 1, got {}",
                config.max_pages
            ))
            .into());
        }

        if config.max_queue_size < 1 {
            return Err(ConfigError::Validation(format!(
                "max-queue-size must be >= 1, got {}",
                config.max_queue_size
            ))
            .into());
        }

        let filter = LinkFilter::new(&config)?;

        Ok(Self {
            client,
            config,
            filter,
            abort: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns a handle that can cancel this traverser's runs
    pub fn abort_handle(&self) -> TraversalAbort {
        TraversalAbort(self.abort.clone())
    }

    /// Crawls breadth-first from the start URL
    ///
    /// Returns every page record collected (successes and failures) plus
    /// run metadata. Hitting the depth or page budget is normal
    /// termination, not an error; only an unusable start URL fails the run.
    pub async fn run(&self, start_url: &str) -> Result<TraversalReport, DriftnetError> {
        let start = normalize_url(start_url)?;
        let base_authority = url_authority(&start).ok_or(UrlError::MissingHost)?;

        tracing::info!(
            "Starting traversal from {} (max depth {}, max pages {})",
            start,
            self.config.max_depth,
            self.config.max_pages
        );

        self.client.bypass().refresh_if_stale().await;

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        let mut pages: Vec<TraversalPage> = Vec::new();
        let mut discovered: HashSet<String> = HashSet::new();

        visited.insert(start.as_str().to_string());
        queue.push_back((start.clone(), 0));

        loop {
            if pages.len() >= self.config.max_pages {
                tracing::debug!("Page budget reached");
                break;
            }

            if self.abort.load(Ordering::Relaxed) {
                tracing::info!("Traversal aborted after {} pages", pages.len());
                break;
            }

            let (url, depth) = match queue.pop_front() {
                Some(entry) => entry,
                None => break,
            };

            if depth > self.config.max_depth {
                continue;
            }

            if depth > 0 && self.config.delay_between_requests_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_between_requests_ms))
                    .await;
            }

            let page = self.fetch_page(&url, depth).await;

            tracing::info!(
                "Fetched page {}/{}: {} (depth {}, success: {})",
                pages.len() + 1,
                self.config.max_pages,
                url,
                depth,
                page.success
            );

            if page.success && depth < self.config.max_depth {
                self.admit_links(&page, depth, &base_authority, &mut visited, &mut queue);
            }

            if page.success {
                discovered.extend(page.links_found.iter().cloned());
            }

            pages.push(page);
        }

        let pages_fetched = pages.iter().filter(|p| p.success).count();
        let max_depth_reached = pages.iter().map(|p| p.depth).max().unwrap_or(0);

        tracing::info!(
            "Traversal complete: {} of {} attempts succeeded, {} unique links, max depth {}",
            pages_fetched,
            pages.len(),
            discovered.len(),
            max_depth_reached
        );

        Ok(TraversalReport {
            start_url: start.as_str().to_string(),
            pages_fetched,
            total_attempts: pages.len(),
            unique_links_found: discovered.len(),
            max_depth_reached,
            pages,
        })
    }

    /// Fetches one page and extracts its title, content, and links
    async fn fetch_page(&self, url: &Url, depth: u32) -> TraversalPage {
        let result = self.client.fetch_url(url.as_str()).await;

        match result.content {
            Some(content) if result.success => {
                let parsed = parse_page(&content, url);
                let title = parsed.title.unwrap_or_else(|| "Untitled".to_string());

                TraversalPage {
                    url: url.as_str().to_string(),
                    title,
                    content: truncate_content(content, self.config.max_content_per_page),
                    links_found: parsed.links,
                    depth,
                    success: true,
                    error: None,
                }
            }
            _ => TraversalPage {
                url: url.as_str().to_string(),
                title: String::new(),
                content: String::new(),
                links_found: Vec::new(),
                depth,
                success: false,
                error: result.error.or_else(|| Some("Empty content".to_string())),
            },
        }
    }

    /// Applies admission rules and enqueues surviving links at depth + 1
    fn admit_links(
        &self,
        page: &TraversalPage,
        depth: u32,
        base_authority: &str,
        visited: &mut HashSet<String>,
        queue: &mut VecDeque<(Url, u32)>,
    ) {
        for link in &page.links_found {
            if queue.len() >= self.config.max_queue_size {
                tracing::debug!(
                    "Queue ceiling of {} reached, dropping remaining links from {}",
                    self.config.max_queue_size,
                    page.url
                );
                break;
            }

            let normalized = match normalize_url(link) {
                Ok(u) => u,
                Err(_) => continue,
            };

            if visited.contains(normalized.as_str()) {
                continue;
            }

            if !self.filter.should_follow(&normalized, base_authority) {
                continue;
            }

            visited.insert(normalized.as_str().to_string());
            queue.push_back((normalized, depth + 1));
        }
    }
}

/// Truncates content to the limit on a char boundary, with a marker
fn truncate_content(content: String, max_len: usize) -> String {
    if content.len() <= max_len {
        return content;
    }

    let mut end = max_len;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &content[..end], TRUNCATION_MARKER)
}
