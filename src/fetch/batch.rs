//! Batch retrieval: bounded-concurrency fan-out over a list of URLs
//!
//! Each URL's failure is isolated: the fetch client encodes failures in
//! its result, so one dead host never cancels the rest of the batch.

use crate::fetch::{FetchClient, FetchResult};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Default concurrency bound for batch retrieval
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Fetches many URLs concurrently, at most `max_concurrent` in flight
///
/// Returns exactly one [`FetchResult`] per input URL, in input order.
/// A `max_concurrent` of zero is coerced to one.
///
/// # Example
///
/// ```no_run
/// use driftnet::{batch_fetch, BypassPool, Config, FetchClient};
/// use std::sync::Arc;
///
/// # async fn example() -> driftnet::Result<()> {
/// let config = Config::default();
/// let bypass = Arc::new(BypassPool::new(config.bypass.clone())?);
/// let client = FetchClient::new(&config, bypass)?;
///
/// let urls = vec![
///     "https://example.com/a".to_string(),
///     "https://example.com/b".to_string(),
/// ];
/// let results = batch_fetch(&client, &urls, 10).await;
/// assert_eq!(results.len(), urls.len());
/// # Ok(())
/// # }
/// ```
pub async fn batch_fetch(
    client: &FetchClient,
    urls: &[String],
    max_concurrent: usize,
) -> Vec<FetchResult> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let fetches = urls.iter().map(|url| {
        let semaphore = semaphore.clone();
        async move {
            // The semaphore is never closed, so acquisition only fails on
            // shutdown paths that cannot occur here.
            let _permit = semaphore.acquire().await.ok();
            client.fetch_url(url).await
        }
    });

    let results = join_all(fetches).await;

    tracing::info!(
        "Batch complete: {}/{} fetches succeeded",
        results.iter().filter(|r| r.success).count(),
        results.len()
    );

    results
}
