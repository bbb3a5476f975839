//! Shared helpers for integration tests

use driftnet::config::Config;
use driftnet::{BypassPool, FetchClient};
use std::sync::Arc;

/// A configuration that stays fast and offline: no pre-dispatch delay, no
/// proxy scraping, no archive mirrors, millisecond retry backoff.
pub fn quiet_config() -> Config {
    let mut config = Config::default();

    config.fetch.min_predispatch_delay_ms = 0;
    config.fetch.max_predispatch_delay_ms = 0;
    config.fetch.stealth_probability = 0.0;

    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;

    config.bypass.proxy_sources = vec![];
    config.bypass.fallback_proxies = vec![];
    config.bypass.auto_refresh_proxies = false;
    config.bypass.archive_mirrors = vec![];

    config.traversal.delay_between_requests_ms = 0;

    config
}

/// Builds a fetch client over a fresh bypass pool from the given config
pub fn build_client(config: &Config) -> Arc<FetchClient> {
    init_logging();
    let bypass = Arc::new(BypassPool::new(config.bypass.clone()).expect("bypass pool"));
    Arc::new(FetchClient::new(config, bypass).expect("fetch client"))
}

/// Installs a test subscriber so RUST_LOG=driftnet=debug shows engine logs
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
