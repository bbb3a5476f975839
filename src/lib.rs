//! Driftnet: a resilient web retrieval and site traversal engine
//!
//! This crate fetches web content despite anti-bot defenses, paywalls, rate
//! limits, and transient network failures, and can expand a single URL into
//! a bounded breadth-first crawl of a site. It exposes three entry points:
//! the [`FetchClient`] for one URL, [`batch_fetch`] for many URLs in
//! parallel, and the [`Traverser`] for link-following crawls. All three draw
//! user agents and proxies from a shared [`BypassPool`] and recover from
//! transient failures through the [`retry`] module.

pub mod bypass;
pub mod config;
pub mod fetch;
pub mod html;
pub mod retry;
pub mod traverse;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for driftnet operations
#[derive(Debug, Error)]
pub enum DriftnetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid link pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors from a single fetch dispatch
///
/// These never escape a [`fetch::FetchResult`]: the fetch client converts
/// them into failed results so batch and traversal callers can keep going.
/// They exist as a typed enum so the [`retry`] module can classify them.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("HTTP {code} for {url}")]
    Status { url: String, code: u16 },

    #[error("Rate limited at {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Unsupported scheme '{scheme}' for {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },
}

impl retry::Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connect { .. } => true,
            FetchError::RateLimited { .. } => true,
            FetchError::Status { code, .. } => matches!(code, 502 | 503 | 504),
            FetchError::Transport { source, .. } => {
                retry::transient_error_message(&source.to_string())
            }
            FetchError::InvalidUrl { .. }
            | FetchError::UnsupportedScheme { .. }
            | FetchError::Body { .. } => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for driftnet operations
pub type Result<T> = std::result::Result<T, DriftnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use bypass::BypassPool;
pub use config::Config;
pub use fetch::{batch_fetch, FetchClient, FetchRequest, FetchResult};
pub use retry::{with_retry, RetryPolicy};
pub use traverse::{traverse_website, TraversalConfig, TraversalPage, TraversalReport, Traverser};
pub use crate::url::{normalize_url, url_authority};
