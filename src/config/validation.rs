use crate::config::types::{BypassConfig, Config, FetchConfig};
use crate::retry::RetryPolicy;
use crate::traverse::TraversalConfig;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Contract violations surface here, at load time, rather than as runtime
/// failures deep inside a crawl.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_retry_policy(&config.retry)?;
    validate_bypass_config(&config.bypass)?;
    validate_traversal_config(&config.traversal)?;
    Ok(())
}

/// Validates fetch client configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.stealth_probability) {
        return Err(ConfigError::Validation(format!(
            "stealth-probability must be between 0.0 and 1.0, got {}",
            config.stealth_probability
        )));
    }

    if config.min_predispatch_delay_ms > config.max_predispatch_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-predispatch-delay-ms ({}) must not exceed max-predispatch-delay-ms ({})",
            config.min_predispatch_delay_ms, config.max_predispatch_delay_ms
        )));
    }

    Ok(())
}

/// Validates retry policy
fn validate_retry_policy(policy: &RetryPolicy) -> Result<(), ConfigError> {
    if policy.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            policy.max_attempts
        )));
    }

    if policy.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be >= 1.0, got {}",
            policy.backoff_factor
        )));
    }

    if policy.base_delay_ms > policy.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms ({}) must not exceed max-delay-ms ({})",
            policy.base_delay_ms, policy.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates bypass resource configuration
fn validate_bypass_config(config: &BypassConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents must not be empty".to_string(),
        ));
    }

    if config.proxy_target_count < 1 {
        return Err(ConfigError::Validation(format!(
            "proxy-target-count must be >= 1, got {}",
            config.proxy_target_count
        )));
    }

    Url::parse(&config.proxy_probe_url).map_err(|e| {
        ConfigError::Validation(format!(
            "proxy-probe-url '{}' is not a valid URL: {}",
            config.proxy_probe_url, e
        ))
    })?;

    for source in &config.proxy_sources {
        Url::parse(source).map_err(|e| {
            ConfigError::Validation(format!("proxy source '{}' is not a valid URL: {}", source, e))
        })?;
    }

    for mirror in &config.archive_mirrors {
        Url::parse(mirror).map_err(|e| {
            ConfigError::Validation(format!(
                "archive mirror '{}' is not a valid URL prefix: {}",
                mirror, e
            ))
        })?;
    }

    if config.paywall_indicators.iter().any(|i| i.is_empty()) {
        return Err(ConfigError::Validation(
            "paywall-indicators must not contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates traversal configuration, including pattern compilation
fn validate_traversal_config(config: &TraversalConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_queue_size < 1 {
        return Err(ConfigError::Validation(format!(
            "max-queue-size must be >= 1, got {}",
            config.max_queue_size
        )));
    }

    for pattern in config
        .include_patterns
        .iter()
        .chain(config.exclude_patterns.iter())
    {
        regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}
