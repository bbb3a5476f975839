use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing sections fall back to their defaults, so a file that only sets
/// `[fetch] stealth-probability = 0.5` is valid.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use driftnet::config::load_config;
///
/// let config = load_config(Path::new("driftnet.toml")).unwrap();
/// println!("max attempts: {}", config.retry.max_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.traversal.max_pages, 10);
        assert!(!config.bypass.user_agents.is_empty());
    }

    #[test]
    fn test_load_partial_config() {
        let config_content = r#"
[fetch]
timeout-secs = 15
stealth-probability = 0.5

[retry]
max-attempts = 5
base-delay-ms = 250

[traversal]
max-depth = 3
max-pages = 40
exclude-patterns = ["/admin/", "\\.pdf$"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.traversal.max_depth, 3);
        assert_eq!(config.traversal.max_pages, 40);
        assert_eq!(config.traversal.exclude_patterns.len(), 2);
        // Untouched sections keep their defaults
        assert_eq!(config.bypass.proxy_target_count, 20);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/driftnet.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[traversal]
max-pages = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_bad_pattern() {
        let config_content = r#"
[traversal]
include-patterns = ["[unclosed"]
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }
}
