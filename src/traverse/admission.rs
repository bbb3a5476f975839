use crate::traverse::TraversalConfig;
use crate::url::url_authority;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use url::Url;

/// File extensions never followed, regardless of other admission rules
///
/// Documents, media, archives, and script assets are not crawlable pages.
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz",
    ".7z", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".mp3", ".mp4", ".avi", ".mov",
    ".wmv", ".css", ".js", ".xml", ".rss",
];

/// Decides which discovered links a traversal may follow
///
/// Rule precedence: domain checks first, then include patterns (if any are
/// configured, at least one must match), then exclude patterns (none may
/// match), then the always-on extension blacklist.
#[derive(Debug)]
pub struct LinkFilter {
    same_domain_only: bool,
    follow_external_links: bool,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl LinkFilter {
    /// Compiles the filter from a traversal configuration
    ///
    /// Pattern compilation failures are contract violations and surface
    /// here, before any fetch happens.
    pub fn new(config: &TraversalConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            same_domain_only: config.same_domain_only,
            follow_external_links: config.follow_external_links,
            include: compile_patterns(&config.include_patterns)?,
            exclude: compile_patterns(&config.exclude_patterns)?,
        })
    }

    /// Returns true if the link passes every admission rule
    pub fn should_follow(&self, url: &Url, base_authority: &str) -> bool {
        let authority = match url_authority(url) {
            Some(a) => a,
            None => return false,
        };

        if self.same_domain_only && authority != base_authority {
            return false;
        }

        if !self.follow_external_links && authority != base_authority {
            return false;
        }

        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(url.as_str())) {
            return false;
        }

        if self.exclude.iter().any(|re| re.is_match(url.as_str())) {
            return false;
        }

        let lower = url.as_str().to_lowercase();
        if EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return false;
        }

        true
    }
}

/// Compiles patterns case-insensitively
fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}
