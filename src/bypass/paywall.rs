use reqwest::Client;
use std::time::Duration;

/// Detects paywalled page bodies by indicator substring matching
///
/// False positives are acceptable: they only cost an extra archive-mirror
/// attempt. False negatives mean paywalled content is returned as-is.
#[derive(Debug, Clone)]
pub struct PaywallDetector {
    indicators: Vec<String>,
}

impl PaywallDetector {
    /// Creates a detector from an indicator list (lowercased for matching)
    pub fn new(indicators: Vec<String>) -> Self {
        Self {
            indicators: indicators.into_iter().map(|i| i.to_lowercase()).collect(),
        }
    }

    /// Returns true if the content matches any paywall indicator
    pub fn detect(&self, content: &str) -> bool {
        let lower = content.to_lowercase();
        self.indicators.iter().any(|i| lower.contains(i))
    }
}

/// Resolves archive-mirror URLs for paywalled pages
///
/// Mirrors are prefix services: the original URL is appended to each prefix
/// and the candidates tried in configuration order.
#[derive(Debug)]
pub struct ArchiveResolver {
    mirrors: Vec<String>,
    client: Client,
}

impl ArchiveResolver {
    /// Creates a resolver with the given mirror prefixes and fetch timeout
    pub fn new(mirrors: Vec<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { mirrors, client })
    }

    /// Mirror URLs for the original URL, in priority order
    pub fn candidates(&self, url: &str) -> Vec<String> {
        self.mirrors
            .iter()
            .map(|prefix| format!("{}{}", prefix, url))
            .collect()
    }

    /// Finds the first mirror serving a non-paywalled copy of the URL
    ///
    /// Each candidate is fetched with a short timeout; any failure skips to
    /// the next mirror. Returns None when every mirror fails or remains
    /// paywalled, never an error.
    pub async fn resolve(&self, url: &str, detector: &PaywallDetector) -> Option<String> {
        for candidate in self.candidates(url) {
            let resp = match self.client.get(&candidate).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Archive mirror {} failed: {}", candidate, e);
                    continue;
                }
            };

            if !resp.status().is_success() {
                tracing::debug!("Archive mirror {} returned HTTP {}", candidate, resp.status());
                continue;
            }

            match resp.text().await {
                Ok(body) if !detector.detect(&body) => {
                    tracing::info!("Resolved archive mirror for {}: {}", url, candidate);
                    return Some(candidate);
                }
                Ok(_) => {
                    tracing::debug!("Archive mirror {} still paywalled", candidate);
                }
                Err(e) => {
                    tracing::debug!("Archive mirror {} body read failed: {}", candidate, e);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PAYWALL_INDICATORS;

    fn default_detector() -> PaywallDetector {
        PaywallDetector::new(
            DEFAULT_PAYWALL_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_detects_subscribe_wall() {
        let detector = default_detector();
        assert!(detector.detect("Please SUBSCRIBE to continue reading this article"));
    }

    #[test]
    fn test_detects_case_insensitively() {
        let detector = default_detector();
        assert!(detector.detect("This is MEMBER ONLY content"));
        assert!(detector.detect("sign In To Read the full story"));
    }

    #[test]
    fn test_clean_content_passes() {
        let detector = default_detector();
        assert!(!detector.detect("<html><body><h1>Weather Report</h1><p>Sunny.</p></body></html>"));
    }

    #[test]
    fn test_empty_content_passes() {
        let detector = default_detector();
        assert!(!detector.detect(""));
    }

    #[test]
    fn test_custom_indicators() {
        let detector = PaywallDetector::new(vec!["Bezahlschranke".to_string()]);
        assert!(detector.detect("hinter der bezahlschranke"));
        assert!(!detector.detect("please subscribe")); // not in the custom list
    }

    #[test]
    fn test_candidates_in_priority_order() {
        let resolver = ArchiveResolver::new(
            vec![
                "https://mirror-a.test/?url=".to_string(),
                "https://mirror-b.test/get?q=".to_string(),
            ],
            Duration::from_secs(10),
        )
        .unwrap();

        let candidates = resolver.candidates("https://news.test/story");
        assert_eq!(
            candidates,
            vec![
                "https://mirror-a.test/?url=https://news.test/story",
                "https://mirror-b.test/get?q=https://news.test/story",
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_with_no_mirrors() {
        let resolver = ArchiveResolver::new(vec![], Duration::from_secs(1)).unwrap();
        let result = resolver
            .resolve("https://news.test/story", &default_detector())
            .await;
        assert_eq!(result, None);
    }
}
