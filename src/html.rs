//! HTML parsing: title and link extraction
//!
//! Built on scraper's typed document model: elements are selected by tag,
//! attributes read by name, text collected per node. This is the only
//! module that touches raw HTML; everything downstream works with the
//! extracted [`ParsedPage`].

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title, from `<title>` with an `<h1>` fallback
    pub title: Option<String>,

    /// Outbound links found on the page, as absolute URLs in document
    /// order, deduplicated
    pub links: Vec<String>,
}

/// Parses HTML content and extracts the title and outbound links
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anchors, resolved against `base_url`.
///
/// **Exclude:** `javascript:`, `mailto:`, `tel:`, and `data:` targets,
/// fragment-only anchors, anchors with a `download` attribute, and anything
/// that does not resolve to an HTTP(S) URL.
///
/// # Example
///
/// ```
/// use driftnet::html::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let links = extract_links(&document, base_url);

    ParsedPage { title, links }
}

/// Extracts the page title: `<title>` first, then the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    for tag in ["title", "h1"] {
        let selector = match Selector::parse(tag) {
            Ok(s) => s,
            Err(_) => continue,
        };

        let found = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        if found.is_some() {
            return found;
        }
    }

    None
}

/// Extracts all valid anchor links, deduplicated in document order
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = std::collections::HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Download targets are files, not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if seen.insert(absolute_url.clone()) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None for excluded targets: special schemes, fragment-only
/// anchors, unparseable hrefs, and non-HTTP(S) results.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Fragment-only links point back at the same page
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = r#"<html><body><h1>Heading Title</h1><p>text</p></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Heading Title".to_string()));
    }

    #[test]
    fn test_empty_title_falls_back_to_h1() {
        let html = r#"<html><head><title> </title></head><body><h1>Real Title</h1></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Real Title".to_string()));
    }

    #[test]
    fn test_no_title_at_all() {
        let html = r#"<html><body><p>Just text</p></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="other">Link</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_skip_javascript_link() {
        let html = r#"<html><body><a href="javascript:void(0)">Link</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_mailto_and_tel_links() {
        let html = r#"<html><body>
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+1234567890">Call</a>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_skip_data_uri() {
        let html = r#"<html><body><a href="data:text/html,<h1>x</h1>">Data</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let html = r#"<html><body>
            <a href="/b">B</a>
            <a href="/a">A</a>
            <a href="/b">B again</a>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/b".to_string(),
                "https://example.com/a".to_string(),
            ]
        );
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="/another-valid">Valid</a>
            </body>
            </html>
        "#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links.len(), 2);
    }
}
