use crate::UrlError;
use url::Url;

/// Normalizes a URL for visited-set comparison
///
/// Two URLs that differ only by host case, fragment, or a trailing slash
/// refer to the same page for crawling purposes, so normalization is the
/// equality key for the traversal visited set.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Lowercase the host (the url crate does this on parse)
/// 4. Remove the fragment (everything after #)
/// 5. Remove trailing slashes from the path, unless the path is the root `/`
///
/// Query strings are preserved: `?page=2` addresses different content.
/// The operation is idempotent: normalizing an already-normalized URL is a
/// no-op.
///
/// # Examples
///
/// ```
/// use driftnet::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page/#section").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&trimmed);
        }
    }

    Ok(url)
}
