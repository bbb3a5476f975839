use url::Url;

/// Extracts the authority of a URL: `host` or `host:port`
///
/// The port is included only when explicitly present and non-default, so
/// `https://example.com:8443/` and `https://example.com/` have different
/// authorities while `https://example.com:443/` matches the latter. This is
/// the equality key for same-domain link admission: a staging site on
/// another port is a different site.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::url_authority;
///
/// let url = Url::parse("http://example.com:8080/path").unwrap();
/// assert_eq!(url_authority(&url), Some("example.com:8080".to_string()));
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(url_authority(&url), Some("example.com".to_string()));
/// ```
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
