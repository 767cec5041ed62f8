use url::Url;

/// Extracts the authority (host plus explicit port) from a URL
///
/// Two URLs belong to the same site only when their authorities match, so
/// `http://127.0.0.1:8080/` and `http://127.0.0.1:9090/` are different sites.
/// Default ports are not spelled out: `https://example.com:443/` has the
/// authority `example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sitemap::url::extract_authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(extract_authority(&url), Some("localhost:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Extracts the lowercase host from a URL, without the port
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
