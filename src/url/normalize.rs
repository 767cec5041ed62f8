use crate::UrlError;
use url::{Position, Url};

/// Resolves a raw `href` value found on `page` into a canonical absolute URL
///
/// # Resolution Steps
///
/// 1. `mailto:` and `tel:` links are rejected
/// 2. Root-relative links (`/about`) are prefixed with the page's scheme and authority
/// 3. Fragment-only links (`#top`) are prefixed with the page's scheme, authority and path
/// 4. Anything else that is not already an absolute http(s) URL is joined onto the
///    page URL and its dot segments are collapsed with [`resolve_url_path`]
/// 5. The fragment (everything from the first `#`) is removed
///
/// Protocol-relative links (`//cdn.example.com/x`) go through step 4 so they keep
/// their own host. The result is compared by exact string equality afterwards;
/// trailing slashes, case in the path and percent-encoding are left alone.
///
/// # Returns
///
/// * `Ok(Url)` - The canonical absolute URL
/// * `Err(UrlError)` - The link should be skipped
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
/// let url = resolve_link("../blog/post#comments", &page).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/blog/post");
/// ```
pub fn resolve_link(href: &str, page: &Url) -> Result<Url, UrlError> {
    if starts_with_ignore_case(href, "mailto:") || starts_with_ignore_case(href, "tel:") {
        return Err(UrlError::InvalidScheme(href.to_string()));
    }

    let parsed = if href.starts_with("//") {
        page.join(href)
    } else if href.starts_with('/') {
        Url::parse(&format!("{}{}", &page[..Position::BeforePath], href))
    } else if href.starts_with('#') {
        Url::parse(&format!("{}{}", &page[..Position::AfterPath], href))
    } else if starts_with_ignore_case(href, "http://") || starts_with_ignore_case(href, "https://")
    {
        Url::parse(href)
    } else {
        page.join(href).map(|mut joined| {
            let cleaned = resolve_url_path(joined.path());
            joined.set_path(&cleaned);
            joined
        })
    };

    let mut url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Collapses `.` and `..` segments of a URL path
///
/// The path is split on `/`, `.` segments are dropped and each `..` removes the
/// previously accumulated segment. The first segment is never removed, so a
/// rooted path cannot climb above `/`.
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::resolve_url_path;
///
/// assert_eq!(resolve_url_path("/a/../b"), "/b");
/// assert_eq!(resolve_url_path("/dir/./x"), "/dir/x");
/// assert_eq!(resolve_url_path("/../../x"), "/x");
/// ```
pub fn resolve_url_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut resolved: Vec<String> = Vec::with_capacity(segments.len());

    for (index, segment) in segments.into_iter().enumerate() {
        let segment = if index < last {
            format!("{}/", segment)
        } else {
            segment.to_string()
        };

        match segment.as_str() {
            "../" | ".." => {
                if resolved.len() > 1 {
                    resolved.pop();
                }
            }
            "./" | "." => {}
            _ => resolved.push(segment),
        }
    }

    resolved.concat()
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
