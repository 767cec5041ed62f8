//! URL handling module for Sumi-Sitemap
//!
//! This module provides link resolution, authority extraction and the
//! substring exclusion set used to keep URLs out of the crawl.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_authority, extract_host};
pub use matcher::ExclusionSet;
pub use normalize::{resolve_link, resolve_url_path};

use url::Url;

/// File extensions that are never fetched because they cannot contain links
pub const NOT_PARSEABLE: &[&str] = &[
    ".epub", ".mobi", ".docx", ".doc", ".opf", ".7z", ".ibooks", ".cbr", ".avi", ".mkv", ".mp4",
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".iso", ".rar", ".tar", ".tgz", ".zip", ".dmg",
    ".exe",
];

/// Returns true if the URL path ends with a known non-HTML extension
///
/// # Examples
///
/// ```
/// use sumi_sitemap::url::is_not_parseable;
/// use url::Url;
///
/// assert!(is_not_parseable(&Url::parse("https://example.com/book.PDF").unwrap()));
/// assert!(!is_not_parseable(&Url::parse("https://example.com/book.html").unwrap()));
/// ```
pub fn is_not_parseable(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NOT_PARSEABLE.iter().any(|ext| path.ends_with(ext))
}

/// Returns true if the URL points at the bare site root (`/` with no query)
pub fn is_bare_root(url: &Url) -> bool {
    let path = url.path();
    (path.is_empty() || path == "/") && url.query().map_or(true, str::is_empty)
}
