//! Link extraction from raw response bodies
//!
//! Links are found with a single regular expression over the undecoded bytes
//! instead of an HTML parse. Any `href="..."` or `href='...'` attribute
//! matches, including ones on `<link>` tags, inside scripts or in comments.
//! Malformed markup never stops extraction.

use regex::bytes::Regex;
use std::sync::LazyLock;

static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)href\s*=\s*["']([^"']*)["']"#).expect("hardcoded regex pattern is valid")
});

/// Extracts raw `href` values from a response body, in document order
///
/// Each value is decoded as UTF-8 with invalid bytes dropped. Values are
/// returned as written; resolution happens in [`crate::url::resolve_link`].
///
/// # Example
///
/// ```
/// use sumi_sitemap::crawler::extract_links;
///
/// let body = br#"<a href="/about">About</a> <A HREF='contact.html'>Contact</A>"#;
/// assert_eq!(extract_links(body), vec!["/about", "contact.html"]);
/// ```
pub fn extract_links(body: &[u8]) -> Vec<String> {
    HREF_REGEX
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_lossy(m.as_bytes()))
        .collect()
}

/// Decodes UTF-8, silently dropping invalid byte sequences
fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
