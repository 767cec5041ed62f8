use std::collections::HashSet;

/// A set of substrings that exclude URLs from the crawl
///
/// Matching is by containment, not equality: the pattern `/private` excludes
/// `https://example.com/private/a` as well as `https://example.com/x?next=/private`.
/// The set grows while crawling, since URLs that failed to connect or were
/// refused by robots.txt are inserted verbatim.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: HashSet<String>,
}

impl ExclusionSet {
    /// Creates an empty exclusion set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pattern, returning false if it was already present
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        self.patterns.insert(pattern.into())
    }

    /// Returns true if any pattern is a substring of `url`
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_sitemap::url::ExclusionSet;
    ///
    /// let excluded: ExclusionSet = ["/admin"].into_iter().collect();
    /// assert!(excluded.matches("https://example.com/admin/users"));
    /// assert!(!excluded.matches("https://example.com/about"));
    /// ```
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.contains(url) || self.patterns.iter().any(|p| url.contains(p.as_str()))
    }

    /// Returns the number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if there are no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ExclusionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.patterns.extend(iter.into_iter().map(Into::into));
    }
}
