//! Robots.txt parser implementation
//!
//! This module provides functionality for evaluating robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Body used to refuse every path for every agent
const DISALLOW_ALL: &str = "User-agent: *\nDisallow: /\n";

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// Skip matching entirely and allow everything
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is missing (HTTP 4xx) or cannot be reached.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Creates a ParsedRobots that refuses every URL
    ///
    /// Used when robots.txt access is forbidden (HTTP 401/403) or the server errors.
    pub fn disallow_all() -> Self {
        Self::from_content(DISALLOW_ALL)
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
