//! Robots.txt handling module
//!
//! This module fetches the target site's robots.txt once per crawl and answers
//! allow/deny questions for discovered links.

mod parser;

pub use parser::ParsedRobots;

use crate::SumiError;
use reqwest::{Client, StatusCode};
use url::Url;

/// Fetches and parses robots.txt for the site `base` belongs to
///
/// # Status Handling
///
/// | Response | Policy |
/// |----------|--------|
/// | 2xx | Parsed from the body |
/// | 401, 403 | Disallow everything |
/// | other 4xx, 3xx | Allow everything |
/// | 5xx | Disallow everything |
/// | Network error | Allow everything (logged) |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `base` - Any URL on the target site
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - The policy to apply
/// * `Err(SumiError)` - The robots.txt URL could not be built
pub async fn fetch_robots(client: &Client, base: &Url) -> Result<ParsedRobots, SumiError> {
    let robots_url = base.join("/robots.txt")?;
    tracing::debug!("Fetching {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch {}: {}; allowing all URLs", robots_url, e);
            return Ok(ParsedRobots::allow_all());
        }
    };

    let status = response.status();
    let robots = if status.is_success() {
        match response.text().await {
            Ok(body) => {
                let robots = ParsedRobots::from_content(&body);
                tracing::debug!("Loaded {} bytes from {}", robots.content().len(), robots_url);
                robots
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}; allowing all URLs", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::info!("{} answered {}; disallowing all URLs", robots_url, status);
        ParsedRobots::disallow_all()
    } else if status.is_server_error() {
        tracing::warn!("{} answered {}; disallowing all URLs", robots_url, status);
        ParsedRobots::disallow_all()
    } else {
        tracing::debug!("{} answered {}; allowing all URLs", robots_url, status);
        ParsedRobots::allow_all()
    };

    Ok(robots)
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}
