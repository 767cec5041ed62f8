//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client
//! - GET requests to fetch page content
//! - Outcome classification (transport failure, rejected status, body errors)

use crate::config::Config;
use crate::url::is_not_parseable;
use reqwest::header::LAST_MODIFIED;
use reqwest::{redirect::Policy, Client};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

/// Status codes whose body is read and whose page may enter the sitemap
pub const ACCEPTED_STATUS: RangeInclusive<u16> = 200..=307;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// The path has a non-HTML extension; no request was made
    Skipped,

    /// Connection, DNS, TLS or timeout failure
    TransportError {
        /// Error description
        error: String,
    },

    /// Status outside [`ACCEPTED_STATUS`]; the body was not read
    Rejected {
        /// The HTTP status code
        status_code: u16,
    },

    /// The response started but its body could not be read
    BodyError {
        /// Error description
        error: String,
    },

    /// Successfully fetched the page
    Fetched {
        /// Raw response body
        body: Vec<u8>,
        /// URL the response was served from
        final_url: String,
        /// Value of the `Last-Modified` header, if any
        last_modified: Option<String>,
    },
}

/// Builds the HTTP client shared by every fetch of a crawl
///
/// Redirects are not followed and certificate validation is disabled. The idle
/// connection pool is capped at the worker count.
///
/// # Example
///
/// ```no_run
/// use sumi_sitemap::config::Config;
/// use sumi_sitemap::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.name.as_str())
        .connect_timeout(Duration::from_secs(config.crawler.connect_timeout))
        .timeout(Duration::from_secs(config.crawler.request_timeout))
        .redirect(Policy::none())
        .danger_accept_invalid_certs(true)
        .cookie_store(true)
        .pool_max_idle_per_host(config.crawler.workers)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | Path ends in a non-HTML extension | `Skipped` |
/// | Connect / DNS / timeout failure | `TransportError` |
/// | Status outside 200..=307 | `Rejected` |
/// | Body read failure | `BodyError` |
/// | Otherwise | `Fetched` |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchOutcome {
    if is_not_parseable(url) {
        return FetchOutcome::Skipped;
    }

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchOutcome::TransportError { error };
        }
    };

    let status = response.status().as_u16();
    if !ACCEPTED_STATUS.contains(&status) {
        return FetchOutcome::Rejected {
            status_code: status,
        };
    }

    let final_url = response.url().to_string();
    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .map(|value| match value.to_str() {
            Ok(text) => text.to_string(),
            Err(_) => {
                tracing::trace!("Last-Modified on {} is not visible ASCII", url);
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            }
        });

    match response.bytes().await {
        Ok(body) => FetchOutcome::Fetched {
            body: body.to_vec(),
            final_url,
            last_modified,
        },
        Err(e) => FetchOutcome::BodyError {
            error: e.to_string(),
        },
    }
}
