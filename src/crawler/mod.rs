//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and outcome classification
//! - Regex-based link extraction
//! - Link eligibility filtering
//! - Round scheduling and concurrency limiting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod filter;
mod parser;
mod scheduler;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, fetch_url, FetchOutcome, ACCEPTED_STATUS};
pub use filter::{Eligibility, LinkFilter};
pub use parser::extract_links;
pub use scheduler::{Round, Scheduler};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::SumiError;
use std::path::PathBuf;

/// Runs a complete crawl and writes its sitemap files
///
/// This is the one-call entry point. It will:
/// 1. Build the crawler from the configuration
/// 2. Probe the seed URL
/// 3. Crawl until the frontier is empty or the URL cap is exceeded
/// 4. Write the sitemap files into the output directory
///
/// # Returns
///
/// * `Ok((CrawlStatistics, Vec<PathBuf>))` - Run statistics and the written files
/// * `Err(SumiError)` - Configuration, seed or IO failure
pub async fn crawl(config: Config) -> Result<(CrawlStatistics, Vec<PathBuf>), SumiError> {
    let mut crawler = Crawler::new(config)?;
    crawler.validate_seed().await?;
    let stats = crawler.run().await?;
    let files = crawler.write_sitemap()?;
    Ok((stats, files))
}
