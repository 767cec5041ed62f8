//! Output module for sitemap files and crawl reports
//!
//! This module handles:
//! - Serializing collected pages into sitemap-index XML files
//! - Reporting end-of-run crawl statistics

pub mod sitemap;
pub mod stats;

pub use sitemap::{
    render_sitemap_index, sitemap_file_name, write_sitemaps, SitemapWriter,
    MAX_URLS_PER_SITEMAP, SITEMAP_NAMESPACE,
};
pub use stats::{print_statistics, CrawlStatistics};
