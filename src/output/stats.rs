//! End-of-run crawl statistics
//!
//! This module provides the summary a crawl produces when it finishes and a
//! formatter for printing it.

use crate::state::EngineState;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Wall-clock time spent in the round loop
    pub elapsed: Duration,

    /// Number of rounds that fetched at least one URL
    pub rounds: u64,

    /// Number of URLs claimed, including the over-cap claim if any
    pub urls_claimed: u64,

    /// Total number of links extracted from fetched pages
    pub links_seen: u64,

    /// Number of pages written to the sitemap
    pub pages_in_sitemap: u64,

    /// Size of the exclusion set at the end of the run
    pub excluded: u64,

    /// Why the round loop stopped
    pub stop_reason: EngineState,
}

impl CrawlStatistics {
    /// Share of claimed URLs that made it into the sitemap, in percent
    pub fn sitemap_rate(&self) -> f64 {
        if self.urls_claimed == 0 {
            0.0
        } else {
            (self.pages_in_sitemap as f64 / self.urls_claimed as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Finished: {}", stats.finished_at.to_rfc3339());
    println!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    println!("  Rounds: {}", stats.rounds);
    println!("  Stopped: {}", stop_description(stats.stop_reason));
    println!();

    println!("URLs:");
    println!("  Claimed: {}", stats.urls_claimed);
    println!("  Links seen: {}", stats.links_seen);
    println!("  Excluded: {}", stats.excluded);
    println!();

    println!(
        "Sitemap: {} pages ({:.1}% of claimed URLs)",
        stats.pages_in_sitemap,
        stats.sitemap_rate()
    );
}

fn stop_description(state: EngineState) -> &'static str {
    match state {
        EngineState::Capped => "URL limit exceeded",
        EngineState::Draining => "frontier exhausted",
        _ => "not finished",
    }
}
