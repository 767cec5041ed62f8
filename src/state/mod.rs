//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: frontier, visited set, exclusions, per-URL metadata and counters
//! - `EngineState`: lifecycle of the crawl engine (idle, running, draining, capped, done)
//! - `UrlRecord`: location and last-modification time of a claimed URL

mod crawl_state;
mod engine_state;

// Re-export main types
pub use crawl_state::{CrawlState, UrlRecord};
pub use engine_state::EngineState;
