//! Configuration module for Sumi-Sitemap
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; command-line flags override whatever the file sets.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sitemap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemap.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_USER_AGENT, DEFAULT_WORKERS,
};

pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_seed};
