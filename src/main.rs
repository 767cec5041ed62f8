//! Sumi-Sitemap main entry point
//!
//! This is the command-line interface for the Sumi-Sitemap generator.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use sumi_sitemap::config::{load_config, Config};
use sumi_sitemap::output::print_statistics;
use sumi_sitemap::Crawler;
use tracing_subscriber::EnvFilter;

/// Sumi-Sitemap: a single-domain sitemap generator
///
/// Sumi-Sitemap crawls one website from a seed URL, following links that
/// stay on the same host, and writes sitemap-index XML files listing every
/// page it could fetch.
#[derive(Parser, Debug)]
#[command(name = "sumi-sitemap")]
#[command(version = "1.0.0")]
#[command(about = "A single-domain sitemap generator", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(short, long, value_name = "URL")]
    domain: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip links disallowed by the site's robots.txt
    #[arg(long)]
    parse_robots: bool,

    /// Stop after claiming this many URLs
    #[arg(long, value_name = "N")]
    max_urls: Option<u64>,

    /// User-Agent header, also matched against robots.txt groups
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Maximum concurrent fetches
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Skip URLs containing any of these substrings
    #[arg(long, value_name = "SUBSTR", num_args = 1..)]
    excluded: Vec<String>,

    /// Directory to write sitemap files into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let seed = config
        .seed
        .clone()
        .context("no seed URL given; pass --domain or set `seed` in the config file")?;

    let mut crawler = Crawler::new(config).context("invalid configuration")?;

    tracing::info!("Checking seed URL {}", crawler.seed());
    crawler
        .validate_seed()
        .await
        .with_context(|| format!("seed URL {} is unreachable", seed))?;

    let stats = crawler.run().await.context("crawl failed")?;
    let files = crawler
        .write_sitemap()
        .context("failed to write sitemap files")?;

    if !cli.quiet {
        print_statistics(&stats);
        println!();
        if files.is_empty() {
            println!("No pages qualified for the sitemap; nothing written");
        } else {
            println!("Sitemap files ({}):", files.len());
            for file in &files {
                println!("  - {}", file.display());
            }
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sitemap=info,warn"),
            1 => EnvFilter::new("sumi_sitemap=debug,info"),
            2 => EnvFilter::new("sumi_sitemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(domain) = &cli.domain {
        config.seed = Some(domain.clone());
    }
    if cli.parse_robots {
        config.crawler.parse_robots = true;
    }
    if let Some(max_urls) = cli.max_urls {
        config.crawler.max_urls = max_urls;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent.name = user_agent.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    config.crawler.exclude.extend(cli.excluded.iter().cloned());
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }

    Ok(config)
}
