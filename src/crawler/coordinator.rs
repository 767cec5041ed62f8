//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the round loop that coordinates all aspects of the
//! crawl, including:
//! - Preparing the seed and the shared crawl state
//! - Fetching robots.txt when robots filtering is enabled
//! - Claiming rounds and running one task per claimed URL
//! - Feeding discovered links back into the frontier until it empties or the
//!   URL cap is exceeded
//! - Handing the collected pages to the sitemap writer

use crate::config::{validate, validate_seed, Config};
use crate::crawler::filter::{Eligibility, LinkFilter};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::{build_http_client, extract_links, fetch_url, FetchOutcome};
use crate::output::{write_sitemaps, CrawlStatistics};
use crate::robots::fetch_robots;
use crate::state::{CrawlState, EngineState, UrlRecord};
use crate::url::{extract_host, resolve_link, ExclusionSet};
use crate::{ConfigError, SumiError, UrlError};
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Locks the crawl state, recovering the data if a task panicked while holding it
fn lock_state(state: &Mutex<CrawlState>) -> MutexGuard<'_, CrawlState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-domain crawl engine
///
/// Construction only parses and validates; no request is made until
/// [`Crawler::validate_seed`] or [`Crawler::run`] is awaited.
///
/// # Example
///
/// ```no_run
/// use sumi_sitemap::{Config, Crawler};
///
/// # async fn example() -> Result<(), sumi_sitemap::SumiError> {
/// let mut config = Config::default();
/// config.seed = Some("https://example.com/".to_string());
///
/// let mut crawler = Crawler::new(config)?;
/// crawler.validate_seed().await?;
/// let stats = crawler.run().await?;
/// let files = crawler.write_sitemap()?;
/// println!("{} pages in {} file(s)", stats.pages_in_sitemap, files.len());
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    config: Config,
    seed: Url,
    state: Arc<Mutex<CrawlState>>,
    engine_state: EngineState,
}

impl Crawler {
    /// Creates a new crawler from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run, with the seed queued
    /// * `Err(SumiError)` - The configuration is invalid or has no seed
    pub fn new(config: Config) -> Result<Self, SumiError> {
        validate(&config)?;

        let seed = config
            .seed
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("a seed URL is required".to_string()))?;
        let seed = prepare_seed(seed)?;

        let exclusions: ExclusionSet = config.crawler.exclude.iter().cloned().collect();
        let state = CrawlState::new(seed.as_str(), exclusions);

        Ok(Self {
            config,
            seed,
            state: Arc::new(Mutex::new(state)),
            engine_state: EngineState::Idle,
        })
    }

    /// Probes the seed URL with a single GET
    ///
    /// Any HTTP response counts as reachable; only transport failures are errors.
    pub async fn validate_seed(&self) -> Result<(), SumiError> {
        let client = build_http_client(&self.config)?;
        let response = client
            .get(self.seed.clone())
            .send()
            .await
            .map_err(|source| SumiError::Http {
                url: self.seed.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Seed {} answered {}", self.seed, status);
        } else {
            tracing::warn!("Seed {} answered {}", self.seed, status);
        }
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// Rounds are claimed and fetched until the frontier is empty or the URL
    /// cap is exceeded. A crawler runs once; calling this again is an
    /// [`SumiError::InvalidTransition`].
    pub async fn run(&mut self) -> Result<CrawlStatistics, SumiError> {
        self.transition(EngineState::Running)?;

        let started_at = Utc::now();
        let start_time = Instant::now();
        tracing::info!("Starting crawl of {}", self.seed);

        let client = build_http_client(&self.config)?;
        let mut filter = LinkFilter::new(&self.seed, self.config.user_agent.name.as_str())?;
        if self.config.crawler.parse_robots {
            let robots = fetch_robots(&client, &self.seed).await?;
            filter = filter.with_robots(robots);
        }

        let scheduler = Scheduler::new(self.config.crawler.workers, self.config.crawler.max_urls);
        let context = Arc::new(TaskContext {
            client,
            filter,
            state: Arc::clone(&self.state),
            max_urls: self.config.crawler.max_urls,
        });

        let mut rounds = 0u64;
        let stop = loop {
            let round = {
                let mut state = lock_state(&self.state);
                state.start_round();
                scheduler.claim_round(&mut state)
            };

            if !round.urls.is_empty() {
                rounds += 1;
                tracing::debug!("Round {}: {} URLs", rounds, round.urls.len());
                run_round(&context, &scheduler, round.urls).await;

                let state = lock_state(&self.state);
                tracing::info!(
                    "Progress: {} URLs claimed, {} new, {} in sitemap, {} in frontier, {:.1}s elapsed",
                    state.num_crawled(),
                    state.num_urls(),
                    state.for_sitemap().len(),
                    state.frontier_len(),
                    start_time.elapsed().as_secs_f64()
                );
            }

            if round.capped {
                break EngineState::Capped;
            }
            if lock_state(&self.state).frontier_len() == 0 {
                break EngineState::Draining;
            }
        };
        self.transition(stop)?;

        // Dropping the last handle to the client closes the HTTP session
        drop(context);
        self.transition(EngineState::Done)?;

        let state = lock_state(&self.state);
        let stats = CrawlStatistics {
            started_at,
            finished_at: Utc::now(),
            elapsed: start_time.elapsed(),
            rounds,
            urls_claimed: state.num_crawled(),
            links_seen: state.count_all(),
            pages_in_sitemap: state.for_sitemap().len() as u64,
            excluded: state.exclusions().len() as u64,
            stop_reason: stop,
        };

        tracing::info!(
            "Crawl {} after {} rounds: {} pages in {:?}",
            stop,
            rounds,
            stats.pages_in_sitemap,
            stats.elapsed
        );

        Ok(stats)
    }

    /// Writes the sitemap files into the configured output directory
    ///
    /// # Returns
    ///
    /// Paths of the written files, first file first. Empty if no page qualified.
    pub fn write_sitemap(&self) -> Result<Vec<PathBuf>, SumiError> {
        self.write_sitemap_to(Path::new(&self.config.output.directory))
    }

    /// Writes the sitemap files into `directory`
    pub fn write_sitemap_to(&self, directory: &Path) -> Result<Vec<PathBuf>, SumiError> {
        if !self.engine_state.is_terminal() {
            tracing::warn!(
                "Writing sitemap while the crawl is {}; the page list may be incomplete",
                self.engine_state
            );
        }
        let host = extract_host(&self.seed).ok_or(UrlError::MissingDomain)?;
        let records = self.sitemap_records();
        write_sitemaps(directory, &host, &records)
    }

    /// Returns the normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Returns the current lifecycle state
    pub fn engine_state(&self) -> EngineState {
        self.engine_state
    }

    /// Returns the records of every page destined for the sitemap, in order
    pub fn sitemap_records(&self) -> Vec<UrlRecord> {
        lock_state(&self.state).sitemap_records()
    }

    /// Returns the URLs still waiting in the frontier
    pub fn frontier(&self) -> Vec<String> {
        lock_state(&self.state).frontier()
    }

    /// Returns the number of URLs claimed so far
    pub fn num_crawled(&self) -> u64 {
        lock_state(&self.state).num_crawled()
    }

    fn transition(&mut self, next: EngineState) -> Result<(), SumiError> {
        if !self.engine_state.can_transition_to(next) {
            return Err(SumiError::InvalidTransition {
                from: self.engine_state,
                to: next,
            });
        }
        tracing::trace!("Engine {} -> {}", self.engine_state, next);
        self.engine_state = next;
        Ok(())
    }
}

/// Validates a seed URL and gives its path a trailing slash
fn prepare_seed(seed: &str) -> Result<Url, SumiError> {
    let mut url = validate_seed(seed)?;
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Everything a crawl task needs, shared by all tasks of a run
struct TaskContext {
    client: Client,
    filter: LinkFilter,
    state: Arc<Mutex<CrawlState>>,
    max_urls: u64,
}

impl TaskContext {
    /// Fetches one claimed URL and queues the links it yields
    async fn crawl(&self, url: String) {
        let parsed = match Url::parse(&url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Dropping unparseable URL {}: {}", url, e);
                return;
            }
        };

        if lock_state(&self.state).exclusions().matches(&url) {
            tracing::debug!("Skipping excluded URL {}", url);
            return;
        }

        match fetch_url(&self.client, &parsed).await {
            FetchOutcome::Skipped => {
                tracing::debug!("Skipping non-HTML URL {}", url);
            }
            FetchOutcome::TransportError { error } => {
                tracing::debug!("Excluding {} after transport error: {}", url, error);
                lock_state(&self.state).exclusions_mut().insert(url);
            }
            FetchOutcome::Rejected { status_code } => {
                tracing::debug!("Dropping {}: HTTP {}", url, status_code);
            }
            FetchOutcome::BodyError { error } => {
                tracing::debug!("Dropping {}: body read failed: {}", url, error);
            }
            FetchOutcome::Fetched {
                body,
                final_url,
                last_modified,
            } => {
                if final_url != url {
                    tracing::debug!("Dropping {}: served from {}", url, final_url);
                    return;
                }

                let links = extract_links(&body);
                let mut state = lock_state(&self.state);
                state.record_fetched(&url, last_modified);
                self.enqueue_links(&mut state, &parsed, links);
            }
        }
    }

    /// Resolves, filters and queues links found on `page`
    ///
    /// Stops early once this round's discoveries push the crawl past the cap.
    fn enqueue_links(&self, state: &mut CrawlState, page: &Url, links: Vec<String>) {
        for href in links {
            state.record_link_seen();

            let link = match resolve_link(&href, page) {
                Ok(link) => link,
                Err(e) => {
                    tracing::trace!("Skipping link {:?} on {}: {}", href, page, e);
                    continue;
                }
            };

            if state.is_known(link.as_str()) {
                continue;
            }

            let verdict = self.filter.check(&link, state.exclusions_mut());
            if verdict != Eligibility::Eligible {
                tracing::trace!("Not queuing {}: {:?}", link, verdict);
                continue;
            }

            state.enqueue(link.as_str());
            if state.cap_exceeded(self.max_urls) {
                tracing::debug!("URL cap of {} reached on {}", self.max_urls, page);
                return;
            }
        }
    }
}

/// Runs one task per URL and waits for all of them
async fn run_round(context: &Arc<TaskContext>, scheduler: &Scheduler, urls: Vec<String>) {
    let mut tasks = JoinSet::new();

    for url in urls {
        let context = Arc::clone(context);
        let semaphore = scheduler.semaphore();
        tasks.spawn(async move {
            let Some(_permit) = Scheduler::acquire(semaphore).await else {
                return;
            };
            context.crawl(url).await;
        });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::warn!("Crawl task failed: {}", e);
        }
    }
}
