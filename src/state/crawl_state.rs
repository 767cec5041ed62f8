use crate::url::ExclusionSet;
use std::collections::{HashMap, HashSet};

/// Metadata collected for a claimed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Canonical URL
    pub loc: String,

    /// `Last-Modified` header of a successful fetch, verbatim
    pub lastmod: Option<String>,
}

impl UrlRecord {
    /// Creates a record with no modification time
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
        }
    }
}

/// Shared mutable state of one crawl
///
/// Holds the frontier, the visited (claimed) set, the exclusion set, per-URL
/// metadata and the ordered list of pages that go into the sitemap. Every
/// method is synchronous; the engine keeps the state behind a single mutex and
/// never holds it across an await point.
///
/// The frontier is drained last-in first-out.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// URLs waiting to be claimed
    frontier: Vec<String>,

    /// Mirror of `frontier` for constant-time duplicate checks
    pending: HashSet<String>,

    /// URLs ever claimed
    visited: HashSet<String>,

    exclusions: ExclusionSet,

    records: HashMap<String, UrlRecord>,

    /// Pages to list in the sitemap, in completion order
    for_sitemap: Vec<String>,

    /// URLs claimed so far
    num_crawled: u64,

    /// URLs enqueued during the current round
    num_urls: u64,

    /// Links seen on fetched pages, before filtering
    count_all: u64,
}

impl CrawlState {
    /// Creates a state with `seed` queued
    pub fn new(seed: impl Into<String>, exclusions: ExclusionSet) -> Self {
        let seed = seed.into();
        let mut state = Self {
            exclusions,
            ..Self::default()
        };
        state.pending.insert(seed.clone());
        state.frontier.push(seed);
        state
    }

    /// Claims the most recently queued URL
    ///
    /// The URL moves to the visited set and gets a metadata record before any
    /// request is made, so it can never be claimed twice.
    pub fn claim_next(&mut self) -> Option<String> {
        let url = self.frontier.pop()?;
        self.pending.remove(&url);
        self.visited.insert(url.clone());
        self.num_crawled += 1;
        self.records.insert(url.clone(), UrlRecord::new(url.clone()));
        Some(url)
    }

    /// Returns true if the URL was already claimed or is waiting in the frontier
    pub fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.pending.contains(url)
    }

    /// Queues a URL unless it is already known
    ///
    /// Returns true if the URL was added. Counts towards this round's discoveries.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.is_known(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.frontier.push(url);
        self.num_urls += 1;
        true
    }

    /// Resets the per-round discovery counter
    pub fn start_round(&mut self) {
        self.num_urls = 0;
    }

    /// Records a page that was fetched directly and belongs in the sitemap
    pub fn record_fetched(&mut self, url: &str, lastmod: Option<String>) {
        self.for_sitemap.push(url.to_string());
        let record = self
            .records
            .entry(url.to_string())
            .or_insert_with(|| UrlRecord::new(url));
        if lastmod.is_some() {
            record.lastmod = lastmod;
        }
    }

    /// Counts one link seen on a page
    pub fn record_link_seen(&mut self) {
        self.count_all += 1;
    }

    /// Returns true if claimed plus newly discovered URLs exceed `max_urls`
    pub fn cap_exceeded(&self, max_urls: u64) -> bool {
        self.num_crawled.saturating_add(self.num_urls) > max_urls
    }

    /// Returns true if the claimed count alone exceeds `max_urls`
    pub fn claims_exceeded(&self, max_urls: u64) -> bool {
        self.num_crawled > max_urls
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut ExclusionSet {
        &mut self.exclusions
    }

    /// Returns the number of URLs waiting in the frontier
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Returns a copy of the URLs waiting in the frontier
    pub fn frontier(&self) -> Vec<String> {
        self.frontier.clone()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn num_crawled(&self) -> u64 {
        self.num_crawled
    }

    pub fn num_urls(&self) -> u64 {
        self.num_urls
    }

    pub fn count_all(&self) -> u64 {
        self.count_all
    }

    /// Returns the URLs destined for the sitemap, in order
    pub fn for_sitemap(&self) -> &[String] {
        &self.for_sitemap
    }

    /// Returns the record stored for a claimed URL
    pub fn record(&self, url: &str) -> Option<&UrlRecord> {
        self.records.get(url)
    }

    /// Returns the sitemap records in sitemap order
    pub fn sitemap_records(&self) -> Vec<UrlRecord> {
        self.for_sitemap
            .iter()
            .filter_map(|url| self.record(url).cloned())
            .collect()
    }
}
