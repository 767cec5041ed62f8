//! Scheduler for claiming rounds of URLs and bounding concurrency
//!
//! This module handles:
//! - Draining the frontier into a round of claimed URLs
//! - Stopping claims once the URL cap is exceeded
//! - Global concurrency limiting via a semaphore

use crate::state::CrawlState;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// URLs claimed for one round of fetching
#[derive(Debug, Default)]
pub struct Round {
    /// Claimed URLs, in claim order
    pub urls: Vec<String>,

    /// True if claiming stopped because the URL cap was exceeded
    pub capped: bool,
}

/// Scheduler hands out rounds of work and fetch permits
///
/// Every task of a round waits for a permit before fetching, which keeps at
/// most `workers` requests in flight.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Maximum number of URLs claimed over the whole crawl
    max_urls: u64,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `workers` - Maximum concurrent fetches
    /// * `max_urls` - Claim cap for the crawl
    pub fn new(workers: usize, max_urls: u64) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            max_urls,
        }
    }

    /// Claims every URL currently in the frontier
    ///
    /// Each claim moves the URL to the visited set before any request is made.
    /// The claim that pushes the claimed count past the cap is kept out of the
    /// round, and claiming stops there.
    pub fn claim_round(&self, state: &mut CrawlState) -> Round {
        let mut round = Round::default();

        while let Some(url) = state.claim_next() {
            if state.claims_exceeded(self.max_urls) {
                tracing::debug!("URL cap of {} reached while claiming", self.max_urls);
                round.capped = true;
                break;
            }
            round.urls.push(url);
        }

        round
    }

    /// Waits for a fetch permit
    ///
    /// Returns None only if the semaphore was closed.
    pub async fn acquire(semaphore: Arc<Semaphore>) -> Option<OwnedSemaphorePermit> {
        semaphore.acquire_owned().await.ok()
    }

    /// Returns a handle to the fetch semaphore
    pub fn semaphore(&self) -> Arc<Semaphore> {
        Arc::clone(&self.semaphore)
    }

    /// Returns the number of fetch permits currently free
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
