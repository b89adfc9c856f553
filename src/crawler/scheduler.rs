//! Concurrency limiting and per-domain pacing
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Per-domain request spacing (the configured minimum delay)
//! - Per-domain request counting

use crate::config::CrawlerConfig;
use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Scheduler shared by all fetch workers of one crawl
///
/// The scheduler coordinates:
/// - Global concurrency limits (max requests in flight)
/// - Per-domain rate limits (minimum time between request starts)
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Per-domain state tracking
    domain_states: Mutex<HashMap<String, DomainState>>,

    /// Minimum spacing between two requests to the same domain
    min_delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        let permits = config.max_concurrent_requests.max(1) as usize;
        Self {
            global_semaphore: Arc::new(Semaphore::new(permits)),
            domain_states: Mutex::new(HashMap::new()),
            min_delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Waits for a free concurrency slot
    ///
    /// The returned permit must be held for the whole fetch. Returns None
    /// only if the semaphore was closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.global_semaphore.clone().acquire_owned().await.ok()
    }

    /// Waits until a request to `domain` may start
    ///
    /// The slot is reserved before sleeping, so concurrent callers for the
    /// same domain are spaced at least `min_delay` apart.
    pub async fn wait_turn(&self, domain: &str) {
        let now = Instant::now();
        let wait = {
            let mut states = self
                .domain_states
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            states
                .entry(domain.to_string())
                .or_insert_with(DomainState::new)
                .reserve_slot(self.min_delay, now)
        };

        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before requesting {}", wait, domain);
            tokio::time::sleep_until(tokio::time::Instant::from_std(now + wait)).await;
        }
    }

    /// Number of requests started against `domain` so far
    pub fn requests_made(&self, domain: &str) -> u32 {
        self.domain_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }

    /// Number of fetches that may start right now
    pub fn available_permits(&self) -> usize {
        self.global_semaphore.available_permits()
    }

    /// Configured minimum spacing between requests to one domain
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}
