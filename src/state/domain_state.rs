use std::time::{Duration, Instant};

/// Tracks the pacing of requests to one domain
///
/// Request slots are handed out in order: each reservation starts at least
/// `min_delay` after the previous one, regardless of how many workers ask at
/// the same time.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Start time of the latest reserved request slot
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + min_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// The slot is recorded immediately, so a second caller reserving before
    /// the first has slept is pushed a further `min_delay` back.
    pub fn reserve_slot(&mut self, min_delay: Duration, now: Instant) -> Duration {
        let wait = self
            .time_until_next_request(min_delay, now)
            .unwrap_or(Duration::ZERO);
        self.request_count += 1;
        self.last_request_time = Some(now + wait);
        wait
    }
}
