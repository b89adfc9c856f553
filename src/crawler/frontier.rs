//! Crawl frontier with per-run deduplication
//!
//! The frontier is owned by the coordinator loop, so it needs no locking.
//! Every admitted address keeps a `PageState` for the rest of the run, which
//! doubles as the visited set.

use crate::state::PageState;
use crate::url::extract_domain;
use std::collections::{HashMap, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: Url,

    /// The domain of this URL
    pub domain: String,

    /// Admission order within the run; the report is sorted by it
    pub sequence: usize,
}

/// FIFO queue of addresses still to fetch plus the state of every address seen
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    pages: HashMap<String, PageState>,
    next_sequence: usize,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a URL unless it was already seen this run
    ///
    /// Returns true if the URL was queued. URLs without a host are refused.
    pub fn push(&mut self, url: Url) -> bool {
        let Some(domain) = extract_domain(&url) else {
            return false;
        };
        if self.pages.contains_key(url.as_str()) {
            return false;
        }

        self.pages.insert(url.to_string(), PageState::Queued);
        self.queue.push_back(QueuedUrl {
            url,
            domain,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        true
    }

    /// Takes the next URL to fetch and marks it as fetching
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        let queued = self.queue.pop_front()?;
        self.pages
            .insert(queued.url.to_string(), PageState::Fetching);
        Some(queued)
    }

    /// Records the final state of a fetched address
    pub fn mark(&mut self, url: &Url, state: PageState) {
        self.pages.insert(url.to_string(), state);
    }

    /// Returns the state of an address, if it was ever admitted
    pub fn state_of(&self, url: &Url) -> Option<PageState> {
        self.pages.get(url.as_str()).copied()
    }

    /// Number of addresses in the given state
    pub fn count(&self, state: PageState) -> usize {
        self.count_matching(|s| s == state)
    }

    /// Number of addresses whose state satisfies `predicate`
    pub fn count_matching(&self, predicate: impl Fn(PageState) -> bool) -> usize {
        self.pages.values().filter(|s| predicate(**s)).count()
    }

    /// Number of addresses admitted this run
    pub fn seen(&self) -> usize {
        self.pages.len()
    }

    /// Returns the number of URLs waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether no URL is waiting to be fetched
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_push_and_pop_in_order() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(url("/a")));
        assert!(frontier.push(url("/b")));
        assert_eq!(frontier.len(), 2);

        let first = frontier.pop().unwrap();
        assert_eq!(first.url, url("/a"));
        assert_eq!(first.domain, "example.com");
        assert_eq!(first.sequence, 0);
        assert_eq!(frontier.pop().unwrap().sequence, 1);
        assert!(frontier.pop().is_none());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_duplicates_are_refused() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(url("/a")));
        assert!(!frontier.push(url("/a")));

        frontier.pop();
        assert!(!frontier.push(url("/a")));
        assert_eq!(frontier.seen(), 1);
    }

    #[test]
    fn test_state_transitions() {
        let mut frontier = Frontier::new();
        frontier.push(url("/a"));
        assert_eq!(frontier.state_of(&url("/a")), Some(PageState::Queued));

        let queued = frontier.pop().unwrap();
        assert_eq!(frontier.state_of(&queued.url), Some(PageState::Fetching));

        frontier.mark(&queued.url, PageState::Processed);
        assert_eq!(frontier.count(PageState::Processed), 1);
        assert_eq!(frontier.count(PageState::Fetching), 0);
        assert_eq!(frontier.count_matching(|s| s.is_terminal()), 1);
        assert_eq!(frontier.state_of(&url("/other")), None);
    }
}
