//! Crawler module for catalog fetching and course detection
//!
//! This module contains the core crawl-and-diff logic, including:
//! - HTTP fetching and outcome classification
//! - Detail-link discovery and course field extraction
//! - Concurrency limiting and per-domain pacing
//! - Reconciliation of extracted courses against the store
//! - Overall crawl coordination

mod coordinator;
mod discover;
mod extract;
mod fetcher;
mod frontier;
mod reconcile;
mod scheduler;

pub use coordinator::{Coordinator, CrawlOutcome};
pub use discover::discover_links;
pub use extract::extract_course;
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use frontier::{Frontier, QueuedUrl};
pub use reconcile::{Reconciler, Reconciliation};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::notify::Notifier;
use crate::output::format_report;
use crate::storage::CourseStore;
use crate::WatchError;
use std::sync::Arc;

/// Runs one complete crawl against `store`
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client
/// 2. Crawl from the root address until the frontier is drained
/// 3. Store every course the store did not know yet
/// 4. Return the new courses in discovery order
///
/// # Example
///
/// ```no_run
/// use course_watch::config::Config;
/// use course_watch::crawler::crawl;
/// use course_watch::storage::SqliteStorage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStorage::new_in_memory()?;
/// let outcome = crawl(&Config::default(), store).await?;
/// println!("{} new courses", outcome.new_courses.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl<S>(config: &Config, store: S) -> Result<CrawlOutcome, WatchError>
where
    S: CourseStore + 'static,
{
    Coordinator::new(Arc::new(config.clone()), store)?
        .run()
        .await
}

/// Crawls, then announces the new courses through `notifier`
///
/// The notifier is not called at all when nothing is new. A failed send is
/// logged and does not fail the run.
pub async fn run_watch<S, N>(
    config: &Config,
    store: S,
    notifier: &N,
) -> Result<CrawlOutcome, WatchError>
where
    S: CourseStore + 'static,
    N: Notifier + ?Sized,
{
    let outcome = crawl(config, store).await?;

    match format_report(&outcome.new_courses) {
        Some(message) => match notifier.send(&message).await {
            Ok(()) => tracing::info!(
                "Announced {} new courses",
                outcome.new_courses.len()
            ),
            Err(e) => tracing::error!("Failed to send notification: {}", e),
        },
        None => tracing::info!("No new courses"),
    }

    Ok(outcome)
}
