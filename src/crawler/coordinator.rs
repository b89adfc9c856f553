//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates:
//! - Seeding and draining the frontier
//! - Dispatching page workers under the concurrency and pacing limits
//! - Feeding discovered links back into the frontier
//! - Run bookkeeping in the store

use crate::config::{config_fingerprint, Config, CrawlerConfig};
use crate::crawler::discover::discover_links;
use crate::crawler::extract::extract_course;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::reconcile::{Reconciler, Reconciliation};
use crate::crawler::scheduler::Scheduler;
use crate::model::CourseRecord;
use crate::state::PageState;
use crate::storage::{CourseStore, RunStats, StorageError};
use crate::url::{extract_domain, is_allowed_domain, normalize_url};
use crate::{ConfigError, WatchError};
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinSet;
use url::Url;

/// Result of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Run id in the store, if run bookkeeping succeeded
    pub run_id: Option<i64>,

    /// Courses not seen before, in discovery order
    pub new_courses: Vec<CourseRecord>,

    /// Pages fetched and parsed
    pub pages_fetched: u64,

    /// Pages that could not be fetched or were not HTML
    pub pages_failed: u64,

    /// Fetched pages that were not course pages
    pub pages_skipped: u64,

    /// Course pages already present in the store
    pub known_courses: u64,

    /// New courses whose insert failed
    pub unsaved_courses: u64,
}

impl CrawlOutcome {
    fn run_stats(&self) -> RunStats {
        RunStats {
            pages_fetched: self.pages_fetched,
            pages_failed: self.pages_failed,
            new_courses: self.new_courses.len() as u64,
        }
    }
}

/// What a worker learned about one page
struct PageReport {
    queued: QueuedUrl,
    state: PageState,
    links: Vec<Url>,
    reconciliation: Option<Reconciliation>,
}

/// Shared, read-only context of the page workers
struct PageWorker<S: CourseStore> {
    client: Client,
    scheduler: Arc<Scheduler>,
    reconciler: Arc<Reconciler<S>>,
    crawler: CrawlerConfig,
}

impl<S: CourseStore> PageWorker<S> {
    /// Fetches one page, discovers its links and reconciles its course
    ///
    /// The permit is held until the page is fully processed. Only a failed
    /// store read is returned as an error.
    async fn process(
        &self,
        queued: QueuedUrl,
        _permit: OwnedSemaphorePermit,
    ) -> Result<PageReport, StorageError> {
        self.scheduler.wait_turn(&queued.domain).await;
        tracing::debug!("Fetching {}", queued.url);

        let fetched = fetch_url(&self.client, &queued.url).await;

        let (links, course) = match &fetched {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let document = Html::parse_document(body);
                let links = discover_links(
                    &document,
                    final_url,
                    &self.crawler.detail_path_prefix,
                    &self.crawler.exclude_marker,
                );
                let course = extract_course(&document, queued.url.as_str());
                (links, course)
            }
            FetchResult::ContentMismatch { content_type } => {
                tracing::warn!("Skipping {}: expected HTML, got {:?}", queued.url, content_type);
                (Vec::new(), None)
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {}: HTTP {}", queued.url, status_code);
                (Vec::new(), None)
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Skipping {}: {}", queued.url, error);
                (Vec::new(), None)
            }
        };

        let state = fetched.page_state(course.is_some());
        match &course {
            Some(course) => tracing::debug!(
                "Extracted course {:?} with {} of 5 fields",
                course.title,
                course.populated_fields()
            ),
            None if state == PageState::NotCourse => {
                tracing::debug!("Not a course page: {}", queued.url)
            }
            None => {}
        }

        let reconciliation = match course {
            Some(course) => Some(self.reconciler.reconcile(course, queued.sequence)?),
            None => None,
        };

        Ok(PageReport {
            queued,
            state,
            links,
            reconciliation,
        })
    }
}

/// Main crawler coordinator structure
///
/// One coordinator drives exactly one run and is consumed by [`Coordinator::run`].
pub struct Coordinator<S: CourseStore + 'static> {
    config: Arc<Config>,
    frontier: Frontier,
    worker: Arc<PageWorker<S>>,
    outcome: CrawlOutcome,
}

impl<S: CourseStore + 'static> Coordinator<S> {
    /// Creates a new coordinator over `store`
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: Arc<Config>, store: S) -> Result<Self, WatchError> {
        let client = build_http_client(&config)?;
        let worker = PageWorker {
            client,
            scheduler: Arc::new(Scheduler::new(&config.crawler)),
            reconciler: Arc::new(Reconciler::new(store)),
            crawler: config.crawler.clone(),
        };

        Ok(Self {
            config,
            frontier: Frontier::new(),
            worker: Arc::new(worker),
            outcome: CrawlOutcome::default(),
        })
    }

    /// Runs the crawl until the frontier is drained
    ///
    /// 1. Seed the frontier with the root address
    /// 2. Dispatch every queued address as a page task, one permit each
    /// 3. Merge finished pages: state, discovered links, reconciliation
    /// 4. Stop when no address is queued and no task is outstanding
    ///
    /// Page-level failures are logged and skipped. A failed store read stops
    /// the run: outstanding tasks are aborted and the run is marked failed.
    pub async fn run(mut self) -> Result<CrawlOutcome, WatchError> {
        let root = normalize_url(&self.config.crawler.root_url)?;
        if !is_allowed_domain(&root, &self.config.crawler.allowed_domains) {
            return Err(ConfigError::Validation(format!(
                "root url {} is outside the allowed domains",
                root
            ))
            .into());
        }

        let run_id = self.start_run();
        self.outcome.run_id = run_id;
        tracing::info!("Starting crawl at {}", root);
        let start_time = std::time::Instant::now();

        let root_domain = extract_domain(&root).unwrap_or_default();
        self.frontier.push(root);
        let mut tasks = JoinSet::new();

        loop {
            while let Some(queued) = self.frontier.pop() {
                let Some(permit) = self.worker.scheduler.acquire().await else {
                    tracing::error!("Concurrency limiter closed, skipping {}", queued.url);
                    self.frontier.mark(&queued.url, PageState::Failed);
                    continue;
                };
                let worker = Arc::clone(&self.worker);
                tasks.spawn(async move { worker.process(queued, permit).await });
            }

            let Some(joined) = tasks.join_next().await else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            match joined {
                Ok(Ok(report)) => self.absorb(report),
                Ok(Err(e)) => {
                    tracing::error!("Store read failed, aborting run: {}", e);
                    tasks.abort_all();
                    self.tally();
                    self.finish_run(run_id, false);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!("Page task failed: {}", e);
                }
            }
        }

        self.tally();
        self.outcome.new_courses = self.worker.reconciler.take_new_courses();
        self.finish_run(run_id, true);

        tracing::info!(
            "Crawl completed in {:?}: {} pages fetched, {} failed, {} new courses, {} known",
            start_time.elapsed(),
            self.outcome.pages_fetched,
            self.outcome.pages_failed,
            self.outcome.new_courses.len(),
            self.outcome.known_courses
        );
        tracing::debug!(
            "{} requests sent to {}",
            self.worker.scheduler.requests_made(&root_domain),
            root_domain
        );

        Ok(self.outcome)
    }

    /// Merges a finished page into the frontier and the counters
    fn absorb(&mut self, report: PageReport) {
        tracing::trace!("{} -> {}", report.queued.url, report.state);
        self.frontier.mark(&report.queued.url, report.state);

        match report.reconciliation {
            Some(Reconciliation::Known) => self.outcome.known_courses += 1,
            Some(Reconciliation::NewUnsaved(_)) => self.outcome.unsaved_courses += 1,
            Some(Reconciliation::New) | None => {}
        }

        for link in report.links {
            if !is_allowed_domain(&link, &self.config.crawler.allowed_domains) {
                tracing::debug!("Ignoring out-of-domain link {}", link);
                continue;
            }
            let queued_url = link.to_string();
            if self.frontier.push(link) {
                tracing::debug!("Queued {}", queued_url);
            }
        }
    }

    /// Derives the page counters from the frontier states
    fn tally(&mut self) {
        let frontier = &self.frontier;

        self.outcome.pages_fetched = frontier.count_matching(|s| s.is_success()) as u64;
        self.outcome.pages_skipped = frontier.count(PageState::NotCourse) as u64;
        // Pages still marked as fetching belong to tasks that panicked or were aborted
        self.outcome.pages_failed = frontier
            .count_matching(|s| s.is_error() || s == PageState::Fetching)
            as u64;
    }

    fn start_run(&self) -> Option<i64> {
        let fingerprint = match config_fingerprint(&self.config.crawler) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                tracing::warn!("Could not fingerprint configuration: {}", e);
                String::new()
            }
        };

        match self
            .worker
            .reconciler
            .with_store(|store| store.create_run(&fingerprint))
        {
            Ok(run_id) => {
                tracing::debug!("Recording as run {}", run_id);
                Some(run_id)
            }
            Err(e) => {
                tracing::error!("Failed to record run start: {}", e);
                None
            }
        }
    }

    fn finish_run(&self, run_id: Option<i64>, completed: bool) {
        let Some(run_id) = run_id else {
            return;
        };
        let stats = self.outcome.run_stats();
        let result = self.worker.reconciler.with_store(|store| {
            if completed {
                store.complete_run(run_id, &stats)
            } else {
                store.fail_run(run_id, &stats)
            }
        });
        if let Err(e) = result {
            tracing::error!("Failed to record end of run {}: {}", run_id, e);
        }
    }
}
