//! Statistics from the course database
//!
//! This module provides functionality for extracting and displaying what
//! the store knows: how many courses, how the last run went, and which
//! courses were added most recently.

use crate::model::CourseRecord;
use crate::storage::{CourseStore, RunRecord, StorageResult};
use chrono::{DateTime, Utc};

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct CourseStatistics {
    /// Total number of courses ever stored
    pub total_courses: u64,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,

    /// Most recently stored courses, newest first
    pub recent_courses: Vec<CourseRecord>,
}

impl CourseStatistics {
    /// Duration of the latest run in seconds, when it has finished
    pub fn latest_run_seconds(&self) -> Option<i64> {
        let run = self.latest_run.as_ref()?;
        let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
        let finished = run.finished_at.as_ref()?.parse::<DateTime<Utc>>().ok()?;
        Some((finished - started).num_seconds())
    }
}

/// Loads statistics from storage
///
/// `recent` bounds the number of courses listed.
pub fn load_statistics(store: &dyn CourseStore, recent: usize) -> StorageResult<CourseStatistics> {
    Ok(CourseStatistics {
        total_courses: store.count_courses()?,
        latest_run: store.get_latest_run()?,
        recent_courses: store.recent_courses(recent)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CourseStatistics) {
    println!("=== Course Statistics ===\n");

    println!("Overview:");
    println!("  Courses stored: {}", stats.total_courses);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run (#{}):", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            if let Some(seconds) = stats.latest_run_seconds() {
                println!("  Duration: {}s", seconds);
            }
            println!("  Pages fetched: {}", run.pages_fetched);
            println!("  Pages failed: {}", run.pages_failed);
            println!("  New courses: {}", run.new_courses);
        }
        None => println!("No crawl runs recorded yet."),
    }
    println!();

    if !stats.recent_courses.is_empty() {
        println!("Recent Courses:");
        for course in &stats.recent_courses {
            println!("  - {} ({})", course.title, course.address);
        }
    }
}
