//! Storage traits and error types
//!
//! This module defines the trait interface for the record store and its
//! error type.

use crate::model::CourseRecord;
use crate::storage::{RunRecord, RunStats};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// The store is keyed by course address. `insert` never duplicates an
/// address: a second insert for the same key fails with
/// `StorageError::ConstraintViolation`.
///
/// The coordinator serializes access through a mutex, so implementations only
/// need to be `Send`.
pub trait CourseStore: Send {
    // ===== Courses =====

    /// Returns true if a course with this address is already stored
    fn exists(&self, address: &str) -> StorageResult<bool>;

    /// Persists a new course
    fn insert(&mut self, course: &CourseRecord) -> StorageResult<()>;

    /// Loads a stored course by address
    fn get_course(&self, address: &str) -> StorageResult<Option<CourseRecord>>;

    /// Counts stored courses
    fn count_courses(&self) -> StorageResult<u64>;

    /// Returns the most recently stored courses, newest first
    fn recent_courses(&self, limit: usize) -> StorageResult<Vec<CourseRecord>>;

    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Fingerprint of the crawler settings
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as completed with its counters and a finish timestamp
    fn complete_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()>;

    /// Marks a run as failed with a finish timestamp
    fn fail_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
