//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CourseStore trait.

use crate::model::CourseRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CourseStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStats, RunStatus};
use crate::WatchError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const COURSE_COLUMNS: &str = "url, titulo, lugar, periodo, hora, plazas, costo";

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, pages_fetched, pages_failed, new_courses";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and initializes the schema
    pub fn new(path: &Path) -> Result<Self, WatchError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, WatchError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<CourseRecord> {
    Ok(CourseRecord {
        address: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        location: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        period: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        schedule: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        available_slots: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        cost: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        pages_fetched: row.get::<_, i64>(5)? as u64,
        pages_failed: row.get::<_, i64>(6)? as u64,
        new_courses: row.get::<_, i64>(7)? as u64,
    })
}

impl SqliteStorage {
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats: &RunStats) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3,
             pages_failed = ?4, new_courses = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                stats.pages_fetched as i64,
                stats.pages_failed as i64,
                stats.new_courses as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

impl CourseStore for SqliteStorage {
    // ===== Courses =====

    fn exists(&self, address: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cursos WHERE url = ?1)",
            params![address],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert(&mut self, course: &CourseRecord) -> StorageResult<()> {
        let result = self.conn.execute(
            &format!("INSERT INTO cursos ({COURSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                course.address,
                course.title,
                course.location,
                course.period,
                course.schedule,
                course.available_slots,
                course.cost
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::ConstraintViolation(format!(
                    "course {} already stored",
                    course.address
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_course(&self, address: &str) -> StorageResult<Option<CourseRecord>> {
        let course = self
            .conn
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM cursos WHERE url = ?1"),
                params![address],
                course_from_row,
            )
            .optional()?;
        Ok(course)
    }

    fn count_courses(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cursos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn recent_courses(&self, limit: usize) -> StorageResult<Vec<CourseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM cursos ORDER BY id DESC LIMIT ?1"
        ))?;

        let courses = stmt
            .query_map(params![limit as i64], course_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(courses)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, stats)
    }

    fn fail_run(&mut self, run_id: i64, stats: &RunStats) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, stats)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY id DESC LIMIT 1"),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }
}
