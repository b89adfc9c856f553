//! New-versus-known reconciliation against the course store
//!
//! The existence check, the insert and the append to the new-course list
//! happen under one lock, so two workers holding the same address cannot
//! both see it as absent.

use crate::model::CourseRecord;
use crate::storage::{CourseStore, StorageError};
use std::sync::{Mutex, PoisonError};

/// What reconciliation decided for one extracted course
#[derive(Debug)]
pub enum Reconciliation {
    /// Not in the store before; now stored and queued for the report
    New,

    /// Not in the store before; the insert failed but the course is still reported
    NewUnsaved(StorageError),

    /// Already in the store; nothing to do
    Known,
}

impl Reconciliation {
    /// Returns true if the course goes into this run's report
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New | Self::NewUnsaved(_))
    }
}

struct Ledger<S> {
    store: S,
    new_courses: Vec<(usize, CourseRecord)>,
}

/// Serializes store access for all page workers and collects new courses
pub struct Reconciler<S: CourseStore> {
    ledger: Mutex<Ledger<S>>,
}

impl<S: CourseStore> Reconciler<S> {
    /// Wraps a store for the duration of one run
    pub fn new(store: S) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                store,
                new_courses: Vec::new(),
            }),
        }
    }

    /// Checks a course against the store and records it when absent
    ///
    /// `sequence` is the frontier admission order of the course's page; it
    /// orders the final new-course list.
    ///
    /// # Errors
    ///
    /// Only a failed existence check is returned as an error. A failed
    /// insert is logged and reported as `Reconciliation::NewUnsaved`.
    pub fn reconcile(
        &self,
        course: CourseRecord,
        sequence: usize,
    ) -> Result<Reconciliation, StorageError> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);

        if ledger.store.exists(&course.address)? {
            tracing::debug!("Known course: {}", course.address);
            return Ok(Reconciliation::Known);
        }

        let outcome = match ledger.store.insert(&course) {
            Ok(()) => Reconciliation::New,
            Err(e) => {
                tracing::error!("Failed to store course {}: {}", course.address, e);
                Reconciliation::NewUnsaved(e)
            }
        };

        tracing::info!("New course: {} ({})", course.title, course.address);
        ledger.new_courses.push((sequence, course));
        Ok(outcome)
    }

    /// Runs `f` with exclusive access to the store
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ledger.store)
    }

    /// Number of new courses collected so far
    pub fn new_count(&self) -> usize {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .new_courses
            .len()
    }

    /// Drains the new courses, ordered by discovery sequence
    pub fn take_new_courses(&self) -> Vec<CourseRecord> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        let mut courses = std::mem::take(&mut ledger.new_courses);
        courses.sort_by_key(|(sequence, _)| *sequence);
        courses.into_iter().map(|(_, course)| course).collect()
    }
}
