//! Output module for reports and store summaries
//!
//! This module handles:
//! - Rendering the new-course notification text
//! - Reading and printing statistics from the course database

mod report;
pub mod stats;

pub use report::{format_report, REPORT_HEADER};
pub use stats::{load_statistics, print_statistics, CourseStatistics};
