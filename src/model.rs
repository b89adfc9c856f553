//! Course record model
//!
//! A `CourseRecord` is built per detail page by the field extractor, checked
//! against the store by the coordinator and, when new, handed to the report
//! formatter at the end of the run.

use serde::{Deserialize, Serialize};

/// One entry of the course catalog
///
/// Optional fields hold an empty string when the row is missing from the
/// page. A row that is present but blank produces the same empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Canonical detail-page address; unique key in the store
    pub address: String,

    /// Course title; never empty for an extracted record
    pub title: String,

    /// "Lugar de impartición"
    pub location: String,

    /// "Período de impartición"
    pub period: String,

    /// "Horario de impartición"
    pub schedule: String,

    /// "Plazas disponibles"
    pub available_slots: String,

    /// "Importe"
    pub cost: String,
}

impl CourseRecord {
    /// Creates a record with only the key and title set
    pub fn new(address: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns the number of optional fields that carry a value
    pub fn populated_fields(&self) -> usize {
        [
            &self.location,
            &self.period,
            &self.schedule,
            &self.available_slots,
            &self.cost,
        ]
        .iter()
        .filter(|value| !value.is_empty())
        .count()
    }
}
