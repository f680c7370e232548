//! Semester record, as provided by the surrounding system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::SemesterId;
use crate::week::{WeekNumber, WeekParity};

/// A semester. Read-only input to the engine; created and edited elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    /// Unique identifier
    pub id: SemesterId,

    /// Display name, e.g. "2025 Fall"
    pub name: String,

    /// First day of the semester
    pub start_date: NaiveDate,

    /// Last day of the semester
    pub end_date: NaiveDate,

    /// Calendar parity that template week 1 corresponds to
    pub first_week_parity: WeekParity,
}

impl Semester {
    /// Resolve a template week number to its calendar parity.
    ///
    /// Week 1 inherits the semester's declared parity; week 2 is the opposite.
    pub fn parity_of(&self, week: WeekNumber) -> WeekParity {
        match week {
            WeekNumber::One => self.first_week_parity,
            WeekNumber::Two => self.first_week_parity.flipped(),
        }
    }
}
