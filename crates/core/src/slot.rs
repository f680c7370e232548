//! Recurring duty-slot templates.

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::id::{SemesterId, TimeSlotId};

/// Slots starting at or before 08:30 count as "early" for the cross-parity
/// early-shift preference.
const EARLY_CUTOFF_MINUTES: u32 = 8 * 60 + 30;

/// A recurring duty-shift template: one day-of-week and clock interval,
/// instantiated once per template week within a roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique identifier
    pub id: TimeSlotId,

    /// Human label, e.g. "Morning desk"
    pub name: String,

    /// Owning semester; `None` means a global default slot
    pub semester_id: Option<SemesterId>,

    /// Weekday the shift recurs on (Mon-Fri in practice)
    pub day_of_week: Weekday,

    /// Shift start (inclusive)
    pub start: NaiveTime,

    /// Shift end (exclusive)
    pub end: NaiveTime,

    /// Inactive slots are ignored by the engine
    pub active: bool,
}

impl TimeSlot {
    /// Whether this slot starts at or before the early-shift cutoff (08:30).
    pub fn is_early(&self) -> bool {
        self.start.hour() * 60 + self.start.minute() <= EARLY_CUTOFF_MINUTES
    }

    /// Whether the slot's `[start, end)` interval overlaps another interval
    /// on the same weekday.
    pub fn overlaps(&self, day: Weekday, start: NaiveTime, end: NaiveTime) -> bool {
        self.day_of_week == day && self.start < end && start < self.end
    }
}
