//! Per-member busy-time records: imported course timetables and
//! self-declared unavailable windows.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::id::{SemesterId, UserId};
use crate::week::WeekPattern;

/// One course meeting in a member's submitted timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEntry {
    /// Member the course belongs to
    pub user_id: UserId,

    /// Semester the timetable was submitted for
    pub semester_id: SemesterId,

    /// Course display name, surfaced in conflict reasons
    pub course_name: String,

    /// Weekday the meeting recurs on
    pub day_of_week: Weekday,

    /// Meeting start (inclusive)
    pub start: NaiveTime,

    /// Meeting end (exclusive)
    pub end: NaiveTime,

    /// Which calendar weeks the meeting occurs in
    pub weeks: WeekPattern,
}

/// How a declared unavailable window repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatKind {
    /// Every week.
    Weekly,
    /// Every other week (the `weeks` pattern selects which parity).
    Biweekly,
    /// A single occurrence. Template scheduling does not resolve concrete
    /// dates, so a one-off entry is matched like a weekly one.
    Once,
}

/// A self-declared unavailable window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnavailableEntry {
    /// Member the window belongs to
    pub user_id: UserId,

    /// Semester the window applies to
    pub semester_id: SemesterId,

    /// Weekday of the window
    pub day_of_week: Weekday,

    /// Window start (inclusive)
    pub start: NaiveTime,

    /// Window end (exclusive)
    pub end: NaiveTime,

    /// Which calendar weeks the window applies to
    pub weeks: WeekPattern,

    /// Optional free-text reason, surfaced in conflict messages
    pub reason: Option<String>,

    /// Repeat classification
    pub repeat: RepeatKind,
}
