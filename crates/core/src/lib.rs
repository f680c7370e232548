//! Duty-roster core data models.
//!
//! This crate defines the domain vocabulary shared by the scheduling engine,
//! the storage contract and the CLI: semesters and their two-week cycle,
//! slot templates, per-member busy time, the candidate pool, the rule
//! inventory, and the roster aggregate with its lifecycle states.

#![warn(missing_docs)]

// Core identities
mod id;

// Calendar vocabulary
mod semester;
mod slot;
mod week;

// Engine inputs
mod candidate;
mod rules;
mod timetable;

// The roster aggregate
mod roster;

// Re-exports
pub use id::{
    ChangeLogId, DepartmentId, LocationId, RosterId, RosterItemId, SemesterId, TimeSlotId, UserId,
};

pub use semester::Semester;
pub use slot::TimeSlot;
pub use week::{WeekNumber, WeekParity, WeekPattern};

pub use candidate::Candidate;
pub use rules::{RuleCode, RuleSet, RuleToggle, UnknownRuleCode};
pub use timetable::{CourseEntry, RepeatKind, UnavailableEntry};

pub use roster::{
    ChangeLogEntry, PoolSnapshotEntry, Roster, RosterItem, RosterStatus, ScopeDrift,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
