//! Engine error taxonomy.
//!
//! Every failure the scheduling engine can report is a distinct variant so
//! the calling layer can map each kind to its own user-facing message and
//! status code. Nothing is retried internally; [`EngineError::StaleVersion`]
//! is the one kind a caller is expected to retry after re-reading.

use dutyroster_core::{RosterStatus, RuleCode};
use dutyroster_storage::StorageError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors reported by the scheduling engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested semester does not exist.
    #[error("semester not found")]
    SemesterNotFound,

    /// No non-archived roster exists for the semester, or the roster ID is
    /// unknown.
    #[error("roster not found")]
    RosterNotFound,

    /// The requested line item does not exist.
    #[error("roster item not found")]
    ItemNotFound,

    /// At least one duty-required member has not submitted a timetable.
    /// Generation requires a 100% submission rate.
    #[error("timetable submission incomplete: {submitted}/{required} submitted")]
    SubmissionIncomplete {
        /// Duty-required members in the pool
        required: usize,
        /// Of those, members that have submitted
        submitted: usize,
    },

    /// The duty pool has no eligible candidate.
    #[error("no eligible duty candidates")]
    NoEligibleCandidates,

    /// No active slot template applies to the semester.
    #[error("no active time slots")]
    NoActiveSlots,

    /// Free-form line-item edits require a draft roster.
    #[error("roster is not in draft state")]
    NotDraft,

    /// The audited override path requires a published roster.
    #[error("roster is not published")]
    NotPublished,

    /// Only draft and needs-regeneration rosters can be published.
    #[error("roster cannot be published from state {status}")]
    CannotPublish {
        /// The roster's current state
        status: RosterStatus,
    },

    /// The replacement member fails validation for the item's slot.
    #[error("candidate is not available for this slot: {}", conflicts.join("; "))]
    CandidateNotAvailable {
        /// Human-readable conflict reasons
        conflicts: Vec<String>,
    },

    /// The rule's toggle cannot be changed through the configuration surface.
    #[error("rule {code} is not configurable")]
    RuleNotConfigurable {
        /// The rejected rule
        code: RuleCode,
    },

    /// A concurrent writer modified the record first. Re-read and reapply.
    #[error("record was modified by another operation, re-read and retry")]
    StaleVersion,

    /// Unexpected storage failure, fatal for the current call.
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::StaleVersion { .. } => Self::StaleVersion,
            other => Self::Storage(other),
        }
    }
}
