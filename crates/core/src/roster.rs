//! The roster aggregate: lifecycle states, line items, pool snapshots and
//! the override audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{
    ChangeLogId, DepartmentId, LocationId, RosterId, RosterItemId, SemesterId, TimeSlotId, UserId,
};
use crate::week::WeekNumber;

/// Lifecycle state of a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    /// Line items are freely editable.
    Draft,
    /// Line items change only through the audited override path.
    Published,
    /// Published, but the candidate pool has drifted since generation.
    /// Still displayed as the active roster.
    NeedsRegeneration,
    /// Superseded. Terminal.
    Archived,
}

impl RosterStatus {
    /// Whether a roster in this state may transition to [`Published`].
    ///
    /// [`Published`]: RosterStatus::Published
    pub fn can_publish(self) -> bool {
        matches!(self, Self::Draft | Self::NeedsRegeneration)
    }

    /// Archived rosters accept no further transitions.
    pub fn terminal(self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl std::fmt::Display for RosterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::NeedsRegeneration => "needs_regeneration",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// Aggregate root for one semester's duty assignments.
///
/// At most one non-archived roster exists per semester; installing a new one
/// archives the prior roster as part of the same storage operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    /// Unique identifier
    pub id: RosterId,

    /// Owning semester
    pub semester_id: SemesterId,

    /// Lifecycle state
    pub status: RosterStatus,

    /// Set when the roster first transitions to published
    pub published_at: Option<DateTime<Utc>>,

    /// Operator that generated the roster
    pub created_by: UserId,

    /// Operator of the most recent mutation
    pub updated_by: UserId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency version, bumped by the storage layer on every
    /// accepted write
    pub version: u64,
}

impl Roster {
    /// A fresh draft for a semester.
    pub fn draft(semester_id: SemesterId, operator: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: RosterId::new(),
            semester_id,
            status: RosterStatus::Draft,
            published_at: None,
            created_by: operator,
            updated_by: operator,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

/// One assigned shift: a (week, slot) cell of the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterItem {
    /// Unique identifier
    pub id: RosterItemId,

    /// Owning roster
    pub roster_id: RosterId,

    /// Template week the shift falls in
    pub week: WeekNumber,

    /// Slot template being filled
    pub time_slot_id: TimeSlotId,

    /// Assigned member
    pub member_id: UserId,

    /// Optional duty location
    pub location_id: Option<LocationId>,

    /// Operator of the most recent mutation
    pub updated_by: UserId,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency version
    pub version: u64,
}

/// One row of the frozen eligible-pool snapshot written at generation time.
///
/// Write-once; consumed only by the scope-drift check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshotEntry {
    /// Roster the snapshot belongs to
    pub roster_id: RosterId,

    /// Member that was eligible at generation time
    pub user_id: UserId,

    /// The member's department at generation time
    pub department_id: DepartmentId,

    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

/// Immutable audit record of a published-item reassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Unique identifier
    pub id: ChangeLogId,

    /// Roster the item belongs to
    pub roster_id: RosterId,

    /// Reassigned item
    pub item_id: RosterItemId,

    /// Member the item held before the override
    pub original_member_id: UserId,

    /// Member the item was reassigned to
    pub new_member_id: UserId,

    /// Required free-text justification
    pub reason: String,

    /// Operator that performed the override
    pub operator_id: UserId,

    /// When the override happened
    pub created_at: DateTime<Utc>,
}

/// Outcome of a scope-drift check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDrift {
    /// Whether the live pool differs from the snapshot
    pub changed: bool,

    /// Display names of members now eligible but absent from the snapshot
    pub added_names: Vec<String>,

    /// Identities present in the snapshot but no longer eligible
    pub removed_ids: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishable_states() {
        assert!(RosterStatus::Draft.can_publish());
        assert!(RosterStatus::NeedsRegeneration.can_publish());
        assert!(!RosterStatus::Published.can_publish());
        assert!(!RosterStatus::Archived.can_publish());
    }

    #[test]
    fn only_archived_is_terminal() {
        assert!(RosterStatus::Archived.terminal());
        assert!(!RosterStatus::Draft.terminal());
        assert!(!RosterStatus::Published.terminal());
        assert!(!RosterStatus::NeedsRegeneration.terminal());
    }

    #[test]
    fn draft_starts_at_version_one() {
        let operator = UserId::new();
        let roster = Roster::draft(SemesterId::new(), operator, Utc::now());
        assert_eq!(roster.status, RosterStatus::Draft);
        assert_eq!(roster.version, 1);
        assert!(roster.published_at.is_none());
        assert_eq!(roster.created_by, operator);
    }
}
