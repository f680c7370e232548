//! Storage trait abstraction.

use async_trait::async_trait;
use dutyroster_core::{
    Candidate, ChangeLogEntry, CourseEntry, PoolSnapshotEntry, Roster, RosterId, RosterItem,
    RosterItemId, RuleToggle, Semester, SemesterId, TimeSlot, TimeSlotId, UnavailableEntry, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A versioned write lost against a concurrent writer. The caller must
    /// re-read and reapply; the stored record was not modified.
    #[error("stale version for {entity} {id}")]
    StaleVersion {
        /// Entity kind, e.g. "roster" or "roster item"
        entity: &'static str,
        /// Identifier of the contested record
        id: String,
    },

    /// Item not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for roster data.
///
/// The engine consumes semester metadata, slot templates, busy-time records,
/// the duty pool and rule toggles read-only, and owns the roster aggregate
/// through this trait. Writes to versioned records (rosters, items) are
/// arbitrated per row: a writer carrying a version that no longer matches the
/// stored one receives [`StorageError::StaleVersion`] and nothing is
/// overwritten.
///
/// The trait does NOT serialize concurrent [`install_roster`] calls for one
/// semester; two racing generations last-write-win on the active roster.
/// Callers needing stricter semantics must serialize externally.
///
/// [`install_roster`]: Storage::install_roster
#[async_trait]
pub trait Storage: Send + Sync {
    // === Collaborator inputs (read-only during a scheduling run) ===

    /// Save a semester record.
    async fn save_semester(&mut self, semester: &Semester) -> Result<()>;

    /// Load a semester by ID.
    async fn load_semester(&self, id: SemesterId) -> Result<Option<Semester>>;

    /// Save a slot template.
    async fn save_time_slot(&mut self, slot: &TimeSlot) -> Result<()>;

    /// Load a slot template by ID, active or not. Line items keep referencing
    /// slots that were deactivated after generation.
    async fn load_time_slot(&self, id: TimeSlotId) -> Result<Option<TimeSlot>>;

    /// List active slot templates applicable to a semester (scoped to it or
    /// global), ordered by (day, start, id).
    async fn list_time_slots(&self, semester_id: SemesterId) -> Result<Vec<TimeSlot>>;

    /// Save a course entry.
    async fn save_course(&mut self, entry: &CourseEntry) -> Result<()>;

    /// List every course entry submitted for a semester.
    async fn list_courses(&self, semester_id: SemesterId) -> Result<Vec<CourseEntry>>;

    /// List one member's course entries for a semester.
    async fn list_courses_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<CourseEntry>>;

    /// Save an unavailable-time entry.
    async fn save_unavailable(&mut self, entry: &UnavailableEntry) -> Result<()>;

    /// List every unavailable-time entry for a semester.
    async fn list_unavailable(&self, semester_id: SemesterId) -> Result<Vec<UnavailableEntry>>;

    /// List one member's unavailable-time entries for a semester.
    async fn list_unavailable_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<UnavailableEntry>>;

    /// Save or replace a duty-pool membership record.
    async fn save_candidate(&mut self, semester_id: SemesterId, candidate: &Candidate)
        -> Result<()>;

    /// List the duty-required pool for a semester (submitted or not),
    /// ordered by name.
    async fn list_duty_pool(&self, semester_id: SemesterId) -> Result<Vec<Candidate>>;

    /// Save or replace a rule toggle.
    async fn save_rule_toggle(&mut self, toggle: &RuleToggle) -> Result<()>;

    /// List stored rule toggles.
    async fn list_rule_toggles(&self) -> Result<Vec<RuleToggle>>;

    // === Roster aggregate ===

    /// Install a freshly generated roster as one unit: archive any
    /// non-archived roster of the same semester, then persist the draft,
    /// its items and its pool snapshot. A failure part-way must not leave
    /// the prior roster archived without its replacement.
    async fn install_roster(
        &mut self,
        roster: &Roster,
        items: &[RosterItem],
        snapshot: &[PoolSnapshotEntry],
    ) -> Result<()>;

    /// Load a roster by ID.
    async fn load_roster(&self, id: RosterId) -> Result<Option<Roster>>;

    /// The semester's single non-archived roster, if any.
    async fn active_roster(&self, semester_id: SemesterId) -> Result<Option<Roster>>;

    /// Versioned roster write. Returns the stored record with its bumped
    /// version on success.
    async fn update_roster(&mut self, roster: &Roster) -> Result<Roster>;

    /// Load a line item by ID.
    async fn load_item(&self, id: RosterItemId) -> Result<Option<RosterItem>>;

    /// List a roster's line items, ordered by (week, slot, id).
    async fn list_items(&self, roster_id: RosterId) -> Result<Vec<RosterItem>>;

    /// List one member's line items within a roster.
    async fn list_items_for_member(
        &self,
        roster_id: RosterId,
        member_id: UserId,
    ) -> Result<Vec<RosterItem>>;

    /// Versioned line-item write. Returns the stored record with its bumped
    /// version on success.
    async fn update_item(&mut self, item: &RosterItem) -> Result<RosterItem>;

    /// The write-once pool snapshot captured when the roster was generated.
    async fn load_snapshot(&self, roster_id: RosterId) -> Result<Vec<PoolSnapshotEntry>>;

    /// Append an override audit record.
    async fn append_change_log(&mut self, entry: &ChangeLogEntry) -> Result<()>;

    /// Page through a roster's audit records, newest first. Returns the page
    /// and the total count.
    async fn list_change_log(
        &self,
        roster_id: RosterId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ChangeLogEntry>, u64)>;
}
