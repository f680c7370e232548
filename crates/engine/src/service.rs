//! Roster service: generation, lifecycle transitions, candidate validation,
//! audited overrides and scope-drift detection over the storage contract.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use dutyroster_core::{
    Candidate, ChangeLogEntry, ChangeLogId, LocationId, PoolSnapshotEntry, Roster, RosterId,
    RosterItem, RosterItemId, RosterStatus, RuleCode, RuleSet, RuleToggle, ScopeDrift, SemesterId,
    UserId,
};
use dutyroster_storage::{Storage, StorageError};
use tokio::sync::Mutex;

use crate::allocator::allocate;
use crate::conflict::{course_conflicts, unavailable_conflicts};
use crate::error::{EngineError, Result};
use crate::matrix::AvailabilityMatrix;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The freshly installed draft
    pub roster: Roster,

    /// Its line items, one per filled instance
    pub items: Vec<RosterItem>,

    /// Instances considered (slots x weeks)
    pub total_slots: usize,

    /// Instances actually filled
    pub filled_slots: usize,

    /// One line per unfillable instance
    pub warnings: Vec<String>,
}

/// A roster together with its line items.
#[derive(Debug, Clone)]
pub struct RosterView {
    /// The roster record
    pub roster: Roster,

    /// Line items ordered by (week, slot)
    pub items: Vec<RosterItem>,
}

/// Fields a draft edit may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct DraftItemPatch {
    /// Reassign the shift to another member
    pub member_id: Option<UserId>,

    /// Move the shift to another location
    pub location_id: Option<LocationId>,
}

/// Verdict on one candidate for one line item.
#[derive(Debug, Clone)]
pub struct CandidateValidation {
    /// No conflicts found
    pub valid: bool,

    /// Human-readable conflict reasons
    pub conflicts: Vec<String>,
}

/// Availability of one pool member for one line item.
#[derive(Debug, Clone)]
pub struct CandidateAvailability {
    /// The pool member
    pub candidate: Candidate,

    /// Whether the member could take the item's slot
    pub available: bool,

    /// Conflict reasons when not available
    pub conflicts: Vec<String>,
}

/// The scheduling engine's service surface.
///
/// All computation is synchronous and in-memory within one call; the only
/// suspension points are storage calls, and no lock is held across a whole
/// run. Concurrent generation for one semester is NOT serialized here (see
/// the storage contract).
pub struct RosterService<S: Storage> {
    storage: Arc<Mutex<S>>,
}

impl<S: Storage + 'static> RosterService<S> {
    /// Create a service owning its storage.
    pub fn new(storage: S) -> Self {
        Self { storage: Arc::new(Mutex::new(storage)) }
    }

    /// Create a service over shared storage.
    pub fn with_shared(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }

    // === Generation ===

    /// Run the full scheduling pipeline for a semester and install the
    /// resulting draft, archiving any prior non-archived roster.
    pub async fn generate(
        &self,
        semester_id: SemesterId,
        operator: UserId,
    ) -> Result<GenerateOutcome> {
        let semester = self
            .storage
            .lock()
            .await
            .load_semester(semester_id)
            .await?
            .ok_or(EngineError::SemesterNotFound)?;

        // Preconditions, each a hard failure before anything is persisted.
        let pool = self.storage.lock().await.list_duty_pool(semester_id).await?;
        let required = pool.len();
        let submitted = pool.iter().filter(|c| c.eligible()).count();
        if required == 0 || submitted < required {
            return Err(EngineError::SubmissionIncomplete { required, submitted });
        }

        let candidates: Vec<Candidate> = pool.into_iter().filter(|c| c.eligible()).collect();
        if candidates.is_empty() {
            return Err(EngineError::NoEligibleCandidates);
        }

        let slots = self.storage.lock().await.list_time_slots(semester_id).await?;
        if slots.is_empty() {
            return Err(EngineError::NoActiveSlots);
        }

        let courses = self.storage.lock().await.list_courses(semester_id).await?;
        let unavailable = self.storage.lock().await.list_unavailable(semester_id).await?;
        let rules = self.rule_set().await?;

        let matrix =
            AvailabilityMatrix::build(&semester, &candidates, &slots, &courses, &unavailable, rules);
        let allocation = allocate(&candidates, &slots, &matrix, rules);

        let now = Utc::now();
        let roster = Roster::draft(semester_id, operator, now);
        let items: Vec<RosterItem> = allocation
            .assignments
            .iter()
            .map(|a| RosterItem {
                id: RosterItemId::new(),
                roster_id: roster.id,
                week: a.week,
                time_slot_id: a.time_slot_id,
                member_id: a.member_id,
                location_id: None,
                updated_by: operator,
                updated_at: now,
                version: 1,
            })
            .collect();
        let snapshot: Vec<PoolSnapshotEntry> = candidates
            .iter()
            .map(|c| PoolSnapshotEntry {
                roster_id: roster.id,
                user_id: c.user_id,
                department_id: c.department_id,
                captured_at: now,
            })
            .collect();

        self.storage
            .lock()
            .await
            .install_roster(&roster, &items, &snapshot)
            .await?;

        tracing::info!(
            roster = %roster.id,
            semester = %semester_id,
            filled = items.len(),
            total = allocation.total_slots,
            warnings = allocation.warnings.len(),
            "generated duty roster"
        );

        Ok(GenerateOutcome {
            roster,
            filled_slots: items.len(),
            items,
            total_slots: allocation.total_slots,
            warnings: allocation.warnings,
        })
    }

    // === Reads ===

    /// The semester's active roster with its items.
    pub async fn roster_for_semester(&self, semester_id: SemesterId) -> Result<RosterView> {
        let roster = self
            .storage
            .lock()
            .await
            .active_roster(semester_id)
            .await?
            .ok_or(EngineError::RosterNotFound)?;
        let items = self.storage.lock().await.list_items(roster.id).await?;
        Ok(RosterView { roster, items })
    }

    /// One member's shifts in the semester's active roster.
    pub async fn personal_assignments(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<RosterItem>> {
        let roster = self
            .storage
            .lock()
            .await
            .active_roster(semester_id)
            .await?
            .ok_or(EngineError::RosterNotFound)?;
        Ok(self
            .storage
            .lock()
            .await
            .list_items_for_member(roster.id, user_id)
            .await?)
    }

    // === Draft editing ===

    /// Free-form edit of a line item while the roster is a draft.
    pub async fn update_draft_item(
        &self,
        item_id: RosterItemId,
        patch: DraftItemPatch,
        operator: UserId,
    ) -> Result<RosterItem> {
        let mut item = self.load_item(item_id).await?;
        let roster = self.load_roster(item.roster_id).await?;
        if roster.status != RosterStatus::Draft {
            return Err(EngineError::NotDraft);
        }

        if let Some(member_id) = patch.member_id {
            item.member_id = member_id;
        }
        if let Some(location_id) = patch.location_id {
            item.location_id = Some(location_id);
        }
        item.updated_by = operator;
        item.updated_at = Utc::now();

        Ok(self.storage.lock().await.update_item(&item).await?)
    }

    // === Candidate validation ===

    /// Check one candidate against one line item's slot (R1/R2) and the
    /// roster's current assignments (R6).
    pub async fn validate_candidate(
        &self,
        item_id: RosterItemId,
        candidate_id: UserId,
    ) -> Result<CandidateValidation> {
        let item = self.load_item(item_id).await?;
        let roster = self.load_roster(item.roster_id).await?;
        let conflicts = self.conflicts_for(candidate_id, &item, &roster).await?;
        Ok(CandidateValidation { valid: conflicts.is_empty(), conflicts })
    }

    /// Availability of every eligible pool member for one line item.
    pub async fn list_candidates(&self, item_id: RosterItemId) -> Result<Vec<CandidateAvailability>> {
        let item = self.load_item(item_id).await?;
        let roster = self.load_roster(item.roster_id).await?;
        let pool = self
            .storage
            .lock()
            .await
            .list_duty_pool(roster.semester_id)
            .await?;

        let mut result = Vec::new();
        for candidate in pool.into_iter().filter(Candidate::eligible) {
            let conflicts = self.conflicts_for(candidate.user_id, &item, &roster).await?;
            result.push(CandidateAvailability {
                available: conflicts.is_empty(),
                conflicts,
                candidate,
            });
        }
        Ok(result)
    }

    // === Lifecycle ===

    /// Publish a draft or needs-regeneration roster.
    pub async fn publish(&self, roster_id: RosterId, operator: UserId) -> Result<Roster> {
        let mut roster = self.load_roster(roster_id).await?;
        if !roster.status.can_publish() {
            return Err(EngineError::CannotPublish { status: roster.status });
        }

        let now = Utc::now();
        roster.status = RosterStatus::Published;
        roster.published_at = Some(now);
        roster.updated_by = operator;
        roster.updated_at = now;

        let stored = self.storage.lock().await.update_roster(&roster).await?;
        tracing::info!(roster = %roster_id, "published duty roster");
        Ok(stored)
    }

    /// Reassign a published item to a new member: validates the member,
    /// writes the audit record, then mutates the item.
    pub async fn override_published_item(
        &self,
        item_id: RosterItemId,
        new_member_id: UserId,
        reason: String,
        operator: UserId,
    ) -> Result<RosterItem> {
        let mut item = self.load_item(item_id).await?;
        let roster = self.load_roster(item.roster_id).await?;
        if roster.status != RosterStatus::Published {
            return Err(EngineError::NotPublished);
        }

        let conflicts = self.conflicts_for(new_member_id, &item, &roster).await?;
        if !conflicts.is_empty() {
            return Err(EngineError::CandidateNotAvailable { conflicts });
        }

        let now = Utc::now();
        let entry = ChangeLogEntry {
            id: ChangeLogId::new(),
            roster_id: roster.id,
            item_id: item.id,
            original_member_id: item.member_id,
            new_member_id,
            reason,
            operator_id: operator,
            created_at: now,
        };
        self.storage.lock().await.append_change_log(&entry).await?;

        item.member_id = new_member_id;
        item.updated_by = operator;
        item.updated_at = now;
        let stored = self.storage.lock().await.update_item(&item).await?;

        tracing::info!(
            item = %item_id,
            from = %entry.original_member_id,
            to = %new_member_id,
            "override on published roster"
        );
        Ok(stored)
    }

    /// Page through a roster's override audit trail, newest first.
    /// `page` is 1-based.
    pub async fn change_log(
        &self,
        roster_id: RosterId,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<ChangeLogEntry>, u64)> {
        let offset = page.saturating_sub(1) * page_size;
        Ok(self
            .storage
            .lock()
            .await
            .list_change_log(roster_id, offset, page_size)
            .await?)
    }

    /// Compare the live eligible pool against the roster's generation-time
    /// snapshot. A published roster with any drift is flagged
    /// needs-regeneration as a side effect.
    pub async fn check_scope(&self, roster_id: RosterId) -> Result<ScopeDrift> {
        let roster = self.load_roster(roster_id).await?;
        let snapshot = self.storage.lock().await.load_snapshot(roster_id).await?;
        let pool = self
            .storage
            .lock()
            .await
            .list_duty_pool(roster.semester_id)
            .await?;

        let snapshot_ids: HashSet<UserId> = snapshot.iter().map(|s| s.user_id).collect();
        let current: Vec<&Candidate> = pool.iter().filter(|c| c.eligible()).collect();
        let current_ids: HashSet<UserId> = current.iter().map(|c| c.user_id).collect();

        let mut added_names: Vec<String> = current
            .iter()
            .filter(|c| !snapshot_ids.contains(&c.user_id))
            .map(|c| c.name.clone())
            .collect();
        added_names.sort();

        let mut removed_ids: Vec<UserId> = snapshot_ids
            .iter()
            .filter(|id| !current_ids.contains(id))
            .copied()
            .collect();
        removed_ids.sort();

        let changed = !added_names.is_empty() || !removed_ids.is_empty();

        if changed && roster.status == RosterStatus::Published {
            let mut flagged = roster;
            flagged.status = RosterStatus::NeedsRegeneration;
            flagged.updated_at = Utc::now();
            self.storage.lock().await.update_roster(&flagged).await?;
            tracing::warn!(
                roster = %roster_id,
                added = added_names.len(),
                removed = removed_ids.len(),
                "candidate pool drifted, roster flagged for regeneration"
            );
        }

        Ok(ScopeDrift { changed, added_names, removed_ids })
    }

    // === Rule configuration ===

    /// The full rule inventory with effective toggle state. Codes without a
    /// stored row report enabled.
    pub async fn rule_toggles(&self) -> Result<Vec<RuleToggle>> {
        let stored = self.storage.lock().await.list_rule_toggles().await?;
        let by_code: HashMap<RuleCode, bool> =
            stored.into_iter().map(|t| (t.code, t.enabled)).collect();
        Ok(RuleCode::ALL
            .into_iter()
            .map(|code| RuleToggle {
                code,
                enabled: by_code.get(&code).copied().unwrap_or(true),
            })
            .collect())
    }

    /// Enable or disable one configurable rule.
    pub async fn set_rule_enabled(&self, code: RuleCode, enabled: bool) -> Result<RuleToggle> {
        if !code.configurable() {
            return Err(EngineError::RuleNotConfigurable { code });
        }
        let toggle = RuleToggle { code, enabled };
        self.storage.lock().await.save_rule_toggle(&toggle).await?;
        Ok(toggle)
    }

    // === Internal helpers ===

    async fn rule_set(&self) -> Result<RuleSet> {
        let toggles = self.storage.lock().await.list_rule_toggles().await?;
        Ok(RuleSet::from_toggles(&toggles))
    }

    async fn load_item(&self, id: RosterItemId) -> Result<RosterItem> {
        self.storage
            .lock()
            .await
            .load_item(id)
            .await?
            .ok_or(EngineError::ItemNotFound)
    }

    async fn load_roster(&self, id: RosterId) -> Result<Roster> {
        self.storage
            .lock()
            .await
            .load_roster(id)
            .await?
            .ok_or(EngineError::RosterNotFound)
    }

    /// The validator's shared conflict routine: R1/R2 against the item's
    /// slot, R6 against the roster's live assignments. R6 deliberately does
    /// not consult the matrix, which predates the roster's current state.
    async fn conflicts_for(
        &self,
        member_id: UserId,
        item: &RosterItem,
        roster: &Roster,
    ) -> Result<Vec<String>> {
        let semester = self
            .storage
            .lock()
            .await
            .load_semester(roster.semester_id)
            .await?
            .ok_or(EngineError::SemesterNotFound)?;
        let slot = self
            .storage
            .lock()
            .await
            .load_time_slot(item.time_slot_id)
            .await?
            .ok_or_else(|| {
                EngineError::Storage(StorageError::NotFound(format!(
                    "time slot {}",
                    item.time_slot_id
                )))
            })?;

        let rules = self.rule_set().await?;
        let parity = semester.parity_of(item.week);
        let mut conflicts = Vec::new();

        if rules.enabled(RuleCode::R1) {
            let courses = self
                .storage
                .lock()
                .await
                .list_courses_for_user(semester.id, member_id)
                .await?;
            conflicts.extend(course_conflicts(&courses, &slot, parity));
        }

        if rules.enabled(RuleCode::R2) {
            let unavailable = self
                .storage
                .lock()
                .await
                .list_unavailable_for_user(semester.id, member_id)
                .await?;
            conflicts.extend(unavailable_conflicts(&unavailable, &slot, parity));
        }

        // R6 against live items, excluding the item under test.
        let items = self.storage.lock().await.list_items(roster.id).await?;
        for other in items {
            if other.id == item.id || other.member_id != member_id || other.week != item.week {
                continue;
            }
            let other_slot = self
                .storage
                .lock()
                .await
                .load_time_slot(other.time_slot_id)
                .await?;
            if other_slot.is_some_and(|s| s.day_of_week == slot.day_of_week) {
                conflicts.push("already assigned to another shift that day".to_string());
                break;
            }
        }

        Ok(conflicts)
    }
}
