//! In-memory storage backend.
//!
//! Backs the engine's test suites and embedded use. Collections are plain
//! maps; every list operation sorts its output so repeated reads are
//! deterministic regardless of map iteration order.

use std::collections::HashMap;

use async_trait::async_trait;
use dutyroster_core::{
    Candidate, ChangeLogEntry, CourseEntry, PoolSnapshotEntry, Roster, RosterId, RosterItem,
    RosterItemId, RuleCode, RuleToggle, Semester, SemesterId, TimeSlot, UnavailableEntry, UserId,
};

use super::{Result, Storage, StorageError};

/// Map-backed storage.
#[derive(Default)]
pub struct MemoryStorage {
    semesters: HashMap<SemesterId, Semester>,
    time_slots: Vec<TimeSlot>,
    courses: Vec<CourseEntry>,
    unavailable: Vec<UnavailableEntry>,
    pool: HashMap<SemesterId, Vec<Candidate>>,
    rules: HashMap<RuleCode, RuleToggle>,
    rosters: HashMap<RosterId, Roster>,
    items: HashMap<RosterItemId, RosterItem>,
    snapshots: HashMap<RosterId, Vec<PoolSnapshotEntry>>,
    change_log: Vec<ChangeLogEntry>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_semester(&mut self, semester: &Semester) -> Result<()> {
        self.semesters.insert(semester.id, semester.clone());
        Ok(())
    }

    async fn load_semester(&self, id: SemesterId) -> Result<Option<Semester>> {
        Ok(self.semesters.get(&id).cloned())
    }

    async fn save_time_slot(&mut self, slot: &TimeSlot) -> Result<()> {
        self.time_slots.retain(|s| s.id != slot.id);
        self.time_slots.push(slot.clone());
        Ok(())
    }

    async fn load_time_slot(
        &self,
        id: dutyroster_core::TimeSlotId,
    ) -> Result<Option<TimeSlot>> {
        Ok(self.time_slots.iter().find(|s| s.id == id).cloned())
    }

    async fn list_time_slots(&self, semester_id: SemesterId) -> Result<Vec<TimeSlot>> {
        let mut slots: Vec<TimeSlot> = self
            .time_slots
            .iter()
            .filter(|s| s.active && s.semester_id.map_or(true, |sid| sid == semester_id))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.day_of_week.number_from_monday(), s.start, s.id));
        Ok(slots)
    }

    async fn save_course(&mut self, entry: &CourseEntry) -> Result<()> {
        self.courses.push(entry.clone());
        Ok(())
    }

    async fn list_courses(&self, semester_id: SemesterId) -> Result<Vec<CourseEntry>> {
        Ok(self
            .courses
            .iter()
            .filter(|c| c.semester_id == semester_id)
            .cloned()
            .collect())
    }

    async fn list_courses_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<CourseEntry>> {
        Ok(self
            .courses
            .iter()
            .filter(|c| c.semester_id == semester_id && c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_unavailable(&mut self, entry: &UnavailableEntry) -> Result<()> {
        self.unavailable.push(entry.clone());
        Ok(())
    }

    async fn list_unavailable(&self, semester_id: SemesterId) -> Result<Vec<UnavailableEntry>> {
        Ok(self
            .unavailable
            .iter()
            .filter(|u| u.semester_id == semester_id)
            .cloned()
            .collect())
    }

    async fn list_unavailable_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<UnavailableEntry>> {
        Ok(self
            .unavailable
            .iter()
            .filter(|u| u.semester_id == semester_id && u.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_candidate(
        &mut self,
        semester_id: SemesterId,
        candidate: &Candidate,
    ) -> Result<()> {
        let pool = self.pool.entry(semester_id).or_default();
        pool.retain(|c| c.user_id != candidate.user_id);
        pool.push(candidate.clone());
        Ok(())
    }

    async fn list_duty_pool(&self, semester_id: SemesterId) -> Result<Vec<Candidate>> {
        let mut pool = self.pool.get(&semester_id).cloned().unwrap_or_default();
        pool.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));
        Ok(pool)
    }

    async fn save_rule_toggle(&mut self, toggle: &RuleToggle) -> Result<()> {
        self.rules.insert(toggle.code, toggle.clone());
        Ok(())
    }

    async fn list_rule_toggles(&self) -> Result<Vec<RuleToggle>> {
        let mut toggles: Vec<RuleToggle> = self.rules.values().cloned().collect();
        toggles.sort_by_key(|t| t.code as u8);
        Ok(toggles)
    }

    async fn install_roster(
        &mut self,
        roster: &Roster,
        items: &[RosterItem],
        snapshot: &[PoolSnapshotEntry],
    ) -> Result<()> {
        // All mutations below are infallible, so the install is atomic with
        // respect to observers of this store.
        for existing in self.rosters.values_mut() {
            if existing.semester_id == roster.semester_id && !existing.status.terminal() {
                existing.status = dutyroster_core::RosterStatus::Archived;
                existing.updated_by = roster.created_by;
                existing.updated_at = roster.created_at;
                existing.version += 1;
            }
        }
        self.rosters.insert(roster.id, roster.clone());
        for item in items {
            self.items.insert(item.id, item.clone());
        }
        self.snapshots.insert(roster.id, snapshot.to_vec());
        Ok(())
    }

    async fn load_roster(&self, id: RosterId) -> Result<Option<Roster>> {
        Ok(self.rosters.get(&id).cloned())
    }

    async fn active_roster(&self, semester_id: SemesterId) -> Result<Option<Roster>> {
        // Newest first, so a half-healed double-active state (two racing
        // generations) resolves to the most recent roster.
        Ok(self
            .rosters
            .values()
            .filter(|r| r.semester_id == semester_id && !r.status.terminal())
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn update_roster(&mut self, roster: &Roster) -> Result<Roster> {
        let stored = self
            .rosters
            .get_mut(&roster.id)
            .ok_or_else(|| StorageError::NotFound(format!("roster {}", roster.id)))?;
        if stored.version != roster.version {
            return Err(StorageError::StaleVersion {
                entity: "roster",
                id: roster.id.to_string(),
            });
        }
        *stored = roster.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn load_item(&self, id: RosterItemId) -> Result<Option<RosterItem>> {
        Ok(self.items.get(&id).cloned())
    }

    async fn list_items(&self, roster_id: RosterId) -> Result<Vec<RosterItem>> {
        let mut items: Vec<RosterItem> = self
            .items
            .values()
            .filter(|i| i.roster_id == roster_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.week, i.time_slot_id, i.id));
        Ok(items)
    }

    async fn list_items_for_member(
        &self,
        roster_id: RosterId,
        member_id: UserId,
    ) -> Result<Vec<RosterItem>> {
        let mut items: Vec<RosterItem> = self
            .items
            .values()
            .filter(|i| i.roster_id == roster_id && i.member_id == member_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.week, i.time_slot_id, i.id));
        Ok(items)
    }

    async fn update_item(&mut self, item: &RosterItem) -> Result<RosterItem> {
        let stored = self
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StorageError::NotFound(format!("roster item {}", item.id)))?;
        if stored.version != item.version {
            return Err(StorageError::StaleVersion {
                entity: "roster item",
                id: item.id.to_string(),
            });
        }
        *stored = item.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn load_snapshot(&self, roster_id: RosterId) -> Result<Vec<PoolSnapshotEntry>> {
        Ok(self.snapshots.get(&roster_id).cloned().unwrap_or_default())
    }

    async fn append_change_log(&mut self, entry: &ChangeLogEntry) -> Result<()> {
        self.change_log.push(entry.clone());
        Ok(())
    }

    async fn list_change_log(
        &self,
        roster_id: RosterId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ChangeLogEntry>, u64)> {
        let mut entries: Vec<ChangeLogEntry> = self
            .change_log
            .iter()
            .filter(|e| e.roster_id == roster_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = entries.len() as u64;
        let page = entries.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }
}
