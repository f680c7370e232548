//! JSON file storage implementation.
//!
//! Stores data as JSON files under a root directory (one file per roster,
//! item, semester and slot; per-semester aggregate files for busy time and
//! the duty pool). Suitable for the CLI front end and small deployments;
//! record versions live inside the records themselves.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dutyroster_core::{
    Candidate, ChangeLogEntry, CourseEntry, PoolSnapshotEntry, Roster, RosterId, RosterItem,
    RosterItemId, RosterStatus, RuleToggle, Semester, SemesterId, TimeSlot, UnavailableEntry,
    UserId,
};
use tokio::fs;

use super::{Result, Storage, StorageError};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the per-entity
    /// subdirectories as needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for dir in [
            "semesters",
            "slots",
            "courses",
            "unavailable",
            "pool",
            "rosters",
            "items",
            "snapshots",
            "changelog",
        ] {
            fs::create_dir_all(root.join(dir)).await?;
        }

        Ok(Self { root })
    }

    fn semester_path(&self, id: SemesterId) -> PathBuf {
        self.root.join("semesters").join(format!("{}.json", id))
    }
    fn slot_path(&self, id: dutyroster_core::TimeSlotId) -> PathBuf {
        self.root.join("slots").join(format!("{}.json", id))
    }
    fn courses_path(&self, semester_id: SemesterId) -> PathBuf {
        self.root.join("courses").join(format!("{}.json", semester_id))
    }
    fn unavailable_path(&self, semester_id: SemesterId) -> PathBuf {
        self.root.join("unavailable").join(format!("{}.json", semester_id))
    }
    fn pool_path(&self, semester_id: SemesterId) -> PathBuf {
        self.root.join("pool").join(format!("{}.json", semester_id))
    }
    fn rules_path(&self) -> PathBuf {
        self.root.join("rules.json")
    }
    fn roster_path(&self, id: RosterId) -> PathBuf {
        self.root.join("rosters").join(format!("{}.json", id))
    }
    fn item_path(&self, id: RosterItemId) -> PathBuf {
        self.root.join("items").join(format!("{}.json", id))
    }
    fn snapshot_path(&self, roster_id: RosterId) -> PathBuf {
        self.root.join("snapshots").join(format!("{}.json", roster_id))
    }
    fn changelog_path(&self, roster_id: RosterId) -> PathBuf {
        self.root.join("changelog").join(format!("{}.json", roster_id))
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json.as_bytes()).await?;
        Ok(())
    }

    async fn read_vec<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        Ok(read_json(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn save_semester(&mut self, semester: &Semester) -> Result<()> {
        self.write_json(&self.semester_path(semester.id), semester).await
    }

    async fn load_semester(&self, id: SemesterId) -> Result<Option<Semester>> {
        read_json(&self.semester_path(id)).await
    }

    async fn save_time_slot(&mut self, slot: &TimeSlot) -> Result<()> {
        self.write_json(&self.slot_path(slot.id), slot).await
    }

    async fn load_time_slot(
        &self,
        id: dutyroster_core::TimeSlotId,
    ) -> Result<Option<TimeSlot>> {
        read_json(&self.slot_path(id)).await
    }

    async fn list_time_slots(&self, semester_id: SemesterId) -> Result<Vec<TimeSlot>> {
        let all: Vec<TimeSlot> = list_dir(&self.root.join("slots")).await?;
        let mut slots: Vec<TimeSlot> = all
            .into_iter()
            .filter(|s| s.active && s.semester_id.map_or(true, |sid| sid == semester_id))
            .collect();
        slots.sort_by_key(|s| (s.day_of_week.number_from_monday(), s.start, s.id));
        Ok(slots)
    }

    async fn save_course(&mut self, entry: &CourseEntry) -> Result<()> {
        let path = self.courses_path(entry.semester_id);
        let mut entries: Vec<CourseEntry> = self.read_vec(&path).await?;
        entries.push(entry.clone());
        self.write_json(&path, &entries).await
    }

    async fn list_courses(&self, semester_id: SemesterId) -> Result<Vec<CourseEntry>> {
        self.read_vec(&self.courses_path(semester_id)).await
    }

    async fn list_courses_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<CourseEntry>> {
        let entries = self.list_courses(semester_id).await?;
        Ok(entries.into_iter().filter(|c| c.user_id == user_id).collect())
    }

    async fn save_unavailable(&mut self, entry: &UnavailableEntry) -> Result<()> {
        let path = self.unavailable_path(entry.semester_id);
        let mut entries: Vec<UnavailableEntry> = self.read_vec(&path).await?;
        entries.push(entry.clone());
        self.write_json(&path, &entries).await
    }

    async fn list_unavailable(&self, semester_id: SemesterId) -> Result<Vec<UnavailableEntry>> {
        self.read_vec(&self.unavailable_path(semester_id)).await
    }

    async fn list_unavailable_for_user(
        &self,
        semester_id: SemesterId,
        user_id: UserId,
    ) -> Result<Vec<UnavailableEntry>> {
        let entries = self.list_unavailable(semester_id).await?;
        Ok(entries.into_iter().filter(|u| u.user_id == user_id).collect())
    }

    async fn save_candidate(
        &mut self,
        semester_id: SemesterId,
        candidate: &Candidate,
    ) -> Result<()> {
        let path = self.pool_path(semester_id);
        let mut pool: Vec<Candidate> = self.read_vec(&path).await?;
        pool.retain(|c| c.user_id != candidate.user_id);
        pool.push(candidate.clone());
        self.write_json(&path, &pool).await
    }

    async fn list_duty_pool(&self, semester_id: SemesterId) -> Result<Vec<Candidate>> {
        let mut pool: Vec<Candidate> = self.read_vec(&self.pool_path(semester_id)).await?;
        pool.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));
        Ok(pool)
    }

    async fn save_rule_toggle(&mut self, toggle: &RuleToggle) -> Result<()> {
        let path = self.rules_path();
        let mut toggles: Vec<RuleToggle> = self.read_vec(&path).await?;
        toggles.retain(|t| t.code != toggle.code);
        toggles.push(toggle.clone());
        toggles.sort_by_key(|t| t.code as u8);
        self.write_json(&path, &toggles).await
    }

    async fn list_rule_toggles(&self) -> Result<Vec<RuleToggle>> {
        self.read_vec(&self.rules_path()).await
    }

    async fn install_roster(
        &mut self,
        roster: &Roster,
        items: &[RosterItem],
        snapshot: &[PoolSnapshotEntry],
    ) -> Result<()> {
        // The replacement lands before the prior roster is archived, so a
        // crash part-way leaves at most a transient double-active state that
        // `active_roster` resolves in favour of the newest record.
        self.write_json(&self.roster_path(roster.id), roster).await?;
        for item in items {
            self.write_json(&self.item_path(item.id), item).await?;
        }
        self.write_json(&self.snapshot_path(roster.id), &snapshot.to_vec()).await?;

        let all: Vec<Roster> = list_dir(&self.root.join("rosters")).await?;
        for mut existing in all {
            if existing.id != roster.id
                && existing.semester_id == roster.semester_id
                && !existing.status.terminal()
            {
                existing.status = RosterStatus::Archived;
                existing.updated_by = roster.created_by;
                existing.updated_at = roster.created_at;
                existing.version += 1;
                tracing::debug!(roster = %existing.id, "archiving superseded roster");
                self.write_json(&self.roster_path(existing.id), &existing).await?;
            }
        }
        Ok(())
    }

    async fn load_roster(&self, id: RosterId) -> Result<Option<Roster>> {
        read_json(&self.roster_path(id)).await
    }

    async fn active_roster(&self, semester_id: SemesterId) -> Result<Option<Roster>> {
        let all: Vec<Roster> = list_dir(&self.root.join("rosters")).await?;
        Ok(all
            .into_iter()
            .filter(|r| r.semester_id == semester_id && !r.status.terminal())
            .max_by_key(|r| (r.created_at, r.id)))
    }

    async fn update_roster(&mut self, roster: &Roster) -> Result<Roster> {
        let path = self.roster_path(roster.id);
        let stored: Roster = read_json(&path)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("roster {}", roster.id)))?;
        if stored.version != roster.version {
            return Err(StorageError::StaleVersion {
                entity: "roster",
                id: roster.id.to_string(),
            });
        }
        let mut updated = roster.clone();
        updated.version += 1;
        self.write_json(&path, &updated).await?;
        Ok(updated)
    }

    async fn load_item(&self, id: RosterItemId) -> Result<Option<RosterItem>> {
        read_json(&self.item_path(id)).await
    }

    async fn list_items(&self, roster_id: RosterId) -> Result<Vec<RosterItem>> {
        let all: Vec<RosterItem> = list_dir(&self.root.join("items")).await?;
        let mut items: Vec<RosterItem> =
            all.into_iter().filter(|i| i.roster_id == roster_id).collect();
        items.sort_by_key(|i| (i.week, i.time_slot_id, i.id));
        Ok(items)
    }

    async fn list_items_for_member(
        &self,
        roster_id: RosterId,
        member_id: UserId,
    ) -> Result<Vec<RosterItem>> {
        let items = self.list_items(roster_id).await?;
        Ok(items.into_iter().filter(|i| i.member_id == member_id).collect())
    }

    async fn update_item(&mut self, item: &RosterItem) -> Result<RosterItem> {
        let path = self.item_path(item.id);
        let stored: RosterItem = read_json(&path)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("roster item {}", item.id)))?;
        if stored.version != item.version {
            return Err(StorageError::StaleVersion {
                entity: "roster item",
                id: item.id.to_string(),
            });
        }
        let mut updated = item.clone();
        updated.version += 1;
        self.write_json(&path, &updated).await?;
        Ok(updated)
    }

    async fn load_snapshot(&self, roster_id: RosterId) -> Result<Vec<PoolSnapshotEntry>> {
        self.read_vec(&self.snapshot_path(roster_id)).await
    }

    async fn append_change_log(&mut self, entry: &ChangeLogEntry) -> Result<()> {
        let path = self.changelog_path(entry.roster_id);
        let mut entries: Vec<ChangeLogEntry> = self.read_vec(&path).await?;
        entries.push(entry.clone());
        self.write_json(&path, &entries).await
    }

    async fn list_change_log(
        &self,
        roster_id: RosterId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ChangeLogEntry>, u64)> {
        let mut entries: Vec<ChangeLogEntry> =
            self.read_vec(&self.changelog_path(roster_id)).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = entries.len() as u64;
        let page = entries.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dutyroster_core::WeekParity;

    async fn store() -> (tempfile::TempDir, JsonStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn semester_roundtrip() {
        let (_dir, mut storage) = store().await;
        let semester = Semester {
            id: SemesterId::new(),
            name: "2025 Fall".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 18).unwrap(),
            first_week_parity: WeekParity::Odd,
        };
        storage.save_semester(&semester).await.unwrap();

        let loaded = storage.load_semester(semester.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, semester.name);
        assert_eq!(loaded.first_week_parity, WeekParity::Odd);

        assert!(storage.load_semester(SemesterId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn install_then_update_roster_versions() {
        let (_dir, mut storage) = store().await;
        let roster = Roster::draft(SemesterId::new(), UserId::new(), Utc::now());
        storage.install_roster(&roster, &[], &[]).await.unwrap();

        let mut publish = roster.clone();
        publish.status = RosterStatus::Published;
        let stored = storage.update_roster(&publish).await.unwrap();
        assert_eq!(stored.version, 2);

        // A writer still holding version 1 loses.
        let err = storage.update_roster(&roster).await.unwrap_err();
        assert!(matches!(err, StorageError::StaleVersion { .. }));
    }

    #[tokio::test]
    async fn candidate_upsert_replaces() {
        let (_dir, mut storage) = store().await;
        let semester_id = SemesterId::new();
        let user_id = UserId::new();
        let dept = dutyroster_core::DepartmentId::new();

        let mut candidate = Candidate {
            user_id,
            name: "Avery".to_string(),
            department_id: dept,
            submitted: false,
        };
        storage.save_candidate(semester_id, &candidate).await.unwrap();
        candidate.submitted = true;
        storage.save_candidate(semester_id, &candidate).await.unwrap();

        let pool = storage.list_duty_pool(semester_id).await.unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool[0].submitted);
    }
}
