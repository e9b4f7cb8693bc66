//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using HashMap structures, providing fast, deterministic, and
//! isolated execution.
//!
//! Transactions are implemented by snapshotting the whole store on
//! `begin_transaction`: a rollback restores the snapshot, a commit discards
//! it. That gives the same visibility guarantee a database session
//! provides — a reader sees either the pre-transaction or the
//! post-commit state, never an intermediate one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::db::repository::{
    ReferenceRepository, RepositoryError, RepositoryResult, ScheduleRepository, TransactionScope,
};
use crate::models::{
    EntityId, Faculty, Room, ScheduleEntry, Section, Subject, TimeOfDay, Weekday,
};

type EntryKey = (String, Weekday, TimeOfDay);

/// In-memory local repository.
///
/// # Example
/// ```
/// use timetable_backend::db::repositories::LocalRepository;
/// use timetable_backend::db::repository::ScheduleRepository;
///
/// # async fn example() {
/// let repo = LocalRepository::new();
/// assert!(repo.health_check().await.unwrap());
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    snapshot: Arc<RwLock<Option<LocalData>>>,
}

#[derive(Clone, Default)]
struct LocalData {
    sections: HashMap<String, Section>,
    subjects: HashMap<String, Subject>,
    rooms: HashMap<String, Room>,
    faculty: HashMap<String, Faculty>,
    entries: HashMap<EntryKey, ScheduleEntry>,

    next_id: i64,

    // Connection health
    is_healthy: bool,
}

impl LocalData {
    fn next_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                is_healthy: true,
                ..Default::default()
            })),
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        let mut data = self.data.write().unwrap();
        data.is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        let healthy = data.is_healthy;
        *data = LocalData {
            is_healthy: healthy,
            ..Default::default()
        };
    }

    /// Number of persisted schedule entries.
    pub fn entry_count(&self) -> usize {
        self.data.read().unwrap().entries.len()
    }

    /// Seed a section directly; test setup helper.
    pub fn seed_section(&self, mut section: Section) -> EntityId {
        let mut data = self.data.write().unwrap();
        let id = data.next_id();
        section.id = Some(id);
        data.sections.insert(section.section_code.clone(), section);
        id
    }

    fn check_health(&self) -> RepositoryResult<()> {
        let data = self.data.read().unwrap();
        if !data.is_healthy {
            return Err(RepositoryError::ConnectionError(
                "storage backend is not healthy".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceRepository for LocalRepository {
    async fn find_sections(&self, codes: &[String]) -> RepositoryResult<Vec<Section>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(codes
            .iter()
            .filter_map(|code| data.sections.get(code).cloned())
            .collect())
    }

    async fn insert_section(&self, section: &Section) -> RepositoryResult<EntityId> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if data.sections.contains_key(&section.section_code) {
            return Err(RepositoryError::Duplicate(format!(
                "section {} already exists",
                section.section_code
            )));
        }
        let id = data.next_id();
        let mut stored = section.clone();
        stored.id = Some(id);
        data.sections.insert(stored.section_code.clone(), stored);
        Ok(id)
    }

    async fn update_section_class_teacher(
        &self,
        section_code: &str,
        class_teacher: &str,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let section = data.sections.get_mut(section_code).ok_or_else(|| {
            RepositoryError::NotFound(format!("section {section_code} not found"))
        })?;
        section.class_teacher = Some(class_teacher.to_string());
        Ok(())
    }

    async fn find_subjects(&self, codes: &[String]) -> RepositoryResult<Vec<Subject>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(codes
            .iter()
            .filter_map(|code| data.subjects.get(code).cloned())
            .collect())
    }

    async fn insert_subject(&self, subject: &Subject) -> RepositoryResult<EntityId> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if data.subjects.contains_key(&subject.code) {
            return Err(RepositoryError::Duplicate(format!(
                "subject {} already exists",
                subject.code
            )));
        }
        let id = data.next_id();
        let mut stored = subject.clone();
        stored.id = Some(id);
        data.subjects.insert(stored.code.clone(), stored);
        Ok(id)
    }

    async fn find_rooms(&self, numbers: &[String]) -> RepositoryResult<Vec<Room>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(numbers
            .iter()
            .filter_map(|number| data.rooms.get(number).cloned())
            .collect())
    }

    async fn insert_room(&self, room: &Room) -> RepositoryResult<EntityId> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if data.rooms.contains_key(&room.number) {
            return Err(RepositoryError::Duplicate(format!(
                "room {} already exists",
                room.number
            )));
        }
        let id = data.next_id();
        let mut stored = room.clone();
        stored.id = Some(id);
        data.rooms.insert(stored.number.clone(), stored);
        Ok(id)
    }

    async fn find_faculty(&self, names: &[String]) -> RepositoryResult<Vec<Faculty>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        Ok(names
            .iter()
            .filter_map(|name| data.faculty.get(name).cloned())
            .collect())
    }

    async fn insert_faculty(&self, faculty: &Faculty) -> RepositoryResult<EntityId> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        if data.faculty.contains_key(&faculty.name)
            || data.faculty.values().any(|f| f.email == faculty.email)
        {
            return Err(RepositoryError::Duplicate(format!(
                "faculty {} already exists",
                faculty.name
            )));
        }
        let id = data.next_id();
        let mut stored = faculty.clone();
        stored.id = Some(id);
        data.faculty.insert(stored.name.clone(), stored);
        Ok(id)
    }
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let data = self.data.read().unwrap();
        Ok(data.is_healthy)
    }

    async fn entries_for_section(&self, section_code: &str) -> RepositoryResult<Vec<ScheduleEntry>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut entries: Vec<ScheduleEntry> = data
            .entries
            .values()
            .filter(|e| e.section_code == section_code)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.day, e.start_time));
        Ok(entries)
    }

    async fn entries_for_day(&self, day: Weekday) -> RepositoryResult<Vec<ScheduleEntry>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut entries: Vec<ScheduleEntry> = data
            .entries
            .values()
            .filter(|e| e.day == day)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.section_code.clone(), e.start_time));
        Ok(entries)
    }

    async fn all_entries(&self) -> RepositoryResult<Vec<ScheduleEntry>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut entries: Vec<ScheduleEntry> = data.entries.values().cloned().collect();
        entries.sort_by_key(|e| (e.section_code.clone(), e.day, e.start_time));
        Ok(entries)
    }

    async fn delete_entries_for_section(&self, section_code: &str) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let before = data.entries.len();
        data.entries.retain(|_, e| e.section_code != section_code);
        Ok(before - data.entries.len())
    }

    async fn insert_entry(&self, entry: &ScheduleEntry) -> RepositoryResult<EntityId> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let key = entry.natural_key();
        if data.entries.contains_key(&key) {
            return Err(RepositoryError::Duplicate(format!(
                "entry for {} on {} at {} already exists",
                key.0, key.1, key.2
            )));
        }
        let id = data.next_id();
        let mut stored = entry.clone();
        stored.id = Some(id);
        data.entries.insert(key, stored);
        Ok(id)
    }
}

#[async_trait]
impl TransactionScope for LocalRepository {
    async fn begin_transaction(&self) -> RepositoryResult<()> {
        self.check_health()?;
        let mut snapshot = self.snapshot.write().unwrap();
        if snapshot.is_some() {
            return Err(RepositoryError::TransactionError(
                "a transaction is already in progress".to_string(),
            ));
        }
        *snapshot = Some(self.data.read().unwrap().clone());
        Ok(())
    }

    async fn commit_transaction(&self) -> RepositoryResult<()> {
        let mut snapshot = self.snapshot.write().unwrap();
        if snapshot.take().is_none() {
            return Err(RepositoryError::TransactionError(
                "no transaction in progress".to_string(),
            ));
        }
        Ok(())
    }

    async fn rollback_transaction(&self) -> RepositoryResult<()> {
        let mut snapshot = self.snapshot.write().unwrap();
        match snapshot.take() {
            Some(saved) => {
                *self.data.write().unwrap() = saved;
                Ok(())
            }
            None => Err(RepositoryError::TransactionError(
                "no transaction in progress".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassType, EntryStatus};

    fn section(code: &str) -> Section {
        Section {
            id: None,
            section_code: code.to_string(),
            name: format!("Section {code}"),
            department: "Computer Science".to_string(),
            year: 3,
            semester: 5,
            strength: 60,
            academic_year: "2024-25".to_string(),
            class_teacher: None,
            active: true,
        }
    }

    fn entry(section_code: &str, day: Weekday, start: &str, end: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: None,
            section_code: section_code.to_string(),
            section_id: EntityId(1),
            day,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            subject_code: "CN".to_string(),
            subject_id: None,
            room_no: "407".to_string(),
            room_id: None,
            faculty_name: "Ms. V. ANUSHA".to_string(),
            faculty_id: None,
            class_type: ClassType::Theory,
            duration: 1,
            status: EntryStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_and_find_section() {
        let repo = LocalRepository::new();
        let id = repo.insert_section(&section("SEC1")).await.unwrap();

        let found = repo.find_sections(&["SEC1".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(id));

        let missing = repo.find_sections(&["SEC9".to_string()]).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_section_rejected() {
        let repo = LocalRepository::new();
        repo.insert_section(&section("SEC1")).await.unwrap();
        let err = repo.insert_section(&section("SEC1")).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_natural_key_uniqueness_on_entries() {
        let repo = LocalRepository::new();
        let e = entry("SEC1", Weekday::Monday, "09:00", "10:00");
        repo.insert_entry(&e).await.unwrap();

        let err = repo.insert_entry(&e).await.unwrap_err();
        assert!(err.is_duplicate());

        // Same section and day, different start time: fine.
        let later = entry("SEC1", Weekday::Monday, "10:00", "11:00");
        repo.insert_entry(&later).await.unwrap();
        assert_eq!(repo.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_entries_for_day_spans_sections() {
        let repo = LocalRepository::new();
        repo.insert_entry(&entry("SEC1", Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();
        repo.insert_entry(&entry("SEC2", Weekday::Monday, "10:00", "11:00"))
            .await
            .unwrap();
        repo.insert_entry(&entry("SEC1", Weekday::Tuesday, "09:00", "10:00"))
            .await
            .unwrap();

        let monday = repo.entries_for_day(Weekday::Monday).await.unwrap();
        assert_eq!(monday.len(), 2);
        assert!(monday.iter().all(|e| e.day == Weekday::Monday));
    }

    #[tokio::test]
    async fn test_delete_entries_for_section() {
        let repo = LocalRepository::new();
        repo.insert_entry(&entry("SEC1", Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();
        repo.insert_entry(&entry("SEC2", Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();

        let deleted = repo.delete_entries_for_section("SEC1").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_rollback_restores_pre_transaction_state() {
        let repo = LocalRepository::new();
        repo.insert_entry(&entry("SEC1", Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();

        repo.begin_transaction().await.unwrap();
        repo.delete_entries_for_section("SEC1").await.unwrap();
        repo.insert_entry(&entry("SEC1", Weekday::Tuesday, "09:00", "10:00"))
            .await
            .unwrap();
        repo.rollback_transaction().await.unwrap();

        let entries = repo.entries_for_section("SEC1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].day, Weekday::Monday);
    }

    #[tokio::test]
    async fn test_commit_keeps_transaction_writes() {
        let repo = LocalRepository::new();
        repo.begin_transaction().await.unwrap();
        repo.insert_entry(&entry("SEC1", Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();
        repo.commit_transaction().await.unwrap();
        assert_eq!(repo.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_nested_transactions_rejected() {
        let repo = LocalRepository::new();
        repo.begin_transaction().await.unwrap();
        let err = repo.begin_transaction().await.unwrap_err();
        assert!(matches!(err, RepositoryError::TransactionError(_)));
        repo.rollback_transaction().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_class_teacher() {
        let repo = LocalRepository::new();
        repo.seed_section(section("SEC1"));
        repo.update_section_class_teacher("SEC1", "Ms. V. ANUSHA")
            .await
            .unwrap();

        let found = repo.find_sections(&["SEC1".to_string()]).await.unwrap();
        assert_eq!(found[0].class_teacher.as_deref(), Some("Ms. V. ANUSHA"));
    }
}
