//! Repository traits for abstracting storage operations.
//!
//! These traits define the interface the ingestion pipeline needs from
//! durable storage: natural-key lookups, inserts, bulk deletion, and a
//! transaction scope. Implementations can use different backends; the
//! in-memory implementation in [`super::repositories::local`] is the
//! default for tests and local development.

use async_trait::async_trait;

use crate::models::{EntityId, Faculty, Room, ScheduleEntry, Section, Subject, Weekday};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Natural-key collision on insert. Non-fatal for batch inserts: the
    /// committer records it and continues with the remaining rows.
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RepositoryError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RepositoryError::Duplicate(_))
    }

    /// Transient faults that abort the whole batch rather than one row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RepositoryError::ConnectionError(_) | RepositoryError::TransactionError(_)
        )
    }
}

/// Lookup and creation of the durable reference entities, each keyed by a
/// natural code (section code, subject code, room number, faculty name).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust and allow
/// sharing across threads.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Find sections by section code. Missing codes are simply absent from
    /// the result; the caller diagnoses them.
    async fn find_sections(&self, codes: &[String]) -> RepositoryResult<Vec<Section>>;

    /// Insert a new section. Fails with [`RepositoryError::Duplicate`] when
    /// the section code is already taken.
    async fn insert_section(&self, section: &Section) -> RepositoryResult<EntityId>;

    /// Set the class teacher recorded on a section.
    async fn update_section_class_teacher(
        &self,
        section_code: &str,
        class_teacher: &str,
    ) -> RepositoryResult<()>;

    async fn find_subjects(&self, codes: &[String]) -> RepositoryResult<Vec<Subject>>;

    async fn insert_subject(&self, subject: &Subject) -> RepositoryResult<EntityId>;

    async fn find_rooms(&self, numbers: &[String]) -> RepositoryResult<Vec<Room>>;

    async fn insert_room(&self, room: &Room) -> RepositoryResult<EntityId>;

    async fn find_faculty(&self, names: &[String]) -> RepositoryResult<Vec<Faculty>>;

    async fn insert_faculty(&self, faculty: &Faculty) -> RepositoryResult<EntityId>;
}

/// Operations on the persisted schedule.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Check if the storage backend is reachable and healthy.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// All persisted entries for one section.
    async fn entries_for_section(&self, section_code: &str) -> RepositoryResult<Vec<ScheduleEntry>>;

    /// All persisted entries on one weekday, across sections.
    async fn entries_for_day(&self, day: Weekday) -> RepositoryResult<Vec<ScheduleEntry>>;

    /// The full persisted schedule.
    async fn all_entries(&self) -> RepositoryResult<Vec<ScheduleEntry>>;

    /// Delete every entry for one section, returning the count removed.
    async fn delete_entries_for_section(&self, section_code: &str) -> RepositoryResult<usize>;

    /// Insert one entry.
    ///
    /// Fails with [`RepositoryError::Duplicate`] when an entry with the
    /// same `(section_code, day, start_time)` natural key already exists.
    async fn insert_entry(&self, entry: &ScheduleEntry) -> RepositoryResult<EntityId>;
}

/// One-at-a-time transaction scope over the repository.
///
/// Every write issued between `begin_transaction` and `commit_transaction`
/// becomes visible atomically; `rollback_transaction` discards all of them.
/// The ingestion pipeline is request-scoped and single-flow, so nested
/// transactions are not supported.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    async fn begin_transaction(&self) -> RepositoryResult<()>;
    async fn commit_transaction(&self) -> RepositoryResult<()>;
    async fn rollback_transaction(&self) -> RepositoryResult<()>;
}

/// Convenience trait for the full repository surface the pipeline needs.
pub trait FullRepository: ReferenceRepository + ScheduleRepository + TransactionScope {}

impl<T: ReferenceRepository + ScheduleRepository + TransactionScope> FullRepository for T {}
