use serde::{Deserialize, Serialize};

use super::slot::{ClassType, Weekday};
use super::time::TimeOfDay;

/// Opaque durable-record identifier assigned by the storage backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub i64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student section, keyed by its section code (e.g. `"SEC14"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Option<EntityId>,
    pub section_code: String,
    pub name: String,
    pub department: String,
    pub year: u8,
    pub semester: u8,
    pub strength: u32,
    pub academic_year: String,
    pub class_teacher: Option<String>,
    pub active: bool,
}

/// A subject, keyed by its code (e.g. `"CN"`, `"CD-LAB"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Option<EntityId>,
    pub code: String,
    pub name: String,
    pub department: String,
    pub semester: u8,
    pub credits: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Classroom,
    Lab,
}

/// A room, keyed by its number (e.g. `"407"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Option<EntityId>,
    pub number: String,
    pub block: String,
    pub capacity: u32,
    pub kind: RoomKind,
}

/// A faculty member, keyed by display name; email is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: Option<EntityId>,
    pub name: String,
    pub department: String,
    pub email: String,
    /// Hex sha256 digest of the credential; never the credential itself.
    pub password_digest: String,
    pub role: String,
    /// Set on auto-provisioned accounts issued a placeholder credential.
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// Durable schedule record.
///
/// The storage layer enforces that no two entries for one section share the
/// same `(day, start_time)`. Foreign-key ids are optional: the record always
/// carries the human-readable code/name even when no linked entity exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Option<EntityId>,
    pub section_code: String,
    pub section_id: EntityId,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub subject_code: String,
    pub subject_id: Option<EntityId>,
    pub room_no: String,
    pub room_id: Option<EntityId>,
    pub faculty_name: String,
    pub faculty_id: Option<EntityId>,
    pub class_type: ClassType,
    pub duration: u32,
    pub status: EntryStatus,
}

impl ScheduleEntry {
    /// The natural key the storage layer enforces uniqueness on.
    pub fn natural_key(&self) -> (String, Weekday, TimeOfDay) {
        (self.section_code.clone(), self.day, self.start_time)
    }
}
