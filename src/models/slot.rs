use serde::{Deserialize, Serialize};

use super::time::{TimeOfDay, TimeRange};

/// Canonical weekday tokens used throughout the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of class a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassType {
    Theory,
    Lab,
    Tutorial,
    Assessment,
    Honors,
}

impl ClassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Theory => "Theory",
            ClassType::Lab => "Lab",
            ClassType::Tutorial => "Tutorial",
            ClassType::Assessment => "Assessment",
            ClassType::Honors => "Honors",
        }
    }
}

impl std::fmt::Display for ClassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of parsing one timetable cell.
///
/// Ephemeral: produced by the cell grammar, consumed by the sheet parser,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCellToken {
    pub subject_code: String,
    pub class_type: ClassType,
    pub room_no: Option<String>,
    /// Faculty name found inline in the cell, e.g. `"CN(Prof.X)-407"`.
    pub faculty_hint: Option<String>,
}

/// Grid coordinates and original text of the cell an entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// One scheduled slot as parsed from a sheet.
///
/// Created by the sheet parser, mutated only by the lab-merge pass
/// (`end_time` extended, `duration`/`merge_count` incremented), immutable
/// afterwards. Its durable form is [`super::entities::ScheduleEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSlotEntry {
    pub section_code: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub subject_code: String,
    pub room_no: Option<String>,
    pub faculty_name: Option<String>,
    pub class_type: ClassType,
    /// Number of consecutive periods this entry spans (>= 1).
    pub duration: u32,
    pub merged: bool,
    pub merge_count: u32,
    pub source: CellRef,
}

impl ParsedSlotEntry {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// Subject code without a trailing `-LAB` marker.
    pub fn base_subject_code(&self) -> &str {
        self.subject_code
            .strip_suffix("-LAB")
            .unwrap_or(&self.subject_code)
    }
}
