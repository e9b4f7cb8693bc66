//! Conflict detection over a candidate schedule batch.
//!
//! All rules are evaluated per day, using grouped-then-sorted sweeps per
//! key (room, section, faculty) rather than all-pairs scans. Intervals are
//! half-open, so slots that merely touch do not conflict. The sweeps run
//! against both the new batch and, when provided, the persisted schedule,
//! so an upload cannot silently double-book a room or a faculty member
//! already taken by an overlapping slot elsewhere; pairs entirely inside
//! the persisted schedule are not this upload's fault and stay unreported.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::db::repo_config::IngestSettings;
use crate::models::{
    ParsedSlotEntry, Room, ScheduleEntry, Section, TimeOfDay, TimeRange, Weekday,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    RoomConflict,
    FacultyConflict,
    SectionOverlap,
    CapacityWarning,
    BreakOverlap,
    WorkloadExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

/// Minimal descriptor of a slot cited in a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub section_code: String,
    pub subject_code: String,
    pub room_no: Option<String>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// One detected conflict. Ephemeral: returned in the ingestion report or
/// used to gate the commit, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub message: String,
    pub entries: Vec<SlotRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Conflict {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Reference data the detector consults beyond the batch itself.
#[derive(Default)]
pub struct ConflictContext<'a> {
    /// Sections by code, for strength lookups.
    pub sections: Option<&'a HashMap<String, Section>>,
    /// Rooms by number, for capacity lookups.
    pub rooms: Option<&'a HashMap<String, Room>>,
    /// The currently persisted schedule, for cross-upload faculty rules.
    pub existing: &'a [ScheduleEntry],
}

/// One slot in the detector's working set: either from the candidate batch
/// or from the persisted schedule.
struct WorkingSlot {
    slot: SlotRef,
    day: Weekday,
    faculty: Option<String>,
    from_batch: bool,
}

impl WorkingSlot {
    fn range(&self) -> TimeRange {
        TimeRange::new(self.slot.start_time, self.slot.end_time)
    }
}

/// Detect conflicts in a candidate batch.
pub fn detect_conflicts(
    entries: &[ParsedSlotEntry],
    ctx: &ConflictContext<'_>,
    settings: &IngestSettings,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    let batch: Vec<WorkingSlot> = entries.iter().map(batch_slot).collect();
    let persisted: Vec<WorkingSlot> = ctx.existing.iter().map(persisted_slot).collect();

    // All double-booking rules run over the batch plus whatever persisted
    // schedule the caller provided, but a pair is only reported when at
    // least one side comes from the new batch — overlaps the store already
    // contains are not this upload's fault.
    let combined: Vec<&WorkingSlot> = batch.iter().chain(persisted.iter()).collect();
    sweep_overlaps(
        &combined,
        |s| s.slot.room_no.clone(),
        ConflictKind::RoomConflict,
        &mut conflicts,
        |room| format!("Room {room} is assigned to multiple sections at the same time"),
    );
    sweep_overlaps(
        &combined,
        |s| Some(s.slot.section_code.clone()),
        ConflictKind::SectionOverlap,
        &mut conflicts,
        |section| format!("Section {section} has overlapping classes"),
    );
    sweep_overlaps(
        &combined,
        |s| s.faculty.clone(),
        ConflictKind::FacultyConflict,
        &mut conflicts,
        |faculty| format!("Faculty {faculty} is assigned to multiple classes at the same time"),
    );
    check_workload(&combined, settings, &mut conflicts);

    check_capacity(&batch, ctx, &mut conflicts);
    check_break_window(&batch, settings, &mut conflicts);

    conflicts
}

fn batch_slot(entry: &ParsedSlotEntry) -> WorkingSlot {
    WorkingSlot {
        slot: SlotRef {
            section_code: entry.section_code.clone(),
            subject_code: entry.subject_code.clone(),
            room_no: entry.room_no.clone(),
            start_time: entry.start_time,
            end_time: entry.end_time,
        },
        day: entry.day,
        faculty: entry.faculty_name.clone(),
        from_batch: true,
    }
}

fn persisted_slot(entry: &ScheduleEntry) -> WorkingSlot {
    let faculty = match entry.faculty_name.as_str() {
        "" | "TBA" => None,
        name => Some(name.to_string()),
    };
    WorkingSlot {
        slot: SlotRef {
            section_code: entry.section_code.clone(),
            subject_code: entry.subject_code.clone(),
            room_no: Some(entry.room_no.clone()),
            start_time: entry.start_time,
            end_time: entry.end_time,
        },
        day: entry.day,
        faculty,
        from_batch: false,
    }
}

/// Group `slots` by `(day, key)`, sort each group by start time, and sweep
/// for overlapping neighbours. A pair is reported only when at least one
/// side belongs to the new batch.
fn sweep_overlaps<K: Fn(&WorkingSlot) -> Option<String>, M: Fn(&str) -> String>(
    slots: &[&WorkingSlot],
    key: K,
    kind: ConflictKind,
    conflicts: &mut Vec<Conflict>,
    message: M,
) {
    let mut groups: BTreeMap<(Weekday, String), Vec<&WorkingSlot>> = BTreeMap::new();
    for slot in slots.iter().copied() {
        if let Some(k) = key(slot) {
            groups.entry((slot.day, k)).or_default().push(slot);
        }
    }

    for ((day, key), mut group) in groups {
        group.sort_by_key(|s| s.slot.start_time);
        let mut open: Option<&WorkingSlot> = None;
        for slot in group {
            if let Some(prev) = open {
                if prev.range().overlaps(&slot.range()) && (prev.from_batch || slot.from_batch) {
                    conflicts.push(Conflict {
                        kind,
                        severity: Severity::Error,
                        day,
                        start_time: slot.slot.start_time,
                        end_time: slot.slot.end_time,
                        message: message(&key),
                        entries: vec![prev.slot.clone(), slot.slot.clone()],
                        suggestion: None,
                    });
                }
            }
            // Keep whichever slot reaches furthest as the open interval.
            open = match open {
                Some(prev) if prev.slot.end_time >= slot.slot.end_time => Some(prev),
                _ => Some(slot),
            };
        }
    }
}

/// Daily workload: total assigned minutes per faculty per day must not
/// exceed the configured cap. Distinct from a double-booking conflict.
fn check_workload(
    slots: &[&WorkingSlot],
    settings: &IngestSettings,
    conflicts: &mut Vec<Conflict>,
) {
    let mut minutes: BTreeMap<(Weekday, String), (u32, Vec<SlotRef>, bool)> = BTreeMap::new();
    for slot in slots {
        if let Some(faculty) = &slot.faculty {
            let bucket = minutes.entry((slot.day, faculty.clone())).or_default();
            bucket.0 += u32::from(slot.range().duration_minutes());
            bucket.1.push(slot.slot.clone());
            bucket.2 |= slot.from_batch;
        }
    }

    for ((day, faculty), (total, slots, touches_batch)) in minutes {
        if total <= settings.max_daily_faculty_minutes || !touches_batch || slots.is_empty() {
            continue;
        }
        let mut start_time = slots[0].start_time;
        let mut end_time = slots[0].end_time;
        for slot in &slots[1..] {
            start_time = start_time.min(slot.start_time);
            end_time = end_time.max(slot.end_time);
        }
        conflicts.push(Conflict {
            kind: ConflictKind::WorkloadExceeded,
            severity: Severity::Error,
            day,
            start_time,
            end_time,
            message: format!(
                "Faculty {faculty} is assigned {:.1} hours on {day}, exceeding the {:.1} hour cap",
                f64::from(total) / 60.0,
                f64::from(settings.max_daily_faculty_minutes) / 60.0,
            ),
            entries: slots,
            suggestion: None,
        });
    }
}

/// Section strength must fit the assigned room.
fn check_capacity(
    batch: &[WorkingSlot],
    ctx: &ConflictContext<'_>,
    conflicts: &mut Vec<Conflict>,
) {
    let (sections, rooms) = match (ctx.sections, ctx.rooms) {
        (Some(sections), Some(rooms)) => (sections, rooms),
        _ => return,
    };

    for slot in batch {
        let room_no = match &slot.slot.room_no {
            Some(r) => r,
            None => continue,
        };
        let (section, room) = match (sections.get(&slot.slot.section_code), rooms.get(room_no)) {
            (Some(section), Some(room)) => (section, room),
            _ => continue,
        };
        if section.strength > room.capacity {
            conflicts.push(Conflict {
                kind: ConflictKind::CapacityWarning,
                severity: Severity::Warning,
                day: slot.day,
                start_time: slot.slot.start_time,
                end_time: slot.slot.end_time,
                message: format!(
                    "Room {room_no} capacity ({}) is less than section {} strength ({})",
                    room.capacity, section.section_code, section.strength
                ),
                entries: vec![slot.slot.clone()],
                suggestion: None,
            });
        }
    }
}

/// No class may overlap the fixed lunch window.
fn check_break_window(
    batch: &[WorkingSlot],
    settings: &IngestSettings,
    conflicts: &mut Vec<Conflict>,
) {
    let window = TimeRange::new(settings.break_start, settings.break_end);
    for slot in batch {
        if slot.range().overlaps(&window) {
            conflicts.push(Conflict {
                kind: ConflictKind::BreakOverlap,
                severity: Severity::Warning,
                day: slot.day,
                start_time: slot.slot.start_time,
                end_time: slot.slot.end_time,
                message: format!(
                    "Class overlaps with lunch break ({}-{})",
                    settings.break_start, settings.break_end
                ),
                entries: vec![slot.slot.clone()],
                suggestion: Some(format!(
                    "Schedule before {} or after {}",
                    settings.break_start, settings.break_end
                )),
            });
        }
    }
}
