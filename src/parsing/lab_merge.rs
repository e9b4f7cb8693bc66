//! Lab merging: collapse consecutive identical lab slots.
//!
//! Spreadsheets express a two-period lab as two adjacent cells with the
//! same text. This pass rewrites them as one entry spanning the combined
//! range, tracking how many source periods were merged.

use std::collections::BTreeMap;

use crate::models::{ClassType, ParsedSlotEntry, Weekday};

/// Merge strictly back-to-back identical lab slots.
///
/// Entries are grouped by `(section, day)` and sorted by start time; a
/// single accumulator sweeps each group left to right. A candidate merges
/// into the accumulator iff subject, room and the `Lab` class type all
/// match, the candidate starts exactly where the accumulator ends (no gap
/// tolerance), and the faculty names are compatible (either side unset, or
/// equal). Non-lab entries pass through unmodified.
pub fn merge_lab_slots(entries: Vec<ParsedSlotEntry>) -> Vec<ParsedSlotEntry> {
    let mut groups: BTreeMap<(String, Weekday), Vec<ParsedSlotEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.section_code.clone(), entry.day))
            .or_default()
            .push(entry);
    }

    let mut merged = Vec::new();
    for (_, mut group) in groups {
        group.sort_by_key(|e| e.start_time);

        let mut current: Option<ParsedSlotEntry> = None;
        for entry in group {
            match current.take() {
                None => current = Some(entry),
                Some(mut acc) => {
                    if can_merge(&acc, &entry) {
                        acc.end_time = entry.end_time;
                        acc.duration += 1;
                        acc.merge_count += 1;
                        acc.merged = true;
                        if acc.faculty_name.is_none() {
                            acc.faculty_name = entry.faculty_name;
                        }
                        current = Some(acc);
                    } else {
                        merged.push(acc);
                        current = Some(entry);
                    }
                }
            }
        }
        if let Some(acc) = current {
            merged.push(acc);
        }
    }

    merged
}

fn can_merge(current: &ParsedSlotEntry, candidate: &ParsedSlotEntry) -> bool {
    current.class_type == ClassType::Lab
        && candidate.class_type == ClassType::Lab
        && current.subject_code == candidate.subject_code
        && current.room_no == candidate.room_no
        && candidate.start_time == current.end_time
        && faculty_compatible(&current.faculty_name, &candidate.faculty_name)
}

fn faculty_compatible(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}
