use crate::models::{CellRef, ClassType, ParsedSlotEntry, TimeOfDay, Weekday};

use super::lab_merge::merge_lab_slots;

fn t(text: &str) -> TimeOfDay {
    text.parse().unwrap()
}

fn lab(start: &str, end: &str) -> ParsedSlotEntry {
    slot("CD-LAB", ClassType::Lab, "512", start, end)
}

fn slot(
    subject: &str,
    class_type: ClassType,
    room: &str,
    start: &str,
    end: &str,
) -> ParsedSlotEntry {
    ParsedSlotEntry {
        section_code: "SEC1".into(),
        day: Weekday::Monday,
        start_time: t(start),
        end_time: t(end),
        subject_code: subject.into(),
        room_no: Some(room.into()),
        faculty_name: None,
        class_type,
        duration: 1,
        merged: false,
        merge_count: 1,
        source: CellRef {
            row: 1,
            col: 1,
            text: String::new(),
        },
    }
}

#[test]
fn test_three_consecutive_labs_merge_into_one() {
    let merged = merge_lab_slots(vec![
        lab("09:00", "10:00"),
        lab("10:00", "11:00"),
        lab("11:00", "12:00"),
    ]);

    assert_eq!(merged.len(), 1);
    let entry = &merged[0];
    assert_eq!(entry.start_time, t("09:00"));
    assert_eq!(entry.end_time, t("12:00"));
    assert_eq!(entry.duration, 3);
    assert_eq!(entry.merge_count, 3);
    assert!(entry.merged);
}

#[test]
fn test_gap_prevents_merging() {
    let merged = merge_lab_slots(vec![lab("09:00", "10:00"), lab("10:05", "11:05")]);
    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|e| !e.merged && e.duration == 1));
}

#[test]
fn test_room_change_starts_a_new_entry() {
    let merged = merge_lab_slots(vec![
        lab("09:00", "10:00"),
        slot("CD-LAB", ClassType::Lab, "508", "10:00", "11:00"),
    ]);
    assert_eq!(merged.len(), 2);
}

#[test]
fn test_subject_change_starts_a_new_entry() {
    let merged = merge_lab_slots(vec![
        lab("09:00", "10:00"),
        slot("OS-LAB", ClassType::Lab, "512", "10:00", "11:00"),
    ]);
    assert_eq!(merged.len(), 2);
}

#[test]
fn test_theory_slots_never_merge() {
    let merged = merge_lab_slots(vec![
        slot("CN", ClassType::Theory, "407", "09:00", "10:00"),
        slot("CN", ClassType::Theory, "407", "10:00", "11:00"),
    ]);
    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|e| e.duration == 1));
}

#[test]
fn test_faculty_mismatch_blocks_merge() {
    let mut a = lab("09:00", "10:00");
    a.faculty_name = Some("Dr. X".into());
    let mut b = lab("10:00", "11:00");
    b.faculty_name = Some("Dr. Y".into());
    assert_eq!(merge_lab_slots(vec![a, b]).len(), 2);
}

#[test]
fn test_unset_faculty_is_compatible_and_filled_in() {
    let a = lab("09:00", "10:00");
    let mut b = lab("10:00", "11:00");
    b.faculty_name = Some("Dr. Y".into());

    let merged = merge_lab_slots(vec![a, b]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].faculty_name.as_deref(), Some("Dr. Y"));
}

#[test]
fn test_groups_are_per_section_and_day() {
    let mut other_day = lab("10:00", "11:00");
    other_day.day = Weekday::Tuesday;
    let mut other_section = lab("10:00", "11:00");
    other_section.section_code = "SEC2".into();

    let merged = merge_lab_slots(vec![lab("09:00", "10:00"), other_day, other_section]);
    assert_eq!(merged.len(), 3);
}

#[test]
fn test_out_of_order_input_is_sorted_before_the_sweep() {
    let merged = merge_lab_slots(vec![lab("10:00", "11:00"), lab("09:00", "10:00")]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].duration, 2);
}
