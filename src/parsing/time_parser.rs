//! Time-slot header parsing.
//!
//! Header cells carry ranges like `"8.15-9.05"` with dot or colon
//! separators and an optional AM/PM suffix. The academic day starts at 8,
//! so an unmarked hour below 8 is read as PM (a `"1.30"` in an afternoon
//! column means 13:30). A range whose end does not land after its start
//! after that adjustment gets a further 12-hour shift on the end, covering
//! slots that cross noon without an explicit PM marker.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{TimeOfDay, TimeRange};

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})[.:](\d{2})\s*(AM|PM)?\s*[-–—]\s*(\d{1,2})[.:](\d{2})\s*(AM|PM)?$",
    )
    .unwrap()
});

static SINGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})[.:](\d{2})\s*(AM|PM)?$").unwrap());

/// First hour of the academic day; unmarked hours below this are PM.
const DAY_START_HOUR: u16 = 8;

/// Parse a header cell into a time range.
///
/// Also accepts a single `"H.MM"` time, defaulting to a one-hour slot.
/// Returns `None` when the text is not a time at all — the caller must
/// treat the column as non-scheduling.
pub fn parse_time_range(text: &str) -> Option<TimeRange> {
    let trimmed = text.trim();

    if let Some(caps) = RANGE_RE.captures(trimmed) {
        let start_hour = adjust_hour(caps[1].parse().ok()?, caps.get(3).map(|m| m.as_str()));
        let start_min: u16 = caps[2].parse().ok()?;
        let mut end_hour = adjust_hour(caps[4].parse().ok()?, caps.get(6).map(|m| m.as_str()));
        let end_min: u16 = caps[5].parse().ok()?;

        // A slot crossing noon without a PM marker parses with end <= start;
        // push the end into the afternoon.
        if end_hour * 60 + end_min <= start_hour * 60 + start_min {
            end_hour += 12;
        }

        let start = TimeOfDay::from_hm(start_hour, start_min)?;
        let end = TimeOfDay::from_hm(end_hour, end_min)?;
        return Some(TimeRange::new(start, end));
    }

    if let Some(caps) = SINGLE_RE.captures(trimmed) {
        let hour = adjust_hour(caps[1].parse().ok()?, caps.get(3).map(|m| m.as_str()));
        let minute: u16 = caps[2].parse().ok()?;
        let start = TimeOfDay::from_hm(hour, minute)?;
        let end = start.plus_hours(1)?;
        return Some(TimeRange::new(start, end));
    }

    None
}

fn adjust_hour(hour: u16, suffix: Option<&str>) -> u16 {
    match suffix.map(|s| s.to_ascii_uppercase()) {
        Some(ref s) if s == "PM" && hour < 12 => hour + 12,
        Some(ref s) if s == "AM" => hour,
        _ if hour < DAY_START_HOUR => hour + 12,
        _ => hour,
    }
}
