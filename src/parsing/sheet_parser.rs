//! Sheet grammar: one worksheet grid into a section's slot entries.
//!
//! The expected layout is: a few banner rows (one of which names the
//! section), a header row whose first cell reads `Day`/`Days`/`Time` and
//! whose remaining cells are time ranges, one row per weekday, and a
//! trailer region that may carry a `SUBJECT → Faculty` mapping table and a
//! `Class Teacher → Name` line.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{CellRef, ClassType, ParsedSlotEntry, TimeRange};

use super::cell_parser::parse_cell;
use super::day_parser::parse_day;
use super::lab_merge::merge_lab_slots;
use super::time_parser::parse_time_range;

/// Rows scanned from the top when looking for the section banner.
const SECTION_SCAN_ROWS: usize = 3;
/// Rows scanned from the top when looking for the header row.
const HEADER_SCAN_ROWS: usize = 5;
/// Rows from the sheet bottom searched for the class-teacher line.
const CLASS_TEACHER_SEARCH_ROWS: usize = 10;

static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)SECTION").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());
static BREAK_COLUMN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)BREAK|LUNCH|RECESS").unwrap());
static ARROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"→|->|=>").unwrap());
static SUBJECT_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9\-\s]+$").unwrap());
static CLASS_TEACHER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Class\s+Teacher\s*(?:→|->|=>|[:–-])\s*(.+)").unwrap());

/// A cell that failed to parse, with its grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellError {
    pub row: usize,
    pub col: usize,
    pub text: String,
    pub reason: String,
}

/// Result of parsing one worksheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetOutcome {
    pub section_code: String,
    pub class_teacher: Option<String>,
    /// Subject code (and `<code>-LAB`) to ordered faculty display names.
    pub faculty_map: HashMap<String, Vec<String>>,
    pub entries: Vec<ParsedSlotEntry>,
    /// Free cells (breaks, dashes, empties) skipped without error.
    pub skipped_cells: usize,
    /// Cells under break or invalid header columns, always skipped.
    pub non_scheduling_cells: usize,
    pub cell_errors: Vec<CellError>,
    /// Entries removed by collapsing consecutive lab slots.
    pub labs_merged: usize,
}

/// Reasons a whole sheet is excluded from the workbook result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SheetError {
    #[error("cannot determine a section code from the sheet or its label")]
    NoSectionCode,
    #[error("no header row found (expected 'Day'/'Days'/'Time' in the first column)")]
    NoHeaderRow,
    #[error("no valid timetable entries found in sheet")]
    NoEntries,
}

/// Header-column classification.
enum ColumnKind {
    Slot(TimeRange),
    Break,
    Invalid,
}

/// Normalize `SECTION-14` / `SECTION 14` / `SEC 14` / a bare `14` to `SEC14`.
pub fn normalize_section_code(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let number = NUMBER_RE.captures(&upper)?.get(1)?.as_str().to_string();
    Some(format!("SEC{number}"))
}

/// Parse one worksheet grid.
///
/// `sheet_label` is the workbook tab name, used as a fallback source for
/// the section code.
pub fn parse_sheet(grid: &[Vec<String>], sheet_label: &str) -> Result<SheetOutcome, SheetError> {
    let section_code = find_section_code(grid, sheet_label).ok_or(SheetError::NoSectionCode)?;

    let (header_row, columns) = find_header_row(grid).ok_or(SheetError::NoHeaderRow)?;

    let mut raw_entries = Vec::new();
    let mut skipped_cells = 0usize;
    let mut non_scheduling_cells = 0usize;
    let mut cell_errors = Vec::new();
    let mut trailer_start = grid.len();

    for (row_idx, row) in grid.iter().enumerate().skip(header_row + 1) {
        let day = match row.first().and_then(|c| parse_day(c)) {
            Some(day) => day,
            None => {
                // First non-day value below the header ends the grid;
                // everything from here down is the trailer region.
                trailer_start = row_idx;
                break;
            }
        };

        for (col_idx, cell) in row.iter().enumerate().skip(1) {
            let kind = match columns.get(col_idx - 1) {
                Some(kind) => kind,
                None => break,
            };
            let range = match kind {
                ColumnKind::Slot(range) => range,
                ColumnKind::Break | ColumnKind::Invalid => {
                    non_scheduling_cells += 1;
                    continue;
                }
            };

            match parse_cell(cell) {
                Ok(None) => skipped_cells += 1,
                Ok(Some(token)) => raw_entries.push(ParsedSlotEntry {
                    section_code: section_code.clone(),
                    day,
                    start_time: range.start,
                    end_time: range.end,
                    subject_code: token.subject_code,
                    room_no: token.room_no,
                    faculty_name: token.faculty_hint,
                    class_type: token.class_type,
                    duration: 1,
                    merged: false,
                    merge_count: 1,
                    source: CellRef {
                        row: row_idx,
                        col: col_idx,
                        text: cell.clone(),
                    },
                }),
                Err(err) => cell_errors.push(CellError {
                    row: row_idx,
                    col: col_idx,
                    text: cell.clone(),
                    reason: err.to_string(),
                }),
            }
        }
    }

    if raw_entries.is_empty() {
        return Err(SheetError::NoEntries);
    }

    let raw_count = raw_entries.len();
    let mut entries = merge_lab_slots(raw_entries);
    let labs_merged = raw_count - entries.len();

    let faculty_map = parse_faculty_map(grid, trailer_start);
    let class_teacher = parse_class_teacher(grid, trailer_start);
    attach_faculty(&mut entries, &faculty_map);

    debug!(
        "sheet {sheet_label:?}: section {section_code}, {} entries, {labs_merged} labs merged, \
         {} faculty mappings",
        entries.len(),
        faculty_map.len()
    );

    Ok(SheetOutcome {
        section_code,
        class_teacher,
        faculty_map,
        entries,
        skipped_cells,
        non_scheduling_cells,
        cell_errors,
        labs_merged,
    })
}

fn find_section_code(grid: &[Vec<String>], sheet_label: &str) -> Option<String> {
    for row in grid.iter().take(SECTION_SCAN_ROWS) {
        if let Some(first) = row.first() {
            if SECTION_RE.is_match(first) {
                if let Some(code) = normalize_section_code(first) {
                    return Some(code);
                }
            }
        }
    }
    normalize_section_code(sheet_label)
}

fn find_header_row(grid: &[Vec<String>]) -> Option<(usize, Vec<ColumnKind>)> {
    for (row_idx, row) in grid.iter().enumerate().take(HEADER_SCAN_ROWS) {
        let first = row.first().map(|c| c.trim().to_uppercase());
        if !matches!(first.as_deref(), Some("DAY" | "DAYS" | "TIME")) {
            continue;
        }
        let columns = row
            .iter()
            .skip(1)
            .map(|cell| {
                if BREAK_COLUMN_RE.is_match(cell) {
                    ColumnKind::Break
                } else {
                    match parse_time_range(cell) {
                        Some(range) => ColumnKind::Slot(range),
                        None => ColumnKind::Invalid,
                    }
                }
            })
            .collect();
        return Some((row_idx, columns));
    }
    None
}

/// Parse the trailer faculty mapping table.
///
/// Accepted row shapes, after the grid ends:
/// - one cell `CD → Mr. Name[, Name...]`
/// - two cells `CD` | `→ Mr. Name`
/// - bare two-column `CD` | `Mr. Name` where the first cell looks like a
///   subject code
fn parse_faculty_map(grid: &[Vec<String>], trailer_start: usize) -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();

    for row in grid.iter().skip(trailer_start) {
        let first = match row.first().map(|c| c.trim()) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };
        if CLASS_TEACHER_RE.is_match(first) {
            continue;
        }

        // Single-cell form: "CD → Mr. Name".
        if ARROW_RE.is_match(first) {
            let mut parts = ARROW_RE.splitn(first, 2);
            if let (Some(code), Some(names)) = (parts.next(), parts.next()) {
                insert_mapping(&mut map, code, names);
            }
            continue;
        }

        let second = match row.get(1).map(|c| c.trim()) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };

        if ARROW_RE.is_match(second) {
            // Arrow lives in the second column: "CD" | "→ Mr. Name".
            let names = ARROW_RE.splitn(second, 2).nth(1).unwrap_or(second);
            insert_mapping(&mut map, first, names);
        } else if first.len() <= 10 && SUBJECT_CODE_RE.is_match(&first.to_uppercase()) {
            insert_mapping(&mut map, first, second);
        }
    }

    map
}

fn insert_mapping(map: &mut HashMap<String, Vec<String>>, code: &str, names: &str) {
    let code = code.trim().to_uppercase();
    let names: Vec<String> = names
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if !code.is_empty() && !names.is_empty() {
        map.insert(code, names);
    }
}

fn parse_class_teacher(grid: &[Vec<String>], trailer_start: usize) -> Option<String> {
    let search_start = trailer_start.max(grid.len().saturating_sub(CLASS_TEACHER_SEARCH_ROWS));
    for row in grid.iter().skip(search_start) {
        for cell in row {
            if let Some(caps) = CLASS_TEACHER_RE.captures(cell) {
                let name = caps[1].trim().to_string();
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }
    None
}

/// Keys tried when resolving an entry's faculty from the mapping table.
pub fn faculty_lookup_keys(entry: &ParsedSlotEntry) -> Vec<String> {
    let mut keys = vec![entry.subject_code.clone()];
    if entry.class_type == ClassType::Lab {
        let base = entry.base_subject_code().to_string();
        keys.push(format!("{base}-LAB"));
        keys.push(base);
    }
    keys.dedup();
    keys
}

/// True when the sheet's faculty table has a mapping for this entry.
pub fn faculty_map_hit(map: &HashMap<String, Vec<String>>, entry: &ParsedSlotEntry) -> bool {
    faculty_lookup_keys(entry)
        .iter()
        .any(|key| map.contains_key(key))
}

fn attach_faculty(entries: &mut [ParsedSlotEntry], map: &HashMap<String, Vec<String>>) {
    for entry in entries.iter_mut() {
        if entry.faculty_name.is_some() {
            continue; // An inline hint wins over the trailer table.
        }
        for key in faculty_lookup_keys(entry) {
            if let Some(names) = map.get(&key) {
                entry.faculty_name = Some(names.join(", "));
                break;
            }
        }
    }
}
