//! Workbook parsing: every worksheet through the sheet grammar.
//!
//! Two strictness profiles share the sub-parsers and differ only in the
//! validation gates applied to the result: the lenient profile keeps
//! best-effort entries, the strict profile buckets entries lacking a real
//! room or a faculty-table mapping so the upload flow can refuse to
//! proceed.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::{ParsedSlotEntry, TimeOfDay, Weekday};

use super::sheet_parser::{faculty_map_hit, parse_sheet, SheetOutcome};

/// Parsing strictness profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseProfile {
    /// Best effort: unparseable cells are skipped and recorded.
    Lenient,
    /// Zero tolerance: every entry must carry a real room and a faculty
    /// resolved via the sheet's own mapping table.
    Strict,
}

/// Placeholder room text treated as "no room assigned".
pub const ROOM_PLACEHOLDER: &str = "TBA";

/// A sheet that was excluded from the result, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetFailure {
    pub sheet: String,
    pub reason: String,
}

/// Minimal descriptor of an entry cited in an error bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    pub section_code: String,
    pub subject_code: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
}

impl EntryRef {
    fn of(entry: &ParsedSlotEntry) -> Self {
        Self {
            section_code: entry.section_code.clone(),
            subject_code: entry.subject_code.clone(),
            day: entry.day,
            start_time: entry.start_time,
        }
    }
}

/// Aggregate counters over the whole workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookSummary {
    pub total_sheets: usize,
    pub processed_sheets: usize,
    pub total_entries: usize,
    pub skipped_cells: usize,
    pub non_scheduling_cells: usize,
    pub labs_merged: usize,
    pub cell_errors: usize,
}

/// Result of parsing a workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookOutcome {
    pub sections: Vec<SheetOutcome>,
    pub sheet_errors: Vec<SheetFailure>,
    pub summary: WorkbookSummary,
    /// Strict profile only: entries with no faculty-table mapping.
    pub missing_faculty: Vec<EntryRef>,
    /// Strict profile only: entries with no real room.
    pub missing_rooms: Vec<EntryRef>,
}

impl WorkbookOutcome {
    /// All entries across all surviving sheets, in sheet order.
    pub fn all_entries(&self) -> Vec<ParsedSlotEntry> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter().cloned())
            .collect()
    }
}

/// Whole-workbook failures. Per-sheet problems are collected in
/// [`WorkbookOutcome::sheet_errors`] instead.
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("workbook could not be read: {0}")]
    Unreadable(String),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("no sheet produced a usable timetable")]
    NoUsableSheets { failures: Vec<SheetFailure> },
}

/// Parse a workbook from its byte buffer.
///
/// The caller is expected to have performed transport-level checks (size
/// ceiling, container signature) already; an unreadable buffer is still
/// rejected here rather than trusted.
pub fn parse_workbook(bytes: &[u8], profile: ParseProfile) -> Result<WorkbookOutcome, WorkbookError> {
    let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| WorkbookError::Unreadable(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(WorkbookError::NoSheets);
    }

    let mut outcome = WorkbookOutcome {
        sections: Vec::new(),
        sheet_errors: Vec::new(),
        summary: WorkbookSummary {
            total_sheets: sheet_names.len(),
            ..Default::default()
        },
        missing_faculty: Vec::new(),
        missing_rooms: Vec::new(),
    };

    for name in sheet_names {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                outcome.sheet_errors.push(SheetFailure {
                    sheet: name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        match parse_sheet(&grid, &name) {
            Ok(sheet) => {
                outcome.summary.processed_sheets += 1;
                outcome.summary.total_entries += sheet.entries.len();
                outcome.summary.skipped_cells += sheet.skipped_cells;
                outcome.summary.non_scheduling_cells += sheet.non_scheduling_cells;
                outcome.summary.labs_merged += sheet.labs_merged;
                outcome.summary.cell_errors += sheet.cell_errors.len();
                outcome.sections.push(sheet);
            }
            Err(e) => {
                warn!("sheet {name:?} excluded: {e}");
                outcome.sheet_errors.push(SheetFailure {
                    sheet: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if outcome.sections.is_empty() {
        return Err(WorkbookError::NoUsableSheets {
            failures: outcome.sheet_errors,
        });
    }

    if profile == ParseProfile::Strict {
        apply_strict_gates(&mut outcome);
    }

    info!(
        "parsed workbook: {}/{} sheets, {} entries, {} skipped cells, {} labs merged",
        outcome.summary.processed_sheets,
        outcome.summary.total_sheets,
        outcome.summary.total_entries,
        outcome.summary.skipped_cells,
        outcome.summary.labs_merged
    );

    Ok(outcome)
}

/// Bucket entries that violate the strict profile's requirements. The
/// buckets are returned to the caller in full rather than dropped, so a
/// spreadsheet can be fixed in one pass.
fn apply_strict_gates(outcome: &mut WorkbookOutcome) {
    for sheet in &outcome.sections {
        for entry in &sheet.entries {
            let room_missing = entry
                .room_no
                .as_deref()
                .map(|r| r.is_empty() || r == ROOM_PLACEHOLDER)
                .unwrap_or(true);
            if room_missing {
                outcome.missing_rooms.push(EntryRef::of(entry));
            }
            if !faculty_map_hit(&sheet.faculty_map, entry) {
                outcome.missing_faculty.push(EntryRef::of(entry));
            }
        }
    }
}

/// Flatten a spreadsheet cell to trimmed text. Numeric cells print without
/// a trailing `.0` so room numbers round-trip as typed.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}
