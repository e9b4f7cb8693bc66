//! The end-to-end ingestion flow.
//!
//! One request carries workbook bytes, a strictness profile, a commit mode
//! and a dry-run flag. The flow is: parse → resolve → detect conflicts →
//! commit, with the strict profile applying its fail-fast gates (missing
//! sections, missing faculty mappings, missing rooms) before anything is
//! written. A dry run stops after conflict detection and returns the same
//! report shape plus a bounded preview of parsed entries.
//!
//! Validation failures are collected and returned in full so a spreadsheet
//! can be fixed in one pass; storage faults are surfaced as a distinct
//! category with minimal outward detail and full server-side logging.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::db::repo_config::IngestSettings;
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{ParsedSlotEntry, ScheduleEntry, Section};
use crate::parsing::workbook_parser::{
    parse_workbook, EntryRef, ParseProfile, SheetFailure, WorkbookError, WorkbookOutcome,
};

use super::committer::{commit_entries, CommitMode, CommitStats};
use super::conflicts::{detect_conflicts, Conflict, ConflictContext, ConflictKind};
use super::resolver::{resolve_entities, ResolutionStats, ResolveError};

/// Options for one upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    pub profile: ParseProfile,
    /// Honored by the lenient profile; the strict profile always replaces.
    pub commit_mode: CommitMode,
    pub dry_run: bool,
    /// Explicit opt-out: commit even when blocking conflicts were found.
    pub skip_conflict_check: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            profile: ParseProfile::Lenient,
            commit_mode: CommitMode::Replace,
            dry_run: false,
            skip_conflict_check: false,
        }
    }
}

/// Why an upload was rejected.
///
/// Every variant except `Storage` is a validation failure: the caller's
/// data is wrong and retrying without changes will fail again. `Storage`
/// means the write side failed and a retry may succeed.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    /// Strict profile: sections absent from the section master, all codes
    /// together.
    #[error("sections missing from the section master: {}", .0.join(", "))]
    MissingSections(Vec<String>),

    /// Strict profile: entries whose subject has no faculty mapping in the
    /// sheet's trailer table.
    #[error("{} entries have no faculty mapping", .0.len())]
    MissingFacultyMappings(Vec<EntryRef>),

    /// Strict profile: entries without a real room assignment.
    #[error("{} entries have no room assigned", .0.len())]
    MissingRooms(Vec<EntryRef>),

    /// Blocking conflicts were detected and the caller did not opt out of
    /// conflict checking.
    #[error("{} blocking scheduling conflicts detected", .0.len())]
    ConflictsDetected(Vec<Conflict>),

    /// Storage-side failure. Full detail is logged server-side; the
    /// message stays minimal for untrusted callers.
    #[error("storage failure, try again later")]
    Storage(#[source] RepositoryError),
}

/// Per-sheet line in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReport {
    pub section_code: String,
    pub class_teacher: Option<String>,
    pub entries: usize,
    pub skipped_cells: usize,
    pub labs_merged: usize,
    pub cell_errors: usize,
}

/// Aggregate counters in the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub total_sheets: usize,
    pub processed_sheets: usize,
    pub total_entries: usize,
    pub skipped_cells: usize,
    pub labs_merged: usize,
    pub conflicts: usize,
    pub warnings: usize,
}

/// The structured ingestion report returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub dry_run: bool,
    pub generated_at: DateTime<Utc>,
    pub summary: IngestSummary,
    pub sections: Vec<SheetReport>,
    pub sheet_errors: Vec<SheetFailure>,
    pub created: ResolutionStats,
    /// Error-severity conflicts (present even when bypassed).
    pub conflicts: Vec<Conflict>,
    /// Warning-severity conflicts; never blocking.
    pub warnings: Vec<Conflict>,
    /// Dry run only: bounded preview of parsed entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<ParsedSlotEntry>>,
    /// Persistence statistics; absent on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<CommitStats>,
}

/// Run the full ingestion pipeline over a workbook buffer.
///
/// Transport-level validity checks (non-empty buffer, size ceiling,
/// container signature) are the caller's responsibility.
pub async fn ingest_workbook<R: FullRepository>(
    repo: &R,
    bytes: &[u8],
    options: &UploadOptions,
    settings: &IngestSettings,
) -> Result<IngestReport, UploadError> {
    info!(
        "Service layer: ingesting workbook ({} bytes, {:?} profile, dry_run={})",
        bytes.len(),
        options.profile,
        options.dry_run
    );

    let outcome = parse_workbook(bytes, options.profile)?;
    let entries = outcome.all_entries();
    let section_codes: Vec<String> = outcome
        .sections
        .iter()
        .map(|s| s.section_code.clone())
        .collect();

    // Resolution first so strict-mode section gaps surface before the
    // faculty/room gates, mirroring the order a fixer works in.
    let resolution = resolve_entities(repo, &section_codes, &entries, options.profile)
        .await
        .map_err(|e| match e {
            ResolveError::MissingSections(codes) => UploadError::MissingSections(codes),
            ResolveError::Repository(e) => storage_error(e),
        })?;

    if options.profile == ParseProfile::Strict {
        if !outcome.missing_faculty.is_empty() {
            return Err(UploadError::MissingFacultyMappings(outcome.missing_faculty));
        }
        if !outcome.missing_rooms.is_empty() {
            return Err(UploadError::MissingRooms(outcome.missing_rooms));
        }
    }

    // The strict flow always replaces and carries the sheets' class
    // teachers onto their section records.
    let (commit_mode, class_teachers) = match options.profile {
        ParseProfile::Strict => (CommitMode::Replace, class_teachers_of(&outcome)),
        ParseProfile::Lenient => (options.commit_mode, BTreeMap::new()),
    };

    // In replace mode the batch sections' persisted rows are about to be
    // deleted; checking the batch against them would make re-uploading the
    // same schedule conflict with itself. In merge mode a persisted row
    // sharing a batch entry's natural key is the same logical slot (it
    // surfaces as a duplicate at commit), not a double-booking.
    let mut existing = repo.all_entries().await.map_err(storage_error)?;
    match commit_mode {
        CommitMode::Replace => {
            let batch_sections: HashSet<&str> =
                section_codes.iter().map(String::as_str).collect();
            existing.retain(|e| !batch_sections.contains(e.section_code.as_str()));
        }
        CommitMode::Merge => {
            let batch_keys: HashSet<_> = entries
                .iter()
                .map(|e| (e.section_code.clone(), e.day, e.start_time))
                .collect();
            existing.retain(|e| {
                !batch_keys.contains(&(e.section_code.clone(), e.day, e.start_time))
            });
        }
    }

    let ctx = ConflictContext {
        sections: Some(&resolution.sections),
        rooms: Some(&resolution.rooms),
        existing: &existing,
    };
    let all_conflicts = detect_conflicts(&entries, &ctx, settings);
    let (conflicts, warnings): (Vec<Conflict>, Vec<Conflict>) = all_conflicts
        .into_iter()
        .partition(|c| c.is_blocking());

    // Workload overruns are advisory in bulk ingestion; they gate only the
    // single-entry create path.
    let gating = conflicts
        .iter()
        .any(|c| c.kind != ConflictKind::WorkloadExceeded);
    if gating && !options.skip_conflict_check {
        return Err(UploadError::ConflictsDetected(conflicts));
    }

    let mut report = build_report(&outcome, &resolution.stats, conflicts, warnings, options);

    if options.dry_run {
        report.preview = Some(entries.iter().take(settings.preview_limit).cloned().collect());
        info!("Service layer: dry run complete, nothing written");
        return Ok(report);
    }

    let saved = commit_entries(repo, &entries, &resolution, commit_mode, &class_teachers)
        .await
        .map_err(storage_error)?;
    report.saved = Some(saved);

    Ok(report)
}

/// Validate and insert one manually authored entry.
///
/// Unlike bulk upload, the daily-workload rule is enforced here: any
/// error-severity conflict, workload included, blocks creation.
pub async fn create_entry<R: FullRepository>(
    repo: &R,
    entry: &ScheduleEntry,
    settings: &IngestSettings,
) -> Result<crate::models::EntityId, UploadError> {
    let existing = repo.all_entries().await.map_err(storage_error)?;

    let sections: HashMap<String, Section> = repo
        .find_sections(&[entry.section_code.clone()])
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(|s| (s.section_code.clone(), s))
        .collect();
    let rooms: HashMap<String, crate::models::Room> = repo
        .find_rooms(&[entry.room_no.clone()])
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(|r| (r.number.clone(), r))
        .collect();

    let candidate = ParsedSlotEntry {
        section_code: entry.section_code.clone(),
        day: entry.day,
        start_time: entry.start_time,
        end_time: entry.end_time,
        subject_code: entry.subject_code.clone(),
        room_no: Some(entry.room_no.clone()),
        faculty_name: Some(entry.faculty_name.clone()),
        class_type: entry.class_type,
        duration: entry.duration,
        merged: false,
        merge_count: 1,
        source: crate::models::CellRef {
            row: 0,
            col: 0,
            text: String::new(),
        },
    };

    let ctx = ConflictContext {
        sections: Some(&sections),
        rooms: Some(&rooms),
        existing: &existing,
    };
    let blocking: Vec<Conflict> = detect_conflicts(std::slice::from_ref(&candidate), &ctx, settings)
        .into_iter()
        .filter(|c| c.is_blocking())
        .collect();
    if !blocking.is_empty() {
        return Err(UploadError::ConflictsDetected(blocking));
    }

    repo.insert_entry(entry).await.map_err(storage_error)
}

fn storage_error(e: RepositoryError) -> UploadError {
    error!("storage fault during ingestion: {e}");
    UploadError::Storage(e)
}

fn class_teachers_of(outcome: &WorkbookOutcome) -> BTreeMap<String, String> {
    outcome
        .sections
        .iter()
        .filter_map(|s| {
            s.class_teacher
                .clone()
                .map(|teacher| (s.section_code.clone(), teacher))
        })
        .collect()
}

fn build_report(
    outcome: &WorkbookOutcome,
    created: &ResolutionStats,
    conflicts: Vec<Conflict>,
    warnings: Vec<Conflict>,
    options: &UploadOptions,
) -> IngestReport {
    IngestReport {
        dry_run: options.dry_run,
        generated_at: Utc::now(),
        summary: IngestSummary {
            total_sheets: outcome.summary.total_sheets,
            processed_sheets: outcome.summary.processed_sheets,
            total_entries: outcome.summary.total_entries,
            skipped_cells: outcome.summary.skipped_cells,
            labs_merged: outcome.summary.labs_merged,
            conflicts: conflicts.len(),
            warnings: warnings.len(),
        },
        sections: outcome
            .sections
            .iter()
            .map(|s| SheetReport {
                section_code: s.section_code.clone(),
                class_teacher: s.class_teacher.clone(),
                entries: s.entries.len(),
                skipped_cells: s.skipped_cells,
                labs_merged: s.labs_merged,
                cell_errors: s.cell_errors.len(),
            })
            .collect(),
        sheet_errors: outcome.sheet_errors.clone(),
        created: *created,
        conflicts,
        warnings,
        preview: None,
        saved: None,
    }
}
