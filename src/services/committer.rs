//! Transactional persistence of a validated batch.
//!
//! The whole batch runs inside one transaction: a transaction-level fault
//! rolls everything back. Within the transaction the commit is
//! intentionally partial-tolerant — a failure while processing one
//! section's entries is caught and recorded, and processing continues with
//! the next section; duplicate-key rejections on individual rows are
//! counted without aborting their siblings.

use std::collections::BTreeMap;
use std::str::FromStr;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{EntryStatus, ParsedSlotEntry, ScheduleEntry};

use super::resolver::ResolutionOutcome;

/// Room text stored when a slot has no room assigned.
const ROOM_FALLBACK: &str = "TBA";
/// Faculty text stored when a slot has no faculty resolved.
const FACULTY_FALLBACK: &str = "TBA";

/// Duplicate faults recorded per section; beyond this many, the rest are
/// only counted.
const MAX_RECORDED_DUPLICATES: usize = 3;

/// Commit strategy for a section's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Delete the section's existing schedule, then insert the new one.
    Replace,
    /// Append new entries, skipping natural-key collisions.
    Merge,
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(CommitMode::Replace),
            "merge" => Ok(CommitMode::Merge),
            other => Err(format!("invalid mode {other:?}: must be \"replace\" or \"merge\"")),
        }
    }
}

/// A recorded, non-fatal commit problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFault {
    pub section_code: String,
    pub detail: String,
}

/// Counters for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCommitStats {
    pub section_code: String,
    pub inserted: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Result of committing a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
    pub failed: usize,
    pub sections_processed: usize,
    pub class_teachers_updated: usize,
    pub per_section: Vec<SectionCommitStats>,
    pub errors: Vec<CommitFault>,
}

/// Apply `entries` to durable storage inside one transaction.
///
/// `class_teachers` maps section codes to class-teacher names parsed from
/// the sheets; each is written onto its section record during the same
/// transaction.
pub async fn commit_entries<R: FullRepository>(
    repo: &R,
    entries: &[ParsedSlotEntry],
    resolution: &ResolutionOutcome,
    mode: CommitMode,
    class_teachers: &BTreeMap<String, String>,
) -> Result<CommitStats, RepositoryError> {
    if entries.is_empty() {
        return Err(RepositoryError::InternalError(
            "no entries to save".to_string(),
        ));
    }

    repo.begin_transaction().await?;
    match commit_inside_transaction(repo, entries, resolution, mode, class_teachers).await {
        Ok(stats) => {
            repo.commit_transaction().await?;
            info!(
                "Service layer: transaction complete ({} inserted, {} deleted, {} failed)",
                stats.inserted, stats.deleted, stats.failed
            );
            Ok(stats)
        }
        Err(e) => {
            error!("Service layer: commit aborted, rolling back: {e}");
            if let Err(rollback_err) = repo.rollback_transaction().await {
                error!("Service layer: rollback also failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

async fn commit_inside_transaction<R: FullRepository>(
    repo: &R,
    entries: &[ParsedSlotEntry],
    resolution: &ResolutionOutcome,
    mode: CommitMode,
    class_teachers: &BTreeMap<String, String>,
) -> Result<CommitStats, RepositoryError> {
    let mut stats = CommitStats::default();

    let mut by_section: BTreeMap<String, Vec<&ParsedSlotEntry>> = BTreeMap::new();
    for entry in entries {
        by_section
            .entry(entry.section_code.clone())
            .or_default()
            .push(entry);
    }

    info!("Service layer: committing {} sections ({mode:?})", by_section.len());

    for (section_code, section_entries) in by_section {
        let mut section_stats = SectionCommitStats {
            section_code: section_code.clone(),
            ..Default::default()
        };

        // The section was resolved (or required to pre-exist) before this
        // point; its absence here is an internal-consistency fault, not a
        // user input fault.
        let section = match resolution.sections.get(&section_code) {
            Some(section) => section,
            None => {
                warn!("section {section_code} missing from resolution; skipping its entries");
                stats.failed += section_entries.len();
                stats.errors.push(CommitFault {
                    section_code: section_code.clone(),
                    detail: "section record missing after resolution".to_string(),
                });
                stats.per_section.push(section_stats);
                continue;
            }
        };
        let section_id = match section.id {
            Some(id) => id,
            None => {
                stats.failed += section_entries.len();
                stats.errors.push(CommitFault {
                    section_code: section_code.clone(),
                    detail: "section record carries no durable id".to_string(),
                });
                stats.per_section.push(section_stats);
                continue;
            }
        };

        if mode == CommitMode::Replace {
            let deleted = repo.delete_entries_for_section(&section_code).await?;
            section_stats.deleted = deleted;
            stats.deleted += deleted;
        }

        if let Some(teacher) = class_teachers.get(&section_code) {
            match repo
                .update_section_class_teacher(&section_code, teacher)
                .await
            {
                Ok(()) => stats.class_teachers_updated += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("could not update class teacher for {section_code}: {e}");
                }
            }
        }

        let mut recorded_duplicates = 0usize;
        let mut section_fault: Option<RepositoryError> = None;

        for entry in section_entries.iter().copied() {
            let record = to_schedule_entry(entry, section_id, resolution);
            match repo.insert_entry(&record).await {
                Ok(_) => section_stats.inserted += 1,
                Err(e) if e.is_duplicate() => {
                    section_stats.failed += 1;
                    if recorded_duplicates < MAX_RECORDED_DUPLICATES {
                        recorded_duplicates += 1;
                        stats.errors.push(CommitFault {
                            section_code: section_code.clone(),
                            detail: format!("duplicate entry skipped: {e}"),
                        });
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // Any other storage error abandons this section but not
                    // the batch.
                    section_fault = Some(e);
                    break;
                }
            }
        }

        if let Some(fault) = section_fault {
            warn!("section {section_code} aborted mid-commit: {fault}");
            let attempted = section_stats.inserted + section_stats.failed;
            section_stats.failed += section_entries.len() - attempted;
            stats.errors.push(CommitFault {
                section_code: section_code.clone(),
                detail: fault.to_string(),
            });
        }

        stats.inserted += section_stats.inserted;
        stats.failed += section_stats.failed;
        stats.sections_processed += 1;
        stats.per_section.push(section_stats);
    }

    Ok(stats)
}

/// Build the durable record for one parsed entry, linking natural keys to
/// ids where resolution found them. Unresolved references keep a null id
/// with the human-readable text preserved.
fn to_schedule_entry(
    entry: &ParsedSlotEntry,
    section_id: crate::models::EntityId,
    resolution: &ResolutionOutcome,
) -> ScheduleEntry {
    let subject_id = resolution
        .subjects
        .get(&entry.subject_code)
        .and_then(|s| s.id);
    let room_no = entry
        .room_no
        .clone()
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| ROOM_FALLBACK.to_string());
    let room_id = resolution.rooms.get(&room_no).and_then(|r| r.id);
    let faculty_name = entry
        .faculty_name
        .clone()
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| FACULTY_FALLBACK.to_string());
    // A multi-faculty slot links the first listed name.
    let faculty_id = faculty_name
        .split(',')
        .next()
        .map(str::trim)
        .and_then(|name| resolution.faculty.get(name))
        .and_then(|f| f.id);

    ScheduleEntry {
        id: None,
        section_code: entry.section_code.clone(),
        section_id,
        day: entry.day,
        start_time: entry.start_time,
        end_time: entry.end_time,
        subject_code: entry.subject_code.clone(),
        subject_id,
        room_no,
        room_id,
        faculty_name,
        faculty_id,
        class_type: entry.class_type,
        duration: entry.duration,
        status: EntryStatus::Scheduled,
    }
}
