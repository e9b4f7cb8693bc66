//! Entity resolution: parsed codes to durable records.
//!
//! The lenient profile auto-creates whatever reference entities the
//! spreadsheet mentions that the store does not know yet; the strict
//! profile requires every section to pre-exist and reports all missing
//! codes together so a spreadsheet can be fixed in one round-trip.
//! Auto-creation never occurs for sections in strict mode.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{Faculty, ParsedSlotEntry, Room, RoomKind, Section, Subject};
use crate::parsing::workbook_parser::ParseProfile;

/// Defaults applied to auto-created records.
const DEFAULT_DEPARTMENT: &str = "Computer Science";
const DEFAULT_YEAR: u8 = 3;
const DEFAULT_SEMESTER: u8 = 5;
const DEFAULT_STRENGTH: u32 = 60;
const DEFAULT_ACADEMIC_YEAR: &str = "2024-25";
const FACULTY_EMAIL_DOMAIN: &str = "college.edu";

/// Placeholder credential issued to auto-provisioned faculty accounts.
/// Issuance is audited and the account is flagged for a forced reset.
const PLACEHOLDER_CREDENTIAL: &str = "faculty123";

/// Known subject codes and their display names.
static SUBJECT_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("CD", "Compiler Design"),
        ("DMT", "Data Mining Techniques"),
        ("CN", "Computer Networks"),
        ("ADS", "Advanced Data Structures"),
        ("AJP", "Advanced Java Programming"),
        ("SS", "System Software"),
        ("IAI", "Introduction to Artificial Intelligence"),
        ("IDP", "Innovative Design Project"),
        ("DIP", "Digital Image Processing"),
        ("AI", "Artificial Intelligence"),
    ])
});

/// Created/existing counts for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedStats {
    pub created: usize,
    pub existing: usize,
}

/// Created/existing counts per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStats {
    pub sections: CreatedStats,
    pub subjects: CreatedStats,
    pub rooms: CreatedStats,
    pub faculty: CreatedStats,
}

/// Natural-key → durable-record lookups produced by resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    pub sections: HashMap<String, Section>,
    pub subjects: HashMap<String, Subject>,
    pub rooms: HashMap<String, Room>,
    pub faculty: HashMap<String, Faculty>,
    pub stats: ResolutionStats,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Strict profile: sections absent from the section master. Every
    /// missing code is reported together, never one at a time.
    #[error("sections missing from the section master: {}", .0.join(", "))]
    MissingSections(Vec<String>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Resolve every natural key a batch references.
///
/// `section_codes` are the codes of the surviving sheets; subjects, rooms
/// and faculty are collected from the entries themselves. Distinct codes
/// are deduplicated in memory before any insert so one upload inserts each
/// missing code exactly once.
pub async fn resolve_entities<R: FullRepository>(
    repo: &R,
    section_codes: &[String],
    entries: &[ParsedSlotEntry],
    profile: ParseProfile,
) -> Result<ResolutionOutcome, ResolveError> {
    let mut outcome = ResolutionOutcome::default();

    resolve_sections(repo, section_codes, profile, &mut outcome).await?;

    // The strict flow links entries to sections only; subject, room and
    // faculty references are stored by their text form.
    if profile == ParseProfile::Strict {
        return Ok(outcome);
    }

    resolve_subjects(repo, entries, &mut outcome).await?;
    resolve_rooms(repo, entries, &mut outcome).await?;
    resolve_faculty(repo, entries, &mut outcome).await?;

    info!(
        "Service layer: entities ready (sections {}+{}, subjects {}+{}, rooms {}+{}, faculty {}+{})",
        outcome.stats.sections.existing,
        outcome.stats.sections.created,
        outcome.stats.subjects.existing,
        outcome.stats.subjects.created,
        outcome.stats.rooms.existing,
        outcome.stats.rooms.created,
        outcome.stats.faculty.existing,
        outcome.stats.faculty.created,
    );

    Ok(outcome)
}

async fn resolve_sections<R: FullRepository>(
    repo: &R,
    section_codes: &[String],
    profile: ParseProfile,
    outcome: &mut ResolutionOutcome,
) -> Result<(), ResolveError> {
    let codes: BTreeSet<String> = section_codes.iter().cloned().collect();
    let code_list: Vec<String> = codes.iter().cloned().collect();

    let existing = repo.find_sections(&code_list).await?;
    outcome.stats.sections.existing = existing.len();
    for section in existing {
        outcome.sections.insert(section.section_code.clone(), section);
    }

    let missing: Vec<String> = codes
        .iter()
        .filter(|code| !outcome.sections.contains_key(*code))
        .cloned()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    if profile == ParseProfile::Strict {
        return Err(ResolveError::MissingSections(missing));
    }

    for code in missing {
        let mut section = Section {
            id: None,
            section_code: code.clone(),
            name: format!("Section {code}"),
            department: DEFAULT_DEPARTMENT.to_string(),
            year: DEFAULT_YEAR,
            semester: DEFAULT_SEMESTER,
            strength: DEFAULT_STRENGTH,
            academic_year: DEFAULT_ACADEMIC_YEAR.to_string(),
            class_teacher: None,
            active: true,
        };
        match repo.insert_section(&section).await {
            Ok(id) => {
                section.id = Some(id);
                outcome.stats.sections.created += 1;
                outcome.sections.insert(code, section);
            }
            Err(e) if e.is_duplicate() => {
                // Lost a race with another writer: the record exists now.
                debug!("section {code} appeared concurrently, re-fetching");
                if let Some(section) = refetch_section(repo, &code).await? {
                    outcome.stats.sections.existing += 1;
                    outcome.sections.insert(code, section);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn refetch_section<R: FullRepository>(
    repo: &R,
    code: &str,
) -> Result<Option<Section>, RepositoryError> {
    let found = repo.find_sections(&[code.to_string()]).await?;
    Ok(found.into_iter().next())
}

async fn resolve_subjects<R: FullRepository>(
    repo: &R,
    entries: &[ParsedSlotEntry],
    outcome: &mut ResolutionOutcome,
) -> Result<(), ResolveError> {
    let codes: BTreeSet<String> = entries.iter().map(|e| e.subject_code.clone()).collect();
    let code_list: Vec<String> = codes.iter().cloned().collect();

    let existing = repo.find_subjects(&code_list).await?;
    outcome.stats.subjects.existing = existing.len();
    for subject in existing {
        outcome.subjects.insert(subject.code.clone(), subject);
    }

    for code in codes {
        if outcome.subjects.contains_key(&code) {
            continue;
        }
        let mut subject = Subject {
            id: None,
            code: code.clone(),
            name: subject_name_for_code(&code),
            department: DEFAULT_DEPARTMENT.to_string(),
            semester: DEFAULT_SEMESTER,
            credits: if code.contains("LAB") { 2 } else { 3 },
        };
        match repo.insert_subject(&subject).await {
            Ok(id) => {
                subject.id = Some(id);
                outcome.stats.subjects.created += 1;
                outcome.subjects.insert(code, subject);
            }
            Err(e) if e.is_duplicate() => {
                debug!("subject {code} appeared concurrently, re-fetching");
                let found = repo.find_subjects(&[code.clone()]).await?;
                if let Some(subject) = found.into_iter().next() {
                    outcome.stats.subjects.existing += 1;
                    outcome.subjects.insert(code, subject);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn resolve_rooms<R: FullRepository>(
    repo: &R,
    entries: &[ParsedSlotEntry],
    outcome: &mut ResolutionOutcome,
) -> Result<(), ResolveError> {
    let numbers: BTreeSet<String> = entries
        .iter()
        .filter_map(|e| e.room_no.clone())
        .filter(|r| !r.is_empty())
        .collect();
    let number_list: Vec<String> = numbers.iter().cloned().collect();

    let existing = repo.find_rooms(&number_list).await?;
    outcome.stats.rooms.existing = existing.len();
    for room in existing {
        outcome.rooms.insert(room.number.clone(), room);
    }

    for number in numbers {
        if outcome.rooms.contains_key(&number) {
            continue;
        }
        let is_lab = number.contains("LAB") || number.as_str() > "500";
        let mut room = Room {
            id: None,
            number: number.clone(),
            block: block_for_room(&number),
            capacity: if is_lab { 30 } else { 60 },
            kind: if is_lab { RoomKind::Lab } else { RoomKind::Classroom },
        };
        match repo.insert_room(&room).await {
            Ok(id) => {
                room.id = Some(id);
                outcome.stats.rooms.created += 1;
                outcome.rooms.insert(number, room);
            }
            Err(e) if e.is_duplicate() => {
                debug!("room {number} appeared concurrently, re-fetching");
                let found = repo.find_rooms(&[number.clone()]).await?;
                if let Some(room) = found.into_iter().next() {
                    outcome.stats.rooms.existing += 1;
                    outcome.rooms.insert(number, room);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn resolve_faculty<R: FullRepository>(
    repo: &R,
    entries: &[ParsedSlotEntry],
    outcome: &mut ResolutionOutcome,
) -> Result<(), ResolveError> {
    let names: BTreeSet<String> = entries
        .iter()
        .filter_map(|e| e.faculty_name.clone())
        .flat_map(|joined| {
            joined
                .split(',')
                .map(|n| n.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|n| !n.is_empty())
        .collect();
    let name_list: Vec<String> = names.iter().cloned().collect();

    let existing = repo.find_faculty(&name_list).await?;
    outcome.stats.faculty.existing = existing.len();
    for faculty in existing {
        outcome.faculty.insert(faculty.name.clone(), faculty);
    }

    for name in names {
        if outcome.faculty.contains_key(&name) {
            continue;
        }
        let email = email_for_faculty_name(&name);
        warn!(
            "audit: auto-provisioning faculty account {name:?} ({email}) with a placeholder \
             credential; password reset required"
        );
        let mut faculty = Faculty {
            id: None,
            name: name.clone(),
            department: DEFAULT_DEPARTMENT.to_string(),
            email,
            password_digest: credential_digest(PLACEHOLDER_CREDENTIAL),
            role: "faculty".to_string(),
            must_change_password: true,
        };
        match repo.insert_faculty(&faculty).await {
            Ok(id) => {
                faculty.id = Some(id);
                outcome.stats.faculty.created += 1;
                outcome.faculty.insert(name, faculty);
            }
            Err(e) if e.is_duplicate() => {
                debug!("faculty {name} appeared concurrently, re-fetching");
                let found = repo.find_faculty(&[name.clone()]).await?;
                if let Some(faculty) = found.into_iter().next() {
                    outcome.stats.faculty.existing += 1;
                    outcome.faculty.insert(name, faculty);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Display name for a subject code, via the static lookup table.
fn subject_name_for_code(code: &str) -> String {
    let base = code.trim_end_matches("-LAB").trim_end_matches("-T");
    let name = SUBJECT_NAMES
        .get(base)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("Subject {base}"));
    if code.contains("LAB") {
        format!("{name} Lab")
    } else {
        name
    }
}

/// Campus block inferred from the room number's leading digit.
fn block_for_room(number: &str) -> String {
    match number.chars().next() {
        Some('1') | Some('2') => "A",
        Some('3') | Some('4') => "B",
        Some('5') | Some('6') => "C",
        _ => "D",
    }
    .to_string()
}

/// Synthesize `f.lastname@college.edu` from a display name like
/// `"Ms. V. ANUSHA"`, stripping the honorific first.
fn email_for_faculty_name(name: &str) -> String {
    static HONORIFIC_RE: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"(?i)^(Mrs|Mr|Ms|Dr|Prof)\.?\s*").unwrap());

    let clean = HONORIFIC_RE.replace(name.trim(), "");
    let clean = clean.to_lowercase();
    let parts: Vec<&str> = clean.split_whitespace().collect();

    if parts.len() >= 2 {
        let initial = parts[0].chars().next().unwrap_or('x');
        let last = parts[parts.len() - 1].trim_matches('.');
        format!("{initial}.{last}@{FACULTY_EMAIL_DOMAIN}")
    } else {
        format!(
            "{}@{FACULTY_EMAIL_DOMAIN}",
            clean.replace(char::is_whitespace, ".")
        )
    }
}

fn credential_digest(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_name_lookup() {
        assert_eq!(subject_name_for_code("CN"), "Computer Networks");
        assert_eq!(subject_name_for_code("CD-LAB"), "Compiler Design Lab");
        assert_eq!(subject_name_for_code("XYZ"), "Subject XYZ");
    }

    #[test]
    fn test_block_inference() {
        assert_eq!(block_for_room("216"), "A");
        assert_eq!(block_for_room("407"), "B");
        assert_eq!(block_for_room("512"), "C");
        assert_eq!(block_for_room("805"), "D");
    }

    #[test]
    fn test_email_synthesis() {
        assert_eq!(
            email_for_faculty_name("Ms. V. ANUSHA"),
            "v.anusha@college.edu"
        );
        assert_eq!(
            email_for_faculty_name("Dr. M. RAJA RAO"),
            "m.rao@college.edu"
        );
        assert_eq!(email_for_faculty_name("ANUSHA"), "anusha@college.edu");
    }

    #[test]
    fn test_credential_is_digested_not_stored() {
        let digest = credential_digest(PLACEHOLDER_CREDENTIAL);
        assert_ne!(digest, PLACEHOLDER_CREDENTIAL);
        assert_eq!(digest.len(), 64);
    }

    #[cfg(feature = "local-repo")]
    mod with_repo {
        use super::super::*;
        use crate::db::repositories::LocalRepository;
        use crate::db::repository::ReferenceRepository;
        use crate::models::{CellRef, ClassType, Weekday};

        fn entry(subject: &str, room: &str, faculty: Option<&str>) -> ParsedSlotEntry {
            ParsedSlotEntry {
                section_code: "SEC1".into(),
                day: Weekday::Monday,
                start_time: "09:00".parse().unwrap(),
                end_time: "10:00".parse().unwrap(),
                subject_code: subject.into(),
                room_no: Some(room.into()),
                faculty_name: faculty.map(String::from),
                class_type: ClassType::Theory,
                duration: 1,
                merged: false,
                merge_count: 1,
                source: CellRef {
                    row: 0,
                    col: 0,
                    text: String::new(),
                },
            }
        }

        #[tokio::test]
        async fn test_lenient_auto_creates_missing_entities() {
            let repo = LocalRepository::new();
            let entries = vec![
                entry("CN", "407", Some("Ms. V. ANUSHA")),
                entry("CN", "407", Some("Ms. V. ANUSHA")),
                entry("CD", "512", None),
            ];

            let outcome = resolve_entities(
                &repo,
                &["SEC1".to_string()],
                &entries,
                ParseProfile::Lenient,
            )
            .await
            .unwrap();

            assert_eq!(outcome.stats.sections.created, 1);
            // Duplicate codes are deduplicated before insertion.
            assert_eq!(outcome.stats.subjects.created, 2);
            assert_eq!(outcome.stats.rooms.created, 2);
            assert_eq!(outcome.stats.faculty.created, 1);

            let section = outcome.sections.get("SEC1").unwrap();
            assert!(section.id.is_some());
            assert_eq!(section.strength, 60);

            let faculty = outcome.faculty.get("Ms. V. ANUSHA").unwrap();
            assert!(faculty.must_change_password);
            assert_eq!(faculty.email, "v.anusha@college.edu");
        }

        #[tokio::test]
        async fn test_lenient_reuses_existing_entities() {
            let repo = LocalRepository::new();
            let entries = vec![entry("CN", "407", None)];

            resolve_entities(&repo, &["SEC1".to_string()], &entries, ParseProfile::Lenient)
                .await
                .unwrap();
            let second = resolve_entities(
                &repo,
                &["SEC1".to_string()],
                &entries,
                ParseProfile::Lenient,
            )
            .await
            .unwrap();

            assert_eq!(second.stats.sections.created, 0);
            assert_eq!(second.stats.sections.existing, 1);
            assert_eq!(second.stats.subjects.created, 0);
            assert_eq!(second.stats.rooms.created, 0);
        }

        #[tokio::test]
        async fn test_strict_reports_all_missing_sections_together() {
            let repo = LocalRepository::new();
            let err = resolve_entities(
                &repo,
                &["SEC7".to_string(), "SEC8".to_string(), "SEC7".to_string()],
                &[],
                ParseProfile::Strict,
            )
            .await
            .unwrap_err();

            match err {
                ResolveError::MissingSections(codes) => {
                    assert_eq!(codes, vec!["SEC7".to_string(), "SEC8".to_string()]);
                }
                other => panic!("unexpected error: {other:?}"),
            }
            // Strict mode never auto-creates sections.
            let found = repo.find_sections(&["SEC7".to_string()]).await.unwrap();
            assert!(found.is_empty());
        }

        #[tokio::test]
        async fn test_strict_links_sections_only() {
            let repo = LocalRepository::new();
            repo.seed_section(crate::models::Section {
                id: None,
                section_code: "SEC1".into(),
                name: "Section SEC1".into(),
                department: "Computer Science".into(),
                year: 3,
                semester: 5,
                strength: 60,
                academic_year: "2024-25".into(),
                class_teacher: None,
                active: true,
            });

            let entries = vec![entry("CN", "407", Some("Ms. V. ANUSHA"))];
            let outcome =
                resolve_entities(&repo, &["SEC1".to_string()], &entries, ParseProfile::Strict)
                    .await
                    .unwrap();

            assert_eq!(outcome.sections.len(), 1);
            assert!(outcome.subjects.is_empty());
            assert!(outcome.rooms.is_empty());
            assert!(outcome.faculty.is_empty());
        }
    }
}
