//! Cell grammar: parses one timetable cell into a class-slot token.
//!
//! The grammar is an ordered list of pure pattern matchers tried in
//! sequence; the first one that matches the whole cell wins. An optional
//! inline faculty hint in parentheses or brackets is stripped before
//! matching (`"CN(Prof.X)-407"` → hint `"Prof.X"`, remainder `"CN-407"`).
//! Matching is deterministic: the same text always yields the same token or
//! the same failure.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ClassType, RawCellToken};

/// The cell text matched no pattern and the fallback found fewer than two
/// alphanumeric runs. The caller decides whether this is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse cell {text:?}")]
pub struct CellParseError {
    pub text: String,
}

/// Keywords marking a slot as free rather than scheduled.
const FREE_KEYWORDS: [&str; 6] = ["BREAK", "LUNCH", "RECESS", "FREE", "HOLIDAY", "OFF"];

static FACULTY_HINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(\[]([^)\]]+)[)\]]").unwrap());

static ASSESSMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]+\s+ASSESSMENT)\s*[-–]\s*([A-Z0-9]+)$").unwrap());

static HONORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^HONORS?\s*[-–]\s*([A-Z0-9]+)$").unwrap());

static LAB_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]+)\s*[-–]\s*L\s*[-–]\s*([A-Z0-9]+)$").unwrap());

static LAB_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]+)\s+LAB\s*[-–]\s*([A-Z0-9]+)$").unwrap());

static TUTORIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]+)\s*[-–]\s*([A-Z0-9]+)\s*\(T\)$").unwrap());

static TYPED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z0-9]+)\s*[-–]\s*(T|THEORY|L|LAB)\s*[-–]\s*([A-Z0-9]+)$").unwrap()
});

static GENERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]+)\s*[-–/ ]\s*([A-Z0-9]+)$").unwrap());

static ALNUM_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z0-9]{2,}").unwrap());

/// Parse one cell.
///
/// Returns `Ok(None)` when the slot is free (empty cell, dashes, or a
/// break keyword), `Ok(Some(token))` when a pattern matched, and
/// `Err(CellParseError)` when nothing could be made of the text.
pub fn parse_cell(text: &str) -> Result<Option<RawCellToken>, CellParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "—" || trimmed == "-" {
        return Ok(None);
    }

    if FREE_KEYWORDS.contains(&trimmed.to_uppercase().as_str()) {
        return Ok(None);
    }

    // Strip the hint before case normalization so it keeps its own casing.
    let (remainder, faculty_hint) = strip_faculty_hint(trimmed);
    let remainder = remainder.trim().to_uppercase();

    let matchers: [fn(&str) -> Option<RawCellToken>; 7] = [
        match_assessment,
        match_honors,
        match_lab,
        match_tutorial,
        match_typed,
        match_generic,
        match_fallback,
    ];

    for matcher in matchers {
        if let Some(mut token) = matcher(&remainder) {
            token.faculty_hint = faculty_hint;
            return Ok(Some(token));
        }
    }

    Err(CellParseError {
        text: trimmed.to_string(),
    })
}

/// Remove an inline faculty hint, returning the remainder and the hint.
///
/// A parenthesized bare `T` is the tutorial marker, not a faculty hint, and
/// is left in place for the tutorial pattern to consume.
fn strip_faculty_hint(text: &str) -> (String, Option<String>) {
    if let Some(caps) = FACULTY_HINT_RE.captures(text) {
        let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if !inner.eq_ignore_ascii_case("T") && !inner.is_empty() {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            let mut remainder = String::with_capacity(text.len());
            remainder.push_str(&text[..whole.0]);
            remainder.push_str(&text[whole.1..]);
            return (remainder, Some(inner.to_string()));
        }
    }
    (text.to_string(), None)
}

fn token(subject: &str, class_type: ClassType, room: &str) -> RawCellToken {
    RawCellToken {
        subject_code: subject.to_string(),
        class_type,
        room_no: Some(room.to_string()),
        faculty_hint: None,
    }
}

/// `"T5 ASSESSMENT-505"` — the whole left side is the subject.
fn match_assessment(text: &str) -> Option<RawCellToken> {
    let caps = ASSESSMENT_RE.captures(text)?;
    Some(token(&caps[1], ClassType::Assessment, &caps[2]))
}

/// `"HONORS-308"` — subject is fixed to `HONORS`.
fn match_honors(text: &str) -> Option<RawCellToken> {
    let caps = HONORS_RE.captures(text)?;
    Some(token("HONORS", ClassType::Honors, &caps[1]))
}

/// `"CN-L-317"` or `"AI LAB-301"` — lab subjects get a `-LAB` suffix.
fn match_lab(text: &str) -> Option<RawCellToken> {
    let caps = LAB_DASH_RE
        .captures(text)
        .or_else(|| LAB_WORD_RE.captures(text))?;
    let subject = format!("{}-LAB", &caps[1]);
    Some(token(&subject, ClassType::Lab, &caps[2]))
}

/// `"DE-407(T)"` — trailing tutorial marker.
fn match_tutorial(text: &str) -> Option<RawCellToken> {
    let caps = TUTORIAL_RE.captures(text)?;
    Some(token(&caps[1], ClassType::Tutorial, &caps[2]))
}

/// `"CD-T-407"` / `"CD-THEORY-407"` / `"CD-LAB-512"`.
fn match_typed(text: &str) -> Option<RawCellToken> {
    let caps = TYPED_RE.captures(text)?;
    match &caps[2] {
        "L" | "LAB" => {
            let subject = format!("{}-LAB", &caps[1]);
            Some(token(&subject, ClassType::Lab, &caps[3]))
        }
        _ => Some(token(&caps[1], ClassType::Theory, &caps[3])),
    }
}

/// `"CN-407"`, `"CN 407"`, `"CN/407"` — generic separator, theory class.
fn match_generic(text: &str) -> Option<RawCellToken> {
    let caps = GENERIC_RE.captures(text)?;
    Some(token(&caps[1], ClassType::Theory, &caps[2]))
}

/// Last resort: collect alphanumeric runs of length >= 2. First run is the
/// subject, last run the room; a middle run of `L`/`LAB` marks a lab.
fn match_fallback(text: &str) -> Option<RawCellToken> {
    let runs: Vec<&str> = ALNUM_RUN_RE.find_iter(text).map(|m| m.as_str()).collect();
    if runs.len() < 2 {
        return None;
    }
    let is_lab = runs[1..runs.len() - 1]
        .iter()
        .any(|r| *r == "L" || *r == "LAB");
    let (subject, class_type) = if is_lab {
        (format!("{}-LAB", runs[0]), ClassType::Lab)
    } else {
        (runs[0].to_string(), ClassType::Theory)
    };
    Some(RawCellToken {
        subject_code: subject,
        class_type,
        room_no: Some(runs[runs.len() - 1].to_string()),
        faculty_hint: None,
    })
}
