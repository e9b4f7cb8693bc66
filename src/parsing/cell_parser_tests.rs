use crate::models::ClassType;

use super::cell_parser::parse_cell;

fn must_parse(text: &str) -> crate::models::RawCellToken {
    parse_cell(text)
        .expect("cell should parse")
        .expect("cell should not be free")
}

#[test]
fn test_generic_theory_cell() {
    let token = must_parse("CN-407");
    assert_eq!(token.subject_code, "CN");
    assert_eq!(token.class_type, ClassType::Theory);
    assert_eq!(token.room_no.as_deref(), Some("407"));
    assert_eq!(token.faculty_hint, None);
}

#[test]
fn test_generic_separators() {
    for text in ["CN 407", "CN/407", "cn-407"] {
        let token = must_parse(text);
        assert_eq!(token.subject_code, "CN", "input {text:?}");
        assert_eq!(token.room_no.as_deref(), Some("407"), "input {text:?}");
        assert_eq!(token.class_type, ClassType::Theory, "input {text:?}");
    }
}

#[test]
fn test_parse_is_deterministic_and_idempotent() {
    // Re-parsing the normalized serialized form of a token yields the same
    // token.
    let first = must_parse("cn-407");
    let reserialized = format!(
        "{}-{}",
        first.subject_code,
        first.room_no.as_deref().unwrap()
    );
    let second = must_parse(&reserialized);
    assert_eq!(first, second);
}

#[test]
fn test_typed_cells() {
    let theory = must_parse("CD-T-407");
    assert_eq!(theory.subject_code, "CD");
    assert_eq!(theory.class_type, ClassType::Theory);

    let theory_long = must_parse("CD-THEORY-407");
    assert_eq!(theory_long.class_type, ClassType::Theory);

    let lab = must_parse("CD-L-512");
    assert_eq!(lab.subject_code, "CD-LAB");
    assert_eq!(lab.class_type, ClassType::Lab);
    assert_eq!(lab.room_no.as_deref(), Some("512"));

    let lab_long = must_parse("CD-LAB-512");
    assert_eq!(lab_long.subject_code, "CD-LAB");
    assert_eq!(lab_long.class_type, ClassType::Lab);
}

#[test]
fn test_lab_keyword_form() {
    let token = must_parse("AI LAB-301");
    assert_eq!(token.subject_code, "AI-LAB");
    assert_eq!(token.class_type, ClassType::Lab);
    assert_eq!(token.room_no.as_deref(), Some("301"));
}

#[test]
fn test_tutorial_cell() {
    let token = must_parse("DE-407(T)");
    assert_eq!(token.subject_code, "DE");
    assert_eq!(token.class_type, ClassType::Tutorial);
    assert_eq!(token.room_no.as_deref(), Some("407"));
    // The (T) marker must not be mistaken for a faculty hint.
    assert_eq!(token.faculty_hint, None);
}

#[test]
fn test_assessment_cell() {
    let token = must_parse("T5 ASSESSMENT-505");
    assert_eq!(token.subject_code, "T5 ASSESSMENT");
    assert_eq!(token.class_type, ClassType::Assessment);
    assert_eq!(token.room_no.as_deref(), Some("505"));
}

#[test]
fn test_honors_cell() {
    for text in ["HONORS-308", "honors-308", "HONOR-308"] {
        let token = must_parse(text);
        assert_eq!(token.subject_code, "HONORS", "input {text:?}");
        assert_eq!(token.class_type, ClassType::Honors);
        assert_eq!(token.room_no.as_deref(), Some("308"));
    }
}

#[test]
fn test_faculty_hint_is_stripped() {
    let token = must_parse("CN(Prof.X)-407");
    assert_eq!(token.subject_code, "CN");
    assert_eq!(token.room_no.as_deref(), Some("407"));
    assert_eq!(token.faculty_hint.as_deref(), Some("Prof.X"));

    let bracketed = must_parse("CN[Dr. Y]-512");
    assert_eq!(bracketed.faculty_hint.as_deref(), Some("Dr. Y"));
}

#[test]
fn test_free_cells_return_none() {
    for text in [
        "", "   ", "-", "—", "BREAK", "break", "Lunch", "RECESS", "free", "HOLIDAY", "off",
    ] {
        assert_eq!(
            parse_cell(text).expect("free cells are not errors"),
            None,
            "input {text:?}"
        );
    }
}

#[test]
fn test_fallback_extracts_runs() {
    // Messy but salvageable: first run subject, last run room.
    let token = must_parse("CN @ 407b");
    assert_eq!(token.subject_code, "CN");
    assert_eq!(token.room_no.as_deref(), Some("407B"));
    assert_eq!(token.class_type, ClassType::Theory);

    let lab = must_parse("CN .. LAB .. 512");
    assert_eq!(lab.subject_code, "CN-LAB");
    assert_eq!(lab.class_type, ClassType::Lab);
}

#[test]
fn test_unparseable_cell_is_error() {
    let err = parse_cell("X").unwrap_err();
    assert!(err.to_string().contains("X"));
    assert!(parse_cell("?").is_err());
}
