use super::time_parser::parse_time_range;

fn range(text: &str) -> (String, String) {
    let r = parse_time_range(text).expect("range should parse");
    (r.start.to_string(), r.end.to_string())
}

#[test]
fn test_morning_range() {
    assert_eq!(range("8.15-9.05"), ("08:15".into(), "09:05".into()));
    assert_eq!(range("08:15-09:05"), ("08:15".into(), "09:05".into()));
    assert_eq!(range("9.05 - 9.55"), ("09:05".into(), "09:55".into()));
}

#[test]
fn test_pm_inference_for_early_hours() {
    // Hours below 8 belong to the afternoon of the academic day.
    assert_eq!(range("1.30-2.20"), ("13:30".into(), "14:20".into()));
    assert_eq!(range("2.20-3.10"), ("14:20".into(), "15:10".into()));
}

#[test]
fn test_noon_crossing_without_pm_marker() {
    // 12.40 stays as parsed; the end hour 1 shifts to 13.
    assert_eq!(range("12.40-1.30"), ("12:40".into(), "13:30".into()));
    // End not after start pushes the end into the afternoon.
    assert_eq!(range("11.50-12.40"), ("11:50".into(), "12:40".into()));
}

#[test]
fn test_explicit_am_pm_suffixes() {
    assert_eq!(range("9.00AM-10.00AM"), ("09:00".into(), "10:00".into()));
    assert_eq!(range("1.30 PM - 2.20 PM"), ("13:30".into(), "14:20".into()));
}

#[test]
fn test_en_and_em_dash_separators() {
    assert_eq!(range("8.15–9.05"), ("08:15".into(), "09:05".into()));
    assert_eq!(range("8.15—9.05"), ("08:15".into(), "09:05".into()));
}

#[test]
fn test_single_time_defaults_to_one_hour() {
    assert_eq!(range("9.00"), ("09:00".into(), "10:00".into()));
    assert_eq!(range("1.30"), ("13:30".into(), "14:30".into()));
}

#[test]
fn test_non_time_text_returns_none() {
    for text in ["Day", "BREAK", "", "room 407", "8", "8.1-9.0"] {
        assert!(parse_time_range(text).is_none(), "input {text:?}");
    }
}
