//! Day-name normalization.

use crate::models::Weekday;

/// Normalize a day cell into a canonical weekday.
///
/// Accepts full names, the standard 2-4 letter abbreviations, and the
/// single letters that are unambiguous (M, W, F). Anything else — including
/// the literal `"Day"`/`"Days"` header label — returns `None`, signalling
/// "not a day row".
pub fn parse_day(text: &str) -> Option<Weekday> {
    match text.trim().to_uppercase().as_str() {
        "M" | "MO" | "MON" | "MONDAY" => Some(Weekday::Monday),
        "TU" | "TUE" | "TUES" | "TUESDAY" => Some(Weekday::Tuesday),
        "W" | "WE" | "WED" | "WEDNESDAY" => Some(Weekday::Wednesday),
        "TH" | "THU" | "THUR" | "THURS" | "THURSDAY" => Some(Weekday::Thursday),
        "F" | "FR" | "FRI" | "FRIDAY" => Some(Weekday::Friday),
        "SAT" | "SATURDAY" => Some(Weekday::Saturday),
        "SUN" | "SUNDAY" => Some(Weekday::Sunday),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_abbreviated_forms() {
        assert_eq!(parse_day("Monday"), Some(Weekday::Monday));
        assert_eq!(parse_day("MON"), Some(Weekday::Monday));
        assert_eq!(parse_day("tues"), Some(Weekday::Tuesday));
        assert_eq!(parse_day("Thur"), Some(Weekday::Thursday));
        assert_eq!(parse_day("THURS"), Some(Weekday::Thursday));
        assert_eq!(parse_day(" fri "), Some(Weekday::Friday));
        assert_eq!(parse_day("SUN"), Some(Weekday::Sunday));
    }

    #[test]
    fn test_unambiguous_single_letters() {
        assert_eq!(parse_day("M"), Some(Weekday::Monday));
        assert_eq!(parse_day("W"), Some(Weekday::Wednesday));
        assert_eq!(parse_day("F"), Some(Weekday::Friday));
        // T and S are ambiguous and must not match.
        assert_eq!(parse_day("T"), None);
        assert_eq!(parse_day("S"), None);
    }

    #[test]
    fn test_header_label_is_not_a_day() {
        assert_eq!(parse_day("Day"), None);
        assert_eq!(parse_day("DAYS"), None);
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("CN-407"), None);
    }
}
