//! Sample workbook generation.
//!
//! Produces a two-section workbook in the exact grid convention the parser
//! consumes, so administrators can download a template, fill it in, and
//! upload it back.

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

/// One template sheet: banner, header row, day rows, trailer.
struct TemplateSheet {
    name: &'static str,
    banner: &'static str,
    rows: &'static [&'static [&'static str]],
}

const HEADER: &[&str] = &[
    "Day",
    "8.15-9.05",
    "9.05-9.55",
    "BREAK",
    "10.10-11.00",
    "11.00-11.50",
    "11.50-12.40",
    "LUNCH",
    "1.30-2.20",
    "2.20-3.10",
];

const SHEETS: [TemplateSheet; 2] = [
    TemplateSheet {
        name: "SECTION-1",
        banner: "SECTION-1",
        rows: &[
            &["MON", "CN-407", "CD-T-407", "", "IAI-301", "MSD-L-512", "MSD-L-512", "", "OS-405", "SE-T-403"],
            &["TUE", "MSD-317", "—", "", "MSD-512", "CN-407", "IAI-301", "", "CD-407", "OS-405"],
            &["WED", "SE-403", "OS-405", "", "CD-407", "CN-407", "—", "", "IAI-L-515", "IAI-L-515"],
            &["THU", "IAI-301", "CN-407", "", "SE-403", "CD-T-407", "MSD-317", "", "OS-405", "—"],
            &["FRI", "CD-407", "SE-L-508", "", "SE-L-508", "MSD-317", "CN-407", "", "IAI-301", "OS-405"],
            &["SAT", "OS-405", "MSD-L-512", "", "MSD-L-512", "SE-403", "CD-407", "", "CN-407", "IAI-301"],
            &[],
            &["CN", "-> Ms. V. ANUSHA"],
            &["CD", "-> Mr. SIMHADRI CHINNA GOPI"],
            &["IAI", "-> Dr. H. JAMES"],
            &["MSD", "-> Dr. M. RAJA RAO"],
            &["MSD-LAB", "-> Dr. M. RAJA RAO, Ms. V. ANUSHA"],
            &["OS", "-> Mr. K. RAVI KUMAR"],
            &["SE", "-> Mrs. P. LAVANYA"],
            &["SE-LAB", "-> Mrs. P. LAVANYA"],
            &["IAI-LAB", "-> Dr. H. JAMES"],
            &["Class Teacher -> Ms. V. ANUSHA"],
        ],
    },
    TemplateSheet {
        name: "SECTION-2",
        banner: "SECTION 2",
        rows: &[
            &["MON", "DS-201", "ALGO-T-202", "", "DB-203", "WEB-L-505", "WEB-L-505", "", "ML-204", "AI-205"],
            &["TUE", "WEB-202", "ML-204", "", "DB-L-506", "DB-L-506", "DS-201", "", "ALGO-202", "AI-205"],
            &["WED", "AI-205", "DB-203", "", "WEB-202", "ML-L-507", "ML-L-507", "", "DS-201", "ALGO-202"],
            &["THU", "ALGO-202", "DS-201", "", "AI-205", "DB-203", "WEB-202", "", "ML-204", "—"],
            &["FRI", "DB-203", "AI-L-508", "", "AI-L-508", "WEB-202", "ALGO-202", "", "DS-201", "ML-204"],
            &["SAT", "ML-204", "WEB-202", "", "DS-L-509", "DS-L-509", "DB-203", "", "ALGO-202", "AI-205"],
            &[],
            &["DS", "-> Dr. A. PRASAD"],
            &["ALGO", "-> Mr. B. SURESH"],
            &["DB", "-> Ms. C. DEVI"],
            &["DB-LAB", "-> Ms. C. DEVI"],
            &["WEB", "-> Mr. D. KIRAN"],
            &["WEB-LAB", "-> Mr. D. KIRAN"],
            &["ML", "-> Dr. E. SWATHI"],
            &["ML-LAB", "-> Dr. E. SWATHI"],
            &["AI", "-> Dr. F. MOHAN"],
            &["AI-LAB", "-> Dr. F. MOHAN"],
            &["DS-LAB", "-> Dr. A. PRASAD"],
            &["Class Teacher -> Dr. A. PRASAD"],
        ],
    },
];

/// Generate the downloadable template workbook as xlsx bytes.
pub fn generate_template() -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    for sheet in &SHEETS {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name)
            .context("invalid template sheet name")?;

        worksheet
            .write_string(0, 0, sheet.banner)
            .context("failed to write section banner")?;
        for (col, text) in HEADER.iter().enumerate() {
            worksheet
                .write_string(1, col as u16, *text)
                .context("failed to write header row")?;
        }
        for (row, cells) in sheet.rows.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                if !text.is_empty() {
                    worksheet
                        .write_string((row + 2) as u32, col as u16, *text)
                        .context("failed to write template cell")?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize template workbook")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::workbook_parser::{parse_workbook, ParseProfile};

    #[test]
    fn test_template_round_trips_through_the_parser() {
        let bytes = generate_template().unwrap();
        let outcome = parse_workbook(&bytes, ParseProfile::Lenient).unwrap();

        assert_eq!(outcome.summary.processed_sheets, 2);
        let codes: Vec<&str> = outcome
            .sections
            .iter()
            .map(|s| s.section_code.as_str())
            .collect();
        assert_eq!(codes, vec!["SEC1", "SEC2"]);

        // Every sheet merges at least one two-period lab.
        for sheet in &outcome.sections {
            assert!(sheet.labs_merged >= 1, "sheet {}", sheet.section_code);
            assert!(sheet.class_teacher.is_some());
            assert!(!sheet.faculty_map.is_empty());
            assert!(sheet.cell_errors.is_empty());
        }
    }

    #[test]
    fn test_template_survives_the_strict_gates() {
        let bytes = generate_template().unwrap();
        let outcome = parse_workbook(&bytes, ParseProfile::Strict).unwrap();
        assert!(outcome.missing_rooms.is_empty());
        assert!(
            outcome.missing_faculty.is_empty(),
            "unmapped: {:?}",
            outcome.missing_faculty
        );
    }
}
