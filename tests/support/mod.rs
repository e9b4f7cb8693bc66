//! Shared fixtures for integration tests.

use rust_xlsxwriter::Workbook;

use timetable_backend::models::Section;

/// Build an xlsx buffer from literal sheet grids.
pub fn workbook_bytes(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (row, cells) in rows.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                if !text.is_empty() {
                    worksheet
                        .write_string(row as u32, col as u16, *text)
                        .unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// The two-sheet workbook from the end-to-end scenario: SEC1 with a theory
/// slot and a two-period lab under a faculty table, SEC2 with one theory
/// slot.
pub fn scenario_workbook() -> Vec<u8> {
    workbook_bytes(&[
        (
            "SECTION-1",
            &[
                &["SECTION-1"],
                &["Day", "9.00-10.00", "10.00-11.00", "11.00-12.00"],
                &["MON", "CN-407", "CD-L-512", "CD-L-512"],
                &[],
                &["CN", "→ Dr. X"],
                &["CD-LAB", "→ Dr. Y"],
                &["Class Teacher → Dr. X"],
            ],
        ),
        (
            "SECTION-2",
            &[
                &["SECTION-2"],
                &["Day", "9.00-10.00"],
                &["TUE", "OS-405"],
                &[],
                &["OS", "→ Dr. Z"],
            ],
        ),
    ])
}

pub fn section(code: &str) -> Section {
    Section {
        id: None,
        section_code: code.to_string(),
        name: format!("Section {code}"),
        department: "Computer Science".to_string(),
        year: 3,
        semester: 5,
        strength: 60,
        academic_year: "2024-25".to_string(),
        class_teacher: None,
        active: true,
    }
}
