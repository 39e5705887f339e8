use crate::calc::fixed_2;
use crate::catalog::{Catalog, SEMESTERS};
use crate::error::GpaError;
use crate::header::Metric;
use crate::import::{NAME_HEADER, REG_NO_HEADER};
use crate::model::Student;
use crate::workbook::sheet_name;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::json;
use std::collections::HashSet;

pub const REPORT_FILE_NAME: &str = "gpa_cgpa_report.xlsx";
pub const SUMMARY_SHEET: &str = "GPA-CGPA Results";
pub const DETAIL_COLUMNS: [&str; 6] = [
    "Course Code",
    "Course Name",
    "Credits",
    "Marks",
    "Grade",
    "Grade Point",
];
const NOT_AVAILABLE: &str = "N/A";
const TEMPLATE_ROWS: u32 = 5;

pub fn sample_file_name(regulation: u16, semester: u8) -> String {
    format!("gpa_sample_reg{}_sem{}.xlsx", regulation, semester)
}

fn encode_err(context: &'static str) -> impl Fn(XlsxError) -> GpaError {
    move |e| GpaError::internal(context, e)
}

fn write_row(ws: &mut Worksheet, row: u32, values: &[&str], fmt: &Format) -> Result<(), XlsxError> {
    for (col, v) in values.iter().enumerate() {
        ws.write_string_with_format(row, col as u16, *v, fmt)?;
    }
    Ok(())
}

/// Summary sheet plus one detail sheet per student, as xlsx bytes.
///
/// The summary has a `Sem N GPA` column for every N up to the highest
/// semester number any student has; gaps read `N/A`. Students arrive from
/// the caller, so semester numbers outside 1..=6 are rejected as bad input.
pub fn build_report(students: &[Student]) -> Result<Vec<u8>, GpaError> {
    if students.is_empty() {
        return Err(GpaError::NoStudents);
    }
    let max_semester = highest_semester(students)?;
    write_report(students, max_semester).map_err(encode_err("generating the report"))
}

fn highest_semester(students: &[Student]) -> Result<u8, GpaError> {
    let mut max = 0;
    for (si, st) in students.iter().enumerate() {
        for (ki, sem) in st.semesters.iter().enumerate() {
            let n = u8::try_from(sem.semester)
                .ok()
                .filter(|n| SEMESTERS.contains(n))
                .ok_or_else(|| GpaError::BadParams {
                    message: format!(
                        "semester {} of student {} must be between {} and {}",
                        sem.semester,
                        st.reg_no,
                        SEMESTERS.start(),
                        SEMESTERS.end()
                    ),
                    details: Some(json!({
                        "field": format!("students[{}].semesters[{}].semester", si, ki),
                        "semester": sem.semester,
                    })),
                })?;
            max = max.max(n);
        }
    }
    Ok(max)
}

fn write_report(students: &[Student], max_semester: u8) -> Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let mut used_names = HashSet::new();

    {
        let name = sheet_name(SUMMARY_SHEET, &mut used_names);
        let ws = workbook.add_worksheet();
        ws.set_name(name)?;

        let mut headers = vec![REG_NO_HEADER.to_string(), NAME_HEADER.to_string(), "CGPA".to_string()];
        headers.extend((1..=max_semester).map(|n| format!("Sem {} GPA", n)));
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        write_row(ws, 0, &header_refs, &bold)?;

        for (idx, st) in students.iter().enumerate() {
            let row = idx as u32 + 1;
            ws.write_string(row, 0, &st.reg_no)?;
            ws.write_string(row, 1, &st.name)?;
            let cgpa = st.cgpa.map(fixed_2).unwrap_or_else(|| NOT_AVAILABLE.to_string());
            ws.write_string(row, 2, &cgpa)?;
            for n in 1..=max_semester {
                let gpa = st
                    .semester(u32::from(n))
                    .and_then(|s| s.gpa)
                    .map(fixed_2)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                ws.write_string(row, 2 + u16::from(n), &gpa)?;
            }
        }
        ws.set_column_width(1, 24.0)?;
    }

    for st in students {
        let name = sheet_name(&st.reg_no, &mut used_names);
        let ws = workbook.add_worksheet();
        ws.set_name(name)?;
        write_student_detail(ws, st, &bold)?;
    }

    workbook.save_to_buffer()
}

fn write_student_detail(ws: &mut Worksheet, st: &Student, bold: &Format) -> Result<(), XlsxError> {
    let mut row: u32 = 0;
    for sem in &st.semesters {
        let gpa = sem.gpa.map(fixed_2).unwrap_or_default();
        ws.write_string_with_format(
            row,
            0,
            format!("Semester {} - GPA: {}", sem.semester, gpa),
            bold,
        )?;
        row += 1;
        write_row(ws, row, &DETAIL_COLUMNS, bold)?;
        row += 1;
        for sub in &sem.subjects {
            ws.write_string(row, 0, &sub.course_code)?;
            ws.write_string(row, 1, &sub.course_name)?;
            ws.write_number(row, 2, sub.credits)?;
            ws.write_number(row, 3, sub.marks)?;
            if let Some(g) = sub.grade {
                ws.write_string(row, 4, g.as_str())?;
            }
            if let Some(gp) = sub.grade_point {
                ws.write_number(row, 5, gp)?;
            }
            row += 1;
        }
        // spacer
        row += 1;
    }
    ws.set_column_width(1, 36.0)?;
    Ok(())
}

/// Fill-in template for one semester: `Reg No`, `Name`, then a
/// `<course code> Marks` column per course, with five placeholder students.
pub fn build_sample_template(
    catalog: &Catalog,
    regulation: u16,
    semester: u8,
) -> Result<Vec<u8>, GpaError> {
    let reg = catalog
        .regulation(regulation)
        .ok_or(GpaError::UnknownRegulation(regulation))?;
    let courses = reg
        .courses(semester)
        .ok_or(GpaError::NoCoursesForSemester {
            regulation,
            semester,
        })?;

    let mut headers = vec![REG_NO_HEADER.to_string(), NAME_HEADER.to_string()];
    headers.extend(
        courses
            .iter()
            .map(|c| format!("{} {}", c.code, Metric::Marks.label())),
    );

    write_template(regulation, semester, &headers)
        .map_err(encode_err("generating the sample file"))
}

fn write_template(regulation: u16, semester: u8, headers: &[String]) -> Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(format!("Regulation {} Sem {}", regulation, semester))?;

    let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_row(ws, 0, &refs, &bold)?;
    for i in 0..TEMPLATE_ROWS {
        let letter = char::from(b'A' + i as u8);
        ws.write_string(i + 1, 0, format!("TU202400{}", i + 1))?;
        ws.write_string(i + 1, 1, format!("Student {}", letter))?;
    }
    workbook.save_to_buffer()
}
