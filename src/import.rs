use crate::calc;
use crate::catalog::{Catalog, CourseEntry};
use crate::error::GpaError;
use crate::header::{parse_header, Metric, ParsedHeader};
use crate::model::{Semester, Student, Subject};
use crate::workbook::{self, cell_is_blank, cell_number, cell_text, SheetTable, TableRow};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

pub const REG_NO_HEADER: &str = "Reg No";
pub const NAME_HEADER: &str = "Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingRegNo,
    MissingName,
    NoValidSubjects,
}

/// A data row that produced no student. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub students: Vec<Student>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Course column with its parsed header.
struct CourseColumn {
    col: usize,
    header: ParsedHeader,
}

#[derive(Debug, Default)]
struct SubjectBucket {
    course_code: String,
    course_name: String,
    marks: Option<f64>,
    grade_point: Option<f64>,
    credits: Option<f64>,
}

impl SubjectBucket {
    /// Needs a marks or grade-point value and a credit, falling back to the
    /// catalog credit.
    fn into_subject(self, courses: &[CourseEntry<'_>]) -> Option<Subject> {
        if self.marks.is_none() && self.grade_point.is_none() {
            return None;
        }
        let credits = self.credits.or_else(|| {
            courses
                .iter()
                .find(|e| e.course.name == self.course_name)
                .map(|e| f64::from(e.course.credit))
        })?;
        Some(Subject {
            course_code: self.course_code,
            course_name: self.course_name,
            credits,
            marks: self.marks.unwrap_or(0.0),
            grade: None,
            grade_point: self.grade_point,
        })
    }
}

/// Reads the first sheet of `bytes` and returns graded students for the
/// semesters up to `upto_semester`.
pub fn import_workbook(
    bytes: &[u8],
    catalog: &Catalog,
    regulation: u16,
    upto_semester: u32,
) -> Result<ImportOutcome, GpaError> {
    let table = workbook::read_first_sheet(bytes)?;
    import_table(&table, catalog, regulation, upto_semester)
}

pub fn import_table(
    table: &SheetTable,
    catalog: &Catalog,
    regulation: u16,
    upto_semester: u32,
) -> Result<ImportOutcome, GpaError> {
    if table.rows.is_empty() {
        return Err(GpaError::EmptyWorkbook);
    }
    let reg = catalog
        .regulation(regulation)
        .ok_or(GpaError::UnknownRegulation(regulation))?;
    let courses = reg.entries();

    let reg_no_col = table.headers.iter().position(|h| h == REG_NO_HEADER);
    let name_col = table.headers.iter().position(|h| h == NAME_HEADER);
    let columns: Vec<CourseColumn> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(col, h)| {
            let header = parse_header(h, &courses)?;
            (header.semester <= upto_semester).then_some(CourseColumn { col, header })
        })
        .collect();
    tracing::debug!(
        regulation,
        upto_semester,
        course_columns = columns.len(),
        rows = table.rows.len(),
        "importing sheet"
    );

    let mut students = Vec::new();
    let mut skipped_rows = Vec::new();
    for row in &table.rows {
        match student_from_row(row, reg_no_col, name_col, &columns, &courses) {
            Ok(student) => students.push(student),
            Err(reason) => {
                tracing::debug!(row = row.line_no, ?reason, "row skipped");
                skipped_rows.push(SkippedRow {
                    row: row.line_no,
                    reason,
                });
            }
        }
    }

    if students.is_empty() {
        return Err(GpaError::NoValidStudents);
    }
    tracing::info!(
        students = students.len(),
        skipped = skipped_rows.len(),
        "sheet imported"
    );

    Ok(ImportOutcome {
        students: calc::process_students(students),
        skipped_rows,
    })
}

fn required_text(row: &TableRow, col: Option<usize>) -> Option<String> {
    let cell = row.cell(col?);
    if cell_is_blank(cell) {
        return None;
    }
    Some(cell_text(cell).trim().to_string())
}

fn student_from_row(
    row: &TableRow,
    reg_no_col: Option<usize>,
    name_col: Option<usize>,
    columns: &[CourseColumn],
    courses: &[CourseEntry<'_>],
) -> Result<Student, SkipReason> {
    let reg_no = required_text(row, reg_no_col).ok_or(SkipReason::MissingRegNo)?;
    let name = required_text(row, name_col).ok_or(SkipReason::MissingName)?;

    // Semesters ascending; subjects in first-seen column order.
    let mut buckets: BTreeMap<u32, IndexMap<String, SubjectBucket>> = BTreeMap::new();
    for c in columns {
        let h = &c.header;
        let bucket = buckets
            .entry(h.semester)
            .or_default()
            .entry(h.course_name.clone())
            .or_default();
        bucket.course_code.clone_from(&h.course_code);
        bucket.course_name.clone_from(&h.course_name);

        let Some(value) = cell_number(row.cell(c.col)) else {
            continue;
        };
        match h.metric {
            Metric::Marks => bucket.marks = Some(value),
            Metric::GradePoint => bucket.grade_point = Some(value),
            Metric::Credit => bucket.credits = Some(value),
        }
    }

    let semesters: Vec<Semester> = buckets
        .into_iter()
        .filter_map(|(sem, subjects)| {
            let subjects: Vec<Subject> = subjects
                .into_values()
                .filter_map(|b| b.into_subject(courses))
                .collect();
            (!subjects.is_empty()).then(|| Semester::new(sem, subjects))
        })
        .collect();

    if semesters.is_empty() {
        return Err(SkipReason::NoValidSubjects);
    }
    Ok(Student::new(reg_no, name, semesters))
}
