use crate::catalog::SEMESTERS;
use crate::error::GpaError;
use crate::grading::grade_of;
use crate::model::{Semester, Student, Subject};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct GpaResult {
    pub gpa: f64,
    pub graded_subjects: Vec<Subject>,
}

/// Grades every subject and returns the credit-weighted mean grade point.
///
/// Failing subjects stay in the output but carry no credit weight. With no
/// credit-bearing subject the GPA is 0.
pub fn gpa_of(subjects: &[Subject]) -> GpaResult {
    let mut total_credits = 0.0;
    let mut weighted = 0.0;

    let graded_subjects = subjects
        .iter()
        .map(|s| {
            let info = grade_of(s.marks, s.grade_point);
            if !info.grade.is_fail() {
                total_credits += s.credits;
                weighted += info.grade_point * s.credits;
            }
            Subject {
                grade: Some(info.grade),
                grade_point: Some(info.grade_point),
                ..s.clone()
            }
        })
        .collect();

    let gpa = if total_credits > 0.0 {
        weighted / total_credits
    } else {
        0.0
    };
    GpaResult {
        gpa,
        graded_subjects,
    }
}

/// Credit-weighted mean of semester GPAs.
///
/// Each semester is weighted by its non-failing credit total, recomputed from
/// its subjects. A semester with no GPA, or a GPA of exactly 0, is left out.
pub fn cgpa_of(semesters: &[Semester]) -> f64 {
    let mut total_weighted = 0.0;
    let mut total_credits = 0.0;

    for sem in semesters {
        let credits = sem.credit_bearing_total();
        let Some(gpa) = sem.gpa.filter(|g| *g != 0.0) else {
            continue;
        };
        if credits > 0.0 {
            total_weighted += gpa * credits;
            total_credits += credits;
        }
    }

    if total_credits > 0.0 {
        total_weighted / total_credits
    } else {
        0.0
    }
}

fn process_student(id: usize, student: Student) -> Student {
    let semesters: Vec<Semester> = student
        .semesters
        .into_iter()
        .map(|sem| {
            let r = gpa_of(&sem.subjects);
            Semester {
                semester: sem.semester,
                subjects: r.graded_subjects,
                gpa: Some(r.gpa),
            }
        })
        .collect();
    let cgpa = cgpa_of(&semesters);
    Student {
        id,
        semesters,
        cgpa: Some(cgpa),
        ..student
    }
}

/// Grades every semester, attaches GPA and CGPA, and numbers students in
/// input order.
pub fn process_students(students: Vec<Student>) -> Vec<Student> {
    students
        .into_iter()
        .enumerate()
        .map(|(idx, student)| process_student(idx, student))
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Form fields arrive as numbers or as the text typed into an input box.
fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match NumberOrText::deserialize(d)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a number, found {:?}", s))),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectForm {
    pub course_code: String,
    pub course_name: String,
    #[serde(deserialize_with = "lenient_number")]
    pub credit: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub marks: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemesterForm {
    pub subjects: Vec<SubjectForm>,
}

/// Hand-entered marks for one student. Semesters are numbered by position.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    pub name: String,
    pub reg_no: String,
    pub semesters: Vec<SemesterForm>,
}

fn field_error(field: String, message: &str) -> GpaError {
    GpaError::BadParams {
        message: format!("{}: {}", field, message),
        details: Some(json!({ "field": field })),
    }
}

impl StudentForm {
    pub fn validate(&self) -> Result<(), GpaError> {
        if self.name.trim().is_empty() {
            return Err(field_error("name".into(), "Name is required"));
        }
        if self.reg_no.trim().is_empty() {
            return Err(field_error("regNo".into(), "Register number is required"));
        }
        let max = usize::from(*SEMESTERS.end());
        if self.semesters.is_empty() || self.semesters.len() > max {
            return Err(field_error(
                "semesters".into(),
                &format!("between 1 and {} semesters required", max),
            ));
        }
        for (si, sem) in self.semesters.iter().enumerate() {
            for (ci, sub) in sem.subjects.iter().enumerate() {
                let at = |f: &str| format!("semesters[{}].subjects[{}].{}", si, ci, f);
                if sub.course_code.trim().is_empty() {
                    return Err(field_error(at("courseCode"), "Required"));
                }
                if sub.course_name.trim().is_empty() {
                    return Err(field_error(at("courseName"), "Required"));
                }
                if !sub.credit.is_finite() || sub.credit < 0.0 {
                    return Err(field_error(at("credit"), "Must be >= 0"));
                }
                if !(0.0..=100.0).contains(&sub.marks) {
                    return Err(field_error(at("marks"), "Must be between 0 and 100"));
                }
            }
        }
        Ok(())
    }
}

/// Single-student path: validates the form and runs it straight through the
/// aggregator.
pub fn calculate_student(form: StudentForm) -> Result<Student, GpaError> {
    form.validate()?;
    let semesters = form
        .semesters
        .into_iter()
        .enumerate()
        .map(|(idx, sem)| {
            let subjects = sem
                .subjects
                .into_iter()
                .map(|s| Subject::new(s.course_code.trim(), s.course_name.trim(), s.credit, s.marks))
                .collect();
            Semester::new(idx as u32 + 1, subjects)
        })
        .collect();
    let student = Student::new(form.reg_no.trim(), form.name.trim(), semesters);
    Ok(process_student(0, student))
}

/// Two-decimal rendering used by reports.
pub fn fixed_2(x: f64) -> String {
    format!("{:.2}", x)
}
