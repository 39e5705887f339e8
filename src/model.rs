use crate::grading::Grade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub course_code: String,
    pub course_name: String,
    pub credits: f64,
    pub marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    /// Externally supplied before grading, assigned after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_point: Option<f64>,
}

impl Subject {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: f64, marks: f64) -> Self {
        Self {
            course_code: code.into(),
            course_name: name.into(),
            credits,
            marks,
            grade: None,
            grade_point: None,
        }
    }

    /// Counts toward credit totals unless graded as a fail.
    pub fn is_credit_bearing(&self) -> bool {
        !self.grade.is_some_and(|g| g.is_fail())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub semester: u32,
    pub subjects: Vec<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
}

impl Semester {
    pub fn new(semester: u32, subjects: Vec<Subject>) -> Self {
        Self {
            semester,
            subjects,
            gpa: None,
        }
    }

    pub fn credit_bearing_total(&self) -> f64 {
        self.subjects
            .iter()
            .filter(|s| s.is_credit_bearing())
            .map(|s| s.credits)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: usize,
    pub reg_no: String,
    pub name: String,
    pub semesters: Vec<Semester>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
}

impl Student {
    pub fn new(reg_no: impl Into<String>, name: impl Into<String>, semesters: Vec<Semester>) -> Self {
        Self {
            id: 0,
            reg_no: reg_no.into(),
            name: name.into(),
            semesters,
            cgpa: None,
        }
    }

    pub fn semester(&self, number: u32) -> Option<&Semester> {
        self.semesters.iter().find(|s| s.semester == number)
    }
}
