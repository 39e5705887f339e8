//! Column-header grammar for uploaded mark sheets.
//!
//! A header names a course and the metric the column carries. Two shapes are
//! accepted, tried in order:
//!
//! * `S<semester> <course name> <metric>`, e.g. `S1 Python Programming Marks`
//! * `<course code> <metric>`, e.g. `23UCA11 Grade Point`
//!
//! Courses are resolved against the catalog, so a misspelt course never
//! produces a subject. Headers that match no rule (`Reg No`, `Name`, notes
//! columns) are simply not course columns.

use crate::catalog::CourseEntry;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Marks,
    #[serde(rename = "Grade Point")]
    GradePoint,
    Credit,
}

impl Metric {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Marks" => Some(Metric::Marks),
            "Grade Point" => Some(Metric::GradePoint),
            "Credit" => Some(Metric::Credit),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Marks => "Marks",
            Metric::GradePoint => "Grade Point",
            Metric::Credit => "Credit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedHeader {
    pub semester: u32,
    pub course_code: String,
    pub course_name: String,
    pub metric: Metric,
}

type Resolve = fn(&Captures<'_>, &[CourseEntry<'_>]) -> Option<ParsedHeader>;

struct HeaderRule {
    name: &'static str,
    pattern: Regex,
    resolve: Resolve,
}

fn rules() -> &'static [HeaderRule] {
    static RULES: OnceLock<Vec<HeaderRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            HeaderRule {
                name: "semester-course-name",
                pattern: Regex::new(r"^S(\d+)\s(.+?)\s(Marks|Grade Point|Credit)$")
                    .unwrap_or_else(|e| panic!("bad header pattern: {e}")),
                resolve: resolve_by_name,
            },
            HeaderRule {
                name: "course-code",
                pattern: Regex::new(r"^(\S+)\s(Marks|Grade Point|Credit)$")
                    .unwrap_or_else(|e| panic!("bad header pattern: {e}")),
                resolve: resolve_by_code,
            },
        ]
    })
}

// The semester comes from the header itself, not the catalog.
fn resolve_by_name(caps: &Captures<'_>, courses: &[CourseEntry<'_>]) -> Option<ParsedHeader> {
    let semester = caps[1].parse::<u32>().ok()?;
    let name = &caps[2];
    let metric = Metric::parse(&caps[3])?;
    let entry = courses.iter().find(|e| e.course.name == name)?;
    Some(ParsedHeader {
        semester,
        course_code: entry.course.code.clone(),
        course_name: name.to_string(),
        metric,
    })
}

fn resolve_by_code(caps: &Captures<'_>, courses: &[CourseEntry<'_>]) -> Option<ParsedHeader> {
    let code = &caps[1];
    let metric = Metric::parse(&caps[2])?;
    let entry = courses.iter().find(|e| e.course.code == code)?;
    Some(ParsedHeader {
        semester: u32::from(entry.semester),
        course_code: entry.course.code.clone(),
        course_name: entry.course.name.clone(),
        metric,
    })
}

/// First rule whose pattern matches and whose course resolves wins.
pub fn parse_header(header: &str, courses: &[CourseEntry<'_>]) -> Option<ParsedHeader> {
    rules().iter().find_map(|rule| {
        let caps = rule.pattern.captures(header)?;
        let parsed = (rule.resolve)(&caps, courses);
        if parsed.is_some() {
            tracing::trace!(header, rule = rule.name, "course column");
        }
        parsed
    })
}
