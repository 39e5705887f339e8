use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_GRADE_POINT: f64 = 10.0;

/// Letter grades, best first. `Ra` (re-appear) is the failing grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "O")]
    O,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "RA")]
    Ra,
}

impl Grade {
    /// Inclusive lower mark bound per grade, evaluated top-down.
    const BANDS: [(f64, Grade); 5] = [
        (90.0, Grade::O),
        (80.0, Grade::DPlus),
        (70.0, Grade::D),
        (60.0, Grade::APlus),
        (50.0, Grade::A),
    ];

    pub fn from_marks(marks: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(floor, _)| marks >= *floor)
            .map(|(_, g)| *g)
            .unwrap_or(Grade::Ra)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::Ra => "RA",
        }
    }

    pub fn is_fail(self) -> bool {
        self == Grade::Ra
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeInfo {
    pub grade: Grade,
    pub grade_point: f64,
}

/// Letter grade and grade point for a mark.
///
/// A finite `supplied` grade point takes precedence over `marks / 10`. The
/// point is capped at 10 but not floored; a failing grade always scores 0.
pub fn grade_of(marks: f64, supplied: Option<f64>) -> GradeInfo {
    let base = supplied
        .filter(|gp| gp.is_finite())
        .unwrap_or(marks / 10.0);
    let grade = Grade::from_marks(marks);
    let grade_point = if grade.is_fail() {
        0.0
    } else {
        base.min(MAX_GRADE_POINT)
    };
    GradeInfo { grade, grade_point }
}
