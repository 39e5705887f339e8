use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;
use std::path::Path;

pub const REGULATION_YEARS: RangeInclusive<u16> = 2022..=2027;
pub const SEMESTERS: RangeInclusive<u8> = 1..=6;

const BUILTIN_CATALOG: &str = include_str!("../data/course_catalog.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub credit: u32,
}

/// A catalog course tagged with the semester it is taught in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseEntry<'a> {
    pub semester: u8,
    pub course: &'a Course,
}

/// Courses of one curriculum version, keyed by semester number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Regulation {
    semesters: BTreeMap<u8, Vec<Course>>,
}

impl Regulation {
    pub fn courses(&self, semester: u8) -> Option<&[Course]> {
        self.semesters
            .get(&semester)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    pub fn semester_numbers(&self) -> Vec<u8> {
        self.semesters
            .iter()
            .filter(|(_, courses)| !courses.is_empty())
            .map(|(sem, _)| *sem)
            .collect()
    }

    /// Every course of the regulation, flattened in semester order.
    pub fn entries(&self) -> Vec<CourseEntry<'_>> {
        self.semesters
            .iter()
            .flat_map(|(sem, courses)| {
                courses.iter().map(move |course| CourseEntry {
                    semester: *sem,
                    course,
                })
            })
            .collect()
    }
}

/// Read-only course reference table. Loaded once at startup and handed to
/// the importer and exporter explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    regulations: BTreeMap<u16, Regulation>,
}

impl Catalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG).context("built-in course catalog is invalid")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.to_string_lossy()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid catalog {}", path.to_string_lossy()))
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(text).context("catalog is not valid JSON")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn regulation(&self, year: u16) -> Option<&Regulation> {
        self.regulations.get(&year)
    }

    pub fn years(&self) -> Vec<u16> {
        self.regulations.keys().copied().collect()
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (year, regulation) in &self.regulations {
            if !REGULATION_YEARS.contains(year) {
                return Err(anyhow!("regulation {} outside supported years", year));
            }
            let mut codes = HashSet::new();
            let mut names = HashSet::new();
            for entry in regulation.entries() {
                if !SEMESTERS.contains(&entry.semester) {
                    return Err(anyhow!(
                        "regulation {}: semester {} out of range",
                        year,
                        entry.semester
                    ));
                }
                let c = entry.course;
                if c.credit == 0 {
                    return Err(anyhow!("regulation {}: course {} has zero credit", year, c.code));
                }
                if c.code.trim().is_empty() || c.name.trim().is_empty() {
                    return Err(anyhow!("regulation {}: course with empty code or name", year));
                }
                if !codes.insert(c.code.as_str()) {
                    return Err(anyhow!("regulation {}: duplicate course code {}", year, c.code));
                }
                if !names.insert(c.name.as_str()) {
                    return Err(anyhow!("regulation {}: duplicate course name {}", year, c.name));
                }
            }
        }
        Ok(())
    }
}
