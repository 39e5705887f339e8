use thiserror::Error;

const NO_VALID_STUDENTS: &str = "No valid student data could be parsed from the file. \
Please check that 'Reg No', 'Name', and subject 'Credit' and 'Marks'/'Grade Point' \
columns are present and correctly filled.";

/// Failures surfaced to the caller. Row- and column-level problems never
/// reach this type; the importer drops them.
#[derive(Error, Debug)]
pub enum GpaError {
    #[error("No file content or URL provided.")]
    NoSource,

    #[error("No student data available to download.")]
    NoStudents,

    #[error("No course data found for regulation year {0}.")]
    UnknownRegulation(u16),

    #[error("No courses defined for regulation {regulation} for semester {semester}.")]
    NoCoursesForSemester { regulation: u16, semester: u8 },

    #[error("The Excel file is empty or could not be read.")]
    EmptyWorkbook,

    #[error("{}", NO_VALID_STUDENTS)]
    NoValidStudents,

    #[error("Unreadable workbook: {0}")]
    UnreadableWorkbook(String),

    #[error("Invalid file content: {0}")]
    InvalidContent(String),

    #[error("Failed to fetch file from URL: {0}")]
    Fetch(String),

    #[error("{message}")]
    BadParams {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Detail is logged, never shown.
    #[error("An unexpected error occurred while {context}.")]
    Internal { context: &'static str, detail: String },
}

impl GpaError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        GpaError::BadParams {
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(context: &'static str, detail: impl ToString) -> Self {
        GpaError::Internal {
            context,
            detail: detail.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GpaError::NoSource | GpaError::NoStudents => "no_input",
            GpaError::UnknownRegulation(_) | GpaError::NoCoursesForSemester { .. } => {
                "catalog_missing"
            }
            GpaError::EmptyWorkbook
            | GpaError::NoValidStudents
            | GpaError::UnreadableWorkbook(_)
            | GpaError::InvalidContent(_) => "malformed_source",
            GpaError::Fetch(_) => "fetch_failed",
            GpaError::BadParams { .. } => "bad_params",
            GpaError::Internal { .. } => "internal",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GpaError::BadParams { details, .. } => details.clone(),
            _ => None,
        }
    }
}
