use super::params;
use crate::calc::{self, StudentForm};
use crate::error::GpaError;
use crate::export;
use crate::import;
use crate::ipc::error::{err, gpa_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::source::{self, FileSource};
use crate::workbook::XLSX_MIME;
use base64::Engine as _;
use serde_json::json;

fn file_source(req: &Request) -> Result<FileSource, GpaError> {
    if let Some(url) = params::optional_str(req, "fileUrl") {
        return Ok(FileSource::Url(url));
    }
    if let Some(content) = params::optional_str(req, "fileContent") {
        return Ok(FileSource::Inline {
            content_base64: content,
            mime_type: params::optional_str(req, "fileType"),
        });
    }
    Err(GpaError::NoSource)
}

fn handle_process_workbook(state: &AppState, req: &Request) -> serde_json::Value {
    let regulation = match params::regulation(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let upto = match params::semester(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let run = || -> Result<serde_json::Value, GpaError> {
        let src = file_source(req)?;
        let (bytes, info) = source::load_bytes(&src, state.config.fetch_limits())?;
        tracing::info!(bytes = info.bytes, sha256 = %info.sha256, regulation, upto, "processing workbook");
        let outcome = import::import_workbook(&bytes, &state.catalog, regulation, u32::from(upto))?;
        Ok(json!({
            "students": outcome.students,
            "skippedRows": outcome.skipped_rows,
            "source": info,
        }))
    };

    match run() {
        Ok(result) => ok(&req.id, result),
        Err(e) => gpa_err(&req.id, &req.method, &e),
    }
}

fn handle_calculate_student(_state: &AppState, req: &Request) -> serde_json::Value {
    let form: StudentForm = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid student: {e}"), None),
    };
    match calc::calculate_student(form) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => gpa_err(&req.id, &req.method, &e),
    }
}

fn file_result(file_name: String, bytes: &[u8]) -> serde_json::Value {
    json!({
        "fileName": file_name,
        "mimeType": XLSX_MIME,
        "fileContent": base64::engine::general_purpose::STANDARD.encode(bytes),
        "generatedAt": chrono::Utc::now().to_rfc3339(),
    })
}

fn handle_download_report(_state: &AppState, req: &Request) -> serde_json::Value {
    let students: Vec<Student> = match req.params.get("students") {
        None => Vec::new(),
        Some(v) if v.is_null() => Vec::new(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(e) => {
                return err(&req.id, "bad_params", format!("invalid students: {e}"), None)
            }
        },
    };
    match export::build_report(&students) {
        Ok(bytes) => ok(
            &req.id,
            file_result(export::REPORT_FILE_NAME.to_string(), &bytes),
        ),
        Err(e) => gpa_err(&req.id, &req.method, &e),
    }
}

fn handle_download_sample(state: &AppState, req: &Request) -> serde_json::Value {
    let regulation = match params::regulation(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let semester = match params::semester(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match export::build_sample_template(&state.catalog, regulation, semester) {
        Ok(bytes) => ok(
            &req.id,
            file_result(export::sample_file_name(regulation, semester), &bytes),
        ),
        Err(e) => gpa_err(&req.id, &req.method, &e),
    }
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gpa.processWorkbook" => Some(handle_process_workbook(state, req)),
        "gpa.calculateStudent" => Some(handle_calculate_student(state, req)),
        "gpa.downloadReport" => Some(handle_download_report(state, req)),
        "gpa.downloadSample" => Some(handle_download_sample(state, req)),
        _ => None,
    }
}
