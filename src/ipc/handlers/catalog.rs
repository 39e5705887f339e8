use super::params;
use crate::error::GpaError;
use crate::ipc::error::{gpa_err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_regulations(state: &AppState, req: &Request) -> serde_json::Value {
    let regulations: Vec<serde_json::Value> = state
        .catalog
        .years()
        .into_iter()
        .filter_map(|year| {
            let reg = state.catalog.regulation(year)?;
            Some(json!({
                "regulation": year,
                "semesters": reg.semester_numbers(),
            }))
        })
        .collect();
    ok(&req.id, json!({ "regulations": regulations }))
}

fn handle_courses(state: &AppState, req: &Request) -> serde_json::Value {
    let regulation = match params::regulation(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let semester = match params::semester(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let Some(reg) = state.catalog.regulation(regulation) else {
        return gpa_err(&req.id, &req.method, &GpaError::UnknownRegulation(regulation));
    };
    let courses = reg.courses(semester).unwrap_or_default();
    ok(
        &req.id,
        json!({
            "regulation": regulation,
            "semester": semester,
            "courses": courses,
        }),
    )
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.regulations" => Some(handle_regulations(state, req)),
        "catalog.courses" => Some(handle_courses(state, req)),
        _ => None,
    }
}
