use crate::error::GpaError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Converts a domain error into an error response. Internal failures are
/// logged with their detail and answered with the generic message only.
pub fn gpa_err(id: &str, method: &str, e: &GpaError) -> serde_json::Value {
    match e {
        GpaError::Internal { detail, .. } => {
            tracing::error!(id, method, detail = %detail, "{}", e);
        }
        _ => tracing::warn!(id, method, code = e.code(), "{}", e),
    }
    err(id, e.code(), e.to_string(), e.details())
}
