use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "regulations": state.catalog.years(),
            "catalogPath": state
                .config
                .catalog_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        }),
    )
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
