use crate::catalog::Catalog;
use crate::config::Config;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Process-wide state. Nothing here changes after startup; every request
/// builds and owns its own student records.
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
}
