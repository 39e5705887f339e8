use crate::catalog::Catalog;
use crate::source::FetchLimits;
use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_CATALOG: &str = "GPACALCD_CATALOG";
pub const ENV_LOG: &str = "GPACALCD_LOG";
pub const ENV_FETCH_TIMEOUT: &str = "GPACALCD_FETCH_TIMEOUT_SECS";
pub const ENV_MAX_SOURCE_BYTES: &str = "GPACALCD_MAX_SOURCE_BYTES";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_SOURCE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub max_source_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(p) = non_empty(ENV_CATALOG) {
            cfg.catalog_path = Some(PathBuf::from(p));
        }
        if let Some(v) = non_empty(ENV_FETCH_TIMEOUT) {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_FETCH_TIMEOUT))?;
            if secs == 0 {
                return Err(anyhow!("{} must be greater than zero", ENV_FETCH_TIMEOUT));
            }
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = non_empty(ENV_MAX_SOURCE_BYTES) {
            cfg.max_source_bytes = v
                .parse()
                .with_context(|| format!("{} must be a byte count", ENV_MAX_SOURCE_BYTES))?;
        }
        Ok(cfg)
    }

    pub fn load_catalog(&self) -> anyhow::Result<Catalog> {
        match &self.catalog_path {
            Some(p) => Catalog::load(p),
            None => Catalog::builtin(),
        }
    }

    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            timeout: self.fetch_timeout,
            max_bytes: self.max_source_bytes,
        }
    }
}
