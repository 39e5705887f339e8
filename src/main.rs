mod calc;
mod catalog;
mod config;
mod error;
mod export;
mod grading;
mod header;
mod import;
mod ipc;
mod model;
mod source;
mod workbook;

use std::io::{self, BufRead, Write};

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(config::ENV_LOG)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // stdout is the IPC channel.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::Config::from_env()?;
    let catalog = config.load_catalog()?;
    tracing::info!(regulations = ?catalog.years(), "catalog loaded");
    let state = ipc::AppState { config, catalog };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&state, req),
            // Can't reply with an id.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
