mod backup;
mod config;
mod db;
mod error;
mod grading;
mod ipc;
mod model;
mod stats;
mod store;
mod subjects;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_logging(directive: &str) {
    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("gradebookd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let config = config::Config::parse();
    init_logging(&config.log_level);

    let db_path = config.db_path();
    let store = match store::RecordStore::open(&db_path) {
        Ok(s) => {
            tracing::info!(path = %db_path.display(), "store ready");
            Some(s)
        }
        Err(e) => {
            // Keep serving; the caller can still pick another file via store.open.
            tracing::error!(path = %db_path.display(), "failed to initialize store: {e}");
            None
        }
    };
    let mut state = ipc::AppState { store };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("unparseable request: {e}");
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::debug!("stdin closed, exiting");
}
