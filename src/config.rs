use crate::db::DB_FILE_NAME;
use clap::Parser;
use std::path::PathBuf;

/// Student record store sidecar. Speaks JSON lines on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "gradebookd", version)]
pub struct Config {
    /// Store file. Defaults to students.db next to the executable.
    #[arg(long, env = "GRADEBOOKD_DB")]
    pub db: Option<PathBuf>,

    /// Tracing filter directive, e.g. "gradebookd=debug".
    #[arg(long, env = "GRADEBOOKD_LOG", default_value = "gradebookd=info")]
    pub log_level: String,
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        match &self.db {
            Some(p) => p.clone(),
            None => default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DB_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}
