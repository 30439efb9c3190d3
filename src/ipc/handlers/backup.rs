use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };

    match backup::export_store_bundle(s.db_path(), &out_path) {
        Ok(summary) => {
            tracing::info!(out = %out_path.display(), bundle_id = %summary.bundle_id, "store exported");
            ok(
                &req.id,
                json!({
                    "outPath": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "bundleId": summary.bundle_id,
                    "entryCount": summary.entry_count,
                    "sha256": summary.sha256,
                }),
            )
        }
        Err(e) => {
            tracing::error!(method = %req.method, "{e:#}");
            err(&req.id, "backup_export_failed", format!("{e:#}"), None)
        }
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };

    let summary = match backup::import_store_bundle(&in_path, s.db_path()) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(method = %req.method, "{e:#}");
            return err(&req.id, "backup_import_failed", format!("{e:#}"), None);
        }
    };
    tracing::info!(from = %in_path.display(), format = %summary.bundle_format_detected, "store imported");

    match s.initialize().and_then(|_| s.count()) {
        Ok(count) => ok(
            &req.id,
            json!({
                "bundleFormatDetected": summary.bundle_format_detected,
                "count": count,
            }),
        ),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
