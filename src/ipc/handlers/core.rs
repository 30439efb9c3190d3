use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::RecordStore;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dbPath": state.store.as_ref().map(|s| s.db_path().to_string_lossy().to_string())
        }),
    )
}

fn handle_store_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if path.trim().is_empty() {
        return err(&req.id, "bad_params", "path must not be empty", None);
    }

    let opened = RecordStore::open(path.trim()).and_then(|s| s.count().map(|n| (s, n)));
    match opened {
        Ok((s, count)) => {
            tracing::info!(path = %s.db_path().display(), count, "store opened");
            let db_path = s.db_path().to_string_lossy().to_string();
            state.store = Some(s);
            ok(&req.id, json!({ "dbPath": db_path, "count": count }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_store_info(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.count() {
        Ok(count) => ok(
            &req.id,
            json!({ "dbPath": s.db_path().to_string_lossy(), "count": count }),
        ),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.open" => Some(handle_store_open(state, req)),
        "store.info" => Some(handle_store_info(state, req)),
        _ => None,
    }
}
