use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_subject_marks, required_i64, required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentRecord;
use serde_json::json;

fn handle_records_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.get_all() {
        Ok(records) => ok(&req.id, json!({ "records": records })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match s.get(id) {
        Ok(record) => ok(&req.id, json!({ "record": record })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match s.search(query) {
        Ok(records) => ok(&req.id, json!({ "records": records })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let marks = match optional_subject_marks(req, "subjectMarks") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return e,
    };

    let record = StudentRecord::new(name, marks);
    match s.add(&record).and_then(|id| s.get(id)) {
        Ok(stored) => ok(&req.id, json!({ "record": stored })),
        Err(e) => store_err(req, e),
    }
}

/// Only the fields present in params are changed.
fn handle_records_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let marks = match optional_subject_marks(req, "subjectMarks") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = req.params.get("name").and_then(|v| v.as_str());
    if name.is_none() && marks.is_none() {
        return err(
            &req.id,
            "bad_params",
            "nothing to update: pass name and/or subjectMarks",
            None,
        );
    }

    let mut record = match s.get(id) {
        Ok(r) => r,
        Err(e) => return store_err(req, e),
    };
    if let Some(name) = name {
        record.name = name.to_string();
    }
    if let Some(marks) = marks {
        record.set_marks(marks);
    }

    match s.update(&record).and_then(|_| s.get(id)) {
        Ok(stored) => ok(&req.id, json!({ "record": stored })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match s.delete(id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.clear() {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => store_err(req, e),
    }
}

fn handle_records_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.count() {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.list" => Some(handle_records_list(state, req)),
        "records.get" => Some(handle_records_get(state, req)),
        "records.search" => Some(handle_records_search(state, req)),
        "records.create" => Some(handle_records_create(state, req)),
        "records.update" => Some(handle_records_update(state, req)),
        "records.delete" => Some(handle_records_delete(state, req)),
        "records.clear" => Some(handle_records_clear(state, req)),
        "records.count" => Some(handle_records_count(state, req)),
        _ => None,
    }
}
