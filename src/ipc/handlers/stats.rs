use crate::ipc::error::ok;
use crate::ipc::helpers::{store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::stats;
use serde_json::json;

fn handle_subject_averages(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.subject_averages() {
        Ok(avgs) => ok(&req.id, json!({ "subjectAverages": avgs })),
        Err(e) => store_err(req, e),
    }
}

fn handle_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.get_all() {
        Ok(records) => ok(&req.id, json!(stats::class_summary(&records))),
        Err(e) => store_err(req, e),
    }
}

fn handle_rankings(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.get_all() {
        Ok(records) => ok(&req.id, json!({ "rankings": stats::rankings(&records) })),
        Err(e) => store_err(req, e),
    }
}

fn handle_subject_analysis(state: &mut AppState, req: &Request) -> serde_json::Value {
    let s = match store(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.subject_averages() {
        Ok(avgs) => ok(&req.id, json!(stats::subject_analysis(&avgs))),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.subjectAverages" => Some(handle_subject_averages(state, req)),
        "stats.class" => Some(handle_class(state, req)),
        "stats.rankings" => Some(handle_rankings(state, req)),
        "stats.subjectAnalysis" => Some(handle_subject_analysis(state, req)),
        _ => None,
    }
}
