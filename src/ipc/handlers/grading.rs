use crate::grading;
use crate::ipc::error::ok;
use crate::ipc::helpers::optional_subject_marks;
use crate::ipc::types::{AppState, Request};
use crate::subjects;
use serde_json::json;

/// Grades marks without touching the store, e.g. to preview before saving.
fn handle_grading_derive(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let marks = match optional_subject_marks(req, "subjectMarks") {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return e,
    };
    let derived = grading::derive_grade(marks.values().copied());
    ok(
        &req.id,
        json!({ "average": derived.average, "grade": derived.grade }),
    )
}

fn handle_subjects_catalog(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "subjects": subjects::CATALOG }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grading.derive" => Some(handle_grading_derive(state, req)),
        "subjects.catalog" => Some(handle_subjects_catalog(state, req)),
        _ => None,
    }
}
