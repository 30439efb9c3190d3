use crate::error::StoreError;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::SubjectMarks;
use crate::store::RecordStore;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("missing or non-integer {}", key),
                None,
            )
        })
}

pub fn store<'a>(state: &'a AppState, req: &Request) -> Result<&'a RecordStore, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_store", "open a store first", None))
}

/// `Ok(None)` when the key is absent; an error when present but not an
/// object of numbers, or when two subjects are the same name once trimmed.
pub fn optional_subject_marks(
    req: &Request,
    key: &str,
) -> Result<Option<SubjectMarks>, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let Some(obj) = raw.as_object() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be an object of subject -> mark", key),
            None,
        ));
    };
    let mut marks = SubjectMarks::new();
    for (subject, v) in obj {
        let Some(mark) = v.as_f64() else {
            return Err(err(
                &req.id,
                "bad_params",
                format!("mark for {} must be a number", subject),
                Some(serde_json::json!({ "subject": subject })),
            ));
        };
        let name = subject.trim();
        if marks.contains_key(name) {
            return Err(err(
                &req.id,
                "bad_params",
                format!("subject {} is given more than once", name),
                Some(serde_json::json!({ "subject": name })),
            ));
        }
        marks.insert(name.to_string(), mark);
    }
    Ok(Some(marks))
}

/// Logs a store failure and turns it into an error response.
pub fn store_err(req: &Request, e: StoreError) -> serde_json::Value {
    match &e {
        StoreError::NotFound(_) | StoreError::InvalidRecord(_) => {
            tracing::warn!(method = %req.method, "{e}");
        }
        _ => {
            tracing::error!(method = %req.method, "{e}");
        }
    }
    err(&req.id, e.code(), e.to_string(), None)
}
