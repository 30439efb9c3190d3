use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(db_path: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .arg("--db")
        .arg(db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let dir = temp_dir("gradebook-router-smoke");
    let db_path = dir.join("students.db");
    let bundle_out = dir.join("smoke-backup.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&db_path);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health["dbPath"].as_str().is_some());

    let methods: Vec<(&str, serde_json::Value)> = vec![
        ("store.info", json!({})),
        ("grading.derive", json!({ "subjectMarks": { "Music": 90 } })),
        ("subjects.catalog", json!({})),
        ("records.create", json!({ "name": "Smoke", "subjectMarks": { "Art": 61 } })),
        ("records.list", json!({})),
        ("records.search", json!({ "query": "smo" })),
        ("records.count", json!({})),
        ("stats.subjectAverages", json!({})),
        ("stats.class", json!({})),
        ("stats.rankings", json!({})),
        ("stats.subjectAnalysis", json!({})),
        ("backup.export", json!({ "outPath": bundle_out.to_string_lossy() })),
    ];
    for (i, (method, params)) in methods.into_iter().enumerate() {
        let id = format!("m{}", i);
        let _ = request_ok(&mut stdin, &mut reader, &id, method, params);
    }

    let unknown = request(&mut stdin, &mut reader, "x", "students.teleport", json!({}));
    assert_eq!(unknown["ok"], false);
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let bad = request(&mut stdin, &mut reader, "y", "records.get", json!({ "id": "seven" }));
    assert_eq!(error_code(&bad), Some("bad_params"));

    writeln!(stdin, "{{ not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(error_code(&value), Some("bad_json"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn store_open_switches_files_and_unusable_paths_fail_cleanly() {
    let dir = temp_dir("gradebook-store-open");
    let first = dir.join("first.db");
    let second = dir.join("term2").join("second.db");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&first);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.create",
        json!({ "name": "First", "subjectMarks": {} }),
    );

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "store.open",
        json!({ "path": second.to_string_lossy() }),
    );
    assert_eq!(opened["count"], 0);
    assert!(second.is_file());

    let blocker = dir.join("blocker");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    let failed = request(
        &mut stdin,
        &mut reader,
        "3",
        "store.open",
        json!({ "path": blocker.join("x.db").to_string_lossy() }),
    );
    assert_eq!(error_code(&failed), Some("store_unavailable"));

    let info = request_ok(&mut stdin, &mut reader, "4", "store.info", json!({}));
    assert_eq!(info["dbPath"].as_str(), Some(second.to_string_lossy().as_ref()));

    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "store.open",
        json!({ "path": first.to_string_lossy() }),
    );
    assert_eq!(reopened["count"], 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn backup_export_then_import_restores_records() {
    let dir = temp_dir("gradebook-backup-ipc");
    let db_path = dir.join("students.db");
    let bundle = dir.join("class.gradebook.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&db_path);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.create",
        json!({ "name": "Saved", "subjectMarks": { "Dance": 77 } }),
    );
    let export = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.export",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(export["bundleFormat"], "gradebook-store-v1");
    assert_eq!(export["sha256"].as_str().map(|s| s.len()), Some(64));

    let _ = request_ok(&mut stdin, &mut reader, "3", "records.clear", json!({}));
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.import",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"], "gradebook-store-v1");
    assert_eq!(imported["count"], 1);

    let list = request_ok(&mut stdin, &mut reader, "5", "records.list", json!({}));
    assert_eq!(list["records"][0]["name"], "Saved");
    assert_eq!(list["records"][0]["grade"], "B");

    let notes = dir.join("notes.txt");
    std::fs::write(&notes, "not a gradebook").expect("write notes");
    let resp = request(
        &mut stdin,
        &mut reader,
        "6",
        "backup.import",
        json!({ "inPath": notes.to_string_lossy() }),
    );
    assert_eq!(error_code(&resp), Some("backup_import_failed"));
    let count = request_ok(&mut stdin, &mut reader, "7", "records.count", json!({}));
    assert_eq!(count["count"], 1);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}
