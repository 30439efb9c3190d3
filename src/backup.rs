use anyhow::{anyhow, Context};
use rusqlite::{Connection, OpenFlags};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/students.db";
pub const BUNDLE_FORMAT_V1: &str = "gradebook-store-v1";
pub const LEGACY_SQLITE_FORMAT: &str = "legacy-sqlite3";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub entry_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes the store file plus a manifest into a zip bundle at `out_path`.
pub fn export_store_bundle(db_path: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if !db_path.is_file() {
        return Err(anyhow!(
            "store database not found: {}",
            db_path.to_string_lossy()
        ));
    }
    let db_bytes = std::fs::read(db_path)
        .with_context(|| format!("failed to read database {}", db_path.to_string_lossy()))?;
    let sha256 = sha256_hex(&db_bytes);
    let bundle_id = Uuid::new_v4().to_string();

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "bundleId": bundle_id,
        "dbSha256": sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start database entry")?;
    zip.write_all(&db_bytes)
        .context("failed to write database entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        entry_count: 2,
        sha256,
    })
}

/// Replaces the store file at `db_path` with the content of `in_path`.
///
/// Zip bundles are checked against their manifest checksum. Anything else is
/// taken to be a bare SQLite file. Either way the new database is staged
/// beside the store and must open as a student store before it replaces the
/// current file; on any failure the current file is left untouched.
pub fn import_store_bundle(in_path: &Path, db_path: &Path) -> anyhow::Result<ImportSummary> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let tmp_dst = importing_path(db_path);
    if !is_zip_file(in_path)? {
        if let Err(e) = std::fs::copy(in_path, &tmp_dst) {
            let _ = std::fs::remove_file(&tmp_dst);
            return Err(e).with_context(|| {
                format!(
                    "failed to copy sqlite backup from {} to {}",
                    in_path.to_string_lossy(),
                    tmp_dst.to_string_lossy()
                )
            });
        }
        install_staged_db(&tmp_dst, db_path)?;
        return Ok(ImportSummary {
            bundle_format_detected: LEGACY_SQLITE_FORMAT.to_string(),
        });
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let expected_sha = manifest
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .map(|s| s.to_ascii_lowercase());

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .context("bundle missing db/students.db")?
        .read_to_end(&mut db_bytes)
        .context("failed to extract database entry")?;
    if let Some(expected) = expected_sha {
        let actual = sha256_hex(&db_bytes);
        if actual != expected {
            return Err(anyhow!(
                "database checksum mismatch: manifest {}, bundle {}",
                expected,
                actual
            ));
        }
    }

    let mut db_out = File::create(&tmp_dst).with_context(|| {
        format!(
            "failed to create temp database {}",
            tmp_dst.to_string_lossy()
        )
    })?;
    let written = db_out
        .write_all(&db_bytes)
        .and_then(|_| db_out.flush())
        .context("failed to write extracted database");
    drop(db_out);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(e);
    }
    install_staged_db(&tmp_dst, db_path)?;

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
    })
}

/// Moves a staged database over the store once it checks out. The staged
/// file is removed whenever it is not installed.
fn install_staged_db(staged: &Path, db_path: &Path) -> anyhow::Result<()> {
    let installed = check_store_db(staged).and_then(|_| {
        std::fs::rename(staged, db_path).with_context(|| {
            format!(
                "failed to move imported database to {}",
                db_path.to_string_lossy()
            )
        })
    });
    if installed.is_err() {
        let _ = std::fs::remove_file(staged);
    }
    installed
}

/// The file must be a readable SQLite database holding a `students` table.
fn check_store_db(path: &Path) -> anyhow::Result<()> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'students'",
            [],
            |r| r.get(0),
        )
        .context("imported file is not a SQLite database")?;
    if tables == 0 {
        return Err(anyhow!("imported database has no students table"));
    }
    Ok(())
}

fn importing_path(db_path: &Path) -> PathBuf {
    let mut name = db_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".importing");
    db_path.with_file_name(name)
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
