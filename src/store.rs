use crate::db;
use crate::error::StoreError;
use crate::grading::Grade;
use crate::model::{self, StudentRecord, SubjectMarks};
use crate::stats;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str = "SELECT id, name, subject_marks_json, grade, date_added FROM students";

/// Durable home of all student records.
///
/// Holds only the file location. Every operation opens its own connection and
/// drops it before returning, so nothing stays open between calls.
#[derive(Debug, Clone)]
pub struct RecordStore {
    db_path: PathBuf,
}

/// A row as written, before marks are decoded and the grade re-derived.
struct StoredRow {
    id: i64,
    name: String,
    subject_marks_json: String,
    grade: String,
    date_added: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            subject_marks_json: row.get(2)?,
            grade: row.get(3)?,
            date_added: row.get(4)?,
        })
    }

    /// Corrupt marks read as empty rather than failing the whole read.
    fn into_record(self) -> StudentRecord {
        let marks: SubjectMarks = match serde_json::from_str(&self.subject_marks_json) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(id = self.id, "unreadable subject marks, treating as empty: {e}");
                SubjectMarks::new()
            }
        };
        let date_added = model::parse_timestamp(&self.date_added);
        if date_added.is_none() {
            tracing::warn!(id = self.id, raw = %self.date_added, "unparseable date_added");
        }

        let record = StudentRecord::from_stored(self.id, self.name, marks, date_added);
        if Grade::parse(&self.grade) != Some(record.grade()) {
            tracing::debug!(
                id = record.id(),
                stored = %self.grade,
                current = %record.grade(),
                "stored grade is stale"
            );
        }
        record
    }
}

impl RecordStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Builds a store handle and makes sure its file and schema exist.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(db_path);
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Idempotent: creates the file and table when missing, keeps existing data.
    pub fn initialize(&self) -> Result<(), StoreError> {
        db::open_db(&self.db_path)
            .map(drop)
            .map_err(StoreError::Unavailable)?;
        tracing::debug!(path = %self.db_path.display(), "store initialized");
        Ok(())
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        db::connect(&self.db_path).map_err(StoreError::Unavailable)
    }

    /// Inserts `record` as a new row and returns the id the store assigned.
    /// Any id already set on `record` is ignored.
    pub fn add(&self, record: &StudentRecord) -> Result<i64, StoreError> {
        record.validate()?;
        let marks_json = serde_json::to_string(record.subject_marks())?;
        let date_added = model::format_timestamp(&Local::now().naive_local());

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO students(name, subject_marks_json, average, grade, date_added)
             VALUES (?, ?, ?, ?, ?)",
            (
                record.name.trim(),
                &marks_json,
                record.average(),
                record.grade().as_str(),
                &date_added,
            ),
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, subjects = record.subject_marks().len(), "student record added");
        Ok(id)
    }

    /// Most recent first. Grades are re-derived from the stored marks.
    pub fn get_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY date_added DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(StoredRow::into_record).collect())
    }

    pub fn get(&self, id: i64) -> Result<StudentRecord, StoreError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                [id],
                StoredRow::from_row,
            )
            .optional()?;
        row.map(StoredRow::into_record)
            .ok_or(StoreError::NotFound(id))
    }

    /// Rewrites name, marks and the cached average/grade of the row with
    /// `record.id()`. The id and creation timestamp never change.
    pub fn update(&self, record: &StudentRecord) -> Result<(), StoreError> {
        if !record.is_persisted() {
            return Err(StoreError::NotFound(record.id()));
        }
        record.validate()?;
        let marks_json = serde_json::to_string(record.subject_marks())?;

        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE students
             SET name = ?, subject_marks_json = ?, average = ?, grade = ?
             WHERE id = ?",
            (
                record.name.trim(),
                &marks_json,
                record.average(),
                record.grade().as_str(),
                record.id(),
            ),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id()));
        }
        tracing::info!(id = record.id(), "student record updated");
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(id, "student record deleted");
        Ok(())
    }

    /// Removes every record. Returns how many rows were deleted.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM students", [])?;
        tracing::info!(removed, "student records cleared");
        Ok(removed)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.connect()?;
        let n = conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok(n)
    }

    /// Case-insensitive substring match on the name. A blank query matches all.
    pub fn search(&self, query: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let needle = query.trim().to_lowercase();
        let records = self.get_all()?;
        if needle.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Mean mark per subject over the records that took it.
    pub fn subject_averages(&self) -> Result<BTreeMap<String, f64>, StoreError> {
        let records = self.get_all()?;
        Ok(stats::subject_averages(&records))
    }
}
