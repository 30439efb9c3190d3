use crate::error::StoreError;
use crate::grading::{self, Derived, Grade};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Subject name -> mark.
pub type SubjectMarks = BTreeMap<String, f64>;

/// Persisted timestamp layout; sorts lexicographically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

fn serialize_timestamp<S: Serializer>(
    ts: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

/// One student's marks plus the grade derived from them.
///
/// `average` and `grade` have no setters: every change to the marks goes
/// through [`StudentRecord::set_marks`], which re-runs the grading engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    id: i64,
    pub name: String,
    subject_marks: SubjectMarks,
    average: f64,
    grade: Grade,
    #[serde(serialize_with = "serialize_timestamp")]
    date_added: Option<NaiveDateTime>,
}

impl StudentRecord {
    /// Unsaved record; the store assigns `id` and `date_added`.
    pub fn new(name: impl Into<String>, subject_marks: SubjectMarks) -> Self {
        let mut record = Self {
            id: 0,
            name: name.into(),
            subject_marks,
            average: 0.0,
            grade: Grade::NotAvailable,
            date_added: None,
        };
        record.regrade();
        record
    }

    /// Addresses an already persisted row, e.g. for an update.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub(crate) fn from_stored(
        id: i64,
        name: String,
        subject_marks: SubjectMarks,
        date_added: Option<NaiveDateTime>,
    ) -> Self {
        Self::new(name, subject_marks)
            .with_id(id)
            .with_date_added(date_added)
    }

    fn with_date_added(mut self, date_added: Option<NaiveDateTime>) -> Self {
        self.date_added = date_added;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn subject_marks(&self) -> &SubjectMarks {
        &self.subject_marks
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub fn date_added(&self) -> Option<NaiveDateTime> {
        self.date_added
    }

    pub fn set_marks(&mut self, subject_marks: SubjectMarks) {
        self.subject_marks = subject_marks;
        self.regrade();
    }

    /// Re-derives average and grade from the current marks.
    pub fn regrade(&mut self) {
        let Derived { average, grade } = grading::derive_grade(self.subject_marks.values().copied());
        self.average = average;
        self.grade = grade;
    }

    /// Checks the record can be written. Marks outside 0..=100 are accepted.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("name must not be empty".into()));
        }
        for (subject, mark) in &self.subject_marks {
            if subject.trim().is_empty() {
                return Err(StoreError::InvalidRecord(
                    "subject names must not be empty".into(),
                ));
            }
            if !mark.is_finite() {
                return Err(StoreError::InvalidRecord(format!(
                    "mark for {} is not a finite number",
                    subject
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(pairs: &[(&str, f64)]) -> SubjectMarks {
        pairs.iter().map(|(s, m)| (s.to_string(), *m)).collect()
    }

    #[test]
    fn new_record_is_graded_and_unsaved() {
        let r = StudentRecord::new("Amina", marks(&[("Mathematics", 95.0), ("Physics", 85.0)]));
        assert_eq!(r.id(), 0);
        assert!(!r.is_persisted());
        assert_eq!(r.date_added(), None);
        assert_eq!(r.average(), 90.0);
        assert_eq!(r.grade(), Grade::APlus);
    }

    #[test]
    fn changing_marks_regrades() {
        let mut r = StudentRecord::new("Amina", SubjectMarks::new());
        assert_eq!(r.grade(), Grade::NotAvailable);

        r.set_marks(marks(&[("History", 55.0)]));
        assert_eq!(r.grade(), Grade::D);
        r.set_marks(marks(&[("History", 75.0)]));
        assert_eq!(r.average(), 75.0);
        assert_eq!(r.grade(), Grade::B);

        r.set_marks(SubjectMarks::new());
        assert_eq!(r.average(), 0.0);
        assert_eq!(r.grade(), Grade::NotAvailable);
    }

    #[test]
    fn validation_rejects_blank_names_and_non_finite_marks() {
        assert!(StudentRecord::new("  ", SubjectMarks::new()).validate().is_err());
        assert!(StudentRecord::new("A", marks(&[(" ", 50.0)])).validate().is_err());
        assert!(StudentRecord::new("A", marks(&[("Music", f64::NAN)]))
            .validate()
            .is_err());
        assert!(StudentRecord::new("A", marks(&[("Music", 120.0)]))
            .validate()
            .is_ok());
    }

    #[test]
    fn serializes_with_wire_names() {
        let ts = parse_timestamp("2025-03-01 08:30:00").expect("timestamp");
        let r = StudentRecord::from_stored(7, "Wanjiru".into(), marks(&[("Drama", 70.0)]), Some(ts));
        let v = serde_json::to_value(&r).expect("serialize");
        assert_eq!(v["id"], 7);
        assert_eq!(v["subjectMarks"]["Drama"], 70.0);
        assert_eq!(v["grade"], "B");
        assert_eq!(v["dateAdded"], "2025-03-01 08:30:00");
    }
}
