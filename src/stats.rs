use crate::grading::{self, Grade, PerformanceBand};
use crate::model::StudentRecord;
use crate::subjects;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStudent {
    pub id: i64,
    pub name: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub total_students: usize,
    pub class_average: Option<f64>,
    pub top_student: Option<TopStudent>,
    pub grade_distribution: Vec<GradeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub rank: usize,
    pub id: i64,
    pub name: String,
    pub average: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStanding {
    pub rank: usize,
    pub subject: String,
    pub average: f64,
    pub category: Option<&'static str>,
    pub band: PerformanceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCount {
    pub band: PerformanceBand,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAnalysis {
    pub subjects: Vec<SubjectStanding>,
    pub bands: Vec<BandCount>,
}

fn by_average_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// For each subject in the union of all records' subjects, the mean of the
/// marks of the records that took it. Records without the subject do not
/// count as zero.
pub fn subject_averages(records: &[StudentRecord]) -> BTreeMap<String, f64> {
    let mut taken: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        for (subject, mark) in r.subject_marks() {
            taken.entry(subject.as_str()).or_default().push(*mark);
        }
    }
    taken
        .into_iter()
        .filter_map(|(s, marks)| grading::mean(&marks).map(|avg| (s.to_string(), avg)))
        .collect()
}

/// Class average is the mean of per-student averages, ungraded students
/// included at 0. Ties for top student go to the first in `records` order.
pub fn class_summary(records: &[StudentRecord]) -> ClassSummary {
    let total_students = records.len();
    let averages: Vec<f64> = records.iter().map(|r| r.average()).collect();
    let class_average = grading::mean(&averages);

    let mut top: Option<&StudentRecord> = None;
    for r in records {
        if top.map(|t| r.average() > t.average()).unwrap_or(true) {
            top = Some(r);
        }
    }
    let top_student = top.map(|r| TopStudent {
        id: r.id(),
        name: r.name.clone(),
        average: r.average(),
    });

    let grade_distribution = Grade::ALL
        .into_iter()
        .map(|grade| GradeCount {
            grade,
            count: records.iter().filter(|r| r.grade() == grade).count(),
        })
        .collect();

    ClassSummary {
        total_students,
        class_average,
        top_student,
        grade_distribution,
    }
}

/// Students by average, best first, numbered from 1. Equal averages keep
/// their order in `records`.
pub fn rankings(records: &[StudentRecord]) -> Vec<RankedStudent> {
    let mut sorted: Vec<&StudentRecord> = records.iter().collect();
    sorted.sort_by(|a, b| by_average_desc(a.average(), b.average()));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankedStudent {
            rank: i + 1,
            id: r.id(),
            name: r.name.clone(),
            average: r.average(),
            grade: r.grade(),
        })
        .collect()
}

pub fn subject_analysis(averages: &BTreeMap<String, f64>) -> SubjectAnalysis {
    let mut ordered: Vec<(&String, f64)> = averages.iter().map(|(s, a)| (s, *a)).collect();
    ordered.sort_by(|a, b| by_average_desc(a.1, b.1).then_with(|| a.0.cmp(b.0)));

    let subjects: Vec<SubjectStanding> = ordered
        .into_iter()
        .enumerate()
        .map(|(i, (subject, average))| SubjectStanding {
            rank: i + 1,
            subject: subject.clone(),
            average,
            category: subjects::category_of(subject),
            band: PerformanceBand::from_average(average),
        })
        .collect();

    let bands = PerformanceBand::ALL
        .into_iter()
        .map(|band| BandCount {
            band,
            label: band.label(),
            count: subjects.iter().filter(|s| s.band == band).count(),
        })
        .collect();

    SubjectAnalysis { subjects, bands }
}
