use serde::{Serialize, Serializer};
use std::fmt;

/// Letter grade derived from an average mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    APlus,
    A,
    B,
    C,
    D,
    F,
    /// No marks recorded.
    NotAvailable,
}

/// Lower bounds, evaluated high to low. First match wins.
const GRADE_THRESHOLDS: [(f64, Grade); 5] = [
    (90.0, Grade::APlus),
    (80.0, Grade::A),
    (70.0, Grade::B),
    (60.0, Grade::C),
    (50.0, Grade::D),
];

impl Grade {
    pub const ALL: [Grade; 7] = [
        Grade::APlus,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
        Grade::NotAvailable,
    ];

    pub fn from_average(average: f64) -> Self {
        GRADE_THRESHOLDS
            .iter()
            .find(|(min, _)| average >= *min)
            .map(|(_, g)| *g)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::NotAvailable => "N/A",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Grade::ALL.into_iter().find(|g| g.as_str() == s.trim())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Derived {
    pub average: f64,
    pub grade: Grade,
}

/// Mean of the marks and the grade for that mean.
///
/// An empty set of marks yields `(0, N/A)`. No rounding is applied to the
/// average; display rounding belongs to the caller.
pub fn derive_grade<I>(marks: I) -> Derived
where
    I: IntoIterator<Item = f64>,
{
    let marks: Vec<f64> = marks.into_iter().collect();
    match mean(&marks) {
        Some(average) => Derived {
            average,
            grade: Grade::from_average(average),
        },
        None => Derived {
            average: 0.0,
            grade: Grade::NotAvailable,
        },
    }
}

/// Arithmetic mean, `None` for no values. Finite inputs always give a finite
/// result, even when their sum would overflow.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        return Some(sum / n);
    }
    // Dividing first keeps every partial sum within the largest |value|.
    Some(values.iter().map(|v| v / n).sum())
}

/// Coarse classification of a subject average used by subject analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceBand {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceBand {
    pub const ALL: [PerformanceBand; 4] = [
        PerformanceBand::Excellent,
        PerformanceBand::Good,
        PerformanceBand::Average,
        PerformanceBand::NeedsImprovement,
    ];

    pub fn from_average(average: f64) -> Self {
        if average >= 80.0 {
            PerformanceBand::Excellent
        } else if average >= 70.0 {
            PerformanceBand::Good
        } else if average >= 60.0 {
            PerformanceBand::Average
        } else {
            PerformanceBand::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent (80%+)",
            PerformanceBand::Good => "Good (70-79%)",
            PerformanceBand::Average => "Average (60-69%)",
            PerformanceBand::NeedsImprovement => "Needs Improvement (<60%)",
        }
    }
}
