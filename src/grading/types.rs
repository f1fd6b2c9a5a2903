//! Data types produced by the grading pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::classifier::ColumnLayout;
use crate::error::GradeError;
use crate::roster::{Category, Roster};

/// Letter band for a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 5] = [
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived fields for one roster row. `None` marks an undefined value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedRow {
    pub row: usize,
    pub name: Option<String>,
    pub id: Option<String>,
    pub avg_assignments: Option<f64>,
    pub avg_labs: Option<f64>,
    pub avg_tests: Option<f64>,
    pub exam: Option<f64>,
    pub final_grade: Option<f64>,
    pub letter_grade: Option<LetterGrade>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl GradedRow {
    pub fn average(&self, category: Category) -> Option<f64> {
        match category {
            Category::Assignment => self.avg_assignments,
            Category::Lab => self.avg_labs,
            Category::Test => self.avg_tests,
        }
    }

    /// The final grade, or the first input that kept it from being computed.
    pub fn final_grade(&self) -> Result<f64, GradeError> {
        match (self.final_grade, self.missing.first()) {
            (Some(score), _) => Ok(score),
            (None, field) => Err(GradeError::MissingRequiredField {
                row: self.row,
                field: field.cloned().unwrap_or_default(),
            }),
        }
    }
}

/// A roster together with its classified layout and per-row grades.
///
/// Rows line up with `roster.records()` by index.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedRoster {
    pub roster: Roster,
    pub layout: ColumnLayout,
    pub rows: Vec<GradedRow>,
}

impl GradedRoster {
    pub fn into_roster(self) -> Roster {
        self.roster
    }

    pub fn final_grades(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.final_grade).collect()
    }
}

/// `describe`-style summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// One leaderboard position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub row: usize,
    pub name: Option<String>,
    pub id: Option<String>,
    pub final_grade: f64,
    pub letter_grade: LetterGrade,
}

/// Class mean of one assessment column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentAverage {
    pub category: Category,
    /// 1-based position within the category.
    pub number: usize,
    pub column: String,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterCount {
    pub letter: LetterGrade,
    pub count: usize,
}

/// How many students fall in each letter band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeDistribution {
    pub counts: Vec<LetterCount>,
    pub undefined: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub final_grade: Option<f64>,
}

/// Dated final grades for one student, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentTrend {
    pub name: String,
    pub points: Vec<TrendPoint>,
}

/// Complete report over a graded roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub generated_at: DateTime<Utc>,
    pub students: usize,
    pub summary: Vec<ColumnSummary>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub distribution: GradeDistribution,
    pub class_averages: Vec<AssessmentAverage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trends: Vec<StudentTrend>,
}
