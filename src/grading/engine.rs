use tracing::{debug, warn};

use crate::classifier::{ColumnLayout, classify};
use crate::grading::grade::letter_grade;
use crate::grading::types::{GradedRoster, GradedRow};
use crate::grading::utility::{AveragePolicy, mean_with};
use crate::roster::{Category, EXAM, ID, NAME, Roster, StudentRecord};

/// Weight of each component in the final score. Sums to 1.0.
pub const ASSIGNMENT_WEIGHT: f64 = 0.15;
pub const LAB_WEIGHT: f64 = 0.15;
pub const TEST_WEIGHT: f64 = 0.30;
pub const EXAM_WEIGHT: f64 = 0.40;

/// Assignments and labs are marked out of 10; the composite is out of 100.
pub const TEN_POINT_SCALE: f64 = 10.0;

/// Weighted final score from category averages and the exam mark.
pub fn final_grade(avg_assignments: f64, avg_labs: f64, avg_tests: f64, exam: f64) -> f64 {
    (avg_assignments * TEN_POINT_SCALE) * ASSIGNMENT_WEIGHT
        + (avg_labs * TEN_POINT_SCALE) * LAB_WEIGHT
        + avg_tests * TEST_WEIGHT
        + exam * EXAM_WEIGHT
}

/// Mean of `record`'s values in `columns`. Columns absent from the record read as missing.
pub fn category_average(
    record: &StudentRecord,
    columns: &[String],
    policy: AveragePolicy,
) -> Option<f64> {
    let values: Vec<Option<f64>> = columns.iter().map(|c| record.number(c)).collect();
    mean_with(&values, policy)
}

/// First mark column in `columns` that holds no number for `record`.
fn first_gap<'a>(record: &StudentRecord, columns: &'a [String]) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| record.number(c).is_none())
        .map(String::as_str)
}

/// Computes the derived fields for a single record.
///
/// A record with a blank or absent `Name` or `ID` gets no derived fields at all. Otherwise
/// missing inputs leave `final_grade` and `letter_grade` undefined. Either
/// way the absent source columns are listed in `missing`, identity first,
/// then in formula order.
pub fn grade_record(
    row: usize,
    record: &StudentRecord,
    layout: &ColumnLayout,
    policy: AveragePolicy,
) -> GradedRow {
    let mut missing = Vec::new();
    for (field, value) in [(NAME, record.name()), (ID, record.id())] {
        if value.is_none_or(|v| v.trim().is_empty()) {
            missing.push(field.to_string());
        }
    }
    let identified = missing.is_empty();

    let mut average = |category: Category| {
        let columns = layout.columns(category);
        let avg = category_average(record, columns, policy);
        if avg.is_none() {
            let gap = first_gap(record, columns).unwrap_or(category.average_column());
            missing.push(gap.to_string());
        }
        avg.filter(|_| identified)
    };
    let avg_assignments = average(Category::Assignment);
    let avg_labs = average(Category::Lab);
    let avg_tests = average(Category::Test);

    let exam = record.number(EXAM);
    if exam.is_none() {
        missing.push(EXAM.to_string());
    }

    let final_score = match (avg_assignments, avg_labs, avg_tests, exam) {
        (Some(a), Some(l), Some(t), Some(e)) => Some(final_grade(a, l, t, e)),
        _ => None,
    };

    GradedRow {
        row,
        name: record.name().map(str::to_string),
        id: record.id().map(str::to_string),
        avg_assignments,
        avg_labs,
        avg_tests,
        exam,
        final_grade: final_score,
        letter_grade: final_score.map(letter_grade),
        missing,
    }
}

/// Classifies the roster's columns and grades every row.
///
/// A row that cannot be graded is reported and left undefined; the others
/// are unaffected.
#[tracing::instrument(skip(roster), fields(students = roster.len()))]
pub fn grade_roster(roster: Roster, policy: AveragePolicy) -> GradedRoster {
    let layout = classify(roster.columns());
    debug!(
        assignments = layout.assignments.len(),
        labs = layout.labs.len(),
        tests = layout.tests.len(),
        "Classified roster columns"
    );

    let rows: Vec<GradedRow> = roster
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| grade_record(i, record, &layout, policy))
        .collect();

    for row in &rows {
        if let Err(e) = row.final_grade() {
            warn!(error = %e, name = ?row.name, "Final grade undefined");
        }
    }

    GradedRoster {
        roster,
        layout,
        rows,
    }
}
