use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

use crate::grading::types::{
    AssessmentAverage, ClassReport, ColumnSummary, GradeDistribution, GradedRoster,
    LeaderboardEntry, LetterCount, LetterGrade, StudentTrend, TrendPoint,
};
use crate::grading::utility::{AveragePolicy, mean, mean_with, quantile, stddev};
use crate::roster::{
    AVG_ASSIGNMENTS, AVG_LABS, AVG_TESTS, DATE, DATE_FORMAT, DERIVED_COLUMNS,
    FINAL_GRADE, ID, NAME,
};

/// Count, mean, sample std, min, quartiles and max over the present values.
pub fn summarize(column: &str, values: &[Option<f64>]) -> ColumnSummary {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);

    let avg = (!present.is_empty()).then(|| mean(&present));

    ColumnSummary {
        column: column.to_string(),
        count: present.len(),
        mean: avg,
        std: avg.and_then(|m| stddev(&present, m)),
        min: present.first().copied(),
        q25: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q75: quantile(&present, 0.75),
        max: present.last().copied(),
    }
}

/// Summaries for every numeric roster column followed by the derived scores.
///
/// Identity and date columns are skipped, as is any column without a single
/// numeric value.
pub fn describe(graded: &GradedRoster) -> Vec<ColumnSummary> {
    let mut summaries: Vec<ColumnSummary> = graded
        .roster
        .columns()
        .iter()
        .filter(|c| ![NAME, ID, DATE].contains(&c.as_str()))
        .filter(|c| !DERIVED_COLUMNS.contains(&c.as_str()))
        .map(|c| summarize(c, &graded.roster.column_values(c)))
        .filter(|s| s.count > 0)
        .collect();

    let derived: [(&str, Vec<Option<f64>>); 4] = [
        (AVG_ASSIGNMENTS, graded.rows.iter().map(|r| r.avg_assignments).collect()),
        (AVG_LABS, graded.rows.iter().map(|r| r.avg_labs).collect()),
        (AVG_TESTS, graded.rows.iter().map(|r| r.avg_tests).collect()),
        (FINAL_GRADE, graded.final_grades()),
    ];
    summaries.extend(derived.iter().map(|(c, v)| summarize(c, v)));
    summaries
}

/// Top `k` rows by final grade, highest first.
///
/// Ties keep roster order. Rows without a final grade are not ranked.
pub fn leaderboard(graded: &GradedRoster, k: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<_> = graded
        .rows
        .iter()
        .filter_map(|r| Some((r, r.final_grade?, r.letter_grade?)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, (row, score, letter))| LeaderboardEntry {
            rank: i + 1,
            row: row.row,
            name: row.name.clone(),
            id: row.id.clone(),
            final_grade: score,
            letter_grade: letter,
        })
        .collect()
}

/// Class mean at each assessment column, in category then column order.
pub fn class_averages(graded: &GradedRoster) -> Vec<AssessmentAverage> {
    graded
        .layout
        .mark_columns()
        .scan((None, 0), |(current, number), (category, column)| {
            if *current != Some(category) {
                *current = Some(category);
                *number = 0;
            }
            *number += 1;
            Some(AssessmentAverage {
                category,
                number: *number,
                column: column.to_string(),
                mean: mean_with(
                    &graded.roster.column_values(column),
                    AveragePolicy::SkipMissing,
                ),
            })
        })
        .collect()
}

/// Number of rows per letter band, plus rows whose grade is undefined.
pub fn letter_distribution(graded: &GradedRoster) -> GradeDistribution {
    let counts = LetterGrade::ALL
        .into_iter()
        .map(|letter| LetterCount {
            letter,
            count: graded
                .rows
                .iter()
                .filter(|r| r.letter_grade == Some(letter))
                .count(),
        })
        .collect();

    GradeDistribution {
        counts,
        undefined: graded.rows.iter().filter(|r| r.letter_grade.is_none()).count(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Dated final grades grouped by case-insensitive name, oldest first.
///
/// Groups appear in order of each student's first row. Rows without a date
/// are left out.
pub fn student_trends(graded: &GradedRoster) -> Vec<StudentTrend> {
    let mut trends: Vec<(String, StudentTrend)> = Vec::new();

    for (record, row) in graded.roster.records().iter().zip(&graded.rows) {
        let (Some(name), Some(date)) = (record.name(), record.get(DATE).as_text()) else {
            continue;
        };
        let key = name.to_lowercase();
        let point = TrendPoint {
            date: date.to_string(),
            final_grade: row.final_grade,
        };
        match trends.iter_mut().find(|(k, _)| *k == key) {
            Some((_, trend)) => trend.points.push(point),
            None => trends.push((
                key,
                StudentTrend {
                    name: name.to_string(),
                    points: vec![point],
                },
            )),
        }
    }

    trends
        .into_iter()
        .map(|(_, mut trend)| {
            trend.points.sort_by(|a, b| compare_dates(&a.date, &b.date));
            trend
        })
        .collect()
}

/// Everything the `report` command shows, computed in one pass.
pub fn build_report(graded: &GradedRoster, top: usize) -> ClassReport {
    ClassReport {
        generated_at: Utc::now(),
        students: graded.rows.len(),
        summary: describe(graded),
        leaderboard: leaderboard(graded, top),
        distribution: letter_distribution(graded),
        class_averages: class_averages(graded),
        trends: student_trends(graded),
    }
}
