//! Mark parsing and range validation.

use crate::error::GradeError;
use crate::roster::{Category, EXAM, EXAM_MAX};

/// Closed range a mark must fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkRange {
    pub min: f64,
    pub max: f64,
}

impl MarkRange {
    pub const fn up_to(max: f64) -> Self {
        Self { min: 0.0, max }
    }

    pub fn for_category(category: Category) -> Self {
        Self::up_to(category.max_mark())
    }

    pub fn exam() -> Self {
        Self::up_to(EXAM_MAX)
    }

    /// Range for a roster column, if the column holds marks.
    pub fn for_column(column: &str) -> Option<Self> {
        if column == EXAM {
            return Some(Self::exam());
        }
        Category::of_column(column).map(Self::for_category)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Parses `raw` as a mark for `field` and checks it against `range`.
///
/// NaN and infinities are rejected by the range check.
pub fn parse_mark(field: &str, raw: &str, range: MarkRange) -> Result<f64, GradeError> {
    let invalid = || GradeError::InvalidMark {
        field: field.to_string(),
        value: raw.to_string(),
        min: range.min,
        max: range.max,
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    check_mark(field, value, range).map_err(|_| invalid())
}

/// Range-checks an already numeric mark.
pub fn check_mark(field: &str, value: f64, range: MarkRange) -> Result<f64, GradeError> {
    if range.contains(value) {
        Ok(value)
    } else {
        Err(GradeError::InvalidMark {
            field: field.to_string(),
            value: value.to_string(),
            min: range.min,
            max: range.max,
        })
    }
}
