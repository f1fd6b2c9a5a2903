//! Domain errors raised while validating, reconciling and grading rosters.

use thiserror::Error;

/// Errors produced by the grading core.
///
/// I/O and storage failures are not represented here; they travel as
/// `anyhow::Error` from the persistence layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    /// A mark was non-numeric or outside its category's closed range.
    #[error("invalid mark for {field}: {value:?} (allowed range {min}..={max})")]
    InvalidMark {
        field: String,
        value: String,
        min: f64,
        max: f64,
    },

    /// The incoming name and ID point at two different roster rows.
    #[error(
        "ambiguous identity for {name:?} / {id:?}: name matches row {name_row}, ID matches row {id_row}"
    )]
    AmbiguousIdentity {
        name: String,
        id: String,
        name_row: usize,
        id_row: usize,
    },

    /// An incoming mark targets a column that is not an assessment column.
    #[error("{field} is not an assessment column")]
    UnknownColumn { field: String },

    /// A value required to compute a final grade (or to identify a student) is absent.
    #[error("row {row} is missing required field {field}")]
    MissingRequiredField { row: usize, field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mark_message_names_field_value_and_range() {
        let err = GradeError::InvalidMark {
            field: "Lab2".to_string(),
            value: "11".to_string(),
            min: 0.0,
            max: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Lab2"));
        assert!(msg.contains("\"11\""));
        assert!(msg.contains("0..=10"));
    }

    #[test]
    fn test_ambiguous_identity_message_names_both_rows() {
        let err = GradeError::AmbiguousIdentity {
            name: "Ann".to_string(),
            id: "2".to_string(),
            name_row: 0,
            id_row: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("row 0"));
        assert!(msg.contains("row 1"));
    }
}
