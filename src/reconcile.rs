//! Merges one incoming student entry into a roster.
//!
//! A roster is taken by value and handed back updated, so persistence stays
//! with the caller. Identity is unique: a matching row is updated in place,
//! otherwise a row is appended.

use tracing::{debug, info};

use crate::error::GradeError;
use crate::roster::{Category, DATE, EXAM, ID, NAME, Roster, StudentRecord};
use crate::validate::{MarkRange, check_mark, parse_mark};

/// One student's entry: identity, marks per assessment column, and exam.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRecord {
    pub name: String,
    pub id: String,
    pub marks: Vec<(String, f64)>,
    pub exam: f64,
    pub date: Option<String>,
}

impl IncomingRecord {
    pub fn new(name: &str, id: &str, exam: f64) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            marks: Vec::new(),
            exam,
            date: None,
        }
    }

    pub fn with_mark(mut self, column: &str, value: f64) -> Self {
        self.marks.push((column.to_string(), value));
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Builds a record from one row of an import table.
    ///
    /// `Name`, `ID` and `Exam` are required. Blank assessment cells are
    /// skipped so they leave existing marks untouched; non-assessment
    /// columns other than `Date` are ignored.
    pub fn from_fields<S: AsRef<str>>(
        row: usize,
        headers: &[S],
        fields: &[S],
    ) -> Result<Self, GradeError> {
        let mut name = None;
        let mut id = None;
        let mut exam = None;
        let mut date = None;
        let mut marks = Vec::new();

        for (header, field) in headers.iter().zip(fields) {
            let (header, field) = (header.as_ref(), field.as_ref());
            let blank = field.trim().is_empty();
            match header {
                NAME if !blank => name = Some(field.trim().to_string()),
                ID if !blank => id = Some(field.trim().to_string()),
                DATE if !blank => date = Some(field.trim().to_string()),
                EXAM if !blank => exam = Some(parse_mark(EXAM, field, MarkRange::exam())?),
                _ if blank => {}
                _ => match Category::of_column(header) {
                    Some(category) => {
                        let value = parse_mark(header, field, MarkRange::for_category(category))?;
                        marks.push((header.to_string(), value));
                    }
                    None => debug!(column = header, "Ignoring non-assessment column"),
                },
            }
        }

        let missing = |field: &str| GradeError::MissingRequiredField {
            row,
            field: field.to_string(),
        };
        Ok(Self {
            name: name.ok_or_else(|| missing(NAME))?,
            id: id.ok_or_else(|| missing(ID))?,
            marks,
            exam: exam.ok_or_else(|| missing(EXAM))?,
            date,
        })
    }

    /// Checks identity presence and every mark against its column's range.
    ///
    /// `row` is reported in `MissingRequiredField` errors.
    pub fn validate(&self, row: usize) -> Result<(), GradeError> {
        if self.name.trim().is_empty() {
            return Err(GradeError::MissingRequiredField {
                row,
                field: NAME.to_string(),
            });
        }
        if self.id.trim().is_empty() {
            return Err(GradeError::MissingRequiredField {
                row,
                field: ID.to_string(),
            });
        }
        for (column, value) in &self.marks {
            let range = match MarkRange::for_column(column) {
                Some(range) if column != EXAM => range,
                _ => {
                    return Err(GradeError::UnknownColumn {
                        field: column.clone(),
                    });
                }
            };
            check_mark(column, *value, range)?;
        }
        check_mark(EXAM, self.exam, MarkRange::exam())?;
        Ok(())
    }
}

/// What [`reconcile`] did with the incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Updated { row: usize },
    Inserted { row: usize },
}

impl Reconciliation {
    pub fn row(&self) -> usize {
        match *self {
            Reconciliation::Updated { row } | Reconciliation::Inserted { row } => row,
        }
    }
}

/// Locates the row for `name` / `id`.
///
/// An exact ID match or a case-insensitive name match identifies a row; the
/// first such row in roster order wins. When the first ID match and the first
/// name match are different rows the identity is ambiguous.
pub fn find_match(roster: &Roster, name: &str, id: &str) -> Result<Option<usize>, GradeError> {
    let id_row = roster.records().iter().position(|r| r.id() == Some(id));

    let lowered = name.to_lowercase();
    let name_row = roster
        .records()
        .iter()
        .position(|r| r.name().is_some_and(|n| n.to_lowercase() == lowered));

    match (name_row, id_row) {
        (Some(name_row), Some(id_row)) if name_row != id_row => {
            Err(GradeError::AmbiguousIdentity {
                name: name.to_string(),
                id: id.to_string(),
                name_row,
                id_row,
            })
        }
        (name_row, id_row) => Ok(id_row.or(name_row)),
    }
}

/// Integrates `incoming` into `roster`.
///
/// Every column the record references is added to the schema first and
/// null-filled on older rows. A matched row has its identity, marks, exam and
/// date overwritten; other columns are left alone. An unmatched record is
/// appended with nulls in every column it does not supply.
pub fn reconcile(
    mut roster: Roster,
    incoming: &IncomingRecord,
) -> Result<(Roster, Reconciliation), GradeError> {
    incoming.validate(roster.len())?;
    let matched = find_match(&roster, &incoming.name, &incoming.id)?;

    roster.ensure_column(NAME);
    roster.ensure_column(ID);
    for (column, _) in &incoming.marks {
        if roster.ensure_column(column) {
            debug!(column = %column, "Added assessment column");
        }
    }
    roster.ensure_column(EXAM);
    if incoming.date.is_some() {
        roster.ensure_column(DATE);
    }

    let outcome = match matched.and_then(|row| roster.record_mut(row).map(|r| (row, r))) {
        Some((row, record)) => {
            info!(row, name = %incoming.name, id = %incoming.id, "Updating existing record");
            write_fields(record, incoming);
            Reconciliation::Updated { row }
        }
        None => {
            let mut record = StudentRecord::new();
            write_fields(&mut record, incoming);
            roster.push(record);
            let row = roster.len() - 1;
            info!(row, name = %incoming.name, id = %incoming.id, "Inserted new record");
            Reconciliation::Inserted { row }
        }
    };

    Ok((roster, outcome))
}

fn write_fields(record: &mut StudentRecord, incoming: &IncomingRecord) {
    record.set(NAME, incoming.name.as_str());
    record.set(ID, incoming.id.as_str());
    for (column, value) in &incoming.marks {
        record.set(column, *value);
    }
    record.set(EXAM, incoming.exam);
    if let Some(date) = &incoming.date {
        record.set(DATE, date.as_str());
    }
}
