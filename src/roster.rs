//! Roster data model: a dynamic column set shared by every student record.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub const NAME: &str = "Name";
pub const ID: &str = "ID";
pub const EXAM: &str = "Exam";
pub const DATE: &str = "Date";

pub const AVG_ASSIGNMENTS: &str = "Avg_Assignments";
pub const AVG_LABS: &str = "Avg_Labs";
pub const AVG_TESTS: &str = "Avg_Tests";
pub const FINAL_GRADE: &str = "Final_Grade";
pub const LETTER_GRADE: &str = "Letter_Grade";

/// Columns computed by the grade engine. They only ever appear in the results artifact.
pub const DERIVED_COLUMNS: [&str; 5] = [
    AVG_ASSIGNMENTS,
    AVG_LABS,
    AVG_TESTS,
    FINAL_GRADE,
    LETTER_GRADE,
];

/// Timestamp format stamped into the `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exam marks share the test scale.
pub const EXAM_MAX: f64 = 100.0;

/// A group of like-indexed mark columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Assignment,
    Lab,
    Test,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Assignment, Category::Lab, Category::Test];

    /// Case-sensitive column-name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Assignment => "Assignment",
            Category::Lab => "Lab",
            Category::Test => "Test",
        }
    }

    /// Upper bound of the closed mark range; the lower bound is always 0.
    pub fn max_mark(self) -> f64 {
        match self {
            Category::Assignment | Category::Lab => 10.0,
            Category::Test => 100.0,
        }
    }

    pub fn average_column(self) -> &'static str {
        match self {
            Category::Assignment => AVG_ASSIGNMENTS,
            Category::Lab => AVG_LABS,
            Category::Test => AVG_TESTS,
        }
    }

    /// Name of the `index`-th column in this category (1-based).
    pub fn column(self, index: usize) -> String {
        format!("{}{}", self.prefix(), index)
    }

    /// Category whose prefix starts `column`, if any.
    pub fn of_column(column: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| column.starts_with(c.prefix()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A single roster value. `Null` is the explicit missing marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

static NULL_CELL: Cell = Cell::Null;

impl Cell {
    /// Interprets a raw table field for `column`.
    ///
    /// Identity and date columns always stay textual so IDs like `007` survive
    /// a round trip. Everything else becomes a number when it parses as one.
    pub fn parse(column: &str, raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        if column == NAME || column == ID || column == DATE {
            return Cell::Text(raw.to_string());
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Field text as written to a CSV table.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Null, Cell::Number)
    }
}

/// One student's row, keyed by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentRecord {
    cells: HashMap<String, Cell>,
}

impl StudentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &str, cell: impl Into<Cell>) -> Self {
        self.set(column, cell);
        self
    }

    pub fn set(&mut self, column: &str, cell: impl Into<Cell>) {
        self.cells.insert(column.to_string(), cell.into());
    }

    /// Returns the cell for `column`, or the null marker when the key is absent.
    pub fn get(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).as_number()
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME).as_text()
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID).as_text()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    fn fill_missing(&mut self, column: &str) {
        self.cells.entry(column.to_string()).or_insert(Cell::Null);
    }
}

/// Ordered student records sharing one roster-wide column set.
///
/// Every record exposes every known column; columns a record never received
/// hold [`Cell::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    columns: Vec<String>,
    records: Vec<StudentRecord>,
}

impl Roster {
    pub fn new(columns: Vec<String>) -> Self {
        let mut roster = Roster::default();
        for column in columns {
            roster.ensure_column(&column);
        }
        roster
    }

    /// Shape of a freshly initialized roster file.
    pub fn starter(with_date: bool) -> Self {
        let mut columns = vec![
            NAME.to_string(),
            ID.to_string(),
            Category::Assignment.column(1),
            Category::Lab.column(1),
            Category::Test.column(1),
            EXAM.to_string(),
        ];
        if with_date {
            columns.push(DATE.to_string());
        }
        Roster::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Appends `column` to the schema and backfills every existing record with
    /// the null marker. Returns `false` when the column was already known.
    pub fn ensure_column(&mut self, column: &str) -> bool {
        if self.has_column(column) {
            return false;
        }
        self.columns.push(column.to_string());
        for record in &mut self.records {
            record.fill_missing(column);
        }
        true
    }

    /// Appends a record, widening the schema for any column it introduces and
    /// null-filling the columns it lacks. New columns are added in name order.
    pub fn push(&mut self, mut record: StudentRecord) {
        let mut introduced: Vec<String> = record
            .columns()
            .filter(|c| !self.has_column(c))
            .map(str::to_string)
            .collect();
        introduced.sort();
        for column in &introduced {
            self.ensure_column(column);
        }
        for column in &self.columns {
            record.fill_missing(column);
        }
        self.records.push(record);
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut StudentRecord> {
        self.records.get_mut(index)
    }

    /// Drops `column` from the schema and from every record.
    pub fn remove_column(&mut self, column: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c != column);
        for record in &mut self.records {
            record.cells.remove(column);
        }
        before != self.columns.len()
    }

    /// Numeric view of one column; non-numeric cells read as missing.
    pub fn column_values(&self, column: &str) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.number(column)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_columns_in_order() {
        let roster = Roster::starter(true);
        assert_eq!(
            roster.columns(),
            ["Name", "ID", "Assignment1", "Lab1", "Test1", "Exam", "Date"]
        );
        assert!(roster.is_empty());

        let no_date = Roster::starter(false);
        assert!(!no_date.has_column(DATE));
    }

    #[test]
    fn test_ensure_column_backfills_null() {
        let mut roster = Roster::starter(false);
        roster.push(StudentRecord::new().with(NAME, "Ann").with(ID, "1"));

        assert!(roster.ensure_column("Assignment2"));
        assert!(!roster.ensure_column("Assignment2"));

        let ann = &roster.records()[0];
        assert!(ann.has_column("Assignment2"));
        assert!(ann.get("Assignment2").is_null());
    }

    #[test]
    fn test_push_fills_every_known_column() {
        let mut roster = Roster::starter(false);
        roster.push(StudentRecord::new().with(NAME, "Ann").with(ID, "1"));

        let ann = &roster.records()[0];
        for column in roster.columns() {
            assert!(ann.has_column(column), "missing {column}");
        }
        assert!(ann.get(EXAM).is_null());
    }

    #[test]
    fn test_push_widens_schema_for_new_columns() {
        let mut roster = Roster::starter(false);
        roster.push(StudentRecord::new().with(NAME, "Ann"));
        roster.push(StudentRecord::new().with(NAME, "Bob").with("Lab2", 7.0));

        assert!(roster.has_column("Lab2"));
        assert!(roster.records()[0].has_column("Lab2"));
        assert_eq!(roster.records()[1].number("Lab2"), Some(7.0));
    }

    #[test]
    fn test_push_adds_new_columns_in_name_order() {
        let mut roster = Roster::default();
        roster.push(
            StudentRecord::new()
                .with("Test1", 50.0)
                .with(NAME, "Ann")
                .with("Lab1", 5.0)
                .with(ID, "1"),
        );
        assert_eq!(roster.columns(), ["ID", "Lab1", "Name", "Test1"]);
    }

    #[test]
    fn test_cell_parse_keeps_identity_textual() {
        assert_eq!(Cell::parse(ID, "007"), Cell::Text("007".to_string()));
        assert_eq!(Cell::parse("Lab1", "7.5"), Cell::Number(7.5));
        assert_eq!(Cell::parse("Lab1", "  "), Cell::Null);
        assert_eq!(Cell::parse("Lab1", "absent"), Cell::Text("absent".to_string()));
        assert_eq!(Cell::parse("Lab1", "NaN"), Cell::Text("NaN".to_string()));
    }

    #[test]
    fn test_category_of_column_is_case_sensitive() {
        assert_eq!(Category::of_column("Assignment3"), Some(Category::Assignment));
        assert_eq!(Category::of_column("Lab_extra"), Some(Category::Lab));
        assert_eq!(Category::of_column("lab1"), None);
        assert_eq!(Category::of_column(AVG_LABS), None);
    }

    #[test]
    fn test_remove_column() {
        let mut roster = Roster::starter(false);
        roster.push(StudentRecord::new().with(NAME, "Ann").with(FINAL_GRADE, 90.0));
        assert!(roster.remove_column(FINAL_GRADE));
        assert!(!roster.has_column(FINAL_GRADE));
        assert!(!roster.records()[0].has_column(FINAL_GRADE));
    }
}
