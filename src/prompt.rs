//! Interactive entry of one student's marks.
//!
//! Every prompt re-asks until the answer is usable, so invalid marks are
//! never an error here. Only a closed input stream ends the session.

use anyhow::{Result, bail};
use std::io::{BufRead, Write};

use crate::classifier::classify;
use crate::reconcile::{IncomingRecord, find_match};
use crate::roster::{Category, EXAM, Roster};
use crate::validate::{MarkRange, parse_mark};

/// Upper bound accepted by [`Prompter::count`].
pub const MAX_COUNT: usize = 50;

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks `label` and returns the trimmed answer.
    pub fn line(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            bail!("input closed while waiting for {label:?}");
        }
        Ok(buf.trim().to_string())
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Asks until a non-empty answer is given.
    pub fn required(&mut self, label: &str) -> Result<String> {
        loop {
            let answer = self.line(label)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("Error: a value is required.")?;
        }
    }

    /// Asks for a mark in `range`. A blank answer keeps `current` when there is one.
    pub fn mark(&mut self, field: &str, range: MarkRange, current: Option<f64>) -> Result<f64> {
        let label = match current {
            Some(v) => format!("  {field} (out of {}) [{v}]: ", range.max),
            None => format!("  {field} (out of {}): ", range.max),
        };
        loop {
            let answer = self.line(&label)?;
            if answer.is_empty() {
                if let Some(v) = current {
                    return Ok(v);
                }
            }
            match parse_mark(field, &answer, range) {
                Ok(v) => return Ok(v),
                Err(e) => self.say(&format!("Error: {e}. Try again."))?,
            }
        }
    }

    /// Asks for a count up to [`MAX_COUNT`]. A blank answer keeps `current`.
    pub fn count(&mut self, label: &str, current: usize) -> Result<usize> {
        loop {
            let answer = self.line(&format!("{label} (current {current}): "))?;
            if answer.is_empty() {
                return Ok(current);
            }
            match answer.parse::<usize>() {
                Ok(n) if n <= MAX_COUNT => return Ok(n),
                Ok(_) => self.say(&format!("Error: at most {MAX_COUNT} allowed."))?,
                Err(_) => self.say("Error: please enter a whole number.")?,
            }
        }
    }

    /// `true` only for an answer starting with `y`.
    pub fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.line(label)?;
        Ok(answer.to_lowercase().starts_with('y'))
    }
}

fn plural(category: Category) -> &'static str {
    match category {
        Category::Assignment => "assignments",
        Category::Lab => "labs",
        Category::Test => "tests",
    }
}

/// Collects one student's entry against the current roster.
///
/// Identity is asked until it is unambiguous. For a known student, blank
/// answers keep the stored marks. Category sizes can grow but never shrink.
pub fn collect_entry<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    roster: &Roster,
    date: Option<String>,
) -> Result<IncomingRecord> {
    prompter.say("\n--- STUDENT INFORMATION ENTRY ---")?;
    let (name, id, existing) = loop {
        let name = prompter.required("Enter student name: ")?;
        let id = prompter.required("Enter student ID: ")?;
        match find_match(roster, &name, &id) {
            Ok(row) => break (name, id, row.and_then(|i| roster.records().get(i))),
            Err(e) => prompter.say(&format!("Error: {e}"))?,
        }
    };
    if let Some(record) = existing {
        prompter.say(&format!(
            "Updating record for {}",
            record.name().unwrap_or(&name)
        ))?;
    }

    let mut layout = classify(roster.columns());
    for category in Category::ALL {
        let current = layout.columns(category).len();
        let wanted = prompter.count(&format!("How many {}?", plural(category)), current)?;
        layout.extend_to(category, wanted);
    }

    let current = |column: &str| existing.and_then(|r| r.number(column));

    let mut incoming = IncomingRecord::new(&name, &id, 0.0);
    for (category, column) in layout.mark_columns() {
        let value = prompter.mark(column, MarkRange::for_category(category), current(column))?;
        incoming = incoming.with_mark(column, value);
    }
    incoming.exam = prompter.mark(EXAM, MarkRange::exam(), current(EXAM))?;
    incoming.date = date;

    Ok(incoming)
}
