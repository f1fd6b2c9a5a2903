//! CSV persistence for the raw roster and the results artifact, plus report output.
//!
//! Tables are always rewritten in full through a temporary file in the target
//! directory, then renamed over the old file.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::grading::types::{ClassReport, GradedRoster};
use crate::reconcile::IncomingRecord;
use crate::roster::{Cell, DERIVED_COLUMNS, Roster, StudentRecord};

/// Creates the starter roster at `path` unless a file already exists.
///
/// Returns `true` when a new file was written.
pub fn init_roster(path: &Path, with_date: bool) -> Result<bool> {
    if path.exists() {
        debug!(path = %path.display(), "Roster already present");
        return Ok(false);
    }
    write_roster(path, &Roster::starter(with_date))?;
    info!(path = %path.display(), with_date, "Created starter roster");
    Ok(true)
}

/// Reads a raw roster. Derived columns found in the file are dropped.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn read_roster(path: &Path) -> Result<Roster> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening roster {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut roster = Roster::new(headers.clone());

    for result in rdr.records() {
        let record = result?;
        roster.push(record_from_fields(&headers, &record));
    }

    for column in DERIVED_COLUMNS {
        if roster.remove_column(column) {
            warn!(column, "Dropped derived column from raw roster");
        }
    }

    debug!(students = roster.len(), columns = roster.columns().len(), "Roster loaded");
    Ok(roster)
}

/// Initializes the roster file if needed, then reads it.
///
/// A file without a header row is treated as a fresh starter roster.
pub fn load_or_init(path: &Path, with_date: bool) -> Result<Roster> {
    init_roster(path, with_date)?;
    let roster = read_roster(path)?;
    if roster.columns().is_empty() {
        warn!(path = %path.display(), "Roster file has no header, starting fresh");
        return Ok(Roster::starter(with_date));
    }
    Ok(roster)
}

fn record_from_fields(headers: &[String], fields: &StringRecord) -> StudentRecord {
    let mut record = StudentRecord::new();
    for (i, column) in headers.iter().enumerate() {
        let raw = fields.get(i).unwrap_or("");
        record.set(column, Cell::parse(column, raw));
    }
    record
}

/// Rewrites the raw roster. Derived columns are never persisted here.
#[tracing::instrument(skip(path, roster), fields(path = %path.display(), students = roster.len()))]
pub fn write_roster(path: &Path, roster: &Roster) -> Result<()> {
    let columns: Vec<&str> = roster
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !DERIVED_COLUMNS.contains(c))
        .collect();

    let rows = roster
        .records()
        .iter()
        .map(|r| columns.iter().map(|c| r.get(c).to_field()).collect());

    write_table(path, &columns, rows)
}

/// Writes the results artifact: raw columns followed by the derived ones.
#[tracing::instrument(skip(path, graded), fields(path = %path.display()))]
pub fn write_results(path: &Path, graded: &GradedRoster) -> Result<()> {
    let raw: Vec<&str> = graded
        .roster
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !DERIVED_COLUMNS.contains(c))
        .collect();
    let mut headers = raw.clone();
    headers.extend(DERIVED_COLUMNS);

    let rows = graded
        .roster
        .records()
        .iter()
        .zip(&graded.rows)
        .map(|(record, row)| {
            let mut fields: Vec<String> = raw.iter().map(|c| record.get(c).to_field()).collect();
            for value in [row.avg_assignments, row.avg_labs, row.avg_tests, row.final_grade] {
                fields.push(Cell::from(value).to_field());
            }
            fields.push(row.letter_grade.map(|l| l.to_string()).unwrap_or_default());
            fields
        });

    write_table(path, &headers, rows)?;
    info!(students = graded.rows.len(), "Results saved");
    Ok(())
}

fn write_table<I>(path: &Path, headers: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;

    {
        let mut writer = WriterBuilder::new().from_writer(&mut tmp);
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }

    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Reads an import table into incoming records, failing on the first invalid row.
///
/// Row numbers in errors count the header as line 1.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn read_incoming(path: &Path) -> Result<Vec<IncomingRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening import file {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut incoming = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        fields.resize(headers.len(), String::new());
        incoming.push(IncomingRecord::from_fields(i + 2, &headers, &fields)?);
    }

    debug!(records = incoming.len(), "Import file parsed");
    Ok(incoming)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Plain-text rendering of a [`ClassReport`].
pub fn render_report(report: &ClassReport) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "--- CLASS STATISTICS ({} students) ---", report.students)?;
    writeln!(
        out,
        "{:<16} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    for s in &report.summary {
        writeln!(
            out,
            "{:<16} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            s.column,
            s.count,
            fmt_opt(s.mean),
            fmt_opt(s.std),
            fmt_opt(s.min),
            fmt_opt(s.q25),
            fmt_opt(s.median),
            fmt_opt(s.q75),
            fmt_opt(s.max),
        )?;
    }

    writeln!(out, "\n--- TOP {} STUDENTS ---", report.leaderboard.len())?;
    for entry in &report.leaderboard {
        writeln!(
            out,
            "{}. {} - {:.2}% ({})",
            entry.rank,
            entry.name.as_deref().unwrap_or("?"),
            entry.final_grade,
            entry.letter_grade
        )?;
    }

    writeln!(out, "\n--- LETTER GRADES ---")?;
    for c in &report.distribution.counts {
        writeln!(out, "{}: {}", c.letter, c.count)?;
    }
    if report.distribution.undefined > 0 {
        writeln!(out, "undefined: {}", report.distribution.undefined)?;
    }

    writeln!(out, "\n--- CLASS AVERAGE PER ASSESSMENT ---")?;
    for a in &report.class_averages {
        writeln!(out, "{:<16} {:>8}", a.column, fmt_opt(a.mean))?;
    }

    if !report.trends.is_empty() {
        writeln!(out, "\n--- STUDENT GRADE TRENDS ---")?;
        for trend in &report.trends {
            let points: Vec<String> = trend
                .points
                .iter()
                .map(|p| format!("{} {}", p.date, fmt_opt(p.final_grade)))
                .collect();
            writeln!(out, "{}: {}", trend.name, points.join(" -> "))?;
        }
    }

    Ok(out)
}

/// Writes the plain-text report to `out`.
pub fn print_report(out: &mut impl Write, report: &ClassReport) -> Result<()> {
    out.write_all(render_report(report)?.as_bytes())?;
    Ok(())
}

/// Writes the report as pretty-printed JSON to `out`.
pub fn print_json(out: &mut impl Write, report: &ClassReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
