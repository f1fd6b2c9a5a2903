//! CLI entry point for the gradebook tool.
//!
//! Provides subcommands for entering marks interactively, importing marks
//! from CSV, producing the graded results and class report, and managing the
//! SQLite record store.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use gradebook::config::Settings;
use gradebook::grading::aggregate::build_report;
use gradebook::grading::{AveragePolicy, grade_roster};
use gradebook::output;
use gradebook::prompt::{Prompter, collect_entry};
use gradebook::reconcile::{Reconciliation, reconcile};
use gradebook::roster::DATE_FORMAT;
use gradebook::store;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Track student marks and compute weighted final grades", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raw roster CSV (source of truth for marks)
    #[arg(long, global = true, value_name = "FILE")]
    raw: Option<PathBuf>,

    /// Results CSV, regenerated on every report
    #[arg(long, global = true, value_name = "FILE")]
    results: Option<PathBuf>,

    /// SQLite database for the record store
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the starter roster if it does not exist
    Init {
        /// Leave out the Date column
        #[arg(long, default_value_t = false)]
        no_date: bool,
    },
    /// Enter students' marks interactively
    Enter {
        /// Skip the report when leaving
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },
    /// Merge every row of a CSV file into the roster
    Import {
        /// CSV with Name, ID, assessment columns and Exam
        #[arg(value_name = "CSV")]
        source: PathBuf,

        /// Skip the report after importing
        #[arg(long, default_value_t = false)]
        no_report: bool,
    },
    /// Grade the roster, write the results file and print the class report
    Report {
        /// Leaderboard size
        #[arg(short = 'k', long)]
        top: Option<usize>,

        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Leave a category average undefined when any of its marks is missing
        #[arg(long, default_value_t = false)]
        require_all: bool,
    },
    /// Manage the SQLite record store
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create tables and seed the course list
    Init,
    /// Add a student
    AddStudent {
        id: i64,
        name: String,
        #[arg(long)]
        sex: Option<String>,
    },
    /// Record a score for a student in a course
    AddGrade {
        student_id: i64,
        /// Course code, e.g. MAT2110
        course: String,
        assessment_type: String,
        score: f64,
    },
    /// List all students
    Students,
    /// List a student's grades in a course
    Grades { student_id: i64, course: String },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gradebook.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(raw) = cli.raw {
        settings.raw_file = raw;
    }
    if let Some(results) = cli.results {
        settings.results_file = results;
    }
    if let Some(db) = cli.db {
        settings.database_file = db;
    }

    match cli.command {
        Commands::Init { no_date } => {
            if output::init_roster(&settings.raw_file, !no_date)? {
                println!("Created {}", settings.raw_file.display());
            } else {
                println!("{} already exists", settings.raw_file.display());
            }
        }
        Commands::Enter { no_report } => {
            enter_students(&settings)?;
            if !no_report {
                report(&settings, settings.leaderboard_size, false, AveragePolicy::SkipMissing)?;
            }
        }
        Commands::Import { source, no_report } => {
            import_students(&settings, &source)?;
            if !no_report {
                report(&settings, settings.leaderboard_size, false, AveragePolicy::SkipMissing)?;
            }
        }
        Commands::Report {
            top,
            json,
            require_all,
        } => {
            let policy = if require_all {
                AveragePolicy::RequireAll
            } else {
                AveragePolicy::SkipMissing
            };
            report(
                &settings,
                top.unwrap_or(settings.leaderboard_size),
                json,
                policy,
            )?;
        }
        Commands::Db { command } => database(&settings, command)?,
    }

    Ok(())
}

fn timestamp(settings: &Settings) -> Option<String> {
    settings
        .track_dates
        .then(|| Local::now().format(DATE_FORMAT).to_string())
}

/// Prompts for students until the user stops, saving the roster after each one.
#[tracing::instrument(skip(settings), fields(raw = %settings.raw_file.display()))]
fn enter_students(settings: &Settings) -> Result<()> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    loop {
        let roster = output::load_or_init(&settings.raw_file, settings.track_dates)?;
        let incoming = collect_entry(&mut prompter, &roster, timestamp(settings))?;

        let (roster, outcome) = reconcile(roster, &incoming)?;
        output::write_roster(&settings.raw_file, &roster)?;
        info!(row = outcome.row(), "Student data saved");
        prompter.say("Student data saved!\n")?;

        if !prompter.confirm("Enter another student? (y/n): ")? {
            break;
        }
    }
    Ok(())
}

/// Reconciles every record of `source` and saves the roster once.
///
/// Any invalid row aborts the import before the roster file is touched.
#[tracing::instrument(skip(settings, source), fields(source = %source.display()))]
fn import_students(settings: &Settings, source: &Path) -> Result<()> {
    let mut roster = output::load_or_init(&settings.raw_file, settings.track_dates)?;
    let records = output::read_incoming(source)?;
    let stamp = timestamp(settings);

    let (mut updated, mut inserted) = (0usize, 0usize);
    for (i, mut incoming) in records.into_iter().enumerate() {
        if incoming.date.is_none() {
            incoming.date = stamp.clone();
        }
        let (next, outcome) = reconcile(roster, &incoming)
            .with_context(|| format!("line {} of {}", i + 2, source.display()))?;
        roster = next;
        match outcome {
            Reconciliation::Updated { .. } => updated += 1,
            Reconciliation::Inserted { .. } => inserted += 1,
        }
    }

    output::write_roster(&settings.raw_file, &roster)?;
    info!(updated, inserted, students = roster.len(), "Import complete");
    println!("Imported {} records ({updated} updated, {inserted} new)", updated + inserted);
    Ok(())
}

fn report(settings: &Settings, top: usize, json: bool, policy: AveragePolicy) -> Result<()> {
    let roster = output::read_roster(&settings.raw_file)?;
    if roster.is_empty() {
        warn!(path = %settings.raw_file.display(), "Roster has no students");
    }

    let graded = grade_roster(roster, policy);
    output::write_results(&settings.results_file, &graded)?;

    let report = build_report(&graded, top);
    let mut stdout = io::stdout().lock();
    if json {
        output::print_json(&mut stdout, &report)?;
    } else {
        output::print_report(&mut stdout, &report)?;
        println!("\nResults saved to {}", settings.results_file.display());
    }
    Ok(())
}

fn database(settings: &Settings, command: DbCommands) -> Result<()> {
    let conn = store::open(&settings.database_file)?;

    match command {
        DbCommands::Init => {
            println!("Database setup complete: {}", settings.database_file.display());
        }
        DbCommands::AddStudent { id, name, sex } => {
            store::add_student(&conn, id, &name, sex.as_deref())?;
            println!("Added student {id} ({name})");
        }
        DbCommands::AddGrade {
            student_id,
            course,
            assessment_type,
            score,
        } => {
            let course_id = store::course_id(&conn, &course)?
                .with_context(|| format!("unknown course {course}"))?;
            let id = store::add_grade(&conn, student_id, course_id, &assessment_type, score)?;
            println!("Recorded grade #{id}");
        }
        DbCommands::Students => {
            for s in store::get_all_students(&conn)? {
                println!("{}\t{}\t{}", s.id, s.name, s.sex.as_deref().unwrap_or("-"));
            }
        }
        DbCommands::Grades { student_id, course } => {
            let course_id = store::course_id(&conn, &course)?
                .with_context(|| format!("unknown course {course}"))?;
            for g in store::get_grades_for_student_course(&conn, student_id, course_id)? {
                println!("{}\t{}", g.assessment_type, g.score);
            }
        }
    }
    Ok(())
}
