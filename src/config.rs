use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File locations and report defaults.
///
/// Stored as a JSON object on disk; every key is optional:
/// ```json
/// {
///   "raw_file": "students_raw.csv",
///   "results_file": "students_results.csv",
///   "database_file": "student_grades.db",
///   "leaderboard_size": 5,
///   "track_dates": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub raw_file: PathBuf,
    pub results_file: PathBuf,
    pub database_file: PathBuf,
    pub leaderboard_size: usize,
    pub track_dates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raw_file: PathBuf::from("students_raw.csv"),
            results_file: PathBuf::from("students_results.csv"),
            database_file: PathBuf::from("student_grades.db"),
            leaderboard_size: 5,
            track_dates: true,
        }
    }
}

impl Settings {
    /// Loads settings from an optional JSON file, then applies `GRADEBOOK_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Applies overrides looked up through `lookup` (normally the process environment).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("GRADEBOOK_RAW_FILE") {
            self.raw_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADEBOOK_RESULTS_FILE") {
            self.results_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADEBOOK_DB_FILE") {
            self.database_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADEBOOK_LEADERBOARD_SIZE") {
            self.leaderboard_size = v
                .trim()
                .parse()
                .with_context(|| format!("GRADEBOOK_LEADERBOARD_SIZE must be a count, got {v:?}"))?;
        }
        if let Some(v) = lookup("GRADEBOOK_TRACK_DATES") {
            self.track_dates = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => anyhow::bail!("GRADEBOOK_TRACK_DATES must be true or false, got {v:?}"),
            };
        }
        Ok(self)
    }
}
