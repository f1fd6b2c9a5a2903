//! Grade computation and roster-level aggregation.
//!
//! Each record gets per-category averages, a weighted final score and a
//! letter grade; the whole roster can then be summarized into descriptive
//! statistics, a leaderboard, per-assessment class averages and trends.

pub mod aggregate;
pub mod engine;
pub mod grade;
pub mod types;
pub mod utility;

pub use engine::{grade_record, grade_roster};
pub use grade::letter_grade;
pub use types::{GradedRoster, GradedRow, LetterGrade};
pub use utility::AveragePolicy;
