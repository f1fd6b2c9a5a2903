pub mod classifier;
pub mod config;
pub mod error;
pub mod grading;
pub mod output;
pub mod prompt;
pub mod reconcile;
pub mod roster;
pub mod store;
pub mod validate;

pub use error::GradeError;
