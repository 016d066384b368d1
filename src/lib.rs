//! Grade derivation for student records.
//!
//! Turns a student's scored grades into weighted averages, letter grades,
//! classifications and a 4.0 GPA, and buckets whole cohorts into the shared
//! classification bands.

pub mod bands;
pub mod calculator;
pub mod cohort;
pub mod db;
pub mod error;
pub mod format;
pub mod metric;
pub mod models;
pub mod report;

pub use bands::{Band, BAND_TABLE, UNCLASSIFIED_LABEL};
pub use calculator::GradeCalculator;
pub use cohort::{aggregate, CohortStats};
pub use error::GradeError;
pub use metric::Metric;
pub use models::{GradeRecord, Student};
