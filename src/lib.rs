#![doc = include_str!("../README.md")]
pub mod amount;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod strategy;

pub use amount::Amount;
pub use error::{Error, Result, RowError, SchemaProblem};
pub use format::{output_path, Format};
pub use pipeline::{run, Outcome, RunConfig};
pub use records::{read_files, Parsed, Row};
pub use report::{Detail, Report, ReportEntry, Totals};
pub use strategy::Strategy;
