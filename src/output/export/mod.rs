//! Export of simulation results
//!
//! [`Exporter`] abstracts the file format; each format lives in its own
//! sub-module. Only CSV exists today.

pub mod csv;

pub use csv::{export_trajectory_csv, CsvConfig, CsvExporter, CsvMetadata};

use std::path::Path;

use thiserror::Error;

use crate::trajectory::Trajectory;

/// Export failure
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("trajectory is empty")]
    EmptyData,

    #[error("column `{column}` has {got} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("column `{0}` contains NaN or infinite values")]
    NonFinite(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes a trajectory to a file in some format
pub trait Exporter {
    /// # Errors
    ///
    /// Fails if the trajectory is empty, inconsistent or non-finite, or if
    /// the file cannot be written.
    fn export(&self, trajectory: &Trajectory, path: impl AsRef<Path>) -> Result<(), ExportError>;
}
