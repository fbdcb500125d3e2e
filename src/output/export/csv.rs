//! CSV export of outbreak trajectories
//!
//! Output is readable by spreadsheets, pandas, gnuplot and the like.
//!
//! # Example
//!
//! ```rust,no_run
//! use zombie_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter};
//! use zombie_rs::{ModelParameters, Simulator};
//!
//! let simulator = Simulator::new(ModelParameters::builder().initial_infected(1.0).build());
//! let trajectory = simulator.solve().unwrap();
//!
//! let metadata = CsvMetadata::from_simulation(&simulator);
//! let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
//! exporter.export(&trajectory, "outbreak.csv").unwrap();
//! ```
//!
//! **Output** (`outbreak.csv`):
//! ```csv
//! # Zombie Outbreak Simulation
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Solver: Dormand-Prince 4(5)
//! # Parameters: init po: 500.0, init zombie: 1.0, ...
//! # Samples: 1000
//! #
//! Days,Living,Zombies,Dead
//! 0.000000,500.000000,1.000000,0.000000
//! ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::output::export::{ExportError, Exporter};
use crate::physics::Compartment;
use crate::simulator::Simulator;
use crate::trajectory::Trajectory;

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// ```rust
/// use zombie_rs::output::export::CsvConfig;
///
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// assert!(config.include_dead);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places (default: 6)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,

    /// Header of the time column (default: "Days")
    pub time_header: String,

    /// Write the dead compartment column (default: true)
    pub include_dead: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            time_header: "Days".to_string(),
            include_dead: true,
        }
    }
}

impl CsvConfig {
    /// Semicolon-delimited with decimal comma
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for CSV header comments
///
/// Only fields that are set are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub model_name: Option<String>,
    pub solver_name: Option<String>,

    /// Summary label of the parameters (newlines are flattened)
    pub parameters: Option<String>,

    pub samples: Option<usize>,

    /// Additional key/value lines
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    pub fn from_simulation(simulator: &Simulator) -> Self {
        Self {
            model_name: Some("Zombie apocalypse (SZR)".to_string()),
            solver_name: Some(simulator.solver_name().to_string()),
            parameters: Some(simulator.summary_label()),
            samples: Some(simulator.parameters().time_span().len()),
            ..Default::default()
        }
    }

    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =============================================================================
// Exporter
// =============================================================================

/// CSV implementation of [`Exporter`]
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    /// Write the CSV document to any writer
    pub fn write_to<W: Write>(
        &self,
        trajectory: &Trajectory,
        out: &mut W,
    ) -> Result<(), ExportError> {
        validate(trajectory)?;
        let config = &self.config;

        if config.include_metadata {
            if let Some(metadata) = &config.metadata {
                write_metadata_header(out, metadata)?;
            }
        }

        // ============================= Header =============================

        let mut columns = vec![
            config.time_header.as_str(),
            Compartment::Living.label(),
            Compartment::Zombie.label(),
        ];
        if config.include_dead {
            columns.push(Compartment::Dead.label());
        }
        writeln!(out, "{}", columns.join(&config.delimiter.to_string()))?;

        // ============================= Data ===============================

        for i in 0..trajectory.len() {
            let mut row = vec![
                trajectory.times()[i],
                trajectory.living[i],
                trajectory.infected[i],
            ];
            if config.include_dead {
                row.push(trajectory.dead[i]);
            }

            let cells: Vec<String> = row.iter().map(|v| format_number(*v, config)).collect();
            writeln!(out, "{}", cells.join(&config.delimiter.to_string()))?;
        }

        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export(&self, trajectory: &Trajectory, path: impl AsRef<Path>) -> Result<(), ExportError> {
        // Validate before creating the file so a bad trajectory leaves nothing behind
        validate(trajectory)?;

        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(trajectory, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Export with the given (or default) configuration
pub fn export_trajectory_csv(
    trajectory: &Trajectory,
    path: impl AsRef<Path>,
    config: Option<&CsvConfig>,
) -> Result<(), ExportError> {
    CsvExporter::new(config.cloned().unwrap_or_default()).export(trajectory, path)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn validate(trajectory: &Trajectory) -> Result<(), ExportError> {
    if trajectory.is_empty() {
        return Err(ExportError::EmptyData);
    }

    let expected = trajectory.len();
    for compartment in Compartment::ALL {
        let series = trajectory.compartment(compartment);
        if series.len() != expected {
            return Err(ExportError::LengthMismatch {
                column: compartment.label().to_string(),
                expected,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ExportError::NonFinite(compartment.label().to_string()));
        }
    }
    Ok(())
}

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> Result<(), ExportError> {
    writeln!(out, "# Zombie Outbreak Simulation")?;

    let now = chrono::Utc::now();
    writeln!(out, "# Generated: {}", now.to_rfc3339())?;

    if let Some(model) = &metadata.model_name {
        writeln!(out, "# Model: {}", model)?;
    }
    if let Some(solver) = &metadata.solver_name {
        writeln!(out, "# Solver: {}", solver)?;
    }
    if let Some(parameters) = &metadata.parameters {
        writeln!(out, "# Parameters: {}", parameters.replace('\n', " "))?;
    }
    if let Some(samples) = metadata.samples {
        writeln!(out, "# Samples: {}", samples)?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {}: {}", key, value)?;
    }

    writeln!(out, "#")?;
    Ok(())
}

/// Format number with configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);

    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

// =============================================================================
// Tests
// =============================================================================
