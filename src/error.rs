//! Error taxonomy
//!
//! Two families of failure exist:
//!
//! - [`ValidationError`]: malformed configuration (non-numeric form values,
//!   unknown keys, a time span that is not strictly increasing, solver
//!   settings out of range). Raised before any integration starts.
//! - [`NumericalError`]: the integrator could not produce a solution
//!   (step budget exhausted, step size collapsed, state blew up).
//!
//! Solvers and [`crate::Simulator::solve`] return [`SimulationError`], which
//! wraps both. Nothing in the crate catches or retries these errors.

use thiserror::Error;

use crate::physics::Compartment;

/// Invalid configuration detected before integration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("parameter `{field}` is not a finite number: {value:?}")]
    NotANumber { field: String, value: String },

    #[error("unknown parameter `{0}`")]
    UnknownField(String),

    #[error("invalid time span: {0}")]
    InvalidTimeSpan(String),

    #[error("invalid solver configuration: {0}")]
    InvalidConfiguration(String),

    #[error("state has {got} compartments, model `{model}` expects {expected}")]
    IncompatibleState {
        model: String,
        expected: usize,
        got: usize,
    },
}

/// Integration failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    #[error("exceeded {max_steps} steps at t={t:.6e} before reaching t={target:.6e}")]
    MaxStepsExceeded { max_steps: usize, t: f64, target: f64 },

    #[error("step size {step:.3e} fell below the minimum {min_step:.3e} at t={t:.6e}")]
    StepSizeUnderflow { t: f64, step: f64, min_step: f64 },

    #[error("non-finite value in {compartment} at t={t:.6e}")]
    NonFinite { compartment: String, t: f64 },
}

impl NumericalError {
    pub(crate) fn non_finite(index: usize, t: f64) -> Self {
        let compartment = Compartment::from_index(index)
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("compartment #{index}"));
        Self::NonFinite { compartment, t }
    }
}

/// Any failure of a simulation run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Numerical(#[from] NumericalError),
}
