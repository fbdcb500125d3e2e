//! Numerical solver traits and types
//!
//! # Design
//!
//! - Central enum `SolverType` describes which family of method a
//!   configuration targets, and carries its numerical parameters
//! - `SolverConfiguration` wraps a `SolverType` and validates it
//! - `SimulationResult` holds the raw states at every sample time plus
//!   free-form metadata written by the solver

use std::collections::HashMap;

use crate::error::{SimulationError, ValidationError};
use crate::physics::{Compartment, PopulationState};
use crate::solver::Scenario;

// =================================================================================================
// Solver Type
// =================================================================================================

/// Default relative tolerance of the adaptive solver
pub const DEFAULT_RTOL: f64 = 1e-9;
/// Default absolute tolerance of the adaptive solver
pub const DEFAULT_ATOL: f64 = 1e-12;
/// Default step budget for one whole run
pub const DEFAULT_MAX_STEPS: usize = 100_000;
/// Default lower bound on the step size
pub const DEFAULT_MIN_STEP: f64 = 1e-14;
/// Default RK4 sub-steps per sample interval
pub const DEFAULT_SUBSTEPS: usize = 10;

/// Type of numerical integration
///
/// # Examples
///
/// ```rust
/// use zombie_rs::solver::SolverType;
///
/// let adaptive = SolverType::Adaptive {
///     rtol: 1e-8,
///     atol: 1e-10,
///     max_steps: 50_000,
///     min_step: 1e-14,
/// };
/// assert!(adaptive.validate().is_ok());
///
/// let fixed = SolverType::FixedStep { substeps: 0 };
/// assert!(fixed.validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum SolverType {
    /// Error-controlled step size
    ///
    /// Used by: Dormand–Prince 4(5)
    ///
    /// # Parameters
    /// - `rtol`, `atol`: per-component tolerance `atol + rtol·|y|`
    /// - `max_steps`: attempted steps (accepted + rejected) for the whole run
    /// - `min_step`: integration fails if the step shrinks below this
    Adaptive {
        rtol: f64,
        atol: f64,
        max_steps: usize,
        min_step: f64,
    },

    /// Fixed number of equal steps between two consecutive sample times
    ///
    /// Used by: RK4
    FixedStep { substeps: usize },
}

impl SolverType {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            SolverType::Adaptive { .. } => "Adaptive",
            SolverType::FixedStep { .. } => "FixedStep",
        }
    }

    /// Validate that parameters are usable
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SolverType::Adaptive { rtol, atol, max_steps, min_step } => {
                if !rtol.is_finite() || *rtol <= 0.0 {
                    return Err(ValidationError::InvalidConfiguration(
                        "rtol must be finite and positive".to_string(),
                    ));
                }
                if !atol.is_finite() || *atol <= 0.0 {
                    return Err(ValidationError::InvalidConfiguration(
                        "atol must be finite and positive".to_string(),
                    ));
                }
                if *max_steps == 0 {
                    return Err(ValidationError::InvalidConfiguration(
                        "max_steps must be greater than 0".to_string(),
                    ));
                }
                if !min_step.is_finite() || *min_step <= 0.0 {
                    return Err(ValidationError::InvalidConfiguration(
                        "min_step must be finite and positive".to_string(),
                    ));
                }
                Ok(())
            }
            SolverType::FixedStep { substeps } => {
                if *substeps == 0 {
                    return Err(ValidationError::InvalidConfiguration(
                        "substeps must be greater than 0".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Configuration for a numerical solver
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfiguration {
    /// Type of solver and its parameters
    pub solver_type: SolverType,
}

impl SolverConfiguration {
    pub fn new(solver_type: SolverType) -> Self {
        Self { solver_type }
    }

    /// Adaptive configuration with the given tolerances and default limits
    pub fn adaptive(rtol: f64, atol: f64) -> Self {
        Self::new(SolverType::Adaptive {
            rtol,
            atol,
            max_steps: DEFAULT_MAX_STEPS,
            min_step: DEFAULT_MIN_STEP,
        })
    }

    /// Fixed-step configuration
    pub fn fixed_step(substeps: usize) -> Self {
        Self::new(SolverType::FixedStep { substeps })
    }

    /// Builder pattern: replace the step budget of an adaptive configuration
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        if let SolverType::Adaptive { max_steps, .. } = &mut self.solver_type {
            *max_steps = steps;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.solver_type.validate()
    }
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        Self::adaptive(DEFAULT_RTOL, DEFAULT_ATOL)
    }
}

// =================================================================================================
// Simulation Result
// =================================================================================================

/// Raw solver output: one state per sample time
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Sample times, identical to the scenario's time span
    pub time_points: Vec<f64>,

    /// State at each sample time
    pub state_trajectory: Vec<PopulationState>,

    /// Solver diagnostics (step counts, tolerances...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(time_points: Vec<f64>, state_trajectory: Vec<PopulationState>) -> Self {
        Self {
            time_points,
            state_trajectory,
            metadata: HashMap::new(),
        }
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.state_trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_trajectory.is_empty()
    }

    pub fn final_state(&self) -> Option<&PopulationState> {
        self.state_trajectory.last()
    }

    /// Time series of one compartment (`NaN` where the state is too short)
    pub fn series(&self, compartment: Compartment) -> Vec<f64> {
        self.state_trajectory
            .iter()
            .map(|state| state.get(compartment).unwrap_or(f64::NAN))
            .collect()
    }
}

// =================================================================================================
// Solver Trait
// =================================================================================================

/// Numerical integration method
///
/// A solver reads the model and sample times from the [`Scenario`] and the
/// numerical parameters from the [`SolverConfiguration`]. It either returns
/// a state for every sample time or fails; it never returns partial output.
pub trait Solver: Send + Sync {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> Result<SimulationResult, SimulationError>;

    /// Solver name (display and logging)
    fn name(&self) -> &'static str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = SolverConfiguration::default();
        assert_eq!(
            config.solver_type,
            SolverType::Adaptive {
                rtol: DEFAULT_RTOL,
                atol: DEFAULT_ATOL,
                max_steps: DEFAULT_MAX_STEPS,
                min_step: DEFAULT_MIN_STEP,
            }
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.solver_type.name(), "Adaptive");
    }

    #[test]
    fn test_invalid_adaptive_parameters() {
        assert!(SolverConfiguration::adaptive(0.0, 1e-9).validate().is_err());
        assert!(SolverConfiguration::adaptive(1e-6, -1.0).validate().is_err());
        assert!(SolverConfiguration::adaptive(f64::NAN, 1e-9).validate().is_err());
        assert!(SolverConfiguration::default().with_max_steps(0).validate().is_err());
    }

    #[test]
    fn test_fixed_step() {
        assert!(SolverConfiguration::fixed_step(4).validate().is_ok());
        assert_eq!(
            SolverConfiguration::fixed_step(0).validate(),
            Err(ValidationError::InvalidConfiguration(
                "substeps must be greater than 0".to_string()
            ))
        );
        // max_steps only applies to adaptive configurations
        let config = SolverConfiguration::fixed_step(4).with_max_steps(1);
        assert_eq!(config.solver_type, SolverType::FixedStep { substeps: 4 });
    }

    #[test]
    fn test_simulation_result_accessors() {
        let mut result = SimulationResult::new(
            vec![0.0, 1.0],
            vec![
                PopulationState::from_compartments(1.0, 2.0, 3.0),
                PopulationState::from_compartments(4.0, 5.0, 6.0),
            ],
        );
        result.add_metadata("solver", "test");

        assert_eq!(result.len(), 2);
        assert_eq!(result.get_metadata("solver"), Some("test"));
        assert_eq!(result.series(Compartment::Zombie), vec![2.0, 5.0]);
        assert_eq!(result.final_state().unwrap().as_slice(), &[4.0, 5.0, 6.0]);
    }
}
