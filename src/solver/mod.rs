//! Numerical solvers
//!
//! A numerical solver applies an integration method to the equations
//! provided by a compartment model within a scenario.
//!
//! # The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve
//!    - Compartment model (equations)
//!    - Sample times
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Adaptive tolerances or fixed sub-step count
//!
//! 3. **Solver** (`Solver` trait) - The numerical method
//!    - `StiffnessSwitching`: the default, explicit until the run turns stiff
//!    - `DormandPrince45`: adaptive explicit
//!    - `Sdirk21`: adaptive implicit, L-stable
//!    - `RK4Solver`: classical Runge–Kutta with fixed sub-steps
//!
//! # Example
//!
//! ```rust
//! use zombie_rs::models::{ModelParameters, ZombieApocalypse};
//! use zombie_rs::solver::{DormandPrince45, Scenario, Solver, SolverConfiguration};
//!
//! let params = ModelParameters::default();
//! let scenario = Scenario::new(
//!     Box::new(ZombieApocalypse::new(&params)),
//!     params.time_span().clone(),
//! );
//!
//! let result = DormandPrince45::new()
//!     .solve(&scenario, &SolverConfiguration::default())
//!     .unwrap();
//! assert_eq!(result.len(), 1000);
//! ```
//!
//! # Error Handling
//!
//! Solvers return [`SimulationError`](crate::error::SimulationError):
//! - invalid configuration or scenario → `Validation`
//! - step budget exhausted, step size collapse, NaN/Inf in the state →
//!   `Numerical`

mod methods;
mod scenario;
mod traits;

pub use methods::{DormandPrince45, RK4Solver, Sdirk21, SolverMethod, StiffnessSwitching};
pub use scenario::Scenario;
pub use traits::{
    DEFAULT_ATOL, DEFAULT_MAX_STEPS, DEFAULT_MIN_STEP, DEFAULT_RTOL, DEFAULT_SUBSTEPS,
    SimulationResult, Solver, SolverConfiguration, SolverType,
};

use crate::error::NumericalError;
use crate::physics::PopulationState;

/// Reject states containing NaN or infinite values
///
/// NaN arises from `0/0` or `Inf - Inf`, infinity from overflow when the
/// populations blow up. Either way the run cannot be trusted any further.
pub(crate) fn validate_state(state: &PopulationState, t: f64) -> Result<(), NumericalError> {
    match state.first_non_finite() {
        Some(index) => Err(NumericalError::non_finite(index, t)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_state() {
        assert!(validate_state(&PopulationState::from_compartments(1.0, 0.0, -2.0), 0.0).is_ok());

        let err = validate_state(&PopulationState::from_compartments(1.0, 0.0, f64::NAN), 3.0)
            .unwrap_err();
        assert_eq!(
            err,
            NumericalError::NonFinite { compartment: "Dead".to_string(), t: 3.0 }
        );
    }
}
