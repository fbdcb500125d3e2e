//! Runge-Kutta 4 (RK4) fixed-step solver
//!
//! # Mathematical Background
//!
//! ```text
//! k₁ = f(yₙ, tₙ)
//! k₂ = f(yₙ + h/2·k₁, tₙ + h/2)
//! k₃ = f(yₙ + h/2·k₂, tₙ + h/2)
//! k₄ = f(yₙ + h·k₃, tₙ + h)
//!
//! yₙ₊₁ = yₙ + h/6·(k₁ + 2k₂ + 2k₃ + k₄)
//! ```
//!
//! Every sample interval `[tᵢ, tᵢ₊₁]` is split into `substeps` equal steps,
//! so the time span may be non-uniform and every sample is hit exactly.
//!
//! # Characteristics
//!
//! - **Order**: fourth (global error ~ O(h⁴))
//! - **Cost**: 4 derivative evaluations per step
//! - **No error control**: `substeps` must be chosen by the caller. For the
//!   default zombie outbreak the stability limit is roughly
//!   `h < 2.8 / (β·N)` with `N` the total population.
//!
//! Used as a cross-check for the adaptive solver and for convergence studies.

use log::debug;

use crate::error::{SimulationError, ValidationError};
use crate::physics::PopulationState;
use crate::solver::{
    validate_state, Scenario, SimulationResult, Solver, SolverConfiguration, SolverType,
};

/// Classical fourth-order Runge-Kutta solver with fixed sub-steps
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4Solver;

impl RK4Solver {
    /// Create a new RK4 solver
    ///
    /// ```rust
    /// use zombie_rs::solver::{RK4Solver, Solver};
    ///
    /// assert_eq!(RK4Solver::new().name(), "Runge Kutta (RK4)");
    /// ```
    pub fn new() -> Self {
        Self
    }
}

impl Solver for RK4Solver {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> Result<SimulationResult, SimulationError> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let substeps = match &config.solver_type {
            SolverType::FixedStep { substeps } => *substeps,
            other => {
                return Err(ValidationError::InvalidConfiguration(format!(
                    "RK4Solver only supports FixedStep configuration, got {}",
                    other.name()
                ))
                .into());
            }
        };

        // ====== Step 2: Setup ======

        let model = scenario.model.as_ref();
        let times = scenario.time_span.as_slice();

        let mut state = scenario.initial_state();
        validate_state(&state, times[0])?;

        let mut state_trajectory = Vec::with_capacity(times.len());
        state_trajectory.push(state.clone());

        // ====== Step 3: Time Integration ======

        for window in times.windows(2) {
            let (t_start, t_end) = (window[0], window[1]);
            let h = (t_end - t_start) / substeps as f64;

            for sub in 0..substeps {
                // Computed from the index to avoid accumulating rounding errors
                let t = t_start + sub as f64 * h;
                state = rk4_step(model, &state, t, h);
            }

            validate_state(&state, t_end)?;
            state_trajectory.push(state.clone());
        }

        // ====== Step 4: Build Result ======

        let steps = substeps * (times.len() - 1);
        debug!("{}: {} steps, {} evaluations", self.name(), steps, 4 * steps);

        let mut result = SimulationResult::new(times.to_vec(), state_trajectory);
        result.add_metadata("solver", "Runge-Kutta 4");
        result.add_metadata("substeps", &substeps.to_string());
        result.add_metadata("steps", &steps.to_string());
        result.add_metadata("function evaluations", &(4 * steps).to_string());

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Runge Kutta (RK4)"
    }
}

/// One classical RK4 step of size `h` from `(t, state)`
fn rk4_step(
    model: &dyn crate::physics::CompartmentModel,
    state: &PopulationState,
    t: f64,
    h: f64,
) -> PopulationState {
    let k1 = model.derivative(state, t);
    let k2 = model.derivative(&(state.clone() + k1.clone() * (h / 2.0)), t + h / 2.0);
    let k3 = model.derivative(&(state.clone() + k2.clone() * (h / 2.0)), t + h / 2.0);
    let k4 = model.derivative(&(state.clone() + k3.clone() * h), t + h);

    // Simpson weights: endpoints 1/6, midpoints 1/3
    let weighted_slope = k1 + k2 * 2.0 + k3 * 2.0 + k4;
    state.clone() + weighted_slope * (h / 6.0)
}

// =================================================================================================
// Tests
// =================================================================================================
