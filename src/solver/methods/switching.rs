//! Automatic stiff/non-stiff switching
//!
//! Outbreaks start non-stiff: every compartment moves on the time scale of
//! the infection. Once the living are nearly gone the Jacobian picks up an
//! eigenvalue close to `−β·N`, which for a large population forces an
//! explicit method into steps of order `1/(β·N)` even though nothing
//! visible changes any more.
//!
//! [`StiffnessSwitching`] runs [`DormandPrince45`] with its stiffness
//! detector on. When the detector fires, or the explicit step budget runs
//! out, the run continues from the last accepted point with [`Sdirk21`].
//! Each phase gets the full step budget of the configuration.

use log::{debug, info};

use crate::error::SimulationError;
use crate::solver::methods::adaptive::{Progress, StepStats, Tolerances};
use crate::solver::methods::dopri5::Outcome;
use crate::solver::methods::{DormandPrince45, Sdirk21};
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration};

/// Dormand–Prince 4(5) with an L-stable SDIRK 2(1) fallback
///
/// Non-stiff runs are step for step identical to [`DormandPrince45`].
///
/// # Example
///
/// ```rust
/// use zombie_rs::models::{ModelParameters, ZombieApocalypse};
/// use zombie_rs::solver::{Scenario, Solver, SolverConfiguration, StiffnessSwitching};
///
/// let params = ModelParameters::builder().initial_living(1e5).build();
/// let model = ZombieApocalypse::new(&params);
/// let scenario = Scenario::new(Box::new(model), params.time_span().clone());
///
/// let result = StiffnessSwitching::new()
///     .solve(&scenario, &SolverConfiguration::default())
///     .unwrap();
/// assert!(result.get_metadata("stiff from").is_some());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StiffnessSwitching {
    explicit: DormandPrince45,
    implicit: Sdirk21,
}

impl StiffnessSwitching {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for StiffnessSwitching {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> Result<SimulationResult, SimulationError> {
        let tol = Tolerances::from_config(config, "StiffnessSwitching")?;
        scenario.validate()?;

        let model = scenario.model.as_ref();
        let times = scenario.time_span.as_slice();
        let mut progress = Progress::start(scenario)?;

        let mut explicit_stats = StepStats::default();
        let outcome =
            self.explicit.advance(model, times, &mut progress, &tol, &mut explicit_stats, true)?;

        let switched_at = match outcome {
            Outcome::Completed => None,
            Outcome::Stiff => {
                info!("{}: stiffness detected at t={}", self.name(), progress.t);
                Some(progress.t)
            }
            Outcome::OutOfSteps { .. } => {
                info!(
                    "{}: explicit step budget exhausted at t={}",
                    self.name(),
                    progress.t
                );
                Some(progress.t)
            }
        };

        let mut implicit_stats = StepStats::default();
        if switched_at.is_some() {
            self.implicit.advance(model, times, &mut progress, &tol, &mut implicit_stats)?;
        }

        debug!(
            "{}: {} explicit and {} implicit steps",
            self.name(),
            explicit_stats.accepted,
            implicit_stats.accepted
        );

        let mut result = progress.into_result(times);
        match switched_at {
            Some(t) => {
                result.add_metadata("solver", "Dormand-Prince 4(5) + SDIRK 2(1)");
                result.add_metadata("stiff from", &t.to_string());
                result.add_metadata("implicit steps", &implicit_stats.accepted.to_string());
                result.add_metadata("jacobian evaluations", &implicit_stats.jacobians.to_string());
            }
            None => result.add_metadata("solver", "Dormand-Prince 4(5)"),
        }
        result.add_metadata("rtol", &tol.rtol.to_string());
        result.add_metadata("atol", &tol.atol.to_string());
        explicit_stats.merged(implicit_stats).write_metadata(&mut result);

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince 4(5) / SDIRK 2(1)"
    }
}
