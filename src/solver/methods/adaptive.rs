//! Bookkeeping shared by the error-controlled methods
//!
//! Both adaptive methods walk the sample times the same way: steps are
//! chosen from the local error estimate, a step that would overshoot the
//! next sample is shortened to land on it, and the state is stored each
//! time a sample is reached. [`Progress`] carries that walk, so one method
//! can stop part-way and another can pick it up from the same point.

use nalgebra::DVector;

use crate::error::{NumericalError, SimulationError, ValidationError};
use crate::physics::PopulationState;
use crate::solver::{validate_state, Scenario, SimulationResult, SolverConfiguration, SolverType};

/// Relative slack when deciding whether a step reaches the next sample
const LANDING_SLACK: f64 = 1e-12;

/// Unpacked `SolverType::Adaptive` settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    pub min_step: f64,
}

impl Tolerances {
    /// Validate `config` and require an adaptive configuration
    pub(crate) fn from_config(
        config: &SolverConfiguration,
        solver: &str,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        match config.solver_type {
            SolverType::Adaptive { rtol, atol, max_steps, min_step } => {
                Ok(Self { rtol, atol, max_steps, min_step })
            }
            ref other => Err(ValidationError::InvalidConfiguration(format!(
                "{solver} only supports Adaptive configuration, got {}",
                other.name()
            ))),
        }
    }

    /// Scaled RMS norm of a local error estimate
    ///
    /// ```text
    /// ‖err‖ = sqrt( mean( (errᵢ / (atol + rtol·max(|yᵢ|, |ŷᵢ|)))² ) )
    /// ```
    pub(crate) fn error_norm(
        &self,
        err: &DVector<f64>,
        y: &DVector<f64>,
        y_new: &DVector<f64>,
    ) -> f64 {
        let n = err.len();
        if n == 0 {
            return 0.0;
        }

        let sum: f64 = (0..n)
            .map(|i| {
                let scale = self.atol + self.rtol * y[i].abs().max(y_new[i].abs());
                (err[i] / scale).powi(2)
            })
            .sum();

        (sum / n as f64).sqrt()
    }

    /// Fail once the step has shrunk below `min_step`
    pub(crate) fn check_step(&self, h: f64, t: f64) -> Result<(), NumericalError> {
        if h < self.min_step {
            Err(NumericalError::StepSizeUnderflow { t, step: h, min_step: self.min_step })
        } else {
            Ok(())
        }
    }
}

/// Step counters written to the result metadata
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
    pub jacobians: usize,
}

impl StepStats {
    pub(crate) fn attempted(&self) -> usize {
        self.accepted + self.rejected
    }

    /// Counters of two consecutive phases of the same run
    pub(crate) fn merged(self, other: StepStats) -> StepStats {
        StepStats {
            accepted: self.accepted + other.accepted,
            rejected: self.rejected + other.rejected,
            evaluations: self.evaluations + other.evaluations,
            jacobians: self.jacobians + other.jacobians,
        }
    }

    pub(crate) fn write_metadata(&self, result: &mut SimulationResult) {
        result.add_metadata("steps", &self.accepted.to_string());
        result.add_metadata("rejected steps", &self.rejected.to_string());
        result.add_metadata("function evaluations", &self.evaluations.to_string());
    }
}

/// Last accepted point of an integration and the samples stored so far
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    pub t: f64,
    pub y: DVector<f64>,
    /// Suggested size of the next step
    pub h: f64,
    pub states: Vec<PopulationState>,
}

impl Progress {
    /// Start at the scenario's initial state with `h = span·10⁻³`
    pub(crate) fn start(scenario: &Scenario) -> Result<Self, SimulationError> {
        let t0 = scenario.time_span.start();
        let initial = scenario.initial_state();
        validate_state(&initial, t0)?;

        let mut states = Vec::with_capacity(scenario.time_span.len());
        states.push(initial.clone());

        Ok(Self {
            t: t0,
            y: initial.values().clone(),
            h: (scenario.time_span.end() - t0) * 1e-3,
            states,
        })
    }

    /// Index of the first sample not stored yet
    pub(crate) fn next_sample(&self) -> usize {
        self.states.len()
    }

    /// Commit an accepted step ending at `t`
    pub(crate) fn accept(&mut self, t: f64, y: DVector<f64>) -> Result<(), NumericalError> {
        let state = PopulationState::new(y);
        validate_state(&state, t)?;
        self.t = t;
        self.y = state.values().clone();
        Ok(())
    }

    /// Store the current state as the next sample
    pub(crate) fn record_sample(&mut self) {
        self.states.push(PopulationState::new(self.y.clone()));
    }

    pub(crate) fn into_result(self, times: &[f64]) -> SimulationResult {
        SimulationResult::new(times.to_vec(), self.states)
    }
}

/// Step to attempt from `t` toward `t_out`, and whether it lands on `t_out`
pub(crate) fn clip_step(t: f64, h: f64, t_out: f64) -> (f64, bool) {
    let landing = t + h >= t_out - LANDING_SLACK * (1.0 + t_out.abs());
    if landing { (t_out - t, true) } else { (h, false) }
}
