//! L-stable SDIRK 2(1) solver for stiff outbreaks
//!
//! # Mathematical Background
//!
//! Two-stage singly diagonally implicit Runge-Kutta method with
//! `γ = 1 − 1/√2`:
//!
//! ```text
//!   γ  |  γ     0
//!   1  |  1−γ   γ
//!  ----+-----------
//!      |  1−γ   γ      (order 2, advancing)
//!      |  1     0      (order 1, embedded)
//! ```
//!
//! Each stage derivative solves `kᵢ = f(t + cᵢh, yᵢ + h·γ·kᵢ)` by simplified
//! Newton iteration on the matrix `I − h·γ·J`, with `J` taken from
//! [`CompartmentModel::jacobian`] at the start of the step. Both stages
//! share the same matrix, so one LU factorisation serves a whole step.
//!
//! The raw error estimate `h·γ·(k₂ − k₁)` is filtered through
//! `(I − h·γ·J)⁻¹` before taking its norm. Without the filter the estimate
//! of a stiff component does not vanish as `h·λ → −∞`, and the step size
//! would stay pinned by components that have long since decayed.
//!
//! # Characteristics
//!
//! - **Order**: 2 (advancing), 1 (error estimate)
//! - **Stability**: L-stable, so stiff transients are damped at any step size
//! - **Failure modes**: step budget exhausted, step size below `min_step`
//!   (for instance when Newton keeps diverging), NaN/Inf in an accepted state

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Dyn, LU};

use crate::error::{NumericalError, SimulationError};
use crate::physics::{CompartmentModel, PopulationState};
use crate::solver::methods::adaptive::{clip_step, Progress, StepStats, Tolerances};
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration};

/// Diagonal coefficient γ = 1 − 1/√2
const GAMMA: f64 = 1.0 - std::f64::consts::FRAC_1_SQRT_2;

const MAX_NEWTON: usize = 10;
/// Newton stops once the scaled stage correction drops below this
const NEWTON_TOL: f64 = 0.01;

// Step size controller: the estimate is O(h²), hence the exponent −1/2
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.25;
const MAX_FACTOR: f64 = 4.0;
/// Step reduction after a failed Newton iteration
const NEWTON_FAILURE_FACTOR: f64 = 0.5;

/// Adaptive L-stable SDIRK 2(1) solver
///
/// Requires a [`SolverType::Adaptive`](crate::solver::SolverType::Adaptive)
/// configuration. Slower than Dormand–Prince on smooth problems, but its
/// step size is limited by accuracy alone.
///
/// # Example
///
/// ```rust
/// use zombie_rs::models::{ModelParameters, TimeSpan, ZombieApocalypse};
/// use zombie_rs::solver::{Scenario, Sdirk21, Solver, SolverConfiguration};
///
/// // A city of a million: the post-outbreak decay of the living is very fast
/// let params = ModelParameters::builder()
///     .initial_living(1e6)
///     .initial_infected(1.0)
///     .time_span(TimeSpan::linspace(0.0, 5.0, 51).unwrap())
///     .build();
/// let model = ZombieApocalypse::new(&params);
/// let scenario = Scenario::new(Box::new(model), params.time_span().clone());
///
/// let result = Sdirk21::new()
///     .solve(&scenario, &SolverConfiguration::adaptive(1e-6, 1e-9))
///     .unwrap();
/// let living = result.final_state().unwrap().as_slice()[0];
/// assert!(living.abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sdirk21;

impl Sdirk21 {
    pub fn new() -> Self {
        Self
    }

    /// Integrate from `progress` across the remaining sample times
    ///
    /// Fails with [`NumericalError::MaxStepsExceeded`] once `stats` reaches
    /// the step budget.
    pub(crate) fn advance(
        &self,
        model: &dyn CompartmentModel,
        times: &[f64],
        progress: &mut Progress,
        tol: &Tolerances,
        stats: &mut StepStats,
    ) -> Result<(), SimulationError> {
        for &t_out in &times[progress.next_sample()..] {
            while progress.t < t_out {
                if stats.attempted() >= tol.max_steps {
                    warn!(
                        "{}: step budget of {} exhausted at t={}",
                        self.name(),
                        tol.max_steps,
                        progress.t
                    );
                    return Err(NumericalError::MaxStepsExceeded {
                        max_steps: tol.max_steps,
                        t: progress.t,
                        target: t_out,
                    }
                    .into());
                }

                let t = progress.t;
                let (step, landing) = clip_step(t, progress.h, t_out);

                let factor = match attempt(model, &progress.y, t, step, tol, stats) {
                    Some((y_new, err_estimate)) => {
                        let err = tol.error_norm(&err_estimate, &progress.y, &y_new);
                        let factor = step_factor(err);

                        if err <= 1.0 {
                            stats.accepted += 1;
                            progress.accept(if landing { t_out } else { t + step }, y_new)?;
                            progress.h = if landing {
                                progress.h.max(step * factor)
                            } else {
                                step * factor
                            };
                            continue;
                        }
                        if !err.is_finite() {
                            warn!(
                                "{}: non-finite error estimate at t={}, h={:e}",
                                self.name(),
                                t,
                                step
                            );
                        }
                        factor
                    }
                    None => {
                        debug!("{}: Newton iteration failed at t={}, h={:e}", self.name(), t, step);
                        NEWTON_FAILURE_FACTOR
                    }
                };

                stats.rejected += 1;
                progress.h = step * factor;
                if let Err(e) = tol.check_step(progress.h, t) {
                    warn!("{}: step size collapsed to {:e} at t={}", self.name(), progress.h, t);
                    return Err(e.into());
                }
            }

            progress.record_sample();
        }

        Ok(())
    }
}

impl Solver for Sdirk21 {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> Result<SimulationResult, SimulationError> {
        let tol = Tolerances::from_config(config, "Sdirk21")?;
        scenario.validate()?;

        let times = scenario.time_span.as_slice();
        let mut progress = Progress::start(scenario)?;
        let mut stats = StepStats::default();

        self.advance(scenario.model.as_ref(), times, &mut progress, &tol, &mut stats)?;

        debug!(
            "{}: {} accepted, {} rejected, {} evaluations, {} jacobians",
            self.name(),
            stats.accepted,
            stats.rejected,
            stats.evaluations,
            stats.jacobians
        );

        let mut result = progress.into_result(times);
        result.add_metadata("solver", "SDIRK 2(1)");
        result.add_metadata("rtol", &tol.rtol.to_string());
        result.add_metadata("atol", &tol.atol.to_string());
        stats.write_metadata(&mut result);
        result.add_metadata("jacobian evaluations", &stats.jacobians.to_string());

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "SDIRK 2(1)"
    }
}

// =================================================================================================
// Step internals
// =================================================================================================

fn eval(model: &dyn CompartmentModel, y: &DVector<f64>, t: f64) -> DVector<f64> {
    model
        .derivative(&PopulationState::new(y.clone()), t)
        .values()
        .clone()
}

/// One step of size `h`: the new state and the filtered error estimate,
/// or `None` when a stage fails to converge
fn attempt(
    model: &dyn CompartmentModel,
    y: &DVector<f64>,
    t: f64,
    h: f64,
    tol: &Tolerances,
    stats: &mut StepStats,
) -> Option<(DVector<f64>, DVector<f64>)> {
    let n = y.len();
    let hg = h * GAMMA;

    let jacobian = model.jacobian(&PopulationState::new(y.clone()), t);
    stats.jacobians += 1;
    let lu = (DMatrix::identity(n, n) - jacobian * hg).lu();

    let scale = y.map(|yi| tol.atol + tol.rtol * yi.abs());

    let k0 = eval(model, y, t);
    stats.evaluations += 1;

    // Stage 1: k1 = f(t + γh, y + hγ·k1)
    let k1 = solve_stage(model, &lu, y, t + GAMMA * h, hg, k0, &scale, stats)?;

    // Stage 2: k2 = f(t + h, y + h(1−γ)·k1 + hγ·k2)
    let base = y + &k1 * (h * (1.0 - GAMMA));
    let k2 = solve_stage(model, &lu, &base, t + h, hg, k1.clone(), &scale, stats)?;

    let y_new = &base + &k2 * hg;
    let raw = (&k2 - &k1) * hg;
    let err_estimate = lu.solve(&raw)?;

    Some((y_new, err_estimate))
}

/// Simplified Newton iteration for `k = f(t, base + hγ·k)`
#[allow(clippy::too_many_arguments)]
fn solve_stage(
    model: &dyn CompartmentModel,
    lu: &LU<f64, Dyn, Dyn>,
    base: &DVector<f64>,
    t: f64,
    hg: f64,
    guess: DVector<f64>,
    scale: &DVector<f64>,
    stats: &mut StepStats,
) -> Option<DVector<f64>> {
    let n = base.len();
    let mut k = guess;

    for _ in 0..MAX_NEWTON {
        let stage = base + &k * hg;
        let residual = eval(model, &stage, t) - &k;
        stats.evaluations += 1;

        let delta = lu.solve(&residual)?;
        k += &delta;
        if k.iter().any(|ki| !ki.is_finite()) {
            return None;
        }

        // Change of the stage value, in units of the tolerance
        let correction = if n == 0 {
            0.0
        } else {
            let sum: f64 = delta.iter().zip(scale.iter()).map(|(d, s)| (d * hg / s).powi(2)).sum();
            (sum / n as f64).sqrt()
        };
        if correction < NEWTON_TOL {
            return Some(k);
        }
    }

    None
}

/// Step size multiplier for the next attempt
fn step_factor(err: f64) -> f64 {
    if !err.is_finite() {
        MIN_FACTOR
    } else if err == 0.0 {
        MAX_FACTOR
    } else {
        (SAFETY * err.powf(-0.5)).clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::{ModelParameters, TimeSpan, ZombieApocalypse};
    use crate::solver::DormandPrince45;

    struct ExponentialDecay {
        decay_rate: f64,
    }

    impl CompartmentModel for ExponentialDecay {
        fn compartments(&self) -> usize {
            1
        }

        fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
            state.clone() * (-self.decay_rate)
        }

        fn initial_state(&self) -> PopulationState {
            PopulationState::from_slice(&[1.0])
        }

        fn name(&self) -> &str {
            "Exponential Decay"
        }
    }

    /// y' = λ·(y − cos t) with λ = −10⁶
    struct StiffForcing;

    impl CompartmentModel for StiffForcing {
        fn compartments(&self) -> usize {
            1
        }

        fn derivative(&self, state: &PopulationState, t: f64) -> PopulationState {
            PopulationState::from_slice(&[-1e6 * (state.as_slice()[0] - t.cos())])
        }

        fn initial_state(&self) -> PopulationState {
            PopulationState::from_slice(&[1.0])
        }

        fn name(&self) -> &str {
            "Stiff forcing"
        }
    }

    fn scenario(model: impl CompartmentModel + 'static, span: TimeSpan) -> Scenario {
        Scenario::new(Box::new(model), span)
    }

    #[test]
    fn test_step_factor_bounds() {
        assert_eq!(step_factor(0.0), MAX_FACTOR);
        assert_eq!(step_factor(f64::NAN), MIN_FACTOR);
        assert_eq!(step_factor(1e12), MIN_FACTOR);
        assert!((step_factor(1.0) - SAFETY).abs() < 1e-15);
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let span = TimeSpan::linspace(0.0, 3.0, 31).unwrap();
        let scenario = scenario(ExponentialDecay { decay_rate: 1.5 }, span);

        let result = Sdirk21::new()
            .solve(&scenario, &SolverConfiguration::adaptive(1e-7, 1e-12))
            .unwrap();

        assert_eq!(result.time_points, scenario.time_span.as_slice());
        for (t, state) in result.time_points.iter().zip(&result.state_trajectory) {
            let exact = (-1.5 * t).exp();
            assert!((state.as_slice()[0] - exact).abs() < 1e-6, "t = {t}");
        }
    }

    #[test]
    fn test_stiff_problem_takes_few_steps() {
        let span = TimeSpan::linspace(0.0, 1.0, 11).unwrap();
        let scenario = scenario(StiffForcing, span);

        let result = Sdirk21::new()
            .solve(&scenario, &SolverConfiguration::adaptive(1e-6, 1e-9))
            .unwrap();

        let y = result.final_state().unwrap().as_slice()[0];
        assert!((y - 1f64.cos()).abs() < 1e-5, "y(1) = {y}");

        // Dormand–Prince would need about 3·10⁵ steps here
        let steps: usize = result.get_metadata("steps").unwrap().parse().unwrap();
        assert!(steps < 10_000, "steps: {steps}");
        assert!(result.get_metadata("jacobian evaluations").is_some());
    }

    #[test]
    fn test_agrees_with_dormand_prince_on_default_outbreak() {
        let params = ModelParameters::builder()
            .initial_infected(1.0)
            .time_span(TimeSpan::linspace(0.0, 5.0, 51).unwrap())
            .build();
        let scenario = scenario(ZombieApocalypse::new(&params), params.time_span().clone());

        let implicit = Sdirk21::new()
            .solve(&scenario, &SolverConfiguration::adaptive(1e-6, 1e-6))
            .unwrap();
        let explicit = DormandPrince45::new()
            .solve(&scenario, &SolverConfiguration::default())
            .unwrap();

        for (a, b) in implicit.state_trajectory.iter().zip(&explicit.state_trajectory) {
            for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
                assert!((x - y).abs() < 1e-3 * (1.0 + y.abs()), "{x} vs {y}");
            }
        }
    }

    #[test]
    fn test_rejects_fixed_step_configuration() {
        let scenario = scenario(ExponentialDecay { decay_rate: 1.0 }, TimeSpan::default());
        let err = Sdirk21::new()
            .solve(&scenario, &SolverConfiguration::fixed_step(10))
            .unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Validation(ValidationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_step_budget_exhausted() {
        let scenario = scenario(ExponentialDecay { decay_rate: 1.0 }, TimeSpan::default());
        let config = SolverConfiguration::default().with_max_steps(10);

        let err = Sdirk21::new().solve(&scenario, &config).unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Numerical(NumericalError::MaxStepsExceeded { max_steps: 10, .. })
        ));
    }
}
