//! Dormand–Prince 4(5) adaptive solver
//!
//! # Mathematical Background
//!
//! Explicit Runge-Kutta pair with seven stages. The 5th-order solution
//! advances the state (local extrapolation), the difference with the
//! embedded 4th-order solution estimates the local error:
//!
//! ```text
//! errᵢ = h·Σⱼ (b̂ⱼ − bⱼ)·kⱼ,ᵢ
//! ‖err‖ = sqrt( mean( (errᵢ / (atol + rtol·max(|yᵢ|, |ŷᵢ|)))² ) )
//! ```
//!
//! A step is accepted when `‖err‖ ≤ 1`. The next step size is
//! `h·clamp(0.9·‖err‖^(-1/5), 0.2, 5)`.
//!
//! The last stage of an accepted step is the first stage of the next one
//! (FSAL), so an accepted step costs 6 derivative evaluations.
//!
//! # Sample times
//!
//! The integrator never steps past a requested sample time: a step that
//! would overshoot is shortened to land exactly on it. The stored state at
//! each sample is therefore a true integration point, not an interpolation.
//!
//! # Characteristics
//!
//! - **Order**: 5 (advancing), 4 (error estimate)
//! - **Error control**: per component, mixed absolute/relative
//! - **Failure modes**: step budget exhausted, step size below `min_step`,
//!   NaN/Inf in an accepted state

use log::{debug, warn};
use nalgebra::DVector;

use crate::error::{NumericalError, SimulationError};
use crate::physics::{CompartmentModel, PopulationState};
use crate::solver::methods::adaptive::{clip_step, Progress, StepStats, Tolerances};
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration};

// Butcher tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (advancing solution)
const BH1: f64 = 35.0 / 384.0;
const BH3: f64 = 500.0 / 1113.0;
const BH4: f64 = 125.0 / 192.0;
const BH5: f64 = -2187.0 / 6784.0;
const BH6: f64 = 11.0 / 84.0;

// 4th order weights (embedded)
const B1: f64 = 5179.0 / 57600.0;
const B3: f64 = 7571.0 / 16695.0;
const B4: f64 = 393.0 / 640.0;
const B5: f64 = -92097.0 / 339200.0;
const B6: f64 = 187.0 / 2100.0;
const B7: f64 = 1.0 / 40.0;

// Error weights
const E1: f64 = BH1 - B1;
const E3: f64 = BH3 - B3;
const E4: f64 = BH4 - B4;
const E5: f64 = BH5 - B5;
const E6: f64 = BH6 - B6;
const E7: f64 = -B7;

// Step size controller
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

// Stiffness detection: `h·ρ` beyond the stability boundary on enough
// accepted steps, with fewer than `CALM_RESET` calm steps in between
const STIFFNESS_BOUND: f64 = 3.25;
const STIFF_HITS: usize = 15;
const CALM_RESET: usize = 6;

/// Adaptive Dormand–Prince 4(5) solver
///
/// Requires a [`SolverType::Adaptive`] configuration.
///
/// # Example
///
/// ```rust
/// use zombie_rs::models::TimeSpan;
/// use zombie_rs::physics::{CompartmentModel, PopulationState};
/// use zombie_rs::solver::{DormandPrince45, Scenario, Solver, SolverConfiguration};
///
/// struct Growth;
///
/// impl CompartmentModel for Growth {
///     fn compartments(&self) -> usize { 1 }
///     fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
///         state.clone()
///     }
///     fn initial_state(&self) -> PopulationState { PopulationState::from_slice(&[1.0]) }
///     fn name(&self) -> &str { "Growth" }
/// }
///
/// let scenario = Scenario::new(Box::new(Growth), TimeSpan::linspace(0.0, 1.0, 11).unwrap());
/// let result = DormandPrince45::new()
///     .solve(&scenario, &SolverConfiguration::default())
///     .unwrap();
///
/// let y = result.final_state().unwrap().as_slice()[0];
/// assert!((y - 1f64.exp()).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince45;

impl DormandPrince45 {
    pub fn new() -> Self {
        Self
    }
}

/// The seven stage derivatives of one attempted step, plus the state at
/// which `k6` was evaluated
struct Stages {
    k1: DVector<f64>,
    k3: DVector<f64>,
    k4: DVector<f64>,
    k5: DVector<f64>,
    k6: DVector<f64>,
    k7: DVector<f64>,
    y6: DVector<f64>,
}

/// Why [`DormandPrince45::advance`] returned
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Outcome {
    /// Every sample is stored
    Completed,
    /// The step size is pinned by stability rather than accuracy
    Stiff,
    /// The step budget ran out before reaching `target`
    OutOfSteps { target: f64 },
}

/// Hairer's test on the dominant eigenvalue estimate
///
/// `ρ ≈ ‖k7 − k6‖ / ‖y₁ − y6‖` approximates the spectral radius of the
/// Jacobian along the step. Explicit Dormand–Prince is unstable past
/// `h·ρ ≈ 3.3`, so a run of steps sitting on that boundary means the
/// problem has become stiff.
#[derive(Debug, Default)]
struct StiffnessDetector {
    hits: usize,
    calm: usize,
}

impl StiffnessDetector {
    /// Record `h·ρ` of an accepted step; true once stiffness is established
    fn observe(&mut self, h_rho: f64) -> bool {
        if h_rho > STIFFNESS_BOUND {
            self.calm = 0;
            self.hits += 1;
        } else {
            self.calm += 1;
            if self.calm >= CALM_RESET {
                self.hits = 0;
            }
        }
        self.hits >= STIFF_HITS
    }
}

impl DormandPrince45 {
    /// Integrate from `progress` across the remaining sample times
    ///
    /// Stops early with [`Outcome::OutOfSteps`] when `stats` reaches the
    /// step budget, or with [`Outcome::Stiff`] when `detect_stiffness` is set
    /// and the detector fires. `progress` is always left at the last
    /// accepted point, with every sample up to it stored.
    pub(crate) fn advance(
        &self,
        model: &dyn CompartmentModel,
        times: &[f64],
        progress: &mut Progress,
        tol: &Tolerances,
        stats: &mut StepStats,
        detect_stiffness: bool,
    ) -> Result<Outcome, SimulationError> {
        let mut k1 = eval(model, &progress.y, progress.t);
        stats.evaluations += 1;
        let mut detector = StiffnessDetector::default();
        let mut stiff = false;

        for &t_out in &times[progress.next_sample()..] {
            while progress.t < t_out {
                if stiff {
                    return Ok(Outcome::Stiff);
                }
                if stats.attempted() >= tol.max_steps {
                    return Ok(Outcome::OutOfSteps { target: t_out });
                }

                let t = progress.t;
                let (step, landing) = clip_step(t, progress.h, t_out);

                let (y_new, stages) = attempt(model, &progress.y, k1.clone(), t, step);
                stats.evaluations += 6;

                let err = tol.error_norm(&error_estimate(&stages, step), &progress.y, &y_new);
                let factor = step_factor(err);

                if err <= 1.0 {
                    stats.accepted += 1;
                    if detect_stiffness {
                        stiff = detector.observe(step * spectral_radius(&stages, &y_new));
                    }

                    progress.accept(if landing { t_out } else { t + step }, y_new)?;
                    k1 = stages.k7;

                    // A shortened landing step says nothing about the natural step size
                    progress.h =
                        if landing { progress.h.max(step * factor) } else { step * factor };
                } else {
                    stats.rejected += 1;
                    if !err.is_finite() {
                        warn!(
                            "{}: non-finite error estimate at t={}, h={:e}",
                            self.name(),
                            t,
                            step
                        );
                    }
                    progress.h = step * factor;

                    if let Err(e) = tol.check_step(progress.h, t) {
                        warn!(
                            "{}: step size collapsed to {:e} at t={}",
                            self.name(),
                            progress.h,
                            t
                        );
                        return Err(e.into());
                    }
                }
            }

            progress.record_sample();
        }

        Ok(Outcome::Completed)
    }
}

impl Solver for DormandPrince45 {
    fn solve(
        &self,
        scenario: &Scenario,
        config: &SolverConfiguration,
    ) -> Result<SimulationResult, SimulationError> {
        let tol = Tolerances::from_config(config, "DormandPrince45")?;
        scenario.validate()?;

        let times = scenario.time_span.as_slice();
        let mut progress = Progress::start(scenario)?;
        let mut stats = StepStats::default();

        let outcome =
            self.advance(scenario.model.as_ref(), times, &mut progress, &tol, &mut stats, false)?;

        if let Outcome::OutOfSteps { target } = outcome {
            warn!(
                "{}: step budget of {} exhausted at t={}",
                self.name(),
                tol.max_steps,
                progress.t
            );
            return Err(NumericalError::MaxStepsExceeded {
                max_steps: tol.max_steps,
                t: progress.t,
                target,
            }
            .into());
        }

        debug!(
            "{}: {} accepted, {} rejected, {} evaluations",
            self.name(),
            stats.accepted,
            stats.rejected,
            stats.evaluations
        );

        let mut result = progress.into_result(times);
        result.add_metadata("solver", "Dormand-Prince 4(5)");
        result.add_metadata("rtol", &tol.rtol.to_string());
        result.add_metadata("atol", &tol.atol.to_string());
        stats.write_metadata(&mut result);

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince 4(5)"
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

/// `y + h·Σ cⱼ·kⱼ`
fn combine(y: &DVector<f64>, h: f64, terms: &[(f64, &DVector<f64>)]) -> DVector<f64> {
    let mut acc = y.clone();
    for &(coefficient, k) in terms {
        acc.axpy(h * coefficient, k, 1.0);
    }
    acc
}

/// Run the six new stages of one step, returning the 5th-order solution
fn attempt(
    model: &dyn CompartmentModel,
    y: &DVector<f64>,
    k1: DVector<f64>,
    t: f64,
    h: f64,
) -> (DVector<f64>, Stages) {
    let k2 = eval(model, &combine(y, h, &[(A21, &k1)]), t + C2 * h);
    let k3 = eval(model, &combine(y, h, &[(A31, &k1), (A32, &k2)]), t + C3 * h);
    let k4 = eval(
        model,
        &combine(y, h, &[(A41, &k1), (A42, &k2), (A43, &k3)]),
        t + C4 * h,
    );
    let k5 = eval(
        model,
        &combine(y, h, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
        t + C5 * h,
    );
    let y6 = combine(y, h, &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)]);
    let k6 = eval(model, &y6, t + h);

    let y_new = combine(y, h, &[(BH1, &k1), (BH3, &k3), (BH4, &k4), (BH5, &k5), (BH6, &k6)]);

    // FSAL
    let k7 = eval(model, &y_new, t + h);

    (y_new, Stages { k1, k3, k4, k5, k6, k7, y6 })
}

/// Embedded error estimate `h·Σ eⱼ·kⱼ`
fn error_estimate(stages: &Stages, h: f64) -> DVector<f64> {
    let zero = DVector::zeros(stages.k1.len());
    combine(
        &zero,
        h,
        &[
            (E1, &stages.k1),
            (E3, &stages.k3),
            (E4, &stages.k4),
            (E5, &stages.k5),
            (E6, &stages.k6),
            (E7, &stages.k7),
        ],
    )
}

/// Estimate of the Jacobian's spectral radius along the last step
///
/// `k7` and `k6` are both evaluated at `t + h`, at `y_new` and `y6`.
fn spectral_radius(stages: &Stages, y_new: &DVector<f64>) -> f64 {
    let spread = (y_new - &stages.y6).norm();
    if spread > 0.0 {
        (&stages.k7 - &stages.k6).norm() / spread
    } else {
        0.0
    }
}

/// Step size multiplier for the next attempt
fn step_factor(err: f64) -> f64 {
    if !err.is_finite() {
        MIN_FACTOR
    } else if err == 0.0 {
        MAX_FACTOR
    } else {
        (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
