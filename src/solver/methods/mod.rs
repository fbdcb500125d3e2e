//! Numerical methods for solving the outbreak equations
//!
//! Concrete implementations of the [`Solver`](crate::solver::Solver) trait.
//!
//! # Available Methods
//!
//! - **[`StiffnessSwitching`]**: the default
//!   - Dormand–Prince 4(5) while the outbreak is non-stiff, SDIRK 2(1) once
//!     a stiffness test fires or the explicit step budget runs out
//!   - Use: any population size
//!
//! - **[`DormandPrince45`]**: adaptive Dormand–Prince 4(5)
//!   - Order: 5, embedded 4th-order error estimate
//!   - Cost: 6 function evaluations per attempted step
//!   - Use: non-stiff runs. Steps are chosen from the requested tolerances
//!     and always land on the sample times.
//!
//! - **[`Sdirk21`]**: L-stable singly diagonally implicit Runge-Kutta 2(1)
//!   - Order: 2, embedded 1st-order error estimate
//!   - Cost: one Jacobian, one LU factorisation and a few Newton
//!     iterations per attempted step
//!   - Use: stiff runs, where explicit steps are limited by stability
//!
//! - **[`RK4Solver`]**: classical fourth-order Runge-Kutta
//!   - Order: 4
//!   - Cost: 4 function evaluations per step, fixed sub-steps per sample interval
//!   - Use: cross-checks and convergence studies
//!
//! [`SolverMethod`] names a method and pairs it with a sensible default
//! configuration, which is what the command line and
//! [`Simulator`](crate::Simulator) use.
//!
//! # Example
//!
//! ```rust
//! use zombie_rs::solver::SolverMethod;
//!
//! let method: SolverMethod = "rk4".parse().unwrap();
//! assert_eq!(method, SolverMethod::RungeKutta4);
//! assert_eq!(method.solver().name(), "Runge Kutta (RK4)");
//! assert!(method.default_configuration().validate().is_ok());
//! ```

mod adaptive;
mod dopri5;
mod rk4;
mod sdirk;
mod switching;

use std::fmt;
use std::str::FromStr;

pub use dopri5::DormandPrince45;
pub use rk4::RK4Solver;
pub use sdirk::Sdirk21;
pub use switching::StiffnessSwitching;

use crate::error::ValidationError;
use crate::solver::{Solver, SolverConfiguration, DEFAULT_SUBSTEPS};

/// Selectable integration method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverMethod {
    /// Dormand–Prince 4(5), switching to SDIRK 2(1) when the run turns stiff
    #[default]
    Adaptive,
    /// Dormand–Prince 4(5) alone
    DormandPrince,
    /// SDIRK 2(1) alone
    Implicit,
    /// Classical RK4 with fixed sub-steps
    RungeKutta4,
}

impl SolverMethod {
    pub const ALL: [SolverMethod; 4] = [
        SolverMethod::Adaptive,
        SolverMethod::DormandPrince,
        SolverMethod::Implicit,
        SolverMethod::RungeKutta4,
    ];

    /// Boxed solver implementing this method
    pub fn solver(self) -> Box<dyn Solver> {
        match self {
            SolverMethod::Adaptive => Box::new(StiffnessSwitching::new()),
            SolverMethod::DormandPrince => Box::new(DormandPrince45::new()),
            SolverMethod::Implicit => Box::new(Sdirk21::new()),
            SolverMethod::RungeKutta4 => Box::new(RK4Solver::new()),
        }
    }

    /// Configuration accepted by [`Self::solver`]
    ///
    /// The implicit method alone uses looser tolerances: at second order,
    /// the default `rtol = 1e-9` would cost hundreds of thousands of steps.
    pub fn default_configuration(self) -> SolverConfiguration {
        match self {
            SolverMethod::Adaptive | SolverMethod::DormandPrince => SolverConfiguration::default(),
            SolverMethod::Implicit => {
                SolverConfiguration::adaptive(IMPLICIT_DEFAULT_RTOL, IMPLICIT_DEFAULT_ATOL)
            }
            SolverMethod::RungeKutta4 => SolverConfiguration::fixed_step(DEFAULT_SUBSTEPS),
        }
    }

    /// Short identifier, as accepted by `FromStr`
    pub fn key(self) -> &'static str {
        match self {
            SolverMethod::Adaptive => "adaptive",
            SolverMethod::DormandPrince => "dopri5",
            SolverMethod::Implicit => "sdirk",
            SolverMethod::RungeKutta4 => "rk4",
        }
    }
}

/// Relative tolerance of [`SolverMethod::Implicit`]
const IMPLICIT_DEFAULT_RTOL: f64 = 1e-6;
/// Absolute tolerance of [`SolverMethod::Implicit`]
const IMPLICIT_DEFAULT_ATOL: f64 = 1e-9;

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SolverMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" | "auto" => Ok(SolverMethod::Adaptive),
            "dopri5" | "rk45" => Ok(SolverMethod::DormandPrince),
            "sdirk" | "implicit" => Ok(SolverMethod::Implicit),
            "rk4" | "runge-kutta" => Ok(SolverMethod::RungeKutta4),
            other => Err(ValidationError::InvalidConfiguration(format!(
                "unknown solver method `{other}` (expected `adaptive`, `dopri5`, `sdirk` or `rk4`)"
            ))),
        }
    }
}
