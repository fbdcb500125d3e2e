//! zombie-rs: Zombie Apocalypse Outbreak Simulator
//!
//! Numerical simulation of the basic SZR model of Munz et al. (2009): a
//! living population `S` is turned into zombies `Z` by contact, dies into
//! the removed class `R`, and the removed may rise again as zombies.
//!
//! # Architecture
//!
//! 1. **Separation of Model and Numerics**
//!    - [`models`]: parameters and the outbreak equations (what to solve)
//!    - [`solver`]: integration methods (how to solve)
//!
//! 2. **Pure core, injected output**
//!    - [`Simulator`] only computes; it returns a [`Trajectory`]
//!    - [`output`] renders or exports trajectories behind the
//!      [`Renderer`](output::Renderer) and [`Exporter`](output::Exporter) traits
//!
//! # Quick Start
//!
//! ```rust
//! use zombie_rs::{ModelParameters, Simulator};
//!
//! // 1. Parameters: percent rates are converted to fractions once
//! let params = ModelParameters::builder()
//!     .initial_infected(1.0)
//!     .transmission_percent(95.0)
//!     .build();
//!
//! // 2. Simulate with the default adaptive solver (Dormand–Prince, switching
//! //    to an implicit method if the run turns stiff)
//! let simulator = Simulator::new(params);
//! let trajectory = simulator.solve()?;
//!
//! // 3. Inspect
//! assert_eq!(trajectory.len(), 1000);
//! let (day, zombies) = trajectory.peak_infected();
//! println!("{}\npeak of {zombies:.0} zombies on day {day:.2}", simulator.summary_label());
//! # Ok::<(), zombie_rs::error::SimulationError>(())
//! ```
//!
//! # Modules
//!
//! - [`error`]: validation and numerical error types
//! - [`physics`]: compartment state and the model trait
//! - [`models`]: parameters and the zombie equations
//! - [`solver`]: Dormand–Prince, SDIRK and RK4 integrators
//! - [`output`]: plots and CSV export

pub mod error;
pub mod physics;

pub mod models;
pub mod solver;

pub mod output;
pub mod simulator;
pub mod trajectory;

pub use error::{NumericalError, SimulationError, ValidationError};
pub use models::{ModelParameters, ParametersBuilder, TimeSpan};
pub use simulator::{simulate_batch, solve, summary_label, Simulator};
pub use trajectory::{FinalState, Trajectory};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use zombie_rs::prelude::*;
    //!
    //! let trajectory = Simulator::new(ModelParameters::default()).solve().unwrap();
    //! assert_eq!(trajectory.compartment(Compartment::Living)[0], 500.0);
    //! ```
    pub use crate::error::{NumericalError, SimulationError, ValidationError};
    pub use crate::models::{ModelParameters, TimeSpan, ZombieApocalypse};
    pub use crate::physics::{Compartment, CompartmentModel, PopulationState};
    pub use crate::simulator::Simulator;
    pub use crate::solver::{
        DormandPrince45, RK4Solver, Scenario, Sdirk21, SimulationResult, Solver,
        SolverConfiguration, SolverMethod, SolverType, StiffnessSwitching,
    };
    pub use crate::trajectory::Trajectory;
}
