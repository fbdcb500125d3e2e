//! Compartment models
//!
//! A compartment model encapsulates the equations of a population system:
//! given the population of every compartment it returns how fast each one
//! changes.
//!
//! # Architecture
//!
//! Models are **separate from numerical solvers**:
//! - The model provides the **equations** (`dy/dt = f(y, t)`)
//! - The solver provides the **method** to integrate them
//!
//! The same model runs under any of the solvers without change. Implicit
//! solvers also call [`CompartmentModel::jacobian`], which defaults to
//! central differences.
//!
//! # Implementing a New Model
//!
//! ```rust
//! use zombie_rs::physics::{CompartmentModel, PopulationState};
//!
//! struct Decay {
//!     rate: f64,
//! }
//!
//! impl CompartmentModel for Decay {
//!     fn compartments(&self) -> usize {
//!         1
//!     }
//!
//!     fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
//!         state.clone() * (-self.rate)
//!     }
//!
//!     fn initial_state(&self) -> PopulationState {
//!         PopulationState::from_slice(&[1.0])
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Decay"
//!     }
//! }
//! ```

pub mod traits;

pub use traits::{Compartment, CompartmentModel, PopulationState};
