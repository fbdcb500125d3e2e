//! Zombie apocalypse model (Munz et al. 2009, basic SZR model)
//!
//! # Equations
//!
//! With `S` living, `Z` zombies and `R` removed (dead) bodies:
//!
//! ```text
//! dS/dt = Π − β·S·Z − δ·S
//! dZ/dt = β·S·Z + ζ·R − (α/100)·S·Z
//! dR/dt = δ·S + α·S·Z − ζ·R
//! ```
//!
//! - Π: births per day
//! - δ: natural death rate
//! - β: transmission rate
//! - ζ: resurrection rate
//! - α: destruction rate
//!
//! The destruction term is scaled by an extra `1/100` in `dZ/dt` but not in
//! `dR/dt`, so the system does not conserve `S + Z + R` when `α ≠ 0`. The
//! asymmetry is pinned by `test_destruction_term_asymmetry`.
//!
//! # Example
//!
//! ```rust
//! use zombie_rs::models::{ModelParameters, ZombieApocalypse};
//! use zombie_rs::physics::{Compartment, CompartmentModel};
//!
//! let model = ZombieApocalypse::new(&ModelParameters::default());
//! let state = model.initial_state();
//! let rate = model.derivative(&state, 0.0);
//!
//! // Only natural deaths happen before the first zombie appears
//! assert_eq!(rate.get(Compartment::Living), Some(-5.0));
//! assert_eq!(rate.get(Compartment::Dead), Some(5.0));
//! ```

use nalgebra::DMatrix;

use crate::models::parameters::{ModelParameters, Rates};
use crate::physics::{CompartmentModel, PopulationState};

/// Right-hand side of the zombie outbreak ODE system
///
/// Holds a copy of the rates and initial populations, so the model is `Copy`
/// and can be moved into any solver or thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZombieApocalypse {
    birth_rate: f64,
    rates: Rates,
    initial: [f64; 3],
}

impl ZombieApocalypse {
    pub fn new(parameters: &ModelParameters) -> Self {
        Self {
            birth_rate: parameters.birth_rate(),
            rates: parameters.rates(),
            initial: [
                parameters.initial_living(),
                parameters.initial_infected(),
                parameters.initial_dead(),
            ],
        }
    }

    /// Derivative on a bare `[S, Z, R]` triple
    #[inline]
    pub fn rates_of_change(&self, s: f64, z: f64, r: f64) -> [f64; 3] {
        let Rates { natural_death, transmission, resurrection, destruction } = self.rates;
        let contacts = s * z;

        [
            self.birth_rate - transmission * contacts - natural_death * s,
            transmission * contacts + resurrection * r - destruction / 100.0 * contacts,
            natural_death * s + destruction * contacts - resurrection * r,
        ]
    }
}

impl CompartmentModel for ZombieApocalypse {
    fn compartments(&self) -> usize {
        3
    }

    fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
        let y = state.as_slice();
        assert_eq!(
            y.len(),
            3,
            "Zombie model state must have 3 compartments, got {}",
            y.len()
        );

        let [ds, dz, dr] = self.rates_of_change(y[0], y[1], y[2]);
        PopulationState::from_compartments(ds, dz, dr)
    }

    fn initial_state(&self) -> PopulationState {
        let [s, z, r] = self.initial;
        PopulationState::from_compartments(s, z, r)
    }

    fn name(&self) -> &str {
        "Zombie apocalypse (SZR)"
    }

    /// Closed-form partial derivatives
    ///
    /// ```text
    ///       ⎡ −βZ − δ        −βS          0  ⎤
    /// J  =  ⎢ (β − α/100)Z   (β − α/100)S  ζ  ⎥
    ///       ⎣ δ + αZ          αS          −ζ ⎦
    /// ```
    fn jacobian(&self, state: &PopulationState, _t: f64) -> DMatrix<f64> {
        let y = state.as_slice();
        assert_eq!(
            y.len(),
            3,
            "Zombie model state must have 3 compartments, got {}",
            y.len()
        );

        let (s, z) = (y[0], y[1]);
        let Rates { natural_death, transmission, resurrection, destruction } = self.rates;
        let net_infection = transmission - destruction / 100.0;

        DMatrix::from_row_slice(
            3,
            3,
            &[
                -transmission * z - natural_death,
                -transmission * s,
                0.0,
                net_infection * z,
                net_infection * s,
                resurrection,
                natural_death + destruction * z,
                destruction * s,
                -resurrection,
            ],
        )
    }
}

// =================================================================================================
// Tests
// =================================================================================================
