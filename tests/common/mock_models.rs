//! Mock compartment models for testing
//!
//! These models have known analytical solutions, making them
//! ideal for validating numerical solver accuracy.

use zombie_rs::physics::{CompartmentModel, PopulationState};

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Exponential decay model: dy/dt = -k*y in every compartment
///
/// Analytical solution: y(t) = y₀ * exp(-k*t)
pub struct ExponentialDecay {
    pub compartments: usize,
    pub decay_rate: f64,
    pub initial: f64,
}

impl ExponentialDecay {
    pub fn new(compartments: usize, decay_rate: f64) -> Self {
        Self { compartments, decay_rate, initial: 1.0 }
    }

    pub fn analytical_solution(&self, t: f64) -> f64 {
        self.initial * (-self.decay_rate * t).exp()
    }
}

impl CompartmentModel for ExponentialDecay {
    fn compartments(&self) -> usize {
        self.compartments
    }

    fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
        state.clone() * (-self.decay_rate)
    }

    fn initial_state(&self) -> PopulationState {
        PopulationState::from_slice(&vec![self.initial; self.compartments])
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

// =================================================================================================
// Constant Growth: dy/dt = c
// =================================================================================================

/// Constant inflow: dy/dt = c
///
/// Analytical solution: y(t) = y₀ + c*t. Every Runge-Kutta method is exact.
pub struct ConstantGrowth {
    pub growth_rate: f64,
}

impl ConstantGrowth {
    pub fn new(growth_rate: f64) -> Self {
        Self { growth_rate }
    }

    pub fn analytical_solution(&self, t: f64) -> f64 {
        self.growth_rate * t
    }
}

impl CompartmentModel for ConstantGrowth {
    fn compartments(&self) -> usize {
        1
    }

    fn derivative(&self, _state: &PopulationState, _t: f64) -> PopulationState {
        PopulationState::from_slice(&[self.growth_rate])
    }

    fn initial_state(&self) -> PopulationState {
        PopulationState::from_slice(&[0.0])
    }

    fn name(&self) -> &str {
        "Constant Growth"
    }
}
