//! Scenario: the problem to solve
//!
//! A scenario pairs a compartment model (the equations) with the sample
//! times at which the solution is wanted. It is WHAT to solve; the solver
//! and its configuration are HOW.

use crate::error::ValidationError;
use crate::models::TimeSpan;
use crate::physics::{CompartmentModel, PopulationState};

/// Model plus sample times
pub struct Scenario {
    /// Equations to integrate
    pub model: Box<dyn CompartmentModel>,

    /// Sample times; the initial state is taken at `time_span.start()`
    pub time_span: TimeSpan,
}

impl Scenario {
    pub fn new(model: Box<dyn CompartmentModel>, time_span: TimeSpan) -> Self {
        Self { model, time_span }
    }

    /// Initial state supplied by the model
    pub fn initial_state(&self) -> PopulationState {
        self.model.initial_state()
    }

    /// Check that the model's initial state is consistent with its size
    pub fn validate(&self) -> Result<(), ValidationError> {
        let initial = self.initial_state();
        let expected = self.model.compartments();

        if initial.len() != expected {
            return Err(ValidationError::IncompatibleState {
                model: self.model.name().to_string(),
                expected,
                got: initial.len(),
            });
        }
        if let Some(index) = initial.first_non_finite() {
            return Err(ValidationError::InvalidConfiguration(format!(
                "initial value of compartment #{index} is not finite"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("model", &self.model.name())
            .field("samples", &self.time_span.len())
            .field("start", &self.time_span.start())
            .field("end", &self.time_span.end())
            .finish()
    }
}
