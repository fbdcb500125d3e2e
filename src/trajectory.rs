//! Per-compartment solution of one outbreak simulation

use crate::error::ValidationError;
use crate::models::TimeSpan;
use crate::physics::Compartment;
use crate::solver::SimulationResult;

/// Solution of one simulation: one value per compartment and sample time
///
/// `living`, `infected` and `dead` always have the same length as
/// `time_span`, and their first elements are the initial populations.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub time_span: TimeSpan,
    pub living: Vec<f64>,
    pub infected: Vec<f64>,
    pub dead: Vec<f64>,
}

/// Final populations of a trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalState {
    pub time: f64,
    pub living: f64,
    pub infected: f64,
    pub dead: f64,
}

impl Trajectory {
    /// Split a solver result into compartment series
    ///
    /// Fails with `IncompatibleState` if the result does not hold three
    /// compartments per sample, or `InvalidTimeSpan` if its time points do
    /// not match `time_span`.
    pub fn from_result(
        time_span: TimeSpan,
        result: &SimulationResult,
    ) -> Result<Self, ValidationError> {
        if result.time_points.as_slice() != time_span.as_slice() {
            return Err(ValidationError::InvalidTimeSpan(format!(
                "solver returned {} samples for a span of {}",
                result.time_points.len(),
                time_span.len()
            )));
        }

        if let Some(state) = result.state_trajectory.iter().find(|s| s.len() != 3) {
            return Err(ValidationError::IncompatibleState {
                model: "trajectory".to_string(),
                expected: Compartment::ALL.len(),
                got: state.len(),
            });
        }

        Ok(Self {
            living: result.series(Compartment::Living),
            infected: result.series(Compartment::Zombie),
            dead: result.series(Compartment::Dead),
            time_span,
        })
    }

    pub fn len(&self) -> usize {
        self.time_span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_span.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        self.time_span.as_slice()
    }

    pub fn compartment(&self, compartment: Compartment) -> &[f64] {
        match compartment {
            Compartment::Living => &self.living,
            Compartment::Zombie => &self.infected,
            Compartment::Dead => &self.dead,
        }
    }

    pub fn final_state(&self) -> FinalState {
        let last = self.len() - 1;
        FinalState {
            time: self.time_span.end(),
            living: self.living[last],
            infected: self.infected[last],
            dead: self.dead[last],
        }
    }

    /// Time and size of the largest zombie population
    pub fn peak_infected(&self) -> (f64, f64) {
        self.times()
            .iter()
            .zip(&self.infected)
            .fold((self.time_span.start(), f64::NEG_INFINITY), |best, (&t, &z)| {
                if z > best.1 { (t, z) } else { best }
            })
    }

    /// Series handed to a renderer, labelled for the legend
    ///
    /// The dead compartment is left out unless `show_dead` is set.
    pub fn plot_series(&self, show_dead: bool) -> Vec<(&'static str, &[f64])> {
        let mut series = vec![
            (Compartment::Living.label(), self.living.as_slice()),
            (Compartment::Zombie.label(), self.infected.as_slice()),
        ];
        if show_dead {
            series.push((Compartment::Dead.label(), self.dead.as_slice()));
        }
        series
    }
}
