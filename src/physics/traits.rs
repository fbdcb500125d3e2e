//! Compartment model traits and types
//!
//! This module defines the core API for compartment models:
//! - `CompartmentModel`: trait for all population models
//! - `PopulationState`: state vector container
//! - `Compartment`: type-safe compartment identifiers

use nalgebra::{DMatrix, DVector};
use std::fmt;

// =================================================================================================
// Compartments (Type-safe Identifiers)
// =================================================================================================

/// Population compartments of the zombie model
///
/// The discriminant order is the layout of a [`PopulationState`]:
/// `[S, Z, R]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Compartment {
    /// Susceptible humans (S)
    Living,

    /// Zombies (Z)
    Zombie,

    /// Dead bodies that may resurrect (R)
    Dead,
}

impl Compartment {
    /// All compartments in state-vector order
    pub const ALL: [Compartment; 3] = [Compartment::Living, Compartment::Zombie, Compartment::Dead];

    /// Position of the compartment in a state vector
    pub fn index(self) -> usize {
        match self {
            Compartment::Living => 0,
            Compartment::Zombie => 1,
            Compartment::Dead => 2,
        }
    }

    /// Inverse of [`Compartment::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Legend label used in plots and CSV headers
    pub fn label(self) -> &'static str {
        match self {
            Compartment::Living => "Living",
            Compartment::Zombie => "Zombies",
            Compartment::Dead => "Dead",
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =================================================================================================
// Population State
// =================================================================================================

/// Population of every compartment at one instant
///
/// Also used for derivatives: a model returns `dy/dt` as a `PopulationState`
/// so that solvers can combine stages with `+` and `* f64`.
///
/// # Example
/// ```
/// use zombie_rs::physics::{Compartment, PopulationState};
///
/// let state = PopulationState::from_compartments(500.0, 0.0, 0.0);
/// assert_eq!(state.get(Compartment::Living), Some(500.0));
/// assert_eq!(state.total(), 500.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationState {
    values: DVector<f64>,
}

impl PopulationState {
    /// Wrap an existing vector
    pub fn new(values: DVector<f64>) -> Self {
        Self { values }
    }

    /// Build from a slice (any number of compartments)
    pub fn from_slice(values: &[f64]) -> Self {
        Self::new(DVector::from_row_slice(values))
    }

    /// Build the three-compartment `[S, Z, R]` state
    pub fn from_compartments(living: f64, zombie: f64, dead: f64) -> Self {
        Self::from_slice(&[living, zombie, dead])
    }

    /// Value of one compartment, `None` if the state is too short
    pub fn get(&self, compartment: Compartment) -> Option<f64> {
        self.values.get(compartment.index()).copied()
    }

    /// Number of compartments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values in state-vector order
    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    /// Underlying vector
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    /// Sum over all compartments
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Index of the first NaN or infinite component
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|x| !x.is_finite())
    }
}

// Operator overloading for numerical operations

impl std::ops::Add for PopulationState {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.values += rhs.values;
        self
    }
}

impl std::ops::Sub for PopulationState {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self.values -= rhs.values;
        self
    }
}

impl std::ops::Mul<f64> for PopulationState {
    type Output = Self;

    fn mul(mut self, scalar: f64) -> Self::Output {
        self.values *= scalar;
        self
    }
}

// =================================================================================================
// Compartment Model Trait
// =================================================================================================

/// Trait for compartment models
///
/// # Responsibility
/// Evaluates the right-hand side `f(y, t)` of `dy/dt = f(y, t)`.
/// Does NOT integrate it (that's the Solver's job).
///
/// Implementations must be pure: the same state and time always give the
/// same derivative, so a model can be shared between threads.
pub trait CompartmentModel: Send + Sync {
    /// Number of compartments in the state vector
    fn compartments(&self) -> usize;

    /// Instantaneous rate of change at `state` and time `t`
    fn derivative(&self, state: &PopulationState, t: f64) -> PopulationState;

    /// State at the first sample time
    fn initial_state(&self) -> PopulationState;

    /// Name of the model (used for display and logging)
    fn name(&self) -> &str;

    /// Partial derivatives `∂fᵢ/∂yⱼ` at `state`, used by implicit solvers
    ///
    /// The default uses central differences with a step of
    /// `1e-8·(1 + |yⱼ|)`. Models with a closed form should override it.
    fn jacobian(&self, state: &PopulationState, t: f64) -> DMatrix<f64> {
        let n = state.len();
        let mut jacobian = DMatrix::zeros(n, n);
        let mut shifted = state.values().clone();

        for j in 0..n {
            let yj = shifted[j];
            let h = 1e-8 * (1.0 + yj.abs());

            shifted[j] = yj + h;
            let forward = self.derivative(&PopulationState::new(shifted.clone()), t);
            shifted[j] = yj - h;
            let backward = self.derivative(&PopulationState::new(shifted.clone()), t);
            shifted[j] = yj;

            let column = (forward - backward) * (0.5 / h);
            jacobian.set_column(j, column.values());
        }

        jacobian
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compartment_layout() {
        for (i, compartment) in Compartment::ALL.iter().enumerate() {
            assert_eq!(compartment.index(), i);
            assert_eq!(Compartment::from_index(i), Some(*compartment));
        }
        assert_eq!(Compartment::from_index(3), None);
        assert_eq!(Compartment::Zombie.to_string(), "Zombies");
    }

    #[test]
    fn test_state_access() {
        let state = PopulationState::from_compartments(500.0, 2.0, 3.0);

        assert_eq!(state.len(), 3);
        assert_eq!(state.get(Compartment::Dead), Some(3.0));
        assert_eq!(state.total(), 505.0);
        assert_eq!(state.first_non_finite(), None);

        let short = PopulationState::from_slice(&[1.0]);
        assert_eq!(short.get(Compartment::Zombie), None);
    }

    #[test]
    fn test_arithmetic() {
        let a = PopulationState::from_compartments(1.0, 2.0, 3.0);
        let b = PopulationState::from_compartments(0.5, -2.0, 1.0);

        let sum = a.clone() + b.clone();
        assert_eq!(sum.as_slice(), &[1.5, 0.0, 4.0]);

        let diff = a.clone() - b;
        assert_eq!(diff.as_slice(), &[0.5, 4.0, 2.0]);

        let scaled = a * 10.0;
        assert_eq!(scaled.as_slice(), &[10.0, 20.0, 30.0]);
    }

    struct Quadratic;

    impl CompartmentModel for Quadratic {
        fn compartments(&self) -> usize {
            2
        }

        // f = [x·y, x²]
        fn derivative(&self, state: &PopulationState, _t: f64) -> PopulationState {
            let [x, y] = [state.as_slice()[0], state.as_slice()[1]];
            PopulationState::from_slice(&[x * y, x * x])
        }

        fn initial_state(&self) -> PopulationState {
            PopulationState::from_slice(&[1.0, 1.0])
        }

        fn name(&self) -> &str {
            "Quadratic"
        }
    }

    #[test]
    fn test_default_jacobian_central_differences() {
        let state = PopulationState::from_slice(&[2.0, 3.0]);
        let jacobian = Quadratic.jacobian(&state, 0.0);

        let expected = [[3.0, 2.0], [4.0, 0.0]];
        for i in 0..2 {
            for j in 0..2 {
                assert!((jacobian[(i, j)] - expected[i][j]).abs() < 1e-6, "J[{i}][{j}]");
            }
        }
    }

    #[test]
    fn test_detects_non_finite() {
        let state = PopulationState::from_compartments(1.0, f64::NAN, f64::INFINITY);
        assert_eq!(state.first_non_finite(), Some(1));
    }
}
