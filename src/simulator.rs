//! Simulation driver
//!
//! [`Simulator`] ties one [`ModelParameters`] value to the zombie model and
//! a numerical method, and turns the raw solver output into a
//! [`Trajectory`]. It holds no mutable state: `solve()` can be called any
//! number of times, from any thread, and always returns the same result.
//!
//! # Example
//!
//! ```rust
//! use zombie_rs::{ModelParameters, Simulator};
//!
//! let params = ModelParameters::builder().initial_infected(1.0).build();
//! let simulator = Simulator::new(params);
//!
//! let trajectory = simulator.solve().unwrap();
//! assert_eq!(trajectory.len(), 1000);
//! assert_eq!(trajectory.living[0], 500.0);
//! println!("{}", simulator.summary_label());
//! ```

use log::info;

use crate::error::{SimulationError, ValidationError};
use crate::models::{ModelParameters, ZombieApocalypse};
use crate::physics::{CompartmentModel, PopulationState};
use crate::solver::{Scenario, Solver, SolverConfiguration, SolverMethod};
use crate::trajectory::Trajectory;

/// One outbreak simulation: parameters, equations and numerical method
pub struct Simulator {
    parameters: ModelParameters,
    model: ZombieApocalypse,
    solver: Box<dyn Solver>,
    config: SolverConfiguration,
}

impl Simulator {
    /// Simulator using the default adaptive method
    pub fn new(parameters: ModelParameters) -> Self {
        let method = SolverMethod::default();
        Self {
            model: ZombieApocalypse::new(&parameters),
            parameters,
            solver: method.solver(),
            config: method.default_configuration(),
        }
    }

    /// Switch to another method with its default configuration
    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.solver = method.solver();
        self.config = method.default_configuration();
        self
    }

    /// Use an explicit solver and configuration
    ///
    /// The configuration is validated here; whether it suits the solver is
    /// checked by the solver itself on `solve()`.
    pub fn with_solver(
        mut self,
        solver: Box<dyn Solver>,
        config: SolverConfiguration,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        self.solver = solver;
        self.config = config;
        Ok(self)
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn configuration(&self) -> &SolverConfiguration {
        &self.config
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Rates of change of `[S, Z, R]` at `state` (time is ignored)
    pub fn derivative(&self, state: [f64; 3], t: f64) -> [f64; 3] {
        let [s, z, r] = state;
        let rate = self
            .model
            .derivative(&PopulationState::from_compartments(s, z, r), t);
        let values = rate.as_slice();
        [values[0], values[1], values[2]]
    }

    /// Integrate the outbreak over the parameters' time span
    ///
    /// # Errors
    ///
    /// `SimulationError::Numerical` when the integrator gives up (step budget,
    /// step size collapse, non-finite populations). No partial trajectory is
    /// returned.
    pub fn solve(&self) -> Result<Trajectory, SimulationError> {
        let time_span = self.parameters.time_span().clone();
        let scenario = Scenario::new(Box::new(self.model), time_span.clone());

        let result = self.solver.solve(&scenario, &self.config)?;
        let trajectory = Trajectory::from_result(time_span, &result)?;

        info!(
            "{} completed: {} samples, {} steps",
            self.solver.name(),
            trajectory.len(),
            result.get_metadata("steps").unwrap_or("?")
        );

        Ok(trajectory)
    }

    /// Human-readable description of the inputs (plot title)
    pub fn summary_label(&self) -> String {
        self.parameters.summary_label()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("parameters", &self.parameters)
            .field("solver", &self.solver.name())
            .field("config", &self.config)
            .finish()
    }
}

// =================================================================================================
// Free functions
// =================================================================================================

/// Simulate with the default adaptive method
pub fn solve(parameters: &ModelParameters) -> Result<Trajectory, SimulationError> {
    Simulator::new(parameters.clone()).solve()
}

/// Title text for a parameter set
pub fn summary_label(parameters: &ModelParameters) -> String {
    parameters.summary_label()
}

/// Run independent simulations, results in input order
///
/// With the `parallel` feature the runs are spread over the rayon pool.
pub fn simulate_batch(
    parameters: &[ModelParameters],
) -> Vec<Result<Trajectory, SimulationError>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        parameters.par_iter().map(solve).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        parameters.iter().map(solve).collect()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NumericalError;
    use crate::solver::{RK4Solver, SolverType};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_simulator_is_send_sync() {
        assert_send_sync::<Simulator>();
    }

    #[test]
    fn test_derivative_at_defaults() {
        let simulator = Simulator::new(ModelParameters::default());
        assert_eq!(simulator.derivative([500.0, 0.0, 0.0], 0.0), [-5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_solve_shapes() {
        let params = ModelParameters::builder().initial_infected(2.0).initial_dead(3.0).build();
        let trajectory = Simulator::new(params).solve().unwrap();

        assert_eq!(trajectory.len(), 1000);
        assert_eq!(trajectory.living.len(), 1000);
        assert_eq!(trajectory.infected.len(), 1000);
        assert_eq!(trajectory.dead.len(), 1000);
        assert_eq!(
            (trajectory.living[0], trajectory.infected[0], trajectory.dead[0]),
            (500.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_with_method_switches_solver() {
        let simulator =
            Simulator::new(ModelParameters::default()).with_method(SolverMethod::RungeKutta4);

        assert_eq!(simulator.solver_name(), "Runge Kutta (RK4)");
        assert!(matches!(simulator.configuration().solver_type, SolverType::FixedStep { .. }));
        assert!(simulator.solve().is_ok());
    }

    #[test]
    fn test_with_solver_validates_configuration() {
        let result = Simulator::new(ModelParameters::default())
            .with_solver(Box::new(RK4Solver::new()), SolverConfiguration::fixed_step(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_solver_and_configuration() {
        let simulator = Simulator::new(ModelParameters::default())
            .with_solver(Box::new(RK4Solver::new()), SolverConfiguration::default())
            .unwrap();

        assert!(matches!(simulator.solve(), Err(SimulationError::Validation(_))));
    }

    #[test]
    fn test_step_budget_error_propagates() {
        let simulator = Simulator::new(ModelParameters::default())
            .with_solver(
                Box::new(crate::solver::DormandPrince45::new()),
                SolverConfiguration::default().with_max_steps(5),
            )
            .unwrap();

        assert!(matches!(
            simulator.solve(),
            Err(SimulationError::Numerical(NumericalError::MaxStepsExceeded { .. }))
        ));
    }

    #[test]
    fn test_free_functions_match_simulator() {
        let params = ModelParameters::builder().initial_infected(1.0).build();

        assert_eq!(summary_label(&params), Simulator::new(params.clone()).summary_label());
        assert_eq!(solve(&params).unwrap(), Simulator::new(params).solve().unwrap());
    }

    #[test]
    fn test_batch_keeps_order() {
        let batch: Vec<_> = [1.0, 5.0, 20.0]
            .iter()
            .map(|&z| ModelParameters::builder().initial_infected(z).build())
            .collect();

        let results = simulate_batch(&batch);

        assert_eq!(results.len(), 3);
        for (params, result) in batch.iter().zip(results) {
            assert_eq!(result.unwrap().infected[0], params.initial_infected());
        }
    }

    #[test]
    fn test_concurrent_solves_agree() {
        let simulator = Simulator::new(ModelParameters::builder().initial_infected(1.0).build());
        let reference = simulator.solve().unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> =
                (0..4).map(|_| scope.spawn(|| simulator.solve().unwrap())).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), reference);
            }
        });
    }
}
