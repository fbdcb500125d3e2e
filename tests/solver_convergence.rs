//! Convergence tests for numerical solvers
//!
//! These tests verify that solvers exhibit the expected
//! convergence rates when refining the step size or tolerance.

use zombie_rs::solver::{DormandPrince45, RK4Solver, Solver, SolverConfiguration};

mod common;
use common::{single_interval_scenario, ConstantGrowth, ExponentialDecay};

fn final_value(result: &zombie_rs::solver::SimulationResult) -> f64 {
    result.final_state().unwrap().as_slice()[0]
}

#[test]
fn test_rk4_fourth_order_convergence() {
    // RK4 should have fourth-order convergence: error ~ O(h^4)
    // When h → h/2, error should → error/16

    let decay_rate = 0.3;
    let total_time = 5.0;
    let exact = ExponentialDecay::new(1, decay_rate).analytical_solution(total_time);

    let substeps_list = [10, 20, 40, 80];
    let mut errors = Vec::new();

    let rk4 = RK4Solver::new();

    for &substeps in &substeps_list {
        let scenario =
            single_interval_scenario(Box::new(ExponentialDecay::new(1, decay_rate)), total_time);

        let config = SolverConfiguration::fixed_step(substeps);
        let result = rk4.solve(&scenario, &config).unwrap();

        errors.push((final_value(&result) - exact).abs());
    }

    for i in 0..errors.len() - 1 {
        let ratio = errors[i] / errors[i + 1];
        println!("RK4 convergence ratio {}->{}: {}", i, i + 1, ratio);

        assert!(
            ratio > 12.0 && ratio < 20.0,
            "Convergence ratio {} not fourth-order",
            ratio
        );
    }
}

#[test]
fn test_adaptive_error_follows_tolerance() {
    let decay_rate = 0.3;
    let total_time = 5.0;
    let exact = ExponentialDecay::new(1, decay_rate).analytical_solution(total_time);

    let dopri = DormandPrince45::new();
    let mut errors = Vec::new();
    let mut steps = Vec::new();

    for rtol in [1e-4, 1e-6, 1e-8, 1e-10] {
        let scenario =
            single_interval_scenario(Box::new(ExponentialDecay::new(1, decay_rate)), total_time);

        let config = SolverConfiguration::adaptive(rtol, rtol * 1e-3);
        let result = dopri.solve(&scenario, &config).unwrap();

        let error = (final_value(&result) - exact).abs();
        println!("rtol {:e}: error {:e}", rtol, error);
        assert!(error < 50.0 * rtol, "error {} too large for rtol {}", error, rtol);

        errors.push(error);
        steps.push(result.get_metadata("steps").unwrap().parse::<usize>().unwrap());
    }

    assert!(errors[3] < errors[0]);
    // Tighter tolerances never take fewer steps
    assert!(steps.windows(2).all(|w| w[0] <= w[1]), "steps: {:?}", steps);
}

#[test]
fn test_both_methods_exact_for_linear_growth() {
    let growth = 7.5;
    let total_time = 3.0;
    let exact = ConstantGrowth::new(growth).analytical_solution(total_time);

    let scenario = single_interval_scenario(Box::new(ConstantGrowth::new(growth)), total_time);

    let rk4 = RK4Solver::new()
        .solve(&scenario, &SolverConfiguration::fixed_step(3))
        .unwrap();
    let dopri = DormandPrince45::new()
        .solve(&scenario, &SolverConfiguration::default())
        .unwrap();

    assert!((final_value(&rk4) - exact).abs() < 1e-12);
    assert!((final_value(&dopri) - exact).abs() < 1e-9);
}

#[test]
fn test_adaptive_and_rk4_agree_on_many_compartments() {
    let model = || Box::new(ExponentialDecay::new(4, 1.2));
    let total_time = 2.0;

    let rk4 = RK4Solver::new()
        .solve(
            &single_interval_scenario(model(), total_time),
            &SolverConfiguration::fixed_step(400),
        )
        .unwrap();
    let dopri = DormandPrince45::new()
        .solve(&single_interval_scenario(model(), total_time), &SolverConfiguration::default())
        .unwrap();

    common::assert_series_close(
        dopri.final_state().unwrap().as_slice(),
        rk4.final_state().unwrap().as_slice(),
        1e-9,
        "dopri vs rk4",
    );
}
