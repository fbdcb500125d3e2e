//! Performance benchmarks for the outbreak solvers
//!
//! Compares the adaptive Dormand–Prince solver with fixed-step RK4 on the
//! default outbreak (1000 samples over 5 days), and times the stiff
//! aftermath of a large-city outbreak.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench --bench solver_performance
//!
//! # Only the method comparison
//! cargo bench --bench solver_performance comparison
//! ```
//!
//! RK4 does 4 evaluations per sub-step regardless of the dynamics, so its
//! cost grows linearly with the sub-step count. The adaptive solver's cost
//! depends on the tolerance and on how stiff the outbreak gets.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use zombie_rs::models::{ModelParameters, ZombieApocalypse};
use zombie_rs::solver::{
    DormandPrince45, RK4Solver, Scenario, Solver, SolverConfiguration, StiffnessSwitching,
};
use zombie_rs::simulate_batch;

fn outbreak_scenario() -> Scenario {
    let params = ModelParameters::builder().initial_infected(1.0).build();
    Scenario::new(Box::new(ZombieApocalypse::new(&params)), params.time_span().clone())
}

// =================================================================================================
// Method comparison
// =================================================================================================

fn bench_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("comparison");
    group.measurement_time(Duration::from_secs(10));

    let scenario = outbreak_scenario();

    group.bench_function("dopri5_default", |b| {
        let solver = DormandPrince45::new();
        let config = SolverConfiguration::default();
        b.iter(|| solver.solve(black_box(&scenario), black_box(&config)).unwrap())
    });

    group.bench_function("switching_default", |b| {
        let solver = StiffnessSwitching::new();
        let config = SolverConfiguration::default();
        b.iter(|| solver.solve(black_box(&scenario), black_box(&config)).unwrap())
    });

    group.bench_function("rk4_10_substeps", |b| {
        let solver = RK4Solver::new();
        let config = SolverConfiguration::fixed_step(10);
        b.iter(|| solver.solve(black_box(&scenario), black_box(&config)).unwrap())
    });

    group.finish();
}

// =================================================================================================
// Tolerance scaling
// =================================================================================================

fn bench_tolerance(c: &mut Criterion) {
    let mut group = c.benchmark_group("dopri5_tolerance");
    let scenario = outbreak_scenario();
    let solver = DormandPrince45::new();

    for rtol in [1e-6, 1e-9, 1e-12] {
        let config = SolverConfiguration::adaptive(rtol, rtol * 1e-3);
        group.bench_with_input(BenchmarkId::from_parameter(rtol), &config, |b, config| {
            b.iter(|| solver.solve(black_box(&scenario), black_box(config)).unwrap())
        });
    }

    group.finish();
}

// =================================================================================================
// Stiff aftermath
// =================================================================================================

fn bench_large_city(c: &mut Criterion) {
    let params = ModelParameters::builder().initial_living(1e6).initial_infected(1.0).build();
    let scenario =
        Scenario::new(Box::new(ZombieApocalypse::new(&params)), params.time_span().clone());
    let solver = StiffnessSwitching::new();
    let config = SolverConfiguration::default();

    c.bench_function("switching_city_1e6", |b| {
        b.iter(|| solver.solve(black_box(&scenario), black_box(&config)).unwrap())
    });
}

// =================================================================================================
// Batch
// =================================================================================================

fn bench_batch(c: &mut Criterion) {
    let batch: Vec<ModelParameters> = (1..=8)
        .map(|i| {
            ModelParameters::builder()
                .initial_infected(1.0)
                .transmission_percent(10.0 * i as f64)
                .build()
        })
        .collect();

    c.bench_function("batch_8_outbreaks", |b| b.iter(|| simulate_batch(black_box(&batch))));
}

criterion_group!(benches, bench_comparison, bench_tolerance, bench_large_city, bench_batch);
criterion_main!(benches);
