//! Helper functions for integration tests

use zombie_rs::models::TimeSpan;
use zombie_rs::physics::CompartmentModel;
use zombie_rs::solver::Scenario;

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Assert two series agree point by point within a mixed tolerance
pub fn assert_series_close(actual: &[f64], expected: &[f64], tolerance: f64, message: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: length mismatch", message);

    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance * (1.0 + e.abs()),
            "{}: element {} differs by {} ({} vs {})",
            message, i, diff, a, e
        );
    }
}

/// Scenario integrating `model` from 0 to `end` with no intermediate samples
pub fn single_interval_scenario(model: Box<dyn CompartmentModel>, end: f64) -> Scenario {
    let span = TimeSpan::new(vec![0.0, end]).expect("valid span");
    Scenario::new(model, span)
}
