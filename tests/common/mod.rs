//! Common utilities for integration tests

#![allow(dead_code, unused_imports)]

pub mod mock_models;
pub mod test_helpers;

pub use mock_models::{ConstantGrowth, ExponentialDecay};
pub use test_helpers::{assert_series_close, relative_error, single_interval_scenario};
