//! Models
//!
//! - [`parameters`]: immutable run configuration and its defaults
//! - [`zombie`]: the SZR outbreak equations

pub mod parameters;
pub mod zombie;

pub use parameters::{ModelParameters, ParametersBuilder, Rates, TimeSpan, MAX_TIME_SAMPLES};
pub use zombie::ZombieApocalypse;
