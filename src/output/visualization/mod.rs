//! Visualization of outbreak trajectories
//!
//! # Organization
//!
//! - **config**: plot configuration (`PlotConfig`)
//! - **render**: the [`Renderer`] strategy and its `plotters` implementation
//!
//! The core simulation only produces numbers. Anything that turns them into
//! an image goes through [`Renderer`], so a different charting backend can
//! be injected without touching the simulator.

pub mod config;
pub mod render;

pub use config::PlotConfig;
pub use render::{render_trajectory, ImageFormat, PlottersRenderer, RenderError, Renderer};
