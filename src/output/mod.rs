//! Output of simulation results
//!
//! - **Visualization**: PNG/SVG line charts through `plotters`
//! - **Export**: CSV files for external analysis
//!
//! ```text
//! output/
//! ├── visualization/
//! │   ├── config.rs   ← PlotConfig
//! │   └── render.rs   ← Renderer, PlottersRenderer
//! └── export/
//!     └── csv.rs      ← CsvExporter
//! ```
//!
//! Both work on a [`Trajectory`](crate::Trajectory) or plain `&[f64]` series.

pub mod export;
pub mod visualization;

pub use export::{export_trajectory_csv, CsvConfig, CsvExporter, CsvMetadata, ExportError, Exporter};
pub use visualization::{
    render_trajectory, ImageFormat, PlotConfig, PlottersRenderer, RenderError, Renderer,
};
