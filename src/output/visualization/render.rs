//! Rendering of outbreak curves to encoded images
//!
//! The simulator never draws anything itself. A [`Renderer`] receives the
//! shared x values, labelled y series and a title, and returns the encoded
//! image bytes. [`PlottersRenderer`] is the stock implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use zombie_rs::output::visualization::{render_trajectory, ImageFormat, PlottersRenderer};
//! use zombie_rs::{ModelParameters, Simulator};
//!
//! let simulator = Simulator::new(ModelParameters::builder().initial_infected(1.0).build());
//! let trajectory = simulator.solve().unwrap();
//!
//! let renderer = PlottersRenderer::new(ImageFormat::Png);
//! let png = render_trajectory(&renderer, &trajectory, &simulator.summary_label(), false).unwrap();
//! std::fs::write("outbreak.png", png).unwrap();
//! ```

use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::output::visualization::PlotConfig;
use crate::trajectory::Trajectory;

/// Rendering failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("nothing to plot: {0}")]
    EmptyData(String),

    #[error("series `{label}` has {got} values, expected {expected}")]
    LengthMismatch {
        label: String,
        expected: usize,
        got: usize,
    },

    #[error("series `{0}` contains NaN or infinite values")]
    NonFinite(String),

    #[error("drawing failed: {0}")]
    Backend(String),

    #[error("image encoding failed: {0}")]
    Encoding(String),
}

/// Turns labelled series into an encoded image
///
/// Implementations must be usable from several threads at once.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        x: &[f64],
        series: &[(&str, &[f64])],
        title: &str,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Output encoding of [`PlottersRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    /// Guess from a file extension, PNG unless it is `.svg`
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageFormat::Svg,
            _ => ImageFormat::Png,
        }
    }
}

/// Line chart renderer built on `plotters`
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer {
    pub format: ImageFormat,
    pub config: PlotConfig,
}

impl PlottersRenderer {
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            config: PlotConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlotConfig) -> Self {
        self.config = config;
        self
    }
}

impl Renderer for PlottersRenderer {
    fn render(
        &self,
        x: &[f64],
        series: &[(&str, &[f64])],
        title: &str,
    ) -> Result<Vec<u8>, RenderError> {
        validate(x, series)?;
        let (width, height) = (self.config.width, self.config.height);

        match self.format {
            ImageFormat::Png => {
                let mut pixels = vec![0u8; width as usize * height as usize * 3];
                {
                    let backend = BitMapBackend::with_buffer(&mut pixels, (width, height));
                    draw_chart(backend, x, series, title, &self.config)?;
                }

                let mut png = Vec::new();
                PngEncoder::new(&mut png)
                    .write_image(&pixels, width, height, ColorType::Rgb8)
                    .map_err(|e| RenderError::Encoding(e.to_string()))?;
                Ok(png)
            }
            ImageFormat::Svg => {
                let mut svg = String::new();
                {
                    let backend = SVGBackend::with_string(&mut svg, (width, height));
                    draw_chart(backend, x, series, title, &self.config)?;
                }
                Ok(svg.into_bytes())
            }
        }
    }
}

/// Render a trajectory with the standard series labels
pub fn render_trajectory(
    renderer: &dyn Renderer,
    trajectory: &Trajectory,
    title: &str,
    show_dead: bool,
) -> Result<Vec<u8>, RenderError> {
    renderer.render(trajectory.times(), &trajectory.plot_series(show_dead), title)
}

// =================================================================================================
// Drawing
// =================================================================================================

fn validate(x: &[f64], series: &[(&str, &[f64])]) -> Result<(), RenderError> {
    if x.len() < 2 {
        return Err(RenderError::EmptyData(format!("need at least 2 x values, got {}", x.len())));
    }
    if series.is_empty() {
        return Err(RenderError::EmptyData("no series".to_string()));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(RenderError::NonFinite("x".to_string()));
    }

    for (label, values) in series {
        if values.len() != x.len() {
            return Err(RenderError::LengthMismatch {
                label: label.to_string(),
                expected: x.len(),
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::NonFinite(label.to_string()));
        }
    }
    Ok(())
}

fn backend_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Backend(err.to_string())
}

/// Axis ranges covering every point, always including y = 0
fn axis_ranges(x: &[f64], series: &[(&str, &[f64])]) -> ((f64, f64), (f64, f64)) {
    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let values = series.iter().flat_map(|(_, values)| values.iter().copied());
    let (y_min, y_max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let span = (y_max - y_min).max(1e-10);
    let pad_below = if y_min < 0.0 { 0.05 * span } else { 0.0 };
    ((x_min, x_max), (y_min - pad_below, y_max + 0.05 * span))
}

fn draw_chart<DB: DrawingBackend>(
    backend: DB,
    x: &[f64],
    series: &[(&str, &[f64])],
    title: &str,
    config: &PlotConfig,
) -> Result<(), RenderError>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background).map_err(backend_error)?;

    // Multi-line title drawn by hand: captions are single-line
    let lines: Vec<&str> = title.lines().collect();
    let line_height = config.title_font_size + 4;
    let title_height = (line_height * lines.len() as u32 + 10) as i32;
    let (title_area, plot_area) = root.split_vertically(title_height);

    let title_style = TextStyle::from(("sans-serif", f64::from(config.title_font_size)).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (i, line) in lines.iter().enumerate() {
        let y = 5 + (i as u32 * line_height) as i32;
        title_area
            .draw_text(line, &title_style, ((config.width / 2) as i32, y))
            .map_err(backend_error)?;
    }

    let ((x_min, x_max), (y_min, y_max)) = axis_ranges(x, series);

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(backend_error)?;

    let x_formatter = |v: &f64| format!("{:.1}", v);
    let y_formatter = |v: &f64| format!("{:.0}", v);

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(config.xlabel.as_str())
        .y_desc(config.ylabel.as_str())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter);
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(backend_error)?;

    for (i, (label, values)) in series.iter().enumerate() {
        let color = config.series_color(i);

        chart
            .draw_series(LineSeries::new(
                x.iter().copied().zip(values.iter().copied()),
                ShapeStyle::from(&color).stroke_width(config.line_width),
            ))
            .map_err(backend_error)?
            .label(*label)
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], &color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(backend_error)?;

    root.present().map_err(backend_error)?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
