//! Plot configuration
//!
//! Shared by every renderer. The defaults reproduce the classic outbreak
//! figure: days on the x axis, head count on the y axis, one line per
//! compartment with a legend.

use plotters::prelude::*;

/// Blue, orange, green (the usual matplotlib cycle)
const DEFAULT_PALETTE: [RGBColor; 3] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
];

/// Configuration for customizing plots
///
/// # Example
///
/// ```rust
/// use zombie_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let mut config = PlotConfig::default();
/// config.width = 1920;
/// config.height = 1080;
/// config.series_colors = Some(vec![BLACK, RED]);
/// assert_eq!(config.xlabel, "Days from outbreak");
/// ```
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 800)
    pub width: u32,

    /// Image height in pixels (default: 600)
    pub height: u32,

    /// X-axis label (default: "Days from outbreak")
    pub xlabel: String,

    /// Y-axis label (default: "Population")
    pub ylabel: String,

    /// Optional colors, one per series
    ///
    /// Falls back to the default palette for missing entries.
    pub series_colors: Option<Vec<RGBColor>>,

    /// Background color (default: WHITE)
    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    /// Show grid lines (default: true)
    pub show_grid: bool,

    /// Font size of each title line (default: 16)
    pub title_font_size: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            xlabel: "Days from outbreak".to_string(),
            ylabel: "Population".to_string(),
            series_colors: None,
            background: WHITE,
            line_width: 2,
            show_grid: true,
            title_font_size: 16,
        }
    }
}

impl PlotConfig {
    /// Default configuration with another image size
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Color of the series at `index`
    pub(crate) fn series_color(&self, index: usize) -> RGBColor {
        if let Some(colors) = &self.series_colors {
            if let Some(color) = colors.get(index) {
                return *color;
            }
        }
        DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
    }
}

// =================================================================================================
// Tests
// =================================================================================================
