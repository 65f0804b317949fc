//! Chart rendering.
//!
//! Six fixed PNG charts are produced with [`plotters`]' bitmap backend.
//! Each chart is rendered on its own; a failure is reported for that chart
//! and the remaining charts are still attempted.

pub mod renderer;
pub mod series;
pub mod theme;

pub use renderer::ChartRenderer;
pub use theme::ChartTheme;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering a single chart.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No data to plot: {0}")]
    NoData(String),

    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),
}

pub type Result<T> = core::result::Result<T, RenderError>;

/// The fixed set of charts, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    EngagementDistribution,
    PersuasivenessBoxplot,
    DonationMeans,
    DonationHistogram,
    PersuasivenessHistogram,
    PersuasivenessQqPlot,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::EngagementDistribution,
        ChartKind::PersuasivenessBoxplot,
        ChartKind::DonationMeans,
        ChartKind::DonationHistogram,
        ChartKind::PersuasivenessHistogram,
        ChartKind::PersuasivenessQqPlot,
    ];

    /// Output file name. These names are part of the tool's output contract.
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::EngagementDistribution => "engagement_distribution.png",
            ChartKind::PersuasivenessBoxplot => "persuasiveness_boxplot.png",
            ChartKind::DonationMeans => "donation_means.png",
            ChartKind::DonationHistogram => "donation_histogram.png",
            ChartKind::PersuasivenessHistogram => "persuasiveness_histogram.png",
            ChartKind::PersuasivenessQqPlot => "persuasiveness_qqplot.png",
        }
    }

    /// Caption drawn at the top of the chart.
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::EngagementDistribution => "Engagement Rating by Gender and Content Source",
            ChartKind::PersuasivenessBoxplot => "Persuasiveness Scores by Gender and Content Source",
            ChartKind::DonationMeans => "Mean Donation Amount by Gender and Content Source",
            ChartKind::DonationHistogram => "Donation Amount by Gender and Content Source",
            ChartKind::PersuasivenessHistogram => "Distribution of Persuasiveness Scores",
            ChartKind::PersuasivenessQqPlot => "Q-Q Plot of Persuasiveness Scores",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// What happened to one chart.
#[derive(Debug)]
pub struct ChartOutcome {
    pub kind: ChartKind,
    pub path: PathBuf,
    pub result: Result<()>,
}

impl ChartOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_chart_file_names_unique() {
        let names: HashSet<_> = ChartKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names.len(), 6);
        assert!(names.contains("persuasiveness_qqplot.png"));
        assert!(names.iter().all(|n| n.ends_with(".png")));
    }

    #[test]
    fn test_render_error_display() {
        let err = RenderError::NoData("persuasiveness".to_string());
        assert_eq!(err.to_string(), "No data to plot: persuasiveness");
    }
}
