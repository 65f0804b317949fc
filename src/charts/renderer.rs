//! Drawing code for the six analysis charts.
//!
//! All charts are 2D cartesian plots on a [`BitMapBackend`]. Categorical axes
//! are drawn on an `f64` range where category `i` is centred on `i`, with one
//! bar or box per content source side by side inside each category.

use super::series::{
    auto_bin_count, gaussian_kde, linear_fit, mean_confidence_interval, normal_qq_points,
    padded_range, BoxStats, Histogram,
};
use super::theme::ChartTheme;
use super::{ChartKind, ChartOutcome, RenderError, Result};
use crate::analysis::{self, stats};
use crate::models::{FactorLevels, GroupKey, Observation};
use indicatif::{ProgressBar, ProgressStyle};
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Share of a category's width taken up by its bars.
const GROUP_WIDTH: f64 = 0.8;

fn area_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::DrawingArea(e.to_string())
}

fn config_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::ChartConfig(e.to_string())
}

fn draw_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Axis range holding `n` categories centred on `0..n`.
pub fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Tick label for a categorical axis; blank between categories.
pub fn category_label(labels: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    labels.get(nearest as usize).cloned().unwrap_or_default()
}

/// Horizontal extent of series `series` (of `series_count`) within `category`.
pub fn bar_span(category: usize, series: usize, series_count: usize) -> (f64, f64) {
    let width = GROUP_WIDTH / series_count.max(1) as f64;
    let left = category as f64 - GROUP_WIDTH / 2.0 + width * series as f64;
    (left, left + width)
}

fn values_of<F>(observations: &[Observation], key: &GroupKey, value: F) -> Vec<f64>
where
    F: Fn(&Observation) -> f64,
{
    analysis::group_members(observations, key)
        .map(value)
        .collect()
}

/// Renders chart files into an output directory.
pub struct ChartRenderer {
    theme: ChartTheme,
    output_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(theme: ChartTheme, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            theme,
            output_dir: output_dir.into(),
        }
    }

    /// Where a chart is written.
    pub fn output_path(&self, kind: ChartKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    /// Render every chart, isolating failures. Returns one outcome per chart.
    pub fn render_all(
        &self,
        observations: &[Observation],
        levels: &FactorLevels,
        show_progress: bool,
    ) -> Vec<ChartOutcome> {
        let progress = if show_progress {
            let pb = ProgressBar::new(ChartKind::ALL.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let outcomes: Vec<ChartOutcome> = ChartKind::ALL
            .iter()
            .map(|&kind| {
                progress.set_message(kind.file_name());
                let path = self.output_path(kind);
                let result = self.render(kind, &path, observations, levels);

                match &result {
                    Ok(()) => debug!("Rendered {}", path.display()),
                    Err(e) => warn!("Skipping chart {}: {}", kind, e),
                }
                progress.inc(1);

                ChartOutcome { kind, path, result }
            })
            .collect();

        progress.finish_and_clear();
        info!(
            "Rendered {}/{} charts",
            outcomes.iter().filter(|o| o.is_ok()).count(),
            outcomes.len()
        );
        outcomes
    }

    /// Render a single chart to `path`.
    pub fn render(
        &self,
        kind: ChartKind,
        path: &Path,
        observations: &[Observation],
        levels: &FactorLevels,
    ) -> Result<()> {
        match kind {
            ChartKind::EngagementDistribution => self.draw_engagement(path, observations, levels),
            ChartKind::PersuasivenessBoxplot => self.draw_persuasiveness_box(path, observations, levels),
            ChartKind::DonationMeans => self.draw_donation_means(path, observations, levels),
            ChartKind::DonationHistogram => self.draw_donation_histogram(path, observations, levels),
            ChartKind::PersuasivenessHistogram => self.draw_persuasiveness_histogram(path, observations),
            ChartKind::PersuasivenessQqPlot => self.draw_persuasiveness_qq(path, observations),
        }
    }

    fn canvas<'a>(&self, path: &'a Path) -> Result<DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>> {
        let root = BitMapBackend::new(path, (self.theme.width, self.theme.height)).into_drawing_area();
        root.fill(&self.theme.background).map_err(area_error)?;
        Ok(root)
    }

    /// Grouped count bars, one panel per gender.
    fn draw_engagement(
        &self,
        path: &Path,
        observations: &[Observation],
        levels: &FactorLevels,
    ) -> Result<()> {
        let table = analysis::engagement_table(observations, levels);
        if table.total() == 0 {
            return Err(RenderError::NoData("no rated observations".to_string()));
        }

        let y_max = table
            .rows
            .iter()
            .flat_map(|r| r.counts.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.1;

        let root = self.canvas(path)?;
        let root = root
            .titled(ChartKind::EngagementDistribution.title(), self.theme.caption_font())
            .map_err(area_error)?;
        let panels = root.split_evenly((1, levels.genders.len().max(1)));
        let source_count = levels.content_sources.len();

        for (panel, gender) in panels.iter().zip(&levels.genders) {
            let mut chart = ChartBuilder::on(panel)
                .caption(gender, self.theme.label_font())
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(60)
                .build_cartesian_2d(category_range(levels.ratings.len()), 0.0..y_max)
                .map_err(config_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(levels.ratings.len())
                .x_label_formatter(&|x| category_label(&levels.ratings, *x))
                .x_desc("Engagement Rating")
                .y_desc("Count")
                .label_style(self.theme.label_font())
                .draw()
                .map_err(draw_error)?;

            for (si, source) in levels.content_sources.iter().enumerate() {
                let color = self.theme.series_color(si);
                let key = GroupKey::new(gender, source);
                let counts = table
                    .rows
                    .iter()
                    .find(|r| r.group == key)
                    .map(|r| r.counts.clone())
                    .unwrap_or_default();

                chart
                    .draw_series(counts.iter().enumerate().map(|(ri, &count)| {
                        let (x0, x1) = bar_span(ri, si, source_count);
                        Rectangle::new([(x0, 0.0), (x1, count as f64)], color.filled())
                    }))
                    .map_err(draw_error)?
                    .label(source.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(self.theme.label_font())
                .draw()
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Box per gender × content source.
    fn draw_persuasiveness_box(
        &self,
        path: &Path,
        observations: &[Observation],
        levels: &FactorLevels,
    ) -> Result<()> {
        let all: Vec<f64> = observations.iter().map(|o| o.persuasiveness).collect();
        let (y_lo, y_hi) = padded_range(stats::min(&all), stats::max(&all), 0.1)
            .ok_or_else(|| RenderError::NoData("no persuasiveness scores".to_string()))?;

        let root = self.canvas(path)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::PersuasivenessBoxplot.title(), self.theme.caption_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(category_range(levels.genders.len()), y_lo..y_hi)
            .map_err(config_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(levels.genders.len())
            .x_label_formatter(&|x| category_label(&levels.genders, *x))
            .x_desc("gender")
            .y_desc("persuasiveness")
            .label_style(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        let source_count = levels.content_sources.len();
        for (si, source) in levels.content_sources.iter().enumerate() {
            let color = self.theme.series_color(si);
            let boxes: Vec<(f64, f64, f64, BoxStats)> = levels
                .genders
                .iter()
                .enumerate()
                .filter_map(|(gi, gender)| {
                    let values = values_of(observations, &GroupKey::new(gender, source), |o| {
                        o.persuasiveness
                    });
                    let (x0, x1) = bar_span(gi, si, source_count);
                    let inset = (x1 - x0) * 0.1;
                    BoxStats::from_values(&values)
                        .map(|b| (x0 + inset, x1 - inset, (x0 + x1) / 2.0, b))
                })
                .collect();

            chart
                .draw_series(boxes.iter().map(|(x0, x1, _, b)| {
                    Rectangle::new([(*x0, b.q1), (*x1, b.q3)], color.mix(0.75).filled())
                }))
                .map_err(draw_error)?
                .label(source.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            chart
                .draw_series(boxes.iter().map(|(x0, x1, _, b)| {
                    Rectangle::new([(*x0, b.q1), (*x1, b.q3)], BLACK.stroke_width(1))
                }))
                .map_err(draw_error)?;

            chart
                .draw_series(boxes.iter().flat_map(|(x0, x1, xc, b)| {
                    let cap = (x1 - x0) / 4.0;
                    vec![
                        PathElement::new(vec![(*x0, b.median), (*x1, b.median)], BLACK.stroke_width(2)),
                        PathElement::new(vec![(*xc, b.q3), (*xc, b.upper_whisker)], BLACK.stroke_width(1)),
                        PathElement::new(vec![(*xc, b.q1), (*xc, b.lower_whisker)], BLACK.stroke_width(1)),
                        PathElement::new(
                            vec![(xc - cap, b.upper_whisker), (xc + cap, b.upper_whisker)],
                            BLACK.stroke_width(1),
                        ),
                        PathElement::new(
                            vec![(xc - cap, b.lower_whisker), (xc + cap, b.lower_whisker)],
                            BLACK.stroke_width(1),
                        ),
                    ]
                }))
                .map_err(draw_error)?;

            chart
                .draw_series(boxes.iter().flat_map(|(_, _, xc, b)| {
                    b.outliers
                        .iter()
                        .map(move |v| Circle::new((*xc, *v), 3, BLACK.filled()))
                }))
                .map_err(draw_error)?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Mean donation bars with Student-t confidence intervals.
    fn draw_donation_means(
        &self,
        path: &Path,
        observations: &[Observation],
        levels: &FactorLevels,
    ) -> Result<()> {
        let source_count = levels.content_sources.len();
        let mut bars = Vec::new();
        for (si, source) in levels.content_sources.iter().enumerate() {
            for (gi, gender) in levels.genders.iter().enumerate() {
                let values = values_of(observations, &GroupKey::new(gender, source), |o| {
                    o.donation_amount
                });
                if let Some(ci) = mean_confidence_interval(&values, self.theme.ci_level) {
                    let (x0, x1) = bar_span(gi, si, source_count);
                    bars.push((si, x0, x1, ci));
                }
            }
        }
        if bars.is_empty() {
            return Err(RenderError::NoData("no donation amounts".to_string()));
        }

        let y_lo = bars.iter().map(|b| b.3 .1).fold(0.0, f64::min);
        let y_hi = bars.iter().map(|b| b.3 .2).fold(0.0, f64::max);
        let (y_lo, y_hi) = if y_hi > y_lo {
            (y_lo, y_hi * 1.1)
        } else {
            (y_lo, y_lo + 1.0)
        };

        let root = self.canvas(path)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::DonationMeans.title(), self.theme.caption_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(category_range(levels.genders.len()), y_lo..y_hi)
            .map_err(config_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(levels.genders.len())
            .x_label_formatter(&|x| category_label(&levels.genders, *x))
            .x_desc("gender")
            .y_desc("Mean Donation Amount ($)")
            .label_style(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        for (si, source) in levels.content_sources.iter().enumerate() {
            let color = self.theme.series_color(si);
            let series: Vec<_> = bars.iter().filter(|b| b.0 == si).collect();

            chart
                .draw_series(series.iter().map(|(_, x0, x1, (mean, _, _))| {
                    Rectangle::new([(*x0, 0.0), (*x1, *mean)], color.mix(0.85).filled())
                }))
                .map_err(draw_error)?
                .label(source.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            chart
                .draw_series(series.iter().flat_map(|(_, x0, x1, (_, low, high))| {
                    let xc = (x0 + x1) / 2.0;
                    let cap = (x1 - x0) / 6.0;
                    vec![
                        PathElement::new(vec![(xc, *low), (xc, *high)], BLACK.stroke_width(2)),
                        PathElement::new(vec![(xc - cap, *low), (xc + cap, *low)], BLACK.stroke_width(2)),
                        PathElement::new(vec![(xc - cap, *high), (xc + cap, *high)], BLACK.stroke_width(2)),
                    ]
                }))
                .map_err(draw_error)?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Facet grid of donation histograms: rows by content source, columns by gender.
    fn draw_donation_histogram(
        &self,
        path: &Path,
        observations: &[Observation],
        levels: &FactorLevels,
    ) -> Result<()> {
        let all: Vec<f64> = observations.iter().map(|o| o.donation_amount).collect();
        let range = padded_range(stats::min(&all), stats::max(&all), 0.0)
            .ok_or_else(|| RenderError::NoData("no donation amounts".to_string()))?;

        let rows = levels.content_sources.len().max(1);
        let cols = levels.genders.len().max(1);

        let mut facets = Vec::with_capacity(rows * cols);
        for source in &levels.content_sources {
            for gender in &levels.genders {
                let key = GroupKey::new(gender, source);
                let values = values_of(observations, &key, |o| o.donation_amount);
                facets.push((key, Histogram::new(&values, range, self.theme.donation_bins)));
            }
        }
        // Panels share the y axis
        let y_max = facets
            .iter()
            .map(|(_, h)| h.max_count())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.1;

        let root = self.canvas(path)?;
        let root = root
            .titled(ChartKind::DonationHistogram.title(), self.theme.caption_font())
            .map_err(area_error)?;
        let panels = root.split_evenly((rows, cols));
        let color = self.theme.series_color(1);

        for (panel, (key, histogram)) in panels.iter().zip(&facets) {
            let caption = format!(
                "gender = {} | content_source = {}",
                key.gender, key.content_source
            );
            let mut chart = ChartBuilder::on(panel)
                .caption(caption, self.theme.label_font())
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(range.0..range.1, 0.0..y_max)
                .map_err(config_error)?;

            chart
                .configure_mesh()
                .x_desc("donation_amount")
                .y_desc("Count")
                .label_style(self.theme.label_font())
                .draw()
                .map_err(draw_error)?;

            chart
                .draw_series(histogram.bars().map(|(left, right, count)| {
                    Rectangle::new([(left, 0.0), (right, count as f64)], color.mix(0.8).filled())
                }))
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Histogram of the composite score with a KDE curve scaled to counts.
    fn draw_persuasiveness_histogram(&self, path: &Path, observations: &[Observation]) -> Result<()> {
        let values: Vec<f64> = stats::present(
            &observations
                .iter()
                .map(|o| o.persuasiveness)
                .collect::<Vec<_>>(),
        );
        let range = padded_range(stats::min(&values), stats::max(&values), 0.0)
            .ok_or_else(|| RenderError::NoData("no persuasiveness scores".to_string()))?;

        let histogram = Histogram::new(&values, range, auto_bin_count(&values));
        let scale = values.len() as f64 * histogram.bin_width();
        let curve: Vec<(f64, f64)> = gaussian_kde(&values, 200)
            .unwrap_or_default()
            .into_iter()
            .map(|(x, density)| (x, density * scale))
            .collect();

        let x_lo = curve.first().map_or(range.0, |p| p.0.min(range.0));
        let x_hi = curve.last().map_or(range.1, |p| p.0.max(range.1));
        let y_max = curve
            .iter()
            .map(|p| p.1)
            .fold(histogram.max_count().max(1) as f64, f64::max)
            * 1.1;

        let root = self.canvas(path)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::PersuasivenessHistogram.title(), self.theme.caption_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)
            .map_err(config_error)?;

        chart
            .configure_mesh()
            .x_desc("persuasiveness")
            .y_desc("Count")
            .label_style(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        let color = self.theme.series_color(1);
        chart
            .draw_series(histogram.bars().map(|(left, right, count)| {
                Rectangle::new([(left, 0.0), (right, count as f64)], color.mix(0.6).filled())
            }))
            .map_err(draw_error)?;

        if !curve.is_empty() {
            chart
                .draw_series(LineSeries::new(curve, color.stroke_width(2)))
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }

    /// Normal Q-Q plot with a least-squares reference line.
    fn draw_persuasiveness_qq(&self, path: &Path, observations: &[Observation]) -> Result<()> {
        let values: Vec<f64> = observations.iter().map(|o| o.persuasiveness).collect();
        let points = normal_qq_points(&values);
        if points.is_empty() {
            return Err(RenderError::NoData("no persuasiveness scores".to_string()));
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let no_range = || RenderError::NoData("non-finite quantiles".to_string());
        let (x_lo, x_hi) = padded_range(stats::min(&xs), stats::max(&xs), 0.05).ok_or_else(no_range)?;
        let (y_lo, y_hi) = padded_range(stats::min(&ys), stats::max(&ys), 0.05).ok_or_else(no_range)?;

        let root = self.canvas(path)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(ChartKind::PersuasivenessQqPlot.title(), self.theme.caption_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
            .map_err(config_error)?;

        chart
            .configure_mesh()
            .x_desc("Theoretical quantiles")
            .y_desc("Ordered Values")
            .label_style(self.theme.label_font())
            .draw()
            .map_err(draw_error)?;

        let color = self.theme.series_color(3);
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))
            .map_err(draw_error)?;

        if let Some((slope, intercept)) = linear_fit(&points) {
            let line = vec![(x_lo, intercept + slope * x_lo), (x_hi, intercept + slope * x_hi)];
            chart
                .draw_series(LineSeries::new(line, self.theme.accent.stroke_width(2)))
                .map_err(draw_error)?;
        }

        root.present().map_err(draw_error)?;
        Ok(())
    }
}
