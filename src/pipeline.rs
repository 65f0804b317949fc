//! End-to-end analysis run.
//!
//! Stages run strictly in order: load, aggregate, charts, report. Loading
//! happens before anything is written, so a fatal input error leaves the
//! output directory untouched.

use crate::analysis;
use crate::charts::{ChartRenderer, ChartTheme};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::loader::{self, LoadOptions};
use crate::models::{AnalysisReport, DataQualityWarning};
use crate::report::{self, console};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Per-run settings that do not belong in the config file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub dry_run: bool,
    pub show_progress: bool,
    /// Print diagnostics and tables to stdout.
    pub print_console: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            format: OutputFormat::Markdown,
            dry_run: false,
            show_progress: false,
            print_console: false,
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub report: AnalysisReport,
    /// `None` on a dry run.
    pub report_path: Option<PathBuf>,
    pub charts_rendered: usize,
    pub charts_failed: usize,
    pub warnings: Vec<DataQualityWarning>,
}

/// Run the complete analysis.
pub fn run(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    let input = &config.input.path;
    let dataset = loader::load_dataset(input, &LoadOptions::from(config))
        .with_context(|| format!("Failed to load dataset {}", input.display()))?;

    let levels = analysis::factor_levels(&dataset.observations, &config.factors);
    info!(
        "Factor levels: {} genders, {} content sources, {} ratings",
        levels.genders.len(),
        levels.content_sources.len(),
        levels.ratings.len()
    );
    let descriptives = analysis::describe_dataset(&dataset.observations, &levels);
    for warning in &descriptives.warnings {
        warn!("{}", warning);
    }

    let mut warnings = dataset.warnings.clone();
    warnings.extend(descriptives.warnings.iter().cloned());

    let report = AnalysisReport {
        source: input.display().to_string(),
        diagnostics: dataset.diagnostics,
        reliability: dataset.reliability,
        descriptives,
    };

    if options.print_console {
        console::print_diagnostics(&report.diagnostics);
        console::print_reliability(&report.reliability);
        console::print_descriptives(&report.descriptives, config.report.decimals);
        console::print_warnings(&warnings);
    }

    if options.dry_run {
        info!("Dry run: no files written");
        return Ok(RunSummary {
            report,
            report_path: None,
            charts_rendered: 0,
            charts_failed: 0,
            warnings,
        });
    }

    let (charts_rendered, charts_failed) = if config.charts.enabled {
        let renderer = ChartRenderer::new(ChartTheme::from(&config.charts), &options.output_dir);
        let outcomes = renderer.render_all(&dataset.observations, &levels, options.show_progress);
        if options.print_console {
            console::print_chart_outcomes(&outcomes);
        }
        let rendered = outcomes.iter().filter(|o| o.is_ok()).count();
        (rendered, outcomes.len() - rendered)
    } else {
        info!("Chart rendering disabled");
        (0, 0)
    };

    let content = match options.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };
    let report_path = options.output_dir.join(&config.report.output);
    report::write_report_atomic(&report_path, &content)?;
    info!("Report written to {}", report_path.display());

    Ok(RunSummary {
        report,
        report_path: Some(report_path),
        charts_rendered,
        charts_failed,
        warnings,
    })
}
