//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::CompositePolicy;
use clap::Parser;
use std::path::PathBuf;

/// AppealStats - descriptive analysis of donation-appeal experiments
///
/// Loads a long-format ratings CSV, checks it, summarizes engagement,
/// persuasiveness and donations by gender and content source, renders
/// six charts and writes a Markdown summary.
///
/// Examples:
///   appealstats
///   appealstats --input data/Data_LongFormat.csv --output-dir out
///   appealstats --dry-run --verbose
///   appealstats --format json --output analysis_summary.json
///   appealstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Long-format CSV file to analyze
    ///
    /// Defaults to Data_LongFormat.csv, or the [input] path in .appealstats.toml.
    #[arg(short, long, value_name = "FILE", env = "APPEALSTATS_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory that receives the charts and the report
    #[arg(short = 'd', long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Report file name (relative to --output-dir)
    ///
    /// Defaults to analysis_summary.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .appealstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Missing-item policy for the persuasiveness composite
    ///
    /// strict: missing if any item is missing. available: mean of present items.
    #[arg(long, value_name = "POLICY")]
    pub composite_policy: Option<CompositePolicy>,

    /// Decimal places for numbers in the report
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Do not render any charts
    #[arg(long)]
    pub skip_charts: bool,

    /// Dry run: load, validate and print the tables without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .appealstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(decimals) = self.decimals {
            if decimals > 12 {
                return Err("Decimals must be between 0 and 12".to_string());
            }
        }

        // The output directory is only touched when files are written
        if !self.dry_run {
            if !self.output_dir.exists() {
                return Err(format!(
                    "Output directory does not exist: {}",
                    self.output_dir.display()
                ));
            }
            if !self.output_dir.is_dir() {
                return Err(format!(
                    "Output path is not a directory: {}",
                    self.output_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("data.csv")),
            output_dir: PathBuf::from("."),
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            format: OutputFormat::Markdown,
            composite_policy: None,
            decimals: None,
            skip_charts: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["appealstats"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.output.is_none());
        assert!(!args.skip_charts);
    }

    #[test]
    fn test_parse_policy_and_format() {
        let args = Args::try_parse_from([
            "appealstats",
            "--composite-policy",
            "available",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.composite_policy, Some(CompositePolicy::Available));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_output_dir() {
        let mut args = make_args();
        args.output_dir = PathBuf::from("definitely/not/a/real/dir");
        assert!(args.validate().is_err());

        // Nothing is written on a dry run
        args.dry_run = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_decimals() {
        let mut args = make_args();
        args.decimals = Some(20);
        assert!(args.validate().is_err());
        args.decimals = Some(3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
