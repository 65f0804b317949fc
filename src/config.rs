//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.appealstats.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".appealstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input dataset settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Factor level settings.
    #[serde(default)]
    pub factors: FactorConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// How the composite persuasiveness score treats missing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompositePolicy {
    /// Missing if any item is missing.
    #[default]
    Strict,
    /// Mean of the items that are present.
    Available,
}

/// Input dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the long-format CSV file.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Lowest point of the persuasiveness Likert scale.
    #[serde(default = "default_likert_min")]
    pub likert_min: f64,

    /// Highest point of the persuasiveness Likert scale.
    #[serde(default = "default_likert_max")]
    pub likert_max: f64,

    /// Missing-item policy for the composite score.
    #[serde(default)]
    pub composite_policy: CompositePolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            likert_min: default_likert_min(),
            likert_max: default_likert_max(),
            composite_policy: CompositePolicy::default(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("Data_LongFormat.csv")
}

fn default_likert_min() -> f64 {
    1.0
}

fn default_likert_max() -> f64 {
    7.0
}

/// Factor level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorConfig {
    /// Expected gender levels, in display order. Observed extras are appended.
    #[serde(default)]
    pub genders: Vec<String>,

    /// Expected content source levels, in display order.
    #[serde(default)]
    pub content_sources: Vec<String>,

    /// Engagement rating levels from lowest to highest; position i encodes as i + 1.
    #[serde(default = "default_engagement_levels")]
    pub engagement_levels: Vec<String>,
}

impl Default for FactorConfig {
    fn default() -> Self {
        Self {
            genders: Vec::new(),
            content_sources: Vec::new(),
            engagement_levels: default_engagement_levels(),
        }
    }
}

fn default_engagement_levels() -> Vec<String> {
    vec!["Dislike", "Neutral", "Like"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Render charts at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Font family for captions and labels.
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Series colours as `#rrggbb`, cycled by content source.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    /// Bin count for the faceted donation histogram.
    #[serde(default = "default_donation_bins")]
    pub donation_bins: usize,

    /// Confidence level for the donation mean error bars.
    #[serde(default = "default_ci_level")]
    pub ci_level: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: default_width(),
            height: default_height(),
            font_family: default_font_family(),
            palette: default_palette(),
            donation_bins: default_donation_bins(),
            ci_level: default_ci_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    800
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

fn default_palette() -> Vec<String> {
    vec!["#440154", "#21918c", "#fde725", "#3b528b"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_donation_bins() -> usize {
    20
}

fn default_ci_level() -> f64 {
    0.95
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report file name, relative to the output directory.
    #[serde(default = "default_report_output")]
    pub output: PathBuf,

    /// Decimal places for floating point cells.
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_report_output(),
            decimals: default_decimals(),
        }
    }
}

fn default_report_output() -> PathBuf {
    PathBuf::from("analysis_summary.md")
}

fn default_decimals() -> usize {
    4
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.input.likert_min < self.input.likert_max) {
            anyhow::bail!(
                "likert_min ({}) must be below likert_max ({})",
                self.input.likert_min,
                self.input.likert_max
            );
        }
        if self.factors.engagement_levels.is_empty() {
            anyhow::bail!("engagement_levels must name at least one rating");
        }
        if self.charts.width == 0 || self.charts.height == 0 {
            anyhow::bail!("chart width and height must be positive");
        }
        if self.charts.donation_bins == 0 {
            anyhow::bail!("donation_bins must be at least 1");
        }
        if !(self.charts.ci_level > 0.0 && self.charts.ci_level < 1.0) {
            anyhow::bail!("ci_level must be strictly between 0 and 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(ref output) = args.output {
            self.report.output = output.clone();
        }
        if let Some(policy) = args.composite_policy {
            self.input.composite_policy = policy;
        }
        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }

        // Flags always override
        if args.skip_charts {
            self.charts.enabled = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.path, PathBuf::from("Data_LongFormat.csv"));
        assert_eq!(config.input.likert_min, 1.0);
        assert_eq!(config.input.likert_max, 7.0);
        assert_eq!(config.input.composite_policy, CompositePolicy::Strict);
        assert_eq!(config.factors.engagement_levels, vec!["Dislike", "Neutral", "Like"]);
        assert_eq!(config.report.output, PathBuf::from("analysis_summary.md"));
        assert!(config.charts.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
path = "data/ratings.csv"
likert_max = 5.0
composite_policy = "available"

[factors]
genders = ["female", "male"]

[charts]
donation_bins = 10

[report]
decimals = 2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/ratings.csv"));
        assert_eq!(config.input.likert_min, 1.0);
        assert_eq!(config.input.likert_max, 5.0);
        assert_eq!(config.input.composite_policy, CompositePolicy::Available);
        assert_eq!(config.factors.genders, vec!["female", "male"]);
        assert_eq!(config.factors.engagement_levels.len(), 3);
        assert_eq!(config.charts.donation_bins, 10);
        assert_eq!(config.charts.width, 1200);
        assert_eq!(config.report.decimals, 2);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = Config::default();
        config.input.likert_min = 7.0;
        config.input.likert_max = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.ci_level = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.factors.engagement_levels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[factors]"));
        assert!(toml_str.contains("[charts]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.charts.palette.len(), 4);
    }
}
