//! Markdown report generation.
//!
//! This module renders the analysis results as a Markdown document and
//! writes it to disk in a single rename.

use super::tables::{self, format_float};
use crate::config::ReportConfig;
use crate::models::{AnalysisReport, DescriptiveResults, Reliability};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tabled::settings::Style;
use tabled::Table;

/// Generate a complete Markdown report.
///
/// The output depends only on `report` and `config`, so an unchanged input
/// yields byte-identical text.
pub fn generate_markdown_report(report: &AnalysisReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Analysis Summary\n\n");
    output.push_str(&format!(
        "Source: `{}` ({} rows)\n\n",
        report.source, report.diagnostics.rows
    ));

    output.push_str(&generate_reliability_section(&report.reliability));
    output.push_str(&generate_descriptive_section(&report.descriptives, config.decimals));
    output.push_str(&generate_correlation_section(&report.descriptives, config.decimals));

    output
}

fn markdown(mut table: Table) -> String {
    table.with(Style::markdown());
    format!("{}\n\n", table)
}

fn generate_reliability_section(reliability: &Reliability) -> String {
    let mut section = String::new();

    section.push_str("## Reliability\n\n");
    section.push_str(&format!(
        "Cronbach's alpha for persuasiveness: {}\n\n",
        format_float(reliability.alpha, 3)
    ));
    section.push_str(&format!(
        "*{} items, {} pooled observations*\n\n",
        reliability.items, reliability.respondents
    ));

    section
}

fn generate_descriptive_section(results: &DescriptiveResults, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Descriptive Statistics\n\n");

    section.push_str("### Engagement (Counts)\n\n");
    section.push_str(&markdown(tables::engagement(&results.engagement)));

    section.push_str("### Persuasiveness\n\n");
    section.push_str(&markdown(tables::group_summaries(&results.persuasiveness, decimals)));

    section.push_str("### Donation Amount\n\n");
    section.push_str(&markdown(tables::group_summaries(&results.donation, decimals)));

    section.push_str("### Zero Donations\n\n");
    section.push_str(&markdown(tables::zero_donations(&results.zero_donations, decimals)));

    section.push_str("### Overall\n\n");
    section.push_str(&markdown(tables::rating_counts(&results.overall)));
    section.push_str(&markdown(tables::overall_describe(&results.overall, decimals)));
    section.push_str(&format!(
        "Overall zero-donation rate: {}\n\n",
        format_float(results.overall.zero_donation_rate, decimals)
    ));

    section
}

fn generate_correlation_section(results: &DescriptiveResults, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Correlations\n\n");
    section.push_str(&markdown(tables::correlations(&results.correlations, decimals)));

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write `content` to `path` via a temporary file in the same directory.
///
/// Readers see either the previous file or the complete new one.
pub fn write_report_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .context("Failed to write report contents")?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::config::FactorConfig;
    use crate::models::{Diagnostics, Observation};

    fn observation(gender: &str, source: &str, rating: &str, score: f64, donation: f64) -> Observation {
        Observation {
            participant_id: Some("p1".to_string()),
            post_id: Some("post".to_string()),
            gender: Some(gender.to_string()),
            content_source: Some(source.to_string()),
            rating: Some(rating.to_string()),
            persuasiveness_items: [score; 3],
            donation_amount: donation,
            persuasiveness: score,
            engagement_numeric: match rating {
                "Dislike" => 1.0,
                "Neutral" => 2.0,
                _ => 3.0,
            },
        }
    }

    fn create_test_report() -> AnalysisReport {
        let observations = vec![
            observation("female", "human", "Like", 5.0, 0.0),
            observation("female", "human", "Neutral", 4.0, 10.0),
            observation("female", "llm", "Dislike", 2.0, 0.0),
            observation("male", "human", "Like", 6.0, 5.0),
            observation("male", "llm", "Neutral", 3.0, 2.5),
            observation("male", "llm", "Like", 4.5, 0.0),
        ];
        let levels = analysis::factor_levels(&observations, &FactorConfig::default());

        AnalysisReport {
            source: "test.csv".to_string(),
            diagnostics: Diagnostics {
                rows: observations.len(),
                ..Diagnostics::default()
            },
            reliability: Reliability {
                alpha: 0.8123,
                items: 3,
                respondents: 6,
            },
            descriptives: analysis::describe_dataset(&observations, &levels),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.starts_with("# Analysis Summary\n"));
        assert!(markdown.contains("Cronbach's alpha for persuasiveness: 0.812"));
        assert!(markdown.contains("| gender"));
        assert!(markdown.contains("female"));
        assert!(markdown.contains("engagement_numeric"));
    }

    #[test]
    fn test_section_order() {
        let markdown = generate_markdown_report(&create_test_report(), &ReportConfig::default());
        let headings = [
            "## Reliability",
            "## Descriptive Statistics",
            "### Engagement (Counts)",
            "### Persuasiveness",
            "### Donation Amount",
            "### Zero Donations",
            "## Correlations",
        ];

        let positions: Vec<usize> = headings
            .iter()
            .map(|h| markdown.find(h).unwrap_or_else(|| panic!("missing {}", h)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_markdown_is_deterministic() {
        let report = create_test_report();
        let config = ReportConfig::default();
        assert_eq!(
            generate_markdown_report(&report, &config),
            generate_markdown_report(&report.clone(), &config)
        );
    }

    #[test]
    fn test_decimals_setting() {
        let report = create_test_report();
        let config = ReportConfig {
            decimals: 2,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &config);
        // female/human zero rate is 1 of 2
        assert!(markdown.contains("0.50"));
        assert!(!markdown.contains("0.5000"));
    }

    #[test]
    fn test_nan_alpha_rendered() {
        let mut report = create_test_report();
        report.reliability.alpha = f64::NAN;
        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("Cronbach's alpha for persuasiveness: nan"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "test.csv");
        assert_eq!(value["reliability"]["items"], 3);
    }

    #[test]
    fn test_write_report_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis_summary.md");

        write_report_atomic(&path, "first").unwrap();
        write_report_atomic(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_report_atomic_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.md");
        assert!(write_report_atomic(&path, "x").is_err());
        assert!(!path.exists());
    }
}
