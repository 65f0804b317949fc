//! Dataset loading and validation.
//!
//! This module reads the long-format CSV against the declared [`Schema`],
//! counts duplicate keys and missing values, attaches the derived
//! persuasiveness and engagement fields, and computes the scale's
//! reliability coefficient.

pub mod schema;

use crate::analysis::stats;
use crate::config::{CompositePolicy, Config};
use crate::models::{DataQualityWarning, Diagnostics, Observation, Reliability};
use schema::{Cell, ColumnType, Schema};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal problems with the input file. The run stops before any output.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: column '{column}' expects {expected}, found '{value}'")]
    TypeMismatch {
        line: u64,
        column: String,
        value: String,
        expected: ColumnType,
    },

    #[error("line {line}: column '{column}' may not be empty")]
    UnexpectedNull { line: u64, column: String },

    #[error("line {line}: column '{column}' value {value} is outside [{min}, {max}]")]
    OutOfRange {
        line: u64,
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{} has a header row but no data", .0.display())]
    Empty(PathBuf),
}

/// Settings that shape how rows are validated and annotated.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub likert_min: f64,
    pub likert_max: f64,
    pub composite_policy: CompositePolicy,
    /// Rating levels from lowest to highest.
    pub engagement_levels: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for LoadOptions {
    fn from(config: &Config) -> Self {
        Self {
            likert_min: config.input.likert_min,
            likert_max: config.input.likert_max,
            composite_policy: config.input.composite_policy,
            engagement_levels: config.factors.engagement_levels.clone(),
        }
    }
}

/// The annotated observation set plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub observations: Vec<Observation>,
    pub diagnostics: Diagnostics,
    pub reliability: Reliability,
    pub warnings: Vec<DataQualityWarning>,
}

/// Load, validate and annotate the dataset at `path`.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<LoadedDataset, DataSourceError> {
    if !path.is_file() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }

    info!("Loading data from {}", path.display());

    let file = File::open(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source| DataSourceError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let schema = Schema::long_format();
    let headers = reader.headers().map_err(csv_error)?.clone();
    let indices = schema.resolve(&headers)?;
    debug!("Resolved {} schema columns", indices.len());

    let mut missing = vec![0usize; schema.columns().len()];
    let mut observations = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        // Header is line 1
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row as u64 + 2);

        let cells = schema.parse_record(&record, &indices, line)?;
        for (count, cell) in missing.iter_mut().zip(&cells) {
            if cell.is_null() {
                *count += 1;
            }
        }

        observations.push(build_observation(cells, line, options)?);
    }

    if observations.is_empty() {
        return Err(DataSourceError::Empty(path.to_path_buf()));
    }

    let diagnostics = Diagnostics {
        rows: observations.len(),
        duplicate_keys: count_duplicate_keys(&observations),
        missing: schema
            .columns()
            .iter()
            .zip(&missing)
            .map(|(spec, count)| (spec.name.to_string(), *count))
            .collect(),
    };

    let warnings = quality_warnings(&diagnostics);
    for warning in &warnings {
        warn!("{}", warning);
    }

    let reliability = persuasiveness_reliability(&observations);
    info!(
        "Loaded {} observations; Cronbach's alpha for persuasiveness: {:.3}",
        diagnostics.rows, reliability.alpha
    );

    Ok(LoadedDataset {
        observations,
        diagnostics,
        reliability,
        warnings,
    })
}

/// Turn validated cells (in schema order) into an annotated observation.
fn build_observation(
    cells: Vec<Cell>,
    line: u64,
    options: &LoadOptions,
) -> Result<Observation, DataSourceError> {
    let items = [cells[5].as_float(), cells[6].as_float(), cells[7].as_float()];
    for (name, value) in schema::PERSUASIVENESS_ITEMS.iter().zip(items) {
        if !value.is_nan() && !(options.likert_min..=options.likert_max).contains(&value) {
            return Err(DataSourceError::OutOfRange {
                line,
                column: name.to_string(),
                value,
                min: options.likert_min,
                max: options.likert_max,
            });
        }
    }

    let donation_amount = cells[8].as_float();
    if donation_amount < 0.0 {
        return Err(DataSourceError::OutOfRange {
            line,
            column: schema::DONATION_AMOUNT.to_string(),
            value: donation_amount,
            min: 0.0,
            max: f64::INFINITY,
        });
    }

    let mut cells = cells.into_iter();
    let mut next_text = || cells.next().and_then(Cell::into_text);
    let participant_id = next_text();
    let post_id = next_text();
    let gender = next_text();
    let content_source = next_text();
    let rating = next_text();

    let engagement_numeric = encode_engagement(rating.as_deref(), &options.engagement_levels);

    Ok(Observation {
        participant_id,
        post_id,
        gender,
        content_source,
        rating,
        persuasiveness_items: items,
        donation_amount,
        persuasiveness: composite_score(&items, options.composite_policy),
        engagement_numeric,
    })
}

/// Mean of the persuasiveness items under the given missing-item policy.
pub fn composite_score(items: &[f64; 3], policy: CompositePolicy) -> f64 {
    match policy {
        CompositePolicy::Strict if items.iter().any(|v| v.is_nan()) => f64::NAN,
        _ => stats::mean(items),
    }
}

/// Ordinal code of a rating: position in `levels` plus one, matched
/// case-insensitively. NaN when missing or unknown.
pub fn encode_engagement(rating: Option<&str>, levels: &[String]) -> f64 {
    rating
        .and_then(|r| levels.iter().position(|l| l.eq_ignore_ascii_case(r.trim())))
        .map(|i| (i + 1) as f64)
        .unwrap_or(f64::NAN)
}

/// Count (participant_id, post_id) pairs that repeat an earlier row.
pub fn count_duplicate_keys(observations: &[Observation]) -> usize {
    let mut seen = HashSet::new();
    observations
        .iter()
        .filter(|o| !seen.insert((o.participant_id.as_deref(), o.post_id.as_deref())))
        .count()
}

/// Cronbach's alpha over the pooled persuasiveness items.
pub fn persuasiveness_reliability(observations: &[Observation]) -> Reliability {
    let rows: Vec<[f64; 3]> = observations.iter().map(|o| o.persuasiveness_items).collect();
    Reliability {
        alpha: stats::cronbach_alpha(&rows),
        items: 3,
        respondents: rows.len(),
    }
}

fn quality_warnings(diagnostics: &Diagnostics) -> Vec<DataQualityWarning> {
    let mut warnings = Vec::new();
    if diagnostics.duplicate_keys > 0 {
        warnings.push(DataQualityWarning::DuplicateKeys(diagnostics.duplicate_keys));
    }
    for (column, count) in diagnostics.columns_with_missing() {
        warnings.push(DataQualityWarning::MissingValues {
            column: column.clone(),
            count: *count,
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "participant_id,post_id,gender,content_source,rating,persuasiveness_1,persuasiveness_2,persuasiveness_3,donation_amount";

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset(Path::new("no/such/file.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataSourceError::NotFound(_)));
        assert!(err.to_string().contains("no/such/file.csv"));
    }

    #[test]
    fn test_constant_items_fixture() {
        let data = load_dataset(&fixture("constant_items.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(data.observations.len(), 8);
        assert!(data.observations.iter().all(|o| o.persuasiveness == 4.0));
        assert_eq!(data.diagnostics.duplicate_keys, 0);
        assert!(data.warnings.is_empty());
        // Constant items have no variance to explain
        assert!(data.reliability.alpha.is_nan());
    }

    #[test]
    fn test_sample_fixture_diagnostics() {
        let data = load_dataset(&fixture("sample_ratings.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(data.diagnostics.rows, 17);
        assert_eq!(data.diagnostics.duplicate_keys, 1);
        assert_eq!(data.diagnostics.missing.len(), 9);

        let missing: Vec<_> = data.diagnostics.columns_with_missing().collect();
        assert_eq!(missing, vec![&("persuasiveness_1".to_string(), 1)]);
        assert_eq!(data.warnings.len(), 2);

        // Strict policy: the row with a missing item has no composite
        let incomplete = &data.observations[13];
        assert!(incomplete.persuasiveness.is_nan());
        assert_eq!(data.reliability.respondents, 17);
        assert!(data.reliability.alpha > 0.8 && data.reliability.alpha <= 1.0);
    }

    #[test]
    fn test_available_policy() {
        let options = LoadOptions {
            composite_policy: CompositePolicy::Available,
            ..LoadOptions::default()
        };
        let data = load_dataset(&fixture("sample_ratings.csv"), &options).unwrap();
        assert_eq!(data.observations[13].persuasiveness, 4.0);
    }

    #[test]
    fn test_derived_fields() {
        let file = write_csv(&["1,A,female,llm,like,1,2,6,0"]);
        let data = load_dataset(file.path(), &LoadOptions::default()).unwrap();
        let obs = &data.observations[0];
        assert_eq!(obs.persuasiveness, 3.0);
        assert_eq!(obs.engagement_numeric, 3.0);
        assert_eq!(obs.gender.as_deref(), Some("female"));
        assert_eq!(obs.donation_amount, 0.0);
    }

    #[test]
    fn test_type_mismatch() {
        let file = write_csv(&["1,A,female,llm,Like,4,4,4,0", "1,B,male,human,Like,4,4,4,lots"]);
        match load_dataset(file.path(), &LoadOptions::default()) {
            Err(DataSourceError::TypeMismatch { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "donation_amount");
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_values() {
        let file = write_csv(&["1,A,female,llm,Like,4,9,4,0"]);
        assert!(matches!(
            load_dataset(file.path(), &LoadOptions::default()),
            Err(DataSourceError::OutOfRange { .. })
        ));

        let file = write_csv(&["1,A,female,llm,Like,4,4,4,-1"]);
        assert!(matches!(
            load_dataset(file.path(), &LoadOptions::default()),
            Err(DataSourceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "participant_id,post_id,gender").unwrap();
        writeln!(file, "1,A,female").unwrap();
        assert!(matches!(
            load_dataset(file.path(), &LoadOptions::default()),
            Err(DataSourceError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = write_csv(&[]);
        assert!(matches!(
            load_dataset(file.path(), &LoadOptions::default()),
            Err(DataSourceError::Empty(_))
        ));
    }

    #[test]
    fn test_encode_engagement() {
        let levels: Vec<String> = vec!["Dislike".into(), "Neutral".into(), "Like".into()];
        assert_eq!(encode_engagement(Some("Dislike"), &levels), 1.0);
        assert_eq!(encode_engagement(Some("NEUTRAL"), &levels), 2.0);
        assert!(encode_engagement(Some("Love"), &levels).is_nan());
        assert!(encode_engagement(None, &levels).is_nan());
    }

    #[test]
    fn test_composite_score_policies() {
        let items = [3.0, f64::NAN, 5.0];
        assert!(composite_score(&items, CompositePolicy::Strict).is_nan());
        assert_eq!(composite_score(&items, CompositePolicy::Available), 4.0);
        assert_eq!(composite_score(&[1.0, 2.0, 3.0], CompositePolicy::Strict), 2.0);
    }
}
