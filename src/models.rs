//! Data models for the experiment analysis.
//!
//! This module contains the core data structures used throughout
//! the application: the annotated observations, the aggregate tables
//! produced by the analysis, and the report model.
//!
//! Missing numeric values are stored as `f64::NAN` and serialize as `null`.

use serde::Serialize;
use std::fmt;

/// One rating event by one participant on one post.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    /// Participant identifier.
    pub participant_id: Option<String>,
    /// Stimulus (post) identifier.
    pub post_id: Option<String>,
    /// Participant gender.
    pub gender: Option<String>,
    /// Who wrote the appeal (e.g. human or llm).
    pub content_source: Option<String>,
    /// Engagement rating (e.g. Dislike, Neutral, Like).
    pub rating: Option<String>,
    /// The three persuasiveness Likert items.
    pub persuasiveness_items: [f64; 3],
    /// Donation amount, non-negative.
    pub donation_amount: f64,
    /// Composite persuasiveness score (derived).
    pub persuasiveness: f64,
    /// Ordinal encoding of `rating`, used for correlations only (derived).
    pub engagement_numeric: f64,
}

impl Observation {
    /// Returns the group key, if both factors are present.
    pub fn group_key(&self) -> Option<GroupKey> {
        match (&self.gender, &self.content_source) {
            (Some(gender), Some(source)) => Some(GroupKey::new(gender, source)),
            _ => None,
        }
    }

    /// Whether this observation belongs to the given group.
    pub fn in_group(&self, key: &GroupKey) -> bool {
        self.gender.as_deref() == Some(key.gender.as_str())
            && self.content_source.as_deref() == Some(key.content_source.as_str())
    }
}

/// A cell of the gender × content source design.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub gender: String,
    pub content_source: String,
}

impl GroupKey {
    pub fn new(gender: &str, content_source: &str) -> Self {
        Self {
            gender: gender.to_string(),
            content_source: content_source.to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.gender, self.content_source)
    }
}

/// Ordered factor levels used for grouping, tables and chart axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FactorLevels {
    pub genders: Vec<String>,
    pub content_sources: Vec<String>,
    pub ratings: Vec<String>,
}

impl FactorLevels {
    /// Full cross product of gender and content source levels, gender-major.
    pub fn groups(&self) -> Vec<GroupKey> {
        self.genders
            .iter()
            .flat_map(|g| {
                self.content_sources
                    .iter()
                    .map(move |s| GroupKey::new(g, s))
            })
            .collect()
    }
}

/// Mean, spread and range of one variable within a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Number of non-missing values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 divisor).
    pub std: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Overall description of a variable (count, mean, std, quartiles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Engagement counts for one group, one entry per rating level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementRow {
    pub group: GroupKey,
    pub counts: Vec<usize>,
}

impl EngagementRow {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Gender × content source × rating cross-tabulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementTable {
    /// Column labels, in level order.
    pub ratings: Vec<String>,
    pub rows: Vec<EngagementRow>,
}

impl EngagementTable {
    /// Sum of every cell in the table.
    pub fn total(&self) -> usize {
        self.rows.iter().map(EngagementRow::total).sum()
    }

    /// Sum of the cells of all rows for one gender.
    pub fn total_for_gender(&self, gender: &str) -> usize {
        self.rows
            .iter()
            .filter(|r| r.group.gender == gender)
            .map(EngagementRow::total)
            .sum()
    }
}

/// Summary statistics of a variable for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: GroupKey,
    pub stats: SummaryStats,
}

/// Proportion of exact-zero donations in a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroRate {
    pub group: GroupKey,
    pub rows: usize,
    pub zeros: usize,
    /// `zeros / rows`, NaN for an empty group.
    pub rate: f64,
}

/// Frequency of one rating value over the whole dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingCount {
    pub rating: String,
    pub count: usize,
}

/// Ungrouped summaries over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub rating_counts: Vec<RatingCount>,
    pub persuasiveness: Describe,
    pub donation: Describe,
    pub zero_donation_rate: f64,
}

/// Square Pearson correlation matrix with row/column labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient between the `i`th and `j`th variables.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// Everything the descriptive stage produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveResults {
    pub levels: FactorLevels,
    pub engagement: EngagementTable,
    pub persuasiveness: Vec<GroupSummary>,
    pub donation: Vec<GroupSummary>,
    pub zero_donations: Vec<ZeroRate>,
    pub overall: OverallStats,
    pub correlations: CorrelationMatrix,
    #[serde(skip)]
    pub warnings: Vec<DataQualityWarning>,
}

/// Internal-consistency reliability of the persuasiveness scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reliability {
    /// Cronbach's alpha, NaN when undefined.
    pub alpha: f64,
    /// Number of items in the scale.
    pub items: usize,
    /// Number of observations used (pooled, not per participant).
    pub respondents: usize,
}

/// Load-time checks on the raw dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Number of data rows read.
    pub rows: usize,
    /// Repeated (participant_id, post_id) pairs, first occurrence excluded.
    pub duplicate_keys: usize,
    /// Missing-value count for every schema column, in schema order.
    pub missing: Vec<(String, usize)>,
}

impl Diagnostics {
    /// Columns with at least one missing value.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &(String, usize)> {
        self.missing.iter().filter(|(_, count)| *count > 0)
    }
}

/// Non-fatal data-quality findings. The pipeline continues with the data as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum DataQualityWarning {
    DuplicateKeys(usize),
    MissingValues { column: String, count: usize },
    EmptyGroup(GroupKey),
    UndefinedCorrelation { left: String, right: String },
    UngroupedRows(usize),
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::DuplicateKeys(n) => {
                write!(f, "{} duplicate participant-post combinations", n)
            }
            DataQualityWarning::MissingValues { column, count } => {
                write!(f, "{} missing values in column '{}'", count, column)
            }
            DataQualityWarning::EmptyGroup(group) => {
                write!(f, "group '{}' has no observations", group)
            }
            DataQualityWarning::UndefinedCorrelation { left, right } => write!(
                f,
                "correlation between '{}' and '{}' is undefined (zero variance or too few pairs)",
                left, right
            ),
            DataQualityWarning::UngroupedRows(n) => write!(
                f,
                "{} rows have a missing gender or content source and are left out of grouped tables",
                n
            ),
        }
    }
}

/// The complete analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Input file the analysis was run on.
    pub source: String,
    pub diagnostics: Diagnostics,
    pub reliability: Reliability,
    pub descriptives: DescriptiveResults,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> FactorLevels {
        FactorLevels {
            genders: vec!["female".into(), "male".into()],
            content_sources: vec!["human".into(), "llm".into()],
            ratings: vec!["Dislike".into(), "Neutral".into(), "Like".into()],
        }
    }

    #[test]
    fn test_groups_cross_product_order() {
        let groups = levels().groups();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], GroupKey::new("female", "human"));
        assert_eq!(groups[1], GroupKey::new("female", "llm"));
        assert_eq!(groups[3], GroupKey::new("male", "llm"));
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::new("male", "llm").to_string(), "male / llm");
    }

    #[test]
    fn test_engagement_totals() {
        let table = EngagementTable {
            ratings: levels().ratings,
            rows: vec![
                EngagementRow {
                    group: GroupKey::new("female", "human"),
                    counts: vec![1, 2, 3],
                },
                EngagementRow {
                    group: GroupKey::new("male", "human"),
                    counts: vec![0, 0, 4],
                },
            ],
        };
        assert_eq!(table.total(), 10);
        assert_eq!(table.total_for_gender("female"), 6);
        assert_eq!(table.total_for_gender("male"), 4);
        assert_eq!(table.total_for_gender("other"), 0);
    }

    #[test]
    fn test_warning_display() {
        let w = DataQualityWarning::MissingValues {
            column: "rating".to_string(),
            count: 3,
        };
        assert_eq!(w.to_string(), "3 missing values in column 'rating'");
        assert!(DataQualityWarning::DuplicateKeys(2)
            .to_string()
            .contains("2 duplicate"));
    }

    #[test]
    fn test_columns_with_missing() {
        let diagnostics = Diagnostics {
            rows: 5,
            duplicate_keys: 0,
            missing: vec![("gender".to_string(), 0), ("rating".to_string(), 2)],
        };
        let cols: Vec<_> = diagnostics.columns_with_missing().collect();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].0, "rating");
    }

    #[test]
    fn test_undefined_statistics_serialize_as_null() {
        let summary = GroupSummary {
            group: GroupKey::new("male", "llm"),
            stats: SummaryStats {
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                median: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            },
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["group"]["gender"], "male");
        assert_eq!(value["stats"]["count"], 0);
        assert!(value["stats"]["mean"].is_null());
    }
}
