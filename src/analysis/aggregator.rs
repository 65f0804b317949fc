//! Grouped aggregation and summary statistics.
//!
//! This module turns the annotated observations into the fixed battery of
//! descriptive tables: engagement cross-tabulation, persuasiveness and
//! donation summaries per group, zero-donation rates, overall summaries and
//! the correlation matrix. Everything here is a pure function of its input.

use super::stats;
use crate::config::FactorConfig;
use crate::models::{
    CorrelationMatrix, DataQualityWarning, DescriptiveResults, EngagementRow, EngagementTable,
    FactorLevels, GroupKey, GroupSummary, Observation, OverallStats, RatingCount, ZeroRate,
};
use std::collections::BTreeSet;

/// Variables of the correlation matrix, in display order.
pub const CORRELATION_VARIABLES: [&str; 3] =
    ["engagement_numeric", "persuasiveness", "donation_amount"];

/// Configured levels first, then any other observed values in ascending order.
fn merge_levels<'a>(configured: &[String], observed: impl Iterator<Item = &'a str>) -> Vec<String> {
    let extra: BTreeSet<&str> = observed
        .filter(|value| !configured.iter().any(|c| c.as_str() == *value))
        .collect();

    configured
        .iter()
        .cloned()
        .chain(extra.into_iter().map(String::from))
        .collect()
}

/// Resolve the ordered factor levels for this dataset.
pub fn factor_levels(observations: &[Observation], config: &FactorConfig) -> FactorLevels {
    let ratings = merge_levels(
        &config.engagement_levels,
        observations
            .iter()
            .filter_map(|o| o.rating.as_deref())
            .filter(|r| {
                !config
                    .engagement_levels
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(r))
            }),
    );

    FactorLevels {
        genders: merge_levels(
            &config.genders,
            observations.iter().filter_map(|o| o.gender.as_deref()),
        ),
        content_sources: merge_levels(
            &config.content_sources,
            observations.iter().filter_map(|o| o.content_source.as_deref()),
        ),
        ratings,
    }
}

/// Column index of a rating among the levels (case-insensitive).
fn rating_index(rating: &str, levels: &[String]) -> Option<usize> {
    levels
        .iter()
        .position(|l| l == rating)
        .or_else(|| levels.iter().position(|l| l.eq_ignore_ascii_case(rating)))
}

/// Observations belonging to one group.
pub fn group_members<'a>(
    observations: &'a [Observation],
    key: &'a GroupKey,
) -> impl Iterator<Item = &'a Observation> + 'a {
    observations.iter().filter(move |o| o.in_group(key))
}

/// Count of observations per group and rating; unobserved cells are zero.
pub fn engagement_table(observations: &[Observation], levels: &FactorLevels) -> EngagementTable {
    let rows = levels
        .groups()
        .into_iter()
        .map(|group| {
            let mut counts = vec![0usize; levels.ratings.len()];
            for obs in group_members(observations, &group) {
                if let Some(index) = obs
                    .rating
                    .as_deref()
                    .and_then(|r| rating_index(r, &levels.ratings))
                {
                    counts[index] += 1;
                }
            }
            EngagementRow { group, counts }
        })
        .collect();

    EngagementTable {
        ratings: levels.ratings.clone(),
        rows,
    }
}

/// Summary statistics of one variable for every group.
pub fn group_summaries<F>(
    observations: &[Observation],
    levels: &FactorLevels,
    value: F,
) -> Vec<GroupSummary>
where
    F: Fn(&Observation) -> f64,
{
    levels
        .groups()
        .into_iter()
        .map(|group| {
            let values: Vec<f64> = group_members(observations, &group).map(&value).collect();
            GroupSummary {
                stats: stats::summarize(&values),
                group,
            }
        })
        .collect()
}

/// Number of exact zeros and their share of all values (missing included).
pub fn zero_rate(values: &[f64]) -> (usize, f64) {
    let zeros = values.iter().filter(|v| **v == 0.0).count();
    if values.is_empty() {
        return (0, f64::NAN);
    }
    (zeros, zeros as f64 / values.len() as f64)
}

/// Proportion of zero donations per group.
pub fn zero_donation_rates(observations: &[Observation], levels: &FactorLevels) -> Vec<ZeroRate> {
    levels
        .groups()
        .into_iter()
        .map(|group| {
            let values: Vec<f64> = group_members(observations, &group)
                .map(|o| o.donation_amount)
                .collect();
            let (zeros, rate) = zero_rate(&values);
            ZeroRate {
                group,
                rows: values.len(),
                zeros,
                rate,
            }
        })
        .collect()
}

/// Frequency of each rating level, most frequent first.
pub fn rating_counts(observations: &[Observation], levels: &FactorLevels) -> Vec<RatingCount> {
    let mut counts: Vec<RatingCount> = levels
        .ratings
        .iter()
        .map(|rating| RatingCount {
            rating: rating.clone(),
            count: 0,
        })
        .collect();

    for rating in observations.iter().filter_map(|o| o.rating.as_deref()) {
        if let Some(index) = rating_index(rating, &levels.ratings) {
            counts[index].count += 1;
        }
    }

    // Stable sort keeps level order among ties
    counts.sort_by_key(|c| std::cmp::Reverse(c.count));
    counts
}

/// Ungrouped summaries over the full dataset.
pub fn overall_stats(observations: &[Observation], levels: &FactorLevels) -> OverallStats {
    let persuasiveness: Vec<f64> = observations.iter().map(|o| o.persuasiveness).collect();
    let donations: Vec<f64> = observations.iter().map(|o| o.donation_amount).collect();

    OverallStats {
        rating_counts: rating_counts(observations, levels),
        persuasiveness: stats::describe(&persuasiveness),
        donation: stats::describe(&donations),
        zero_donation_rate: zero_rate(&donations).1,
    }
}

/// Pearson correlations between engagement, persuasiveness and donation.
///
/// Diagonal entries are 1.0 for any variable with at least one observed
/// value; off-diagonal entries are NaN when undefined.
pub fn correlation_matrix(observations: &[Observation]) -> CorrelationMatrix {
    let columns: [Vec<f64>; 3] = [
        observations.iter().map(|o| o.engagement_numeric).collect(),
        observations.iter().map(|o| o.persuasiveness).collect(),
        observations.iter().map(|o| o.donation_amount).collect(),
    ];

    let values = (0..columns.len())
        .map(|i| {
            (0..columns.len())
                .map(|j| {
                    if i == j {
                        if columns[i].iter().any(|v| !v.is_nan()) {
                            1.0
                        } else {
                            f64::NAN
                        }
                    } else {
                        stats::pearson(&columns[i], &columns[j])
                    }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        labels: CORRELATION_VARIABLES.iter().map(|s| s.to_string()).collect(),
        values,
    }
}

/// Data-quality warnings raised by the aggregate tables.
fn aggregate_warnings(
    observations: &[Observation],
    zero_donations: &[ZeroRate],
    correlations: &CorrelationMatrix,
) -> Vec<DataQualityWarning> {
    let mut warnings = Vec::new();

    let ungrouped = observations
        .iter()
        .filter(|o| o.group_key().is_none())
        .count();
    if ungrouped > 0 {
        warnings.push(DataQualityWarning::UngroupedRows(ungrouped));
    }

    warnings.extend(
        zero_donations
            .iter()
            .filter(|z| z.rows == 0)
            .map(|z| DataQualityWarning::EmptyGroup(z.group.clone())),
    );

    for i in 0..correlations.labels.len() {
        for j in (i + 1)..correlations.labels.len() {
            if correlations.get(i, j).is_nan() {
                warnings.push(DataQualityWarning::UndefinedCorrelation {
                    left: correlations.labels[i].clone(),
                    right: correlations.labels[j].clone(),
                });
            }
        }
    }

    warnings
}

/// Run the full descriptive battery.
pub fn describe_dataset(observations: &[Observation], levels: &FactorLevels) -> DescriptiveResults {
    let engagement = engagement_table(observations, levels);
    let persuasiveness = group_summaries(observations, levels, |o| o.persuasiveness);
    let donation = group_summaries(observations, levels, |o| o.donation_amount);
    let zero_donations = zero_donation_rates(observations, levels);
    let overall = overall_stats(observations, levels);
    let correlations = correlation_matrix(observations);
    let warnings = aggregate_warnings(observations, &zero_donations, &correlations);

    DescriptiveResults {
        levels: levels.clone(),
        engagement,
        persuasiveness,
        donation,
        zero_donations,
        overall,
        correlations,
        warnings,
    }
}
