//! Table builders shared by the Markdown report and the console presenter.
//!
//! Builders return unstyled [`Table`]s; callers pick the border style.

use crate::models::{
    CorrelationMatrix, Describe, EngagementTable, GroupSummary, OverallStats, ZeroRate,
};
use tabled::builder::Builder;
use tabled::Table;

/// Fixed-point float formatting; NaN renders as `nan`. Values that round
/// to zero print without a sign.
pub fn format_float(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let formatted = format!("{:.*}", decimals, value);
    match formatted.strip_prefix('-') {
        Some(digits) if digits.chars().all(|c| c == '0' || c == '.') => digits.to_string(),
        _ => formatted,
    }
}

pub fn engagement(table: &EngagementTable) -> Table {
    let mut builder = Builder::default();

    let mut header = vec!["gender".to_string(), "content_source".to_string()];
    header.extend(table.ratings.iter().cloned());
    header.push("total".to_string());
    builder.push_record(header);

    for row in &table.rows {
        let mut record = vec![row.group.gender.clone(), row.group.content_source.clone()];
        record.extend(row.counts.iter().map(|c| c.to_string()));
        record.push(row.total().to_string());
        builder.push_record(record);
    }

    builder.build()
}

pub fn group_summaries(summaries: &[GroupSummary], decimals: usize) -> Table {
    let mut builder = Builder::default();
    builder.push_record([
        "gender",
        "content_source",
        "count",
        "mean",
        "std",
        "median",
        "min",
        "max",
    ]);

    for summary in summaries {
        let s = &summary.stats;
        builder.push_record([
            summary.group.gender.clone(),
            summary.group.content_source.clone(),
            s.count.to_string(),
            format_float(s.mean, decimals),
            format_float(s.std, decimals),
            format_float(s.median, decimals),
            format_float(s.min, decimals),
            format_float(s.max, decimals),
        ]);
    }

    builder.build()
}

pub fn zero_donations(rates: &[ZeroRate], decimals: usize) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["gender", "content_source", "rows", "zeros", "zero_rate"]);

    for rate in rates {
        builder.push_record([
            rate.group.gender.clone(),
            rate.group.content_source.clone(),
            rate.rows.to_string(),
            rate.zeros.to_string(),
            format_float(rate.rate, decimals),
        ]);
    }

    builder.build()
}

pub fn rating_counts(overall: &OverallStats) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["engagement", "count"]);
    for rc in &overall.rating_counts {
        builder.push_record([rc.rating.clone(), rc.count.to_string()]);
    }
    builder.build()
}

/// Side-by-side `describe()` of persuasiveness and donation amount.
pub fn overall_describe(overall: &OverallStats, decimals: usize) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["statistic", "persuasiveness", "donation_amount"]);

    let p = &overall.persuasiveness;
    let d = &overall.donation;
    builder.push_record(["count".to_string(), p.count.to_string(), d.count.to_string()]);

    let rows: [(&str, fn(&Describe) -> f64); 7] = [
        ("mean", |x| x.mean),
        ("std", |x| x.std),
        ("min", |x| x.min),
        ("25%", |x| x.q25),
        ("50%", |x| x.median),
        ("75%", |x| x.q75),
        ("max", |x| x.max),
    ];
    for (name, field) in rows {
        builder.push_record([
            name.to_string(),
            format_float(field(p), decimals),
            format_float(field(d), decimals),
        ]);
    }

    builder.build()
}

pub fn correlations(matrix: &CorrelationMatrix, decimals: usize) -> Table {
    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(matrix.labels.iter().cloned());
    builder.push_record(header);

    for (i, label) in matrix.labels.iter().enumerate() {
        let mut record = vec![label.clone()];
        record.extend((0..matrix.labels.len()).map(|j| format_float(matrix.get(i, j), decimals)));
        builder.push_record(record);
    }

    builder.build()
}
