//! Human-readable console output.

use super::tables::{self, format_float};
use crate::charts::ChartOutcome;
use crate::models::{DataQualityWarning, DescriptiveResults, Diagnostics, Reliability};
use tabled::settings::Style;
use tabled::Table;

fn boxed(mut table: Table) -> Table {
    table.with(Style::modern());
    table
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    println!("\n🔍 Data checks ({} rows):", diagnostics.rows);
    println!(
        "   Duplicate participant-post combinations: {}",
        diagnostics.duplicate_keys
    );

    let mut missing = diagnostics.columns_with_missing().peekable();
    if missing.peek().is_none() {
        println!("   Missing values: none");
    } else {
        println!("   Missing values:");
        for (column, count) in missing {
            println!("     {}: {}", column, count);
        }
    }
}

pub fn print_reliability(reliability: &Reliability) {
    println!(
        "\n📐 Cronbach's alpha for persuasiveness: {}",
        format_float(reliability.alpha, 3)
    );
}

pub fn print_descriptives(results: &DescriptiveResults, decimals: usize) {
    println!("\n📊 Engagement (counts):");
    println!("{}", boxed(tables::engagement(&results.engagement)));

    println!("\n📊 Persuasiveness:");
    println!("{}", boxed(tables::group_summaries(&results.persuasiveness, decimals)));

    println!("\n📊 Donation amount:");
    println!("{}", boxed(tables::group_summaries(&results.donation, decimals)));

    println!("\n📊 Zero donations:");
    println!("{}", boxed(tables::zero_donations(&results.zero_donations, decimals)));

    println!("\n📊 Overall:");
    println!("{}", boxed(tables::rating_counts(&results.overall)));
    println!("{}", boxed(tables::overall_describe(&results.overall, decimals)));
    println!(
        "   Zero-donation rate: {}",
        format_float(results.overall.zero_donation_rate, decimals)
    );

    println!("\n📊 Correlations:");
    println!("{}", boxed(tables::correlations(&results.correlations, decimals)));
}

pub fn print_warnings(warnings: &[DataQualityWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n⚠️  Data quality warnings:");
    for warning in warnings {
        println!("   - {}", warning);
    }
}

pub fn print_chart_outcomes(outcomes: &[ChartOutcome]) {
    let rendered = outcomes.iter().filter(|o| o.is_ok()).count();
    println!("\n🖼️  Charts: {}/{} rendered", rendered, outcomes.len());
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => println!("   ✅ {}", outcome.path.display()),
            Err(e) => println!("   ❌ {}: {}", outcome.kind, e),
        }
    }
}
