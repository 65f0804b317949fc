//! AppealStats - descriptive analysis of donation-appeal experiments
//!
//! Loads a long-format ratings CSV, summarizes engagement, persuasiveness
//! and donations by gender and content source, renders six charts and
//! writes a Markdown summary.
//!
//! Exit codes:
//!   0 - Success (data-quality warnings and chart failures included)
//!   1 - Fatal error (missing or invalid input, bad arguments or config)

mod analysis;
mod charts;
mod cli;
mod config;
mod loader;
mod models;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use pipeline::RunOptions;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("AppealStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_analysis(args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .appealstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the input file, factor levels, charts and report.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis workflow.
fn run_analysis(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    println!("📥 Input: {}", config.input.path.display());
    if args.dry_run {
        println!("🔍 Dry run: nothing will be written");
    }

    let options = RunOptions {
        output_dir: args.output_dir.clone(),
        format: args.format,
        dry_run: args.dry_run,
        show_progress: !args.quiet,
        print_console: !args.quiet,
    };

    let summary = pipeline::run(&config, &options)?;

    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📋 Run Summary:");
    println!("   Rows analyzed: {}", summary.report.diagnostics.rows);
    println!("   Warnings: {}", summary.warnings.len());
    if config.charts.enabled && !args.dry_run {
        println!(
            "   Charts: {} rendered, {} skipped",
            summary.charts_rendered, summary.charts_failed
        );
    }
    println!("   Duration: {:.1}s", duration);

    match summary.report_path {
        Some(path) => println!("\n✅ Analysis complete! Report saved to: {}", path.display()),
        None => println!("\n✅ Dry run complete. No files were written."),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.context(format!("Invalid {}", CONFIG_FILE_NAME))),
    }
}
