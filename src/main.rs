//! Survey Stats - aggregate statistics for value surveys
//!
//! A CLI tool that reads every stored survey response and produces
//! demographic distributions, average-rank tables for the terminal and
//! instrumental value lists, and per-item Likert score distributions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, malformed collection, bad config, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use report::{Report, ReportMetadata};
use std::path::{Path, PathBuf};
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

    // Config is read before logging so `general.verbose` can set the level
    let (config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("survey-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(ref path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(args, config) {
        error!("Statistics run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .survey-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

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
    println!("   Edit it to customize fields, ranked lists and the Likert scale.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load, aggregate and write the report.
fn run(args: Args, mut config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.merge_with_args(&args);
    config.validate()?;

    let input = args
        .input
        .as_deref()
        .context("An input file is required")?;
    let records = store::load_records(input)?;

    if args.dry_run {
        return handle_dry_run(input, &records, &config);
    }

    let statistics = analysis::aggregate(&records, &config);

    let report = Report {
        metadata: ReportMetadata {
            source: input.display().to_string(),
            generated_at: Utc::now(),
            total_responses: statistics.total_responses,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        statistics,
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report.statistics)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to {}", path);
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Handle --dry-run: summarize the loaded records and exit.
fn handle_dry_run(input: &Path, records: &[models::ResponseRecord], config: &Config) -> Result<()> {
    let summary = store::RecordSummary::from_records(records);

    println!("\n🔍 Dry run: {} ({} responses)\n", input.display(), summary.total);

    for spec in &config.fields {
        let present = summary.field_presence.get(&spec.key).copied().unwrap_or(0);
        println!(
            "   {:<20} present in {} ({}, default {:?})",
            spec.key, present, spec.normalization, spec.default
        );
    }

    for list in [&config.ranking.terminal, &config.ranking.instrumental] {
        let present: usize = list
            .candidate_keys()
            .filter_map(|key| summary.field_presence.get(key))
            .sum();
        println!("   {:<20} present in {}", list.key, present);
    }

    let likert_keys = config.likert.item_keys();
    let answered = likert_keys
        .iter()
        .filter(|key| summary.field_presence.contains_key(key.as_str()))
        .count();
    println!(
        "   Likert items        {} of {} seen",
        answered,
        likert_keys.len()
    );

    println!("\n✅ Dry run complete. No statistics were written.");
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// A config file that exists but cannot be parsed is an error.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Config::resolve(args.config.as_deref(), &cwd)
}
