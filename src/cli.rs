//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Survey Stats - aggregate statistics for value surveys
///
/// Reads every stored survey response and reports demographic
/// distributions, average ranks for the terminal and instrumental
/// value lists, and per-item Likert score distributions.
///
/// Examples:
///   survey-stats --input results_backup.json
///   survey-stats --input responses.jsonl --format json --output stats.json
///   survey-stats --input results_backup.json --likert-items 20
///   survey-stats --input results_backup.json --dry-run
///   survey-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Stored responses to aggregate
    ///
    /// A JSON array of response objects, or JSON Lines when the file
    /// ends in .jsonl or .ndjson.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SURVEY_STATS_INPUT",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .survey-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of Likert items (keys Q1..QN)
    #[arg(long, value_name = "COUNT")]
    pub likert_items: Option<usize>,

    /// Separator between ranked-list entries
    #[arg(long, value_name = "SEP")]
    pub separator: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and check the responses without aggregating
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .survey-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
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

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(count) = self.likert_items {
            if count == 0 {
                return Err("Likert item count must be at least 1".to_string());
            }
        }

        if let Some(ref separator) = self.separator {
            if separator.is_empty() {
                return Err("Separator must not be empty".to_string());
            }
        }

        match self.input {
            Some(ref input) if !input.exists() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
            Some(_) => {}
            None => return Err("An input file is required".to_string()),
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `general.verbose` setting from the config
    /// file; `--quiet` still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
