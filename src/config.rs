//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.survey-stats.toml` files.

use crate::cli::OutputFormat;
use crate::error::EngineError;
use crate::models::{FieldAggregationSpec, Normalization};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".survey-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Demographic fields to aggregate, in output order.
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldAggregationSpec>,

    /// Ranked-list settings.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Likert instrument settings.
    #[serde(default)]
    pub likert: LikertConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            fields: default_fields(),
            ranking: RankingConfig::default(),
            likert: LikertConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report destination; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

fn default_fields() -> Vec<FieldAggregationSpec> {
    vec![
        FieldAggregationSpec::new("Gender", "unspecified", Normalization::Lowercase),
        FieldAggregationSpec::new("Age", "unspecified", Normalization::Stringify),
        FieldAggregationSpec::new("Profession", "unspecified", Normalization::Stringify),
        FieldAggregationSpec::new("City", "unspecified", Normalization::Stringify),
    ]
}

/// Settings for both ranked-preference lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_terminal")]
    pub terminal: RankedListConfig,

    #[serde(default = "default_instrumental")]
    pub instrumental: RankedListConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            terminal: default_terminal(),
            instrumental: default_instrumental(),
        }
    }
}

/// Where one ranked list lives in a record and how it is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedListConfig {
    /// Primary record field.
    pub key: String,

    /// Keys tried in order when the primary field is absent.
    #[serde(default)]
    pub fallback_keys: Vec<String>,

    /// Separator between `<rank>. <name>` entries.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Canonical item order, used to break ties between equal averages.
    #[serde(default)]
    pub vocabulary: Vec<String>,
}

impl RankedListConfig {
    pub fn new(key: &str, fallback: &str) -> Self {
        Self {
            key: key.to_string(),
            fallback_keys: vec![fallback.to_string()],
            separator: default_separator(),
            vocabulary: Vec::new(),
        }
    }

    /// Primary key followed by fallbacks.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.fallback_keys.iter().map(String::as_str))
    }
}

fn default_terminal() -> RankedListConfig {
    RankedListConfig::new("TerminalRanks", "terminal")
}

fn default_instrumental() -> RankedListConfig {
    RankedListConfig::new("InstrumentalRanks", "instrumental")
}

fn default_separator() -> String {
    "; ".to_string()
}

/// Likert instrument settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikertConfig {
    /// Prefix for generated item keys.
    #[serde(default = "default_item_prefix")]
    pub item_prefix: String,

    /// Number of generated item keys (`Q1`..`Qn`).
    #[serde(default = "default_item_count")]
    pub item_count: usize,

    /// Explicit item keys; overrides prefix and count when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,

    /// Lowest allowed score.
    #[serde(default = "default_scale_min")]
    pub scale_min: u32,

    /// Highest allowed score.
    #[serde(default = "default_scale_max")]
    pub scale_max: u32,
}

impl Default for LikertConfig {
    fn default() -> Self {
        Self {
            item_prefix: default_item_prefix(),
            item_count: default_item_count(),
            items: None,
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
        }
    }
}

impl LikertConfig {
    /// The full ordered list of item keys expected by the instrument.
    pub fn item_keys(&self) -> Vec<String> {
        match &self.items {
            Some(items) => items.clone(),
            None => (1..=self.item_count)
                .map(|n| format!("{}{}", self.item_prefix, n))
                .collect(),
        }
    }

    /// Score bucket keys, lowest first.
    pub fn score_keys(&self) -> Vec<String> {
        (self.scale_min..=self.scale_max).map(|s| s.to_string()).collect()
    }
}

fn default_item_prefix() -> String {
    "Q".to_string()
}

fn default_item_count() -> usize {
    40
}

fn default_scale_min() -> u32 {
    1
}

fn default_scale_max() -> u32 {
    6
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Labels for each Likert score, lowest first.
    #[serde(default = "default_score_labels")]
    pub score_labels: Vec<String>,

    /// Show percentages next to counts.
    #[serde(default = "default_true")]
    pub include_percentages: bool,

    /// Decimal places for average ranks.
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            score_labels: default_score_labels(),
            include_percentages: true,
            decimals: default_decimals(),
        }
    }
}

fn default_score_labels() -> Vec<String> {
    vec![
        "Not like me at all",
        "Not like me",
        "A little like me",
        "Somewhat like me",
        "Like me",
        "Very much like me",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_decimals() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.survey-stats.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Pick the configuration for a run: the explicit path when given, else
    /// the file in `dir`, else built-in defaults.
    ///
    /// Also returns the path the configuration came from, if any. A file
    /// that exists but cannot be parsed is an error in both cases.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match Self::load_from_dir(dir)? {
            Some(config) => Ok((config, Some(dir.join(CONFIG_FILE_NAME)))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(count) = args.likert_items {
            self.likert.item_count = count;
            self.likert.items = None;
        }

        if let Some(ref separator) = args.separator {
            self.ranking.terminal.separator = separator.clone();
            self.ranking.instrumental.separator = separator.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject configurations the engine cannot aggregate with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.key.is_empty() {
                return Err(EngineError::InvalidConfig(
                    "field key must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate field key: {}",
                    field.key
                )));
            }
        }

        for (name, list) in [
            ("terminal", &self.ranking.terminal),
            ("instrumental", &self.ranking.instrumental),
        ] {
            if list.separator.is_empty() {
                return Err(EngineError::InvalidConfig(format!(
                    "{} ranking separator must not be empty",
                    name
                )));
            }
        }

        let mut items = HashSet::new();
        for key in self.likert.item_keys() {
            if !items.insert(key.clone()) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate likert item: {}",
                    key
                )));
            }
        }

        if self.likert.scale_min > self.likert.scale_max {
            return Err(EngineError::InvalidConfig(format!(
                "likert scale is inverted: {}..{}",
                self.likert.scale_min, self.likert.scale_max
            )));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
