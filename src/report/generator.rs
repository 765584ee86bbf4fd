//! Markdown and JSON report generation.
//!
//! This module renders an aggregate statistics document as a readable
//! Markdown report, or hands the document itself out as JSON.

use crate::analysis::{
    buckets_by_count, buckets_numeric, closeness_to_top, likert, looks_numeric, percentage,
};
use crate::config::{Config, RankedListConfig};
use crate::models::{AggregateStatisticsDocument, FieldAggregationSpec, RankedItem};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about one statistics run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the responses were read from.
    pub source: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    /// Number of responses aggregated.
    pub total_responses: usize,
    /// Duration of loading and aggregation in seconds.
    pub duration_seconds: f64,
}

/// A statistics document plus the context needed to present it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub statistics: AggregateStatisticsDocument,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &Config) -> String {
    let mut output = String::new();

    output.push_str("# Survey Statistics Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    let stats = &report.statistics;
    if stats.is_empty() {
        output.push_str("No responses yet. Statistics will appear once the first survey is submitted.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str(&generate_table_of_contents());
    output.push_str(&generate_demographics_section(stats, config));
    output.push_str(&generate_rankings_section(stats, config));
    output.push_str(&generate_likert_section(stats, config));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Total Responses:** {}\n",
        metadata.total_responses
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Demographics](#demographics)\n");
    toc.push_str("- [Value Rankings](#value-rankings)\n");
    toc.push_str("- [Likert Items](#likert-items)\n");
    toc.push('\n');

    toc
}

/// One table per configured field, in configuration order.
fn generate_demographics_section(stats: &AggregateStatisticsDocument, config: &Config) -> String {
    let mut section = String::new();
    let total = stats.total_responses as u64;

    section.push_str("## Demographics\n\n");

    for spec in &config.fields {
        let Some(dist) = stats.field_distributions.get(&spec.key) else {
            continue;
        };
        if dist.is_empty() {
            continue;
        }

        section.push_str(&format!("### {}\n\n", spec.key));
        section.push_str(&table_header(config.report.include_percentages, "Value"));

        for (label, count) in ordered_buckets(dist, spec) {
            section.push_str(&count_row(
                &capitalize(label),
                count,
                total,
                config.report.include_percentages,
            ));
        }
        section.push('\n');
    }

    section
}

fn ordered_buckets<'a>(
    dist: &'a crate::models::Distribution,
    spec: &FieldAggregationSpec,
) -> Vec<(&'a str, u64)> {
    let fallback = spec.default.as_str();
    if looks_numeric(dist, fallback) {
        buckets_numeric(dist, fallback)
    } else {
        buckets_by_count(dist)
    }
}

fn generate_rankings_section(stats: &AggregateStatisticsDocument, config: &Config) -> String {
    let mut section = String::new();

    section.push_str("## Value Rankings\n\n");
    section.push_str("Lower average rank means the value was placed higher.\n\n");
    section.push_str(&generate_rank_table(
        "Terminal Values",
        &stats.rank_tables.terminal,
        &config.ranking.terminal,
        config.report.decimals,
    ));
    section.push_str(&generate_rank_table(
        "Instrumental Values",
        &stats.rank_tables.instrumental,
        &config.ranking.instrumental,
        config.report.decimals,
    ));

    section
}

/// Render one average-rank table.
fn generate_rank_table(
    title: &str,
    table: &[RankedItem],
    list: &RankedListConfig,
    decimals: usize,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {}\n\n", title));

    if table.is_empty() {
        section.push_str("No rankings to display.\n\n");
        return section;
    }

    // Scale size comes from the vocabulary, or from what was observed.
    let scale_size = if list.vocabulary.is_empty() {
        table.len()
    } else {
        list.vocabulary.len().max(table.len())
    };

    section.push_str(&format!(
        "| # | Value | Avg. Rank | Closeness to 1 (of {}) |\n",
        scale_size
    ));
    section.push_str("|:---:|:---|:---:|:---:|\n");

    for (i, item) in table.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {:.*} | {:.1}% |\n",
            i + 1,
            item.item_name,
            decimals,
            item.average_rank,
            closeness_to_top(item.average_rank, scale_size)
        ));
    }
    section.push('\n');

    section
}

fn generate_likert_section(stats: &AggregateStatisticsDocument, config: &Config) -> String {
    let mut section = String::new();
    let scores = config.likert.score_keys();

    section.push_str("## Likert Items\n\n");

    // Legend
    for (i, score) in scores.iter().enumerate() {
        if let Some(label) = config.report.score_labels.get(i) {
            section.push_str(&format!("- **{}**: {}\n", score, label));
        }
    }
    section.push('\n');

    section.push_str("| Item |");
    for score in &scores {
        section.push_str(&format!(" {} |", score));
    }
    section.push_str(" Answers | Mean |\n");
    section.push_str("|:---|");
    for _ in &scores {
        section.push_str(":---:|");
    }
    section.push_str(":---:|:---:|\n");

    for key in config.likert.item_keys() {
        let Some(dist) = stats.likert_distributions.get(&key) else {
            continue;
        };
        let answered = likert::answered(dist);

        section.push_str(&format!("| {} |", key));
        for score in &scores {
            let count = dist.get(score).copied().unwrap_or(0);
            if config.report.include_percentages && answered > 0 {
                section.push_str(&format!(
                    " {} ({:.0}%) |",
                    count,
                    percentage(count, answered)
                ));
            } else {
                section.push_str(&format!(" {} |", count));
            }
        }
        let mean = likert::mean_score(dist)
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(" {} | {} |\n", answered, mean));
    }
    section.push('\n');

    section
}

fn table_header(include_percentages: bool, label: &str) -> String {
    if include_percentages {
        format!("| {} | Count | Share |\n|:---|:---:|:---:|\n", label)
    } else {
        format!("| {} | Count |\n|:---|:---:|\n", label)
    }
}

fn count_row(label: &str, count: u64, total: u64, include_percentages: bool) -> String {
    if include_percentages {
        format!(
            "| {} | {} | {:.1}% |\n",
            label,
            count,
            percentage(count, total)
        )
    } else {
        format!("| {} | {} |\n", label, count)
    }
}

/// Uppercase the first character of a label.
fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by survey-stats v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report: the statistics document itself.
pub fn generate_json_report(stats: &AggregateStatisticsDocument) -> Result<String> {
    serde_json::to_string_pretty(stats).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::ResponseRecord;
    use serde_json::json;

    fn create_test_report(records: serde_json::Value, config: &Config) -> Report {
        let records: Vec<ResponseRecord> = serde_json::from_value(records).unwrap();
        let statistics = aggregate(&records, config);

        Report {
            metadata: ReportMetadata {
                source: "results_backup.json".to_string(),
                generated_at: Utc::now(),
                total_responses: statistics.total_responses,
                duration_seconds: 0.01,
            },
            statistics,
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.likert.item_count = 2;
        config
    }

    #[test]
    fn test_generate_markdown_report() {
        let config = small_config();
        let report = create_test_report(
            json!([
                {"Gender": "female", "Age": 24, "TerminalRanks": "1. Health; 2. Freedom", "Q1": 5},
                {"Gender": "male", "Age": 31, "InstrumentalRanks": "1. Honest", "Q1": 6},
            ]),
            &config,
        );

        let markdown = generate_markdown_report(&report, &config);

        assert!(markdown.contains("# Survey Statistics Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Demographics"));
        assert!(markdown.contains("### Gender"));
        assert!(markdown.contains("| Female | 1 | 50.0% |"));
        assert!(markdown.contains("### Terminal Values"));
        assert!(markdown.contains("| 1 | Health | 1.00 | 100.0% |"));
        assert!(markdown.contains("| Q2 |"));
        assert!(markdown.contains("Very much like me"));
    }

    #[test]
    fn test_age_buckets_sorted_numerically() {
        let config = small_config();
        let report = create_test_report(
            json!([{"Age": 40}, {"Age": 9}, {"Age": 25}, {}]),
            &config,
        );

        let markdown = generate_markdown_report(&report, &config);
        let nine = markdown.find("| 9 |").unwrap();
        let twenty_five = markdown.find("| 25 |").unwrap();
        let forty = markdown.find("| 40 |").unwrap();
        assert!(nine < twenty_five && twenty_five < forty);
    }

    #[test]
    fn test_empty_report() {
        let config = small_config();
        let report = create_test_report(json!([]), &config);

        let markdown = generate_markdown_report(&report, &config);
        assert!(markdown.contains("No responses yet"));
        assert!(!markdown.contains("## Demographics"));
    }

    #[test]
    fn test_rank_table_without_rows() {
        let list = RankedListConfig::new("TerminalRanks", "terminal");
        let table = generate_rank_table("Terminal Values", &[], &list, 2);
        assert!(table.contains("No rankings to display."));
    }

    #[test]
    fn test_rank_table_uses_vocabulary_size() {
        let mut list = RankedListConfig::new("TerminalRanks", "terminal");
        list.vocabulary = (1..=18).map(|i| format!("V{}", i)).collect();
        let items = vec![RankedItem {
            item_name: "V1".to_string(),
            average_rank: 18.0,
        }];

        let table = generate_rank_table("Terminal Values", &items, &list, 1);
        assert!(table.contains("(of 18)"));
        assert!(table.contains("| 1 | V1 | 18.0 | 0.0% |"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("male"), "Male");
        assert_eq!(capitalize("ірина"), "Ірина");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_generate_json_report() {
        let config = small_config();
        let report = create_test_report(json!([{"Q1": 3}]), &config);
        let json = generate_json_report(&report.statistics).unwrap();

        assert!(json.contains("\"total_responses\": 1"));
        assert!(json.contains("\"field_distributions\""));
        assert!(json.contains("\"rank_tables\""));
        assert!(json.contains("\"likert_distributions\""));
    }
}
