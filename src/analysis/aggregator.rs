//! Aggregate statistics document assembly.
//!
//! This module runs the three aggregators over a record snapshot and
//! provides the ordering helpers shared by the report views.

use super::{frequency, likert, ranking};
use crate::config::Config;
use crate::models::{AggregateStatisticsDocument, Distribution, RankTables, ResponseRecord};
use tracing::{debug, info};

/// Aggregate every record into one statistics document.
///
/// An empty collection yields the empty sentinel without running the
/// aggregators.
pub fn aggregate(records: &[ResponseRecord], config: &Config) -> AggregateStatisticsDocument {
    let total_responses = records.len();
    if total_responses == 0 {
        info!("No responses on file; returning empty statistics");
        return AggregateStatisticsDocument::empty();
    }

    debug!(
        "Aggregating {} responses over {} fields",
        total_responses,
        config.fields.len()
    );

    let field_distributions = frequency::field_distributions(records, &config.fields);

    let rank_tables = RankTables {
        terminal: ranking::average_ranks(records, &config.ranking.terminal),
        instrumental: ranking::average_ranks(records, &config.ranking.instrumental),
    };

    let likert_distributions = likert::likert_distributions(
        records,
        &config.likert.item_keys(),
        &config.likert.score_keys(),
    );

    info!(
        "Aggregated {} responses: {} terminal and {} instrumental items ranked",
        total_responses,
        rank_tables.terminal.len(),
        rank_tables.instrumental.len()
    );

    AggregateStatisticsDocument {
        total_responses,
        field_distributions,
        rank_tables,
        likert_distributions,
    }
}

/// Buckets sorted by count, highest first; ties by label.
pub fn buckets_by_count(dist: &Distribution) -> Vec<(&str, u64)> {
    let mut buckets: Vec<_> = dist.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    buckets
}

/// Buckets in numeric order of their leading number (`"18-25"` sorts as 18).
///
/// Labels without a leading number follow in label order, and the
/// `fallback` bucket always comes last.
pub fn buckets_numeric<'a>(dist: &'a Distribution, fallback: &str) -> Vec<(&'a str, u64)> {
    let mut buckets: Vec<_> = dist.iter().map(|(k, &v)| (k.as_str(), v)).collect();
    buckets.sort_by(|a, b| {
        let key = |label: &str| (label == fallback, leading_number(label).unwrap_or(f64::INFINITY));
        let (fa, na) = key(a.0);
        let (fb, nb) = key(b.0);
        fa.cmp(&fb)
            .then_with(|| na.total_cmp(&nb))
            .then_with(|| a.0.cmp(b.0))
    });
    buckets
}

/// Whether most non-fallback labels start with a number.
pub fn looks_numeric(dist: &Distribution, fallback: &str) -> bool {
    let labels: Vec<_> = dist.keys().filter(|k| k.as_str() != fallback).collect();
    !labels.is_empty()
        && labels.iter().filter(|k| leading_number(k).is_some()).count() * 2 > labels.len()
}

fn leading_number(label: &str) -> Option<f64> {
    label
        .split(|c: char| c == '-' || c.is_whitespace())
        .next()
        .and_then(|head| head.parse::<f64>().ok())
}

/// Share of `count` in `total`, in percent.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// How close an average rank is to the top of an `n`-item scale, in percent.
///
/// Rank 1 maps to 100, rank `n` to 0.
pub fn closeness_to_top(average_rank: f64, scale_size: usize) -> f64 {
    if scale_size <= 1 {
        return 100.0;
    }
    let n = scale_size as f64;
    ((n - average_rank) / (n - 1.0) * 100.0).max(0.0)
}
