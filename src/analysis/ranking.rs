//! Ranked-list parsing and average-rank tables.
//!
//! Rankings are stored either as delimited text (`"1. Health; 2. Freedom"`)
//! or as an ordered array of item names. Malformed text entries are skipped
//! so one bad historical record cannot break aggregation for everyone.

use crate::config::RankedListConfig;
use crate::models::{RankedItem, ResponseRecord};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

/// `<digits>.<optional whitespace><name>`
fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.\s*(.*)$").expect("ranking entry pattern is valid"))
}

/// Parse a single `<rank>. <name>` entry.
///
/// Returns `None` only for entries that do not match the pattern. A rank
/// wider than `u64` saturates, and an empty name is kept as-is.
pub fn parse_entry(entry: &str) -> Option<(u64, String)> {
    let caps = entry_pattern().captures(entry)?;
    let rank = caps.get(1)?.as_str().parse::<u64>().unwrap_or(u64::MAX);
    let name = caps.get(2)?.as_str().trim();
    Some((rank, name.to_string()))
}

/// Parse a delimited ranking string into `(rank, name)` pairs, in entry order.
pub fn parse_ranking(text: &str, separator: &str) -> Vec<(u64, String)> {
    text.split(separator)
        .filter_map(|entry| {
            let parsed = parse_entry(entry);
            if parsed.is_none() && !entry.trim().is_empty() {
                debug!("Skipping malformed ranking entry: {:?}", entry);
            }
            parsed
        })
        .collect()
}

/// Extract the ranking stored in a field value.
///
/// Strings are parsed as delimited text. Arrays are read as native ordered
/// sequences: position `i` gets rank `i + 1`, and non-string elements are
/// skipped while still occupying their position.
pub fn ranking_from_value(value: &Value, separator: &str) -> Vec<(u64, String)> {
    match value {
        Value::String(text) => parse_ranking(text, separator),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let name = item.as_str()?.trim();
                let rank = u64::try_from(i + 1).ok()?;
                (!name.is_empty()).then(|| (rank, name.to_string()))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Find the ranking for one list in a record, trying fallback keys in order.
pub fn record_ranking(record: &ResponseRecord, list: &RankedListConfig) -> Vec<(u64, String)> {
    list.candidate_keys()
        .find_map(|key| record.truthy(key))
        .map(|value| ranking_from_value(value, &list.separator))
        .unwrap_or_default()
}

/// Per-item rank observations, remembering first-occurrence order.
#[derive(Debug, Default)]
struct RankAccumulator {
    order: Vec<String>,
    observations: HashMap<String, Vec<u64>>,
}

impl RankAccumulator {
    fn observe(&mut self, name: String, rank: u64) {
        match self.observations.get_mut(&name) {
            Some(ranks) => ranks.push(rank),
            None => {
                self.order.push(name.clone());
                self.observations.insert(name, vec![rank]);
            }
        }
    }

    fn averages(self) -> Vec<RankedItem> {
        let mut observations = self.observations;
        self.order
            .into_iter()
            .filter_map(|name| {
                let ranks = observations.remove(&name)?;
                if ranks.is_empty() {
                    return None;
                }
                let sum: u128 = ranks.iter().map(|&r| u128::from(r)).sum();
                Some(RankedItem {
                    average_rank: sum as f64 / ranks.len() as f64,
                    item_name: name,
                })
            })
            .collect()
    }
}

/// Compute the average-rank table for one ranked list.
///
/// The result is sorted ascending by average rank. Equal averages are
/// ordered by vocabulary position when a vocabulary is configured, with
/// unknown items after known ones; otherwise first occurrence wins.
pub fn average_ranks(records: &[ResponseRecord], list: &RankedListConfig) -> Vec<RankedItem> {
    let mut acc = RankAccumulator::default();

    for (index, record) in records.iter().enumerate() {
        let mut seen = HashSet::new();
        for (rank, name) in record_ranking(record, list) {
            if !seen.insert(name.clone()) {
                debug!(
                    "Record #{} ranks {:?} more than once; keeping the first rank",
                    index, name
                );
                continue;
            }
            acc.observe(name, rank);
        }
    }

    let mut table = acc.averages();
    sort_table(&mut table, &list.vocabulary);
    table
}

/// Stable ascending sort with an optional vocabulary tie-break.
pub fn sort_table(table: &mut [RankedItem], vocabulary: &[String]) {
    let position: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    table.sort_by(|a, b| match a.average_rank.total_cmp(&b.average_rank) {
        Ordering::Equal => {
            let pa = position.get(a.item_name.as_str()).copied().unwrap_or(usize::MAX);
            let pb = position.get(b.item_name.as_str()).copied().unwrap_or(usize::MAX);
            pa.cmp(&pb)
        }
        other => other,
    });
}
