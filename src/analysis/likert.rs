//! Likert score distributions.
//!
//! Every configured item gets a bucket for each score on the scale, filled
//! with zeros up front so consumers can render the full scale without
//! null checks.

use crate::models::{canonical_string, Distribution, ResponseRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Count each score per item. Out-of-scale and missing answers are ignored.
pub fn likert_distributions(
    records: &[ResponseRecord],
    item_keys: &[String],
    score_keys: &[String],
) -> BTreeMap<String, Distribution> {
    let empty: Distribution = score_keys.iter().map(|s| (s.clone(), 0)).collect();
    let mut distributions: BTreeMap<String, Distribution> = item_keys
        .iter()
        .map(|key| (key.clone(), empty.clone()))
        .collect();

    for (index, record) in records.iter().enumerate() {
        for key in item_keys {
            let Some(value) = record.truthy(key) else {
                continue;
            };
            let score = canonical_string(value);
            match distributions.get_mut(key).and_then(|d| d.get_mut(&score)) {
                Some(count) => *count += 1,
                None => debug!("Record #{} has out-of-scale {} = {}", index, key, score),
            }
        }
    }

    distributions
}

/// Number of valid answers recorded for one item.
pub fn answered(distribution: &Distribution) -> u64 {
    distribution.values().sum()
}

/// Mean score of one item, or `None` when nobody answered it.
pub fn mean_score(distribution: &Distribution) -> Option<f64> {
    let total = answered(distribution);
    if total == 0 {
        return None;
    }
    let weighted: f64 = distribution
        .iter()
        .filter_map(|(score, &count)| score.parse::<f64>().ok().map(|s| s * count as f64))
        .sum();
    Some(weighted / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ResponseRecord {
        serde_json::from_value(value).unwrap()
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn scale() -> Vec<String> {
        keys(&["1", "2", "3", "4", "5", "6"])
    }

    #[test]
    fn test_zero_fill_for_unanswered_items() {
        let dists = likert_distributions(&[], &keys(&["Q1", "Q2"]), &scale());
        assert_eq!(dists.len(), 2);
        for dist in dists.values() {
            assert_eq!(dist.len(), 6);
            assert!(dist.values().all(|&c| c == 0));
        }
    }

    #[test]
    fn test_counts_scores() {
        let records = vec![
            record(json!({"Q1": 6, "Q2": 1})),
            record(json!({"Q1": "6", "Q2": 3})),
            record(json!({"Q1": 2})),
        ];

        let dists = likert_distributions(&records, &keys(&["Q1", "Q2"]), &scale());
        assert_eq!(dists["Q1"]["6"], 2);
        assert_eq!(dists["Q1"]["2"], 1);
        assert_eq!(dists["Q2"]["1"], 1);
        assert_eq!(dists["Q2"]["3"], 1);
        assert_eq!(answered(&dists["Q2"]), 2);
    }

    #[test]
    fn test_out_of_range_values_ignored() {
        let records = vec![
            record(json!({"Q1": 7})),
            record(json!({"Q1": 0})),
            record(json!({"Q1": 2.5})),
            record(json!({"Q1": "high"})),
            record(json!({"Q1": 4})),
        ];

        let dists = likert_distributions(&records, &keys(&["Q1"]), &scale());
        assert_eq!(dists["Q1"].len(), 6);
        assert_eq!(answered(&dists["Q1"]), 1);
        assert_eq!(dists["Q1"]["4"], 1);
    }

    #[test]
    fn test_unconfigured_items_not_reported() {
        let records = vec![record(json!({"Q99": 3}))];
        let dists = likert_distributions(&records, &keys(&["Q1"]), &scale());
        assert!(!dists.contains_key("Q99"));
    }

    #[test]
    fn test_mean_score() {
        let records = vec![record(json!({"Q1": 2})), record(json!({"Q1": 5}))];
        let dists = likert_distributions(&records, &keys(&["Q1", "Q2"]), &scale());
        assert_eq!(mean_score(&dists["Q1"]), Some(3.5));
        assert_eq!(mean_score(&dists["Q2"]), None);
    }
}
