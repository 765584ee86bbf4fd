//! Generic field-frequency aggregation.
//!
//! Each configured demographic field gets a histogram of its normalized
//! values. Missing or falsy values fall into the field's default bucket, so
//! every histogram sums to the number of records.

use crate::models::{
    canonical_string, Distribution, FieldAggregationSpec, Normalization, ResponseRecord,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Build one histogram per configured field.
pub fn field_distributions(
    records: &[ResponseRecord],
    specs: &[FieldAggregationSpec],
) -> BTreeMap<String, Distribution> {
    let mut distributions: BTreeMap<String, Distribution> = specs
        .iter()
        .map(|spec| (spec.key.clone(), Distribution::new()))
        .collect();

    for record in records {
        for spec in specs {
            let bucket = bucket_for(record, spec);
            if let Some(dist) = distributions.get_mut(&spec.key) {
                *dist.entry(bucket).or_insert(0) += 1;
            }
        }
    }

    distributions
}

/// The histogram bucket a record falls into for one field.
pub fn bucket_for(record: &ResponseRecord, spec: &FieldAggregationSpec) -> String {
    match record.truthy(&spec.key) {
        Some(value) => normalize(value, spec.normalization),
        None => match spec.normalization {
            Normalization::Lowercase => spec.default.to_lowercase(),
            _ => spec.default.clone(),
        },
    }
}

/// Apply a normalization mode and return the bucket key.
pub fn normalize(value: &Value, mode: Normalization) -> String {
    match (mode, value) {
        (Normalization::Lowercase, Value::String(s)) => s.to_lowercase(),
        _ => canonical_string(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ResponseRecord {
        serde_json::from_value(value).unwrap()
    }

    fn specs() -> Vec<FieldAggregationSpec> {
        vec![
            FieldAggregationSpec::new("Gender", "unspecified", Normalization::Lowercase),
            FieldAggregationSpec::new("Age", "unknown", Normalization::Stringify),
            FieldAggregationSpec::new("City", "unspecified", Normalization::None),
        ]
    }

    #[test]
    fn test_lowercase_merges_case_variants() {
        let records = vec![
            record(json!({"Gender": "Male"})),
            record(json!({"Gender": "male"})),
            record(json!({"Gender": "FEMALE"})),
        ];

        let dists = field_distributions(&records, &specs());
        let gender = &dists["Gender"];
        assert_eq!(gender.get("male"), Some(&2));
        assert_eq!(gender.get("female"), Some(&1));
    }

    #[test]
    fn test_missing_field_uses_default() {
        let records = vec![record(json!({"Gender": "Male"}))];

        let dists = field_distributions(&records, &specs());
        assert_eq!(dists["Age"].get("unknown"), Some(&1));
        assert_eq!(dists["City"].get("unspecified"), Some(&1));
    }

    #[test]
    fn test_falsy_values_use_default() {
        let records = vec![
            record(json!({"Age": 0})),
            record(json!({"Age": ""})),
            record(json!({"Age": null})),
        ];

        let dists = field_distributions(&records, &specs());
        assert_eq!(dists["Age"].get("unknown"), Some(&3));
    }

    #[test]
    fn test_stringify_merges_numeric_and_string_ages() {
        let records = vec![
            record(json!({"Age": 25})),
            record(json!({"Age": "25"})),
            record(json!({"Age": 25.0})),
        ];

        let dists = field_distributions(&records, &specs());
        assert_eq!(dists["Age"].get("25"), Some(&3));
        assert_eq!(dists["Age"].len(), 1);
    }

    #[test]
    fn test_lowercase_leaves_non_strings_alone() {
        assert_eq!(normalize(&json!(42), Normalization::Lowercase), "42");
        assert_eq!(normalize(&json!("Kyiv"), Normalization::None), "Kyiv");
    }

    #[test]
    fn test_counts_sum_to_total() {
        let records = vec![
            record(json!({"Gender": "Male", "Age": 30, "City": "Lviv"})),
            record(json!({"Gender": "Female"})),
            record(json!({})),
        ];

        let dists = field_distributions(&records, &specs());
        for spec in specs() {
            let sum: u64 = dists[&spec.key].values().sum();
            assert_eq!(sum, records.len() as u64, "field {}", spec.key);
        }
    }

    #[test]
    fn test_no_records_yields_empty_histograms() {
        let dists = field_distributions(&[], &specs());
        assert_eq!(dists.len(), 3);
        assert!(dists.values().all(|d| d.is_empty()));
    }
}
