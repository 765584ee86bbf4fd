//! Data models for survey aggregation.
//!
//! This module contains the record wrapper handed to the engine, the
//! declarative field table that drives frequency aggregation, and the
//! aggregate statistics document the engine produces.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Histogram from a normalized value (or score) to its occurrence count.
pub type Distribution = BTreeMap<String, u64>;

/// One submitted survey response.
///
/// Records are created once at submission time and only ever read here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseRecord {
    fields: Map<String, Value>,
}

impl ResponseRecord {
    /// Wrap an already-deserialized JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a field, returning `None` when it is absent or falsy.
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !is_falsy(v))
    }

    /// Iterate over field names present in the record.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl From<Map<String, Value>> for ResponseRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// How a simple field's value is normalized before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Keep the value as submitted.
    #[default]
    None,
    /// Lowercase string values; other types pass through.
    Lowercase,
    /// Convert non-string values to their canonical string form.
    Stringify,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::None => write!(f, "none"),
            Normalization::Lowercase => write!(f, "lowercase"),
            Normalization::Stringify => write!(f, "stringify"),
        }
    }
}

/// One row of the demographic aggregation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAggregationSpec {
    /// Record field to read.
    pub key: String,
    /// Bucket used when the field is absent or falsy.
    pub default: String,
    /// Normalization applied before counting.
    #[serde(default)]
    pub normalization: Normalization,
}

impl FieldAggregationSpec {
    pub fn new(key: &str, default: &str, normalization: Normalization) -> Self {
        Self {
            key: key.to_string(),
            default: default.to_string(),
            normalization,
        }
    }
}

/// Average rank of one ranked-list item across the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item_name: String,
    pub average_rank: f64,
}

/// Average-rank tables for both ranked lists, each sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankTables {
    pub terminal: Vec<RankedItem>,
    pub instrumental: Vec<RankedItem>,
}

/// The engine's sole output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatisticsDocument {
    /// Number of input records.
    pub total_responses: usize,
    /// Field key to value histogram.
    pub field_distributions: BTreeMap<String, Distribution>,
    /// Terminal and instrumental average-rank tables.
    pub rank_tables: RankTables,
    /// Likert item key to six-bucket score distribution.
    pub likert_distributions: BTreeMap<String, Distribution>,
}

impl AggregateStatisticsDocument {
    /// The "no data yet" sentinel returned for an empty record collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this document is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.total_responses == 0
    }
}

/// Falsiness as the submission layer understood it: absent, null, `false`,
/// numeric zero and the empty string all count as "not provided".
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Canonical string form of a JSON value.
///
/// Integral numbers render without a fractional part, so `25` and `25.0`
/// land in the same bucket.
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => canonical_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!(false)));
        assert!(!is_falsy(&json!("0")));
        assert!(!is_falsy(&json!(25)));
        assert!(!is_falsy(&json!([])));
    }

    #[test]
    fn test_canonical_string_numbers() {
        assert_eq!(canonical_string(&json!(25)), "25");
        assert_eq!(canonical_string(&json!(25.0)), "25");
        assert_eq!(canonical_string(&json!(25.5)), "25.5");
        assert_eq!(canonical_string(&json!(-3)), "-3");
    }

    #[test]
    fn test_canonical_string_other_types() {
        assert_eq!(canonical_string(&json!("Kyiv")), "Kyiv");
        assert_eq!(canonical_string(&json!(true)), "true");
        assert_eq!(canonical_string(&json!(["a", 1, null])), "a,1,");
    }

    #[test]
    fn test_record_truthy_lookup() {
        let record: ResponseRecord = serde_json::from_value(json!({
            "Name": "Olena",
            "City": "",
        }))
        .unwrap();

        assert_eq!(record.truthy("Name"), Some(&json!("Olena")));
        assert_eq!(record.truthy("City"), None);
        assert_eq!(record.truthy("Age"), None);
        assert_eq!(record.keys().count(), 2);
    }

    #[test]
    fn test_normalization_deserializes_lowercase() {
        let spec: FieldAggregationSpec = serde_json::from_value(json!({
            "key": "Gender",
            "default": "unspecified",
            "normalization": "lowercase",
        }))
        .unwrap();
        assert_eq!(spec.normalization, Normalization::Lowercase);
        assert_eq!(spec.normalization.to_string(), "lowercase");
    }

    #[test]
    fn test_empty_document_sentinel() {
        let doc = AggregateStatisticsDocument::empty();
        assert!(doc.is_empty());
        assert!(doc.field_distributions.is_empty());
        assert!(doc.likert_distributions.is_empty());
        assert!(doc.rank_tables.terminal.is_empty());
    }
}
