//! Record store loading.
//!
//! This module reads the stored response collection from disk and checks
//! its shape before anything reaches the engine. A collection that is not a
//! sequence of objects is a caller contract violation and fails fast.

use crate::error::{json_type_name, EngineError};
use crate::models::ResponseRecord;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Load every stored record from a JSON array or JSON Lines file.
pub fn load_records(path: &Path) -> Result<Vec<ResponseRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read responses from {}", path.display()))?;

    let records = if is_json_lines(path) {
        debug!("Reading {} as JSON Lines", path.display());
        records_from_lines(&content)?
    } else {
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        records_from_value(value)?
    };

    info!("Loaded {} responses from {}", records.len(), path.display());
    Ok(records)
}

fn is_json_lines(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jsonl") | Some("ndjson")
    )
}

/// Convert a parsed JSON document into records.
pub fn records_from_value(value: Value) -> Result<Vec<ResponseRecord>, EngineError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(EngineError::NotASequence {
                found: json_type_name(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| record_from_value(index, item))
        .collect()
}

fn record_from_value(index: usize, value: Value) -> Result<ResponseRecord, EngineError> {
    match value {
        Value::Object(fields) => Ok(ResponseRecord::new(fields)),
        other => Err(EngineError::RecordNotAMapping {
            index,
            found: json_type_name(&other),
        }),
    }
}

/// Parse JSON Lines content, one record per non-blank line.
pub fn records_from_lines(content: &str) -> Result<Vec<ResponseRecord>, EngineError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .enumerate()
        .map(|(index, (line_no, line))| {
            let value: Value =
                serde_json::from_str(line).map_err(|e| EngineError::InvalidLine {
                    line: line_no + 1,
                    message: e.to_string(),
                })?;
            record_from_value(index, value)
        })
        .collect()
}

/// Quick overview of a record collection, used by dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSummary {
    /// Number of records.
    pub total: usize,
    /// How many records carry each field.
    pub field_presence: BTreeMap<String, usize>,
}

impl RecordSummary {
    pub fn from_records(records: &[ResponseRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            for key in record.keys() {
                *summary.field_presence.entry(key.clone()).or_insert(0) += 1;
            }
        }

        summary
    }
}
