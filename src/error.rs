//! Typed errors for contract violations.
//!
//! Data-quality problems inside a single record (malformed ranking entries,
//! out-of-range scores, missing fields) are tolerated by the engine and never
//! reach this type. Only structural problems with the input collection or the
//! configuration are reported here.

use thiserror::Error;

/// Errors raised when the caller hands the engine something it cannot use.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The record collection is not a sequence.
    #[error("record collection must be a JSON array, found {found}")]
    NotASequence { found: &'static str },

    /// A record inside the collection is not a mapping.
    #[error("record #{index} must be a JSON object, found {found}")]
    RecordNotAMapping { index: usize, found: &'static str },

    /// A JSON Lines entry could not be parsed.
    #[error("line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    /// The aggregation configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Human-readable name of a JSON value's type, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(3)), "number");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_error_messages_name_position() {
        let err = EngineError::RecordNotAMapping {
            index: 4,
            found: "string",
        };
        assert_eq!(err.to_string(), "record #4 must be a JSON object, found string");
    }
}
