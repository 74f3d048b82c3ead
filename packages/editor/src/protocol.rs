//! # Evaluator Protocol
//!
//! Messages exchanged with the external evaluator that runs the queries
//! against a live target. Requests are fire-and-forget: nothing pairs a
//! response with the request that produced it.
//!
//! ```text
//! editor ──{kind: "validate", document}──▶ evaluator
//! editor ──{kind: "evaluate", document}──▶ evaluator
//! editor ◀──{results | validationResult | reload}── evaluator
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label the evaluator uses for its own failures in a results list
pub const ERROR_LABEL: &str = "__error";

/// Requests sent to the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Compute per-rule match status
    Validate { document: String },

    /// Re-render matched values (and page highlighting)
    Evaluate { document: String },
}

impl OutboundMessage {
    pub fn document(&self) -> &str {
        match self {
            OutboundMessage::Validate { document } | OutboundMessage::Evaluate { document } => {
                document
            }
        }
    }
}

/// Message received from the evaluator
///
/// Each part is optional and handled independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FieldResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_result: Option<ValidationResult>,

    /// The target changed; validation should run again
    #[serde(default)]
    pub reload: bool,
}

/// Extracted value(s) for one metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

impl FieldResult {
    pub fn is_error(&self) -> bool {
        self.label == ERROR_LABEL
    }

    /// Values as display strings, `None` when the entry carries no value
    pub fn display_values(&self) -> Option<Vec<String>> {
        if let Some(values) = &self.values {
            return Some(values.iter().map(display_value).collect());
        }

        match &self.value {
            Some(Value::Array(values)) => Some(values.iter().map(display_value).collect()),
            Some(value) => Some(vec![display_value(value)]),
            None => None,
        }
    }

    /// Single-line text of an error entry
    pub fn message(&self) -> String {
        self.display_values()
            .map(|values| values.join("\n"))
            .unwrap_or_default()
    }
}

/// Per-rule statuses computed against some (possibly older) document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub exclude_statuses: Vec<RowStatus>,

    #[serde(default)]
    pub metadata_statuses: HashMap<String, RowStatus>,

    /// Evaluator messages to show verbatim
    #[serde(default)]
    pub errors: Vec<ReportedError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedError {
    pub value: Value,
}

impl ReportedError {
    pub fn message(&self) -> String {
        display_value(&self.value)
    }
}

/// Validation class of a row
///
/// Unrecognized or null statuses read as `Unknown`, which renders unstyled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum RowStatus {
    #[serde(rename = "matched")]
    Matched,

    #[serde(rename = "no-match")]
    NoMatch,

    /// The evaluator failed on this rule (distinct from no match)
    #[serde(rename = "error")]
    Error,

    #[serde(rename = "unknown")]
    Unknown,
}

impl RowStatus {
    /// Status to display, `None` for unstyled
    pub fn styled(self) -> Option<RowStatus> {
        match self {
            RowStatus::Unknown => None,
            status => Some(status),
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            RowStatus::Matched => "matched",
            RowStatus::NoMatch => "no-match",
            RowStatus::Error => "error",
            RowStatus::Unknown => "",
        }
    }
}

impl From<Option<String>> for RowStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("matched") => RowStatus::Matched,
            Some("no-match") => RowStatus::NoMatch,
            Some("error") => RowStatus::Error,
            _ => RowStatus::Unknown,
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_serialization() {
        let message = OutboundMessage::Validate {
            document: "[]".to_string(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"kind":"validate","document":"[]"}"#);

        let deserialized: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, message);
    }

    #[test]
    fn test_inbound_validation_result() {
        let message: InboundMessage = serde_json::from_str(
            r#"{"validationResult":{
                "excludeStatuses":["matched","no-match","error",null,"bogus"],
                "metadataStatuses":{"title":"matched"},
                "errors":[{"value":"bad xpath"}]}}"#,
        )
        .unwrap();

        let result = message.validation_result.unwrap();
        assert_eq!(
            result.exclude_statuses,
            vec![
                RowStatus::Matched,
                RowStatus::NoMatch,
                RowStatus::Error,
                RowStatus::Unknown,
                RowStatus::Unknown
            ]
        );
        assert_eq!(result.metadata_statuses["title"], RowStatus::Matched);
        assert_eq!(result.errors[0].message(), "bad xpath");
        assert!(message.results.is_none());
        assert!(!message.reload);
    }

    #[test]
    fn test_inbound_results() {
        let message: InboundMessage = serde_json::from_str(
            r#"{"results":[
                {"label":"title","value":"Hello"},
                {"label":"tags","values":["a","b"]},
                {"label":"count","value":3},
                {"label":"__error","value":"Invalid XPath: //h1["},
                {"label":"empty"}]}"#,
        )
        .unwrap();

        let results = message.results.unwrap();
        assert_eq!(results[0].display_values(), Some(vec!["Hello".to_string()]));
        assert_eq!(
            results[1].display_values(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(results[2].display_values(), Some(vec!["3".to_string()]));
        assert!(results[3].is_error());
        assert_eq!(results[3].message(), "Invalid XPath: //h1[");
        assert_eq!(results[4].display_values(), None);
    }

    #[test]
    fn test_inbound_reload() {
        let message: InboundMessage = serde_json::from_str(r#"{"reload":true}"#).unwrap();
        assert!(message.reload);
    }

    #[test]
    fn test_unknown_status_is_unstyled() {
        assert_eq!(RowStatus::Unknown.styled(), None);
        assert_eq!(RowStatus::Error.styled(), Some(RowStatus::Error));
    }
}
