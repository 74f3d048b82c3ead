//! Error types for the document model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    /// Malformed JSON or a shape that is not an array of rulesets
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Text is not a valid escaped JSON string literal
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),
}

/// Structural problems found after the JSON itself was read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("document must contain at least one ruleset")]
    NoRuleset,

    #[error("metadata field names must not be empty")]
    EmptyFieldName,
}
