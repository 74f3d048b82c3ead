//! # Text Codec
//!
//! Conversions between a [`Document`] and its text forms:
//!
//! - **Pretty**: 2-space indented JSON shown in the text view
//! - **Compact**: single-line JSON sent to the evaluator
//! - **Escaped**: the compact form wrapped as a JSON string literal, for
//!   pasting into other configuration files

use crate::errors::DocumentError;
use crate::model::Document;

/// Output layout for [`serialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Pretty,
    Compact,
}

/// Parse document text
///
/// Fails on malformed JSON and on JSON that is not a non-empty array of
/// rulesets.
pub fn parse(text: &str) -> Result<Document, DocumentError> {
    Ok(serde_json::from_str(text)?)
}

pub fn serialize(doc: &Document, format: TextFormat) -> Result<String, DocumentError> {
    let result = match format {
        TextFormat::Pretty => serde_json::to_string_pretty(doc),
        TextFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Re-indent document text
pub fn reformat(text: &str) -> Result<String, DocumentError> {
    serialize(&parse(text)?, TextFormat::Pretty)
}

/// Wrap already-serialized text in quotes, escaping backslashes and quotes
pub fn escape_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Compact serialization as an escaped string literal
pub fn encode_escaped(doc: &Document) -> Result<String, DocumentError> {
    Ok(escape_literal(&serialize(doc, TextFormat::Compact)?))
}

/// Read a document back from its escaped string literal form
pub fn decode_escaped(text: &str) -> Result<Document, DocumentError> {
    let inner: String = serde_json::from_str(text.trim())
        .map_err(|e| DocumentError::Encoding(e.to_string()))?;

    parse(&inner)
}
