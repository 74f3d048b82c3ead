//! # Rulepad Document
//!
//! Canonical model of a rule document and its text forms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ codec: text ⇄ Document                      │
//! │  - pretty (2-space) and compact JSON        │
//! │  - escaped string literal ("encoded") form  │
//! └─────────────────────────────────────────────┘
//!                     ↕
//! ┌─────────────────────────────────────────────┐
//! │ model: Document → Ruleset                   │
//! │  - scope (`for.urls`)                       │
//! │  - ordered exclude rules                    │
//! │  - named metadata rules                     │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ mutations: validated, all-or-nothing edits  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The array shape is kept**: a document is a list of rulesets on the
//!    wire; edits only ever touch the first one
//! 2. **Mutations validate before they apply**: a rejected mutation leaves the
//!    document unchanged
//! 3. **Metadata names are unique**: a rename onto a taken name is refused,
//!    never overwritten
//!
//! ## Usage
//!
//! ```rust
//! use rulepad_document::{parse, serialize, ExcludeRule, QueryKind, TextFormat};
//!
//! let mut doc = parse(r#"[{"for":{"urls":[".*"]},"exclude":[],"metadata":{}}]"#)?;
//! doc.insert_exclude(ExcludeRule::new(QueryKind::Css, "div.ad"))?;
//!
//! let text = serialize(&doc, TextFormat::Compact)?;
//! assert_eq!(parse(&text)?, doc);
//! # Ok::<(), rulepad_document::DocumentError>(())
//! ```

mod codec;
mod errors;
mod model;
mod mutations;

pub use codec::{
    decode_escaped, encode_escaped, escape_literal, parse, reformat, serialize, TextFormat,
};
pub use errors::{DocumentError, ShapeError};
pub use model::{Document, ExcludeRule, MetadataRule, QueryKind, Ruleset, UrlScope};
pub use mutations::{Mutation, MutationError};

/// Pretty text of the built-in document every new file starts from
pub const DEFAULT_DOCUMENT_TEXT: &str = r#"[
  {
    "for": {
      "urls": [
        ".*"
      ]
    },
    "exclude": [],
    "metadata": {}
  }
]"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_text_matches_default_document() {
        let text = serialize(&Document::default(), TextFormat::Pretty).unwrap();
        assert_eq!(text, DEFAULT_DOCUMENT_TEXT);
        assert_eq!(parse(DEFAULT_DOCUMENT_TEXT).unwrap(), Document::default());
    }
}
