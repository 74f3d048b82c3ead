//! # Document Mutations
//!
//! Semantic edits on the primary ruleset.
//!
//! ## Design Principles
//!
//! 1. **Validated**: every mutation is checked against the document before
//!    anything is written
//! 2. **All-or-nothing**: a rejected mutation leaves the document untouched
//! 3. **Positional excludes**: exclude rules are addressed by index, so their
//!    order is part of the document
//!
//! ## Mutation Semantics
//!
//! ### SetMetadata
//! - `field == previous_field` writes the rule in place (or appends it)
//! - `field != previous_field` renames: fails with `DuplicateField` when
//!   `field` is taken, otherwise the entry keeps its display position
//! - Empty field names are refused
//!
//! ### RemoveExclude
//! - Later rules shift down by one

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Document, ExcludeRule, MetadataRule};

/// Semantic edits on a rule document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Replace the exclude rule at index
    SetExclude { index: usize, rule: ExcludeRule },

    /// Append an exclude rule
    InsertExclude { rule: ExcludeRule },

    /// Remove the exclude rule at index
    RemoveExclude { index: usize },

    /// Write a metadata rule, renaming `previous_field` to `field`
    SetMetadata {
        field: String,
        previous_field: String,
        rule: MetadataRule,
    },

    /// Remove a metadata rule
    RemoveMetadata { field: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Exclude index {index} out of range ({len} rules)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Metadata field not found: {0}")]
    FieldNotFound(String),

    #[error("Metadata field already exists: {0}")]
    DuplicateField(String),

    #[error("Metadata field name is empty")]
    EmptyFieldName,
}

impl Mutation {
    /// Apply mutation with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        // Validate first
        self.validate(doc)?;

        let ruleset = doc.primary_mut();

        match self {
            Mutation::SetExclude { index, rule } => {
                ruleset.excludes[*index] = rule.clone();
            }

            Mutation::InsertExclude { rule } => {
                ruleset.excludes.push(rule.clone());
            }

            Mutation::RemoveExclude { index } => {
                ruleset.excludes.remove(*index);
            }

            Mutation::SetMetadata {
                field,
                previous_field,
                rule,
            } => {
                if field == previous_field {
                    ruleset.metadata.insert(field.clone(), rule.clone());
                } else if let Some(position) = ruleset.metadata.get_index_of(previous_field) {
                    ruleset.metadata.shift_remove(previous_field);
                    ruleset
                        .metadata
                        .shift_insert(position, field.clone(), rule.clone());
                } else {
                    ruleset.metadata.insert(field.clone(), rule.clone());
                }
            }

            Mutation::RemoveMetadata { field } => {
                ruleset.metadata.shift_remove(field);
            }
        }

        Ok(())
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::SetExclude { index, .. } | Mutation::RemoveExclude { index } => {
                doc.get_exclude(*index)?;
                Ok(())
            }

            Mutation::InsertExclude { .. } => Ok(()),

            Mutation::SetMetadata {
                field,
                previous_field,
                ..
            } => {
                if field.is_empty() {
                    return Err(MutationError::EmptyFieldName);
                }

                if field != previous_field && doc.has_metadata(field) {
                    return Err(MutationError::DuplicateField(field.clone()));
                }

                Ok(())
            }

            Mutation::RemoveMetadata { field } => {
                doc.get_metadata(field)?;
                Ok(())
            }
        }
    }

    /// Get a debug name for this mutation
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetExclude { .. } => "set_exclude",
            Mutation::InsertExclude { .. } => "insert_exclude",
            Mutation::RemoveExclude { .. } => "remove_exclude",
            Mutation::SetMetadata { .. } => "set_metadata",
            Mutation::RemoveMetadata { .. } => "remove_metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryKind;

    fn doc_with_fields(fields: &[&str]) -> Document {
        let mut doc = Document::default();
        for field in fields {
            let rule = MetadataRule::new(QueryKind::XPath, format!("//{}", field));
            doc.set_metadata(field, field, rule).unwrap();
        }
        doc
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::SetMetadata {
            field: "title".to_string(),
            previous_field: String::new(),
            rule: MetadataRule::new(QueryKind::XPath, "//h1"),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut doc = doc_with_fields(&["a", "b", "c"]);

        doc.set_metadata("renamed", "b", MetadataRule::new(QueryKind::Css, "p"))
            .unwrap();

        let keys: Vec<&str> = doc.metadata().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "renamed", "c"]);
        assert_eq!(doc.get_metadata("renamed").unwrap().query, "p");
    }

    #[test]
    fn test_rename_onto_taken_name_is_rejected() {
        let mut doc = doc_with_fields(&["title", "author"]);
        let before = doc.clone();

        let result = doc.set_metadata("title", "author", MetadataRule::default());

        assert_eq!(result, Err(MutationError::DuplicateField("title".to_string())));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_same_name_updates_in_place() {
        let mut doc = doc_with_fields(&["title", "author"]);

        doc.set_metadata("title", "title", MetadataRule::new(QueryKind::Css, "h1"))
            .unwrap();

        let keys: Vec<&str> = doc.metadata().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "author"]);
        assert_eq!(doc.get_metadata("title").unwrap().kind, QueryKind::Css);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut doc = Document::default();
        let result = doc.set_metadata("", "", MetadataRule::default());
        assert_eq!(result, Err(MutationError::EmptyFieldName));
        assert!(doc.metadata().is_empty());
    }

    #[test]
    fn test_remove_missing_field_fails() {
        let mut doc = Document::default();
        let mutation = Mutation::RemoveMetadata {
            field: "nope".to_string(),
        };
        assert!(mutation.validate(&doc).is_err());
        assert!(doc.apply(&mutation).is_err());
    }

    #[test]
    fn test_set_exclude_out_of_range_leaves_document() {
        let mut doc = Document::default();
        let result = doc.set_exclude(0, ExcludeRule::default());
        assert_eq!(result, Err(MutationError::IndexOutOfRange { index: 0, len: 0 }));
        assert!(doc.excludes().is_empty());
    }
}
