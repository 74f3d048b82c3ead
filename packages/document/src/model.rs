//! # Document Model
//!
//! A rule document is an array of rulesets. Only the first ruleset is edited;
//! the rest are carried through untouched so the text shape survives a
//! round-trip.
//!
//! ```text
//! [
//!   {
//!     "for": { "urls": [".*"] },
//!     "exclude": [ { "type": "CSS", "path": "div.ad" } ],
//!     "metadata": { "title": { "type": "XPATH", "path": "//h1" } }
//!   }
//! ]
//! ```
//!
//! Keys the model does not know about are kept in `extra` maps and written
//! back after the known keys.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ShapeError;
use crate::mutations::{Mutation, MutationError};

/// Query language of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    #[serde(rename = "XPATH")]
    XPath,

    #[serde(rename = "CSS")]
    Css,
}

impl QueryKind {
    /// Kind selected by a row's toggle (checked means CSS)
    pub fn from_toggle(checked: bool) -> Self {
        if checked {
            QueryKind::Css
        } else {
            QueryKind::XPath
        }
    }

    /// Toggle position that displays this kind
    pub fn toggle(self) -> bool {
        self == QueryKind::Css
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::XPath => "XPATH",
            QueryKind::Css => "CSS",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query identifying content to exclude from matching
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExcludeRule {
    #[serde(rename = "type")]
    pub kind: QueryKind,

    #[serde(rename = "path", default)]
    pub query: String,
}

impl ExcludeRule {
    pub fn new(kind: QueryKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }
}

/// Named query extracting a labeled value from a target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataRule {
    #[serde(rename = "type")]
    pub kind: QueryKind,

    #[serde(rename = "path", default)]
    pub query: String,
}

impl MetadataRule {
    pub fn new(kind: QueryKind, query: impl Into<String>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }
}

/// URL patterns a ruleset applies to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UrlScope {
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scope, exclusions and metadata queries for one set of URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(rename = "for")]
    pub scope: UrlScope,

    #[serde(rename = "exclude", default)]
    pub excludes: Vec<ExcludeRule>,

    #[serde(default)]
    pub metadata: IndexMap<String, MetadataRule>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            scope: UrlScope {
                urls: vec![".*".to_string()],
                extra: Map::new(),
            },
            excludes: Vec::new(),
            metadata: IndexMap::new(),
            extra: Map::new(),
        }
    }
}

/// Editable rule document
///
/// Always holds at least one ruleset: the primary one, which every accessor
/// and mutation works on.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Vec<Ruleset>")]
pub struct Document {
    primary: Ruleset,
    rest: Vec<Ruleset>,
}

impl TryFrom<Vec<Ruleset>> for Document {
    type Error = ShapeError;

    fn try_from(rulesets: Vec<Ruleset>) -> Result<Self, Self::Error> {
        let mut rulesets = rulesets.into_iter();
        let primary = rulesets.next().ok_or(ShapeError::NoRuleset)?;

        if primary.metadata.keys().any(|field| field.is_empty()) {
            return Err(ShapeError::EmptyFieldName);
        }

        Ok(Self {
            primary,
            rest: rulesets.collect(),
        })
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(1 + self.rest.len()))?;
        seq.serialize_element(&self.primary)?;
        for ruleset in &self.rest {
            seq.serialize_element(ruleset)?;
        }
        seq.end()
    }
}

impl Document {
    /// Create a document holding a single ruleset
    pub fn new(primary: Ruleset) -> Self {
        Self {
            primary,
            rest: Vec::new(),
        }
    }

    /// The ruleset all edits apply to
    pub fn primary(&self) -> &Ruleset {
        &self.primary
    }

    pub(crate) fn primary_mut(&mut self) -> &mut Ruleset {
        &mut self.primary
    }

    /// Number of rulesets in the array, including the primary one
    pub fn ruleset_count(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn excludes(&self) -> &[ExcludeRule] {
        &self.primary.excludes
    }

    pub fn metadata(&self) -> &IndexMap<String, MetadataRule> {
        &self.primary.metadata
    }

    pub fn get_exclude(&self, index: usize) -> Result<&ExcludeRule, MutationError> {
        self.primary
            .excludes
            .get(index)
            .ok_or(MutationError::IndexOutOfRange {
                index,
                len: self.primary.excludes.len(),
            })
    }

    pub fn get_metadata(&self, field: &str) -> Result<&MetadataRule, MutationError> {
        self.primary
            .metadata
            .get(field)
            .ok_or_else(|| MutationError::FieldNotFound(field.to_string()))
    }

    pub fn has_metadata(&self, field: &str) -> bool {
        self.primary.metadata.contains_key(field)
    }

    /// Apply a mutation, leaving the document untouched if it is rejected
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        mutation.apply(self)
    }

    pub fn set_exclude(&mut self, index: usize, rule: ExcludeRule) -> Result<(), MutationError> {
        self.apply(&Mutation::SetExclude { index, rule })
    }

    /// Append an exclude rule
    pub fn insert_exclude(&mut self, rule: ExcludeRule) -> Result<(), MutationError> {
        self.apply(&Mutation::InsertExclude { rule })
    }

    pub fn remove_exclude(&mut self, index: usize) -> Result<(), MutationError> {
        self.apply(&Mutation::RemoveExclude { index })
    }

    /// Write a metadata rule under `new_field`, renaming `old_field` if the
    /// two differ
    pub fn set_metadata(
        &mut self,
        new_field: &str,
        old_field: &str,
        rule: MetadataRule,
    ) -> Result<(), MutationError> {
        self.apply(&Mutation::SetMetadata {
            field: new_field.to_string(),
            previous_field: old_field.to_string(),
            rule,
        })
    }

    pub fn remove_metadata(&mut self, field: &str) -> Result<(), MutationError> {
        self.apply(&Mutation::RemoveMetadata {
            field: field.to_string(),
        })
    }
}
