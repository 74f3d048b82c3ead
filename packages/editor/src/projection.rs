//! # Visual Projection
//!
//! The visual editor shows one row per exclude rule and one row per metadata
//! rule. Rows are a derived view of the [`Document`]: they are rebuilt from it
//! wholesale and patched as edits are written through, but they never hold
//! truth of their own.
//!
//! Every row gets a synthetic [`RowId`] when it is built. Ids are never reused,
//! so an id handed out before a rebuild simply stops resolving afterwards
//! instead of pointing at whatever row now sits in the same position.
//!
//! The renderer is driven with [`ViewPatch`]es; it never reads rows directly.

use std::fmt;

use rulepad_document::{Document, ExcludeRule, MetadataRule, QueryKind};
use serde::{Deserialize, Serialize};

use crate::protocol::RowStatus;

/// Stable identity of a visual row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Table a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSection {
    Exclude,
    Metadata,
}

impl fmt::Display for RowSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSection::Exclude => f.write_str("exclude"),
            RowSection::Metadata => f.write_str("metadata"),
        }
    }
}

/// Why a metadata row's typed name is held back from the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldConflict {
    /// Another entry already uses the name
    Taken,

    /// The name is empty
    Blank,
}

/// Row mirroring `exclude[position]`
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludeRow {
    pub id: RowId,
    pub rule: ExcludeRule,
    pub status: Option<RowStatus>,
}

/// Row mirroring one metadata entry
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub id: RowId,

    /// Field name this row is bound to in the document (`None` until named)
    pub field: Option<String>,

    /// Name as typed in the row; differs from `field` only while in conflict
    pub draft: String,

    pub rule: MetadataRule,
    pub status: Option<RowStatus>,
    pub conflict: Option<FieldConflict>,
}

/// Data the renderer needs to draw a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowView {
    pub id: RowId,
    pub section: RowSection,
    pub kind: QueryKind,
    pub query: String,

    /// Metadata rows only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Instruction for the view layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "patch", rename_all = "camelCase")]
pub enum ViewPatch {
    /// Replace the text view content
    SetText { text: String },

    /// Remove every row and show a message instead of the tables
    ShowPlaceholder { message: String },

    /// Remove every row
    ClearRows,

    BuildRow { row: RowView },

    RemoveRow { id: RowId },

    /// Set or clear the validation class on a row's toggle
    SetStatus {
        id: RowId,
        status: Option<RowStatus>,
    },

    /// Set or clear the name-conflict marker on a metadata row
    SetConflict {
        id: RowId,
        conflict: Option<FieldConflict>,
    },
}

/// Ordered exclude and metadata rows
#[derive(Debug, Default)]
pub struct RowSet {
    excludes: Vec<ExcludeRow>,
    metadata: Vec<MetadataRow>,
    next_id: u64,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe the rows and rebuild them from the document
    ///
    /// Only the rows change; the document is read, never written.
    pub fn rebuild_from_document(&mut self, doc: &Document) -> Vec<ViewPatch> {
        let mut patches = vec![self.clear()];

        for (field, rule) in doc.metadata() {
            let (_, patch) = self.push_metadata(Some(field.clone()), rule.clone());
            patches.push(patch);
        }

        for rule in doc.excludes() {
            let (_, patch) = self.push_exclude(rule.clone());
            patches.push(patch);
        }

        patches
    }

    /// Drop every row
    pub fn clear(&mut self) -> ViewPatch {
        self.excludes.clear();
        self.metadata.clear();
        ViewPatch::ClearRows
    }

    pub fn excludes(&self) -> &[ExcludeRow] {
        &self.excludes
    }

    pub fn metadata(&self) -> &[MetadataRow] {
        &self.metadata
    }

    pub(crate) fn excludes_mut(&mut self) -> &mut [ExcludeRow] {
        &mut self.excludes
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut [MetadataRow] {
        &mut self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.excludes.is_empty() && self.metadata.is_empty()
    }

    pub fn section_of(&self, id: RowId) -> Option<RowSection> {
        if self.exclude_position(id).is_some() {
            Some(RowSection::Exclude)
        } else if self.metadata_position(id).is_some() {
            Some(RowSection::Metadata)
        } else {
            None
        }
    }

    /// Index into `exclude` the row currently stands for
    pub fn exclude_position(&self, id: RowId) -> Option<usize> {
        self.excludes.iter().position(|row| row.id == id)
    }

    pub fn metadata_position(&self, id: RowId) -> Option<usize> {
        self.metadata.iter().position(|row| row.id == id)
    }

    pub fn exclude_row(&self, id: RowId) -> Option<&ExcludeRow> {
        self.excludes.iter().find(|row| row.id == id)
    }

    pub fn exclude_row_mut(&mut self, id: RowId) -> Option<&mut ExcludeRow> {
        self.excludes.iter_mut().find(|row| row.id == id)
    }

    pub fn metadata_row(&self, id: RowId) -> Option<&MetadataRow> {
        self.metadata.iter().find(|row| row.id == id)
    }

    pub fn metadata_row_mut(&mut self, id: RowId) -> Option<&mut MetadataRow> {
        self.metadata.iter_mut().find(|row| row.id == id)
    }

    /// Row whose name has not been written to the document yet
    pub fn unnamed_metadata_row(&self) -> Option<&MetadataRow> {
        self.metadata.iter().find(|row| row.field.is_none())
    }

    /// Append an exclude row
    pub fn push_exclude(&mut self, rule: ExcludeRule) -> (RowId, ViewPatch) {
        let id = self.allocate_id();
        let patch = ViewPatch::BuildRow {
            row: RowView {
                id,
                section: RowSection::Exclude,
                kind: rule.kind,
                query: rule.query.clone(),
                field: None,
            },
        };

        self.excludes.push(ExcludeRow {
            id,
            rule,
            status: None,
        });

        (id, patch)
    }

    /// Append a metadata row, bound to `field` or unnamed
    pub fn push_metadata(
        &mut self,
        field: Option<String>,
        rule: MetadataRule,
    ) -> (RowId, ViewPatch) {
        let id = self.allocate_id();
        let draft = field.clone().unwrap_or_default();
        let patch = ViewPatch::BuildRow {
            row: RowView {
                id,
                section: RowSection::Metadata,
                kind: rule.kind,
                query: rule.query.clone(),
                field: Some(draft.clone()),
            },
        };

        self.metadata.push(MetadataRow {
            id,
            field,
            draft,
            rule,
            status: None,
            conflict: None,
        });

        (id, patch)
    }

    /// Remove a row from either table
    pub fn remove(&mut self, id: RowId) -> Option<ViewPatch> {
        if let Some(position) = self.exclude_position(id) {
            self.excludes.remove(position);
        } else if let Some(position) = self.metadata_position(id) {
            self.metadata.remove(position);
        } else {
            return None;
        }

        Some(ViewPatch::RemoveRow { id })
    }

    /// Whether the rows mirror the document
    ///
    /// Exclude rows must match `exclude` position by position. Bound metadata
    /// rows must cover every entry exactly once with the same rule; unnamed
    /// and conflicted rows are allowed to hold a draft name.
    pub fn is_consistent_with(&self, doc: &Document) -> bool {
        let excludes_match = self.excludes.len() == doc.excludes().len()
            && self
                .excludes
                .iter()
                .zip(doc.excludes())
                .all(|(row, rule)| &row.rule == rule);

        let bound: Vec<&MetadataRow> = self
            .metadata
            .iter()
            .filter(|row| row.field.is_some())
            .collect();
        let metadata_match = bound.len() == doc.metadata().len()
            && bound.iter().all(|row| {
                row.field
                    .as_deref()
                    .and_then(|field| doc.metadata().get(field))
                    .is_some_and(|rule| &row.rule == rule)
            });

        let drafts_settled = self.metadata.iter().all(|row| {
            row.conflict.is_some()
                || row.field.is_none()
                || row.field.as_deref() == Some(row.draft.as_str())
        });

        excludes_match && metadata_match && drafts_settled
    }

    fn allocate_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulepad_document::parse;

    fn sample() -> Document {
        parse(
            r#"[{"for":{"urls":[".*"]},
                "exclude":[{"type":"CSS","path":"div.ad"},{"type":"XPATH","path":"//aside"}],
                "metadata":{"title":{"type":"XPATH","path":"//h1"}}}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rebuild_mirrors_document() {
        let doc = sample();
        let mut rows = RowSet::new();

        let patches = rows.rebuild_from_document(&doc);

        assert_eq!(patches.first(), Some(&ViewPatch::ClearRows));
        assert_eq!(patches.len(), 4);
        assert_eq!(rows.excludes().len(), 2);
        assert_eq!(rows.metadata()[0].field.as_deref(), Some("title"));
        assert!(rows.is_consistent_with(&doc));
    }

    #[test]
    fn test_rebuild_issues_fresh_ids() {
        let doc = sample();
        let mut rows = RowSet::new();

        rows.rebuild_from_document(&doc);
        let old_id = rows.excludes()[0].id;
        rows.rebuild_from_document(&doc);

        assert_ne!(rows.excludes()[0].id, old_id);
        assert_eq!(rows.section_of(old_id), None);
    }

    #[test]
    fn test_positions_follow_removals() {
        let doc = sample();
        let mut rows = RowSet::new();
        rows.rebuild_from_document(&doc);

        let first = rows.excludes()[0].id;
        let second = rows.excludes()[1].id;

        assert_eq!(rows.remove(first), Some(ViewPatch::RemoveRow { id: first }));
        assert_eq!(rows.exclude_position(second), Some(0));
        assert_eq!(rows.remove(first), None);
    }

    #[test]
    fn test_unnamed_row_lookup() {
        let mut rows = RowSet::new();
        assert!(rows.unnamed_metadata_row().is_none());

        let (id, _) = rows.push_metadata(None, MetadataRule::default());

        assert_eq!(rows.unnamed_metadata_row().map(|row| row.id), Some(id));
        assert_eq!(rows.section_of(id), Some(RowSection::Metadata));
    }

    #[test]
    fn test_inconsistent_rows_detected() {
        let doc = sample();
        let mut rows = RowSet::new();
        rows.rebuild_from_document(&doc);

        rows.excludes_mut()[1].rule.query = "//nav".to_string();

        assert!(!rows.is_consistent_with(&doc));
    }
}
