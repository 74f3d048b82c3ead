//! Error types for the editor

use rulepad_document::{DocumentError, MutationError};
use thiserror::Error;

use crate::projection::{RowId, RowSection};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    /// The row id does not resolve (it predates a rebuild or was removed)
    #[error("Unknown row: {0}")]
    UnknownRow(RowId),

    /// The row pointed at a document entry that no longer exists; it was removed
    #[error("Row {0} no longer matches the document and was removed")]
    StaleRow(RowId),

    #[error("Edit does not apply to {0} rows")]
    InvalidEdit(RowSection),

    #[error("No document loaded")]
    NoDocument,

    #[error("Text view does not parse")]
    TextNotParsed,
}

impl EditorError {
    /// Whether this is a rejected metadata rename
    pub fn is_duplicate_field(&self) -> bool {
        matches!(
            self,
            EditorError::Mutation(MutationError::DuplicateField(_))
                | EditorError::Document(DocumentError::Mutation(MutationError::DuplicateField(_)))
        )
    }
}
