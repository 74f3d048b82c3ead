//! Error types for document storage

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store content is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Store file must hold a JSON object")]
    NotAnObject,

    #[error("Entry {key} is not {expected}")]
    UnexpectedValue { key: String, expected: &'static str },

    #[error(transparent)]
    Name(#[from] NameError),
}

/// Reasons a document name is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("No name entered")]
    EmptyName,

    #[error("Name is a keyword: {0}")]
    ReservedName(String),

    #[error("Name already taken: {0}")]
    NameTaken(String),
}
