//! # Document Library
//!
//! Named rule documents on top of a [`KeyValueStore`].
//!
//! ```text
//! "__jsons" → ["news", "shop"]      index of document names
//! "news"    → "[{\"for\": ...}]"    document text, stored as typed
//! "shop"    → "..."
//! ```
//!
//! Documents are stored as text, not as parsed JSON, so a save never loses
//! what the user typed even when it does not parse.

use rulepad_document::DEFAULT_DOCUMENT_TEXT;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{NameError, StorageError};
use crate::store::KeyValueStore;

/// Key holding the list of document names
pub const INDEX_KEY: &str = "__jsons";

/// Selector value meaning "create a new document"
pub const CREATE_SENTINEL: &str = "__create";

/// Names that can never be used for a document
pub const RESERVED_NAMES: &[&str] = &["", "null", "__json", INDEX_KEY, CREATE_SENTINEL];

/// Check a proposed name against the reserved names and the existing ones
pub fn validate_name(name: &str, existing: &[String]) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::EmptyName);
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(NameError::ReservedName(name.to_string()));
    }
    if existing.iter().any(|known| known == name) {
        return Err(NameError::NameTaken(name.to_string()));
    }
    Ok(())
}

pub struct DocumentLibrary {
    store: Box<dyn KeyValueStore>,
}

impl DocumentLibrary {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Known document names, in creation order
    pub fn names(&self) -> Result<Vec<String>, StorageError> {
        match self.store.get(INDEX_KEY)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|_| StorageError::UnexpectedValue {
                    key: INDEX_KEY.to_string(),
                    expected: "a list of names",
                })
            }
        }
    }

    pub fn contains(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.names()?.iter().any(|known| known == name))
    }

    /// Text of a document, `None` if the name is not in the index
    pub fn load(&self, name: &str) -> Result<Option<String>, StorageError> {
        if !self.contains(name)? {
            return Ok(None);
        }

        match self.store.get(name)? {
            Some(Value::String(text)) => Ok(Some(text)),
            None => {
                debug!(document = name, "Indexed document has no stored text");
                Ok(None)
            }
            Some(_) => Err(StorageError::UnexpectedValue {
                key: name.to_string(),
                expected: "document text",
            }),
        }
    }

    /// Add a document holding the default text
    ///
    /// The index and the document are written together.
    pub fn create(&mut self, name: &str) -> Result<(), StorageError> {
        let mut names = self.names()?;
        validate_name(name, &names)?;
        names.push(name.to_string());

        self.store.set_many(vec![
            (INDEX_KEY.to_string(), Value::from(names)),
            (name.to_string(), Value::from(DEFAULT_DOCUMENT_TEXT)),
        ])?;

        info!(document = name, "Created document");
        Ok(())
    }

    /// Store text under an existing name
    ///
    /// Returns `false` and writes nothing for names outside the index.
    pub fn save(&mut self, name: &str, text: &str) -> Result<bool, StorageError> {
        if !self.contains(name)? {
            debug!(document = name, "Not saving unknown document");
            return Ok(false);
        }

        self.store.set(name, Value::from(text))?;
        debug!(document = name, bytes = text.len(), "Saved document");
        Ok(true)
    }

    /// Drop a document and its index entry
    pub fn delete(&mut self, name: &str) -> Result<bool, StorageError> {
        let mut names = self.names()?;
        let Some(position) = names.iter().position(|known| known == name) else {
            return Ok(false);
        };
        names.remove(position);

        self.store.set(INDEX_KEY, Value::from(names))?;
        self.store.remove(name)?;

        info!(document = name, "Deleted document");
        Ok(true)
    }
}
