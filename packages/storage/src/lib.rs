//! # Rulepad Storage
//!
//! Persistence for named rule documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ library: names, create / load / save / del  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: KeyValueStore                        │
//! │  - MemoryStore                              │
//! │  - FileStore (temp file + rename)           │
//! └─────────────────────────────────────────────┘
//! ```

mod errors;
mod library;
mod store;

pub use errors::{NameError, StorageError};
pub use library::{validate_name, DocumentLibrary, CREATE_SENTINEL, INDEX_KEY, RESERVED_NAMES};
pub use store::{FileStore, KeyValueStore, MemoryStore};
