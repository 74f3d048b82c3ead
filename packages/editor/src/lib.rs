//! # Rulepad Editor
//!
//! Keeps a rule document, its text view and its visual rows in sync, and
//! feeds validation results back onto the rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: event handlers, one at a time      │
//! │  - text edits rebuild the rows              │
//! │  - row edits write through to the text      │
//! └─────────────────────────────────────────────┘
//!          ↓ ViewPatch            ↓ OutboundMessage
//! ┌──────────────────────┐  ┌────────────────────┐
//! │ projection: RowSet   │  │ scheduler: 100ms   │
//! │  exclude + metadata  │  │ debounce           │
//! └──────────────────────┘  └────────────────────┘
//!          ↑                        ↓
//! ┌─────────────────────────────────────────────┐
//! │ merge: statuses → rows (position / name)    │
//! └─────────────────────────────────────────────┘
//!                     ↑ InboundMessage
//!                 evaluator
//! ```
//!
//! ## Core Principles
//!
//! 1. **The document is the source of truth**: rows and text are derived
//!    views and can be rebuilt at any time
//! 2. **Validation is advisory**: results can be stale and are applied
//!    defensively, never to row content
//! 3. **Edits settle before validating**: only the last change in a quiet
//!    period goes out
//!
//! ## Usage
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use rulepad_editor::{EditSession, RowEdit, RowSection, DEFAULT_DEBOUNCE};
//! use rulepad_document::{QueryKind, DEFAULT_DOCUMENT_TEXT};
//!
//! let mut session = EditSession::new(DEFAULT_DEBOUNCE);
//! session.load_document(Some(DEFAULT_DOCUMENT_TEXT))?;
//!
//! let start = Instant::now();
//! let row = session.add_empty_row(RowSection::Exclude, start)?.unwrap();
//! session.on_row_edited(row, RowEdit::Kind(QueryKind::Css), start)?;
//! session.on_row_edited(row, RowEdit::Query("div.ad".into()), start)?;
//!
//! // Nothing goes out until the debounce expires
//! session.take_outbound();
//! assert!(session.poll(start + Duration::from_millis(100)));
//! assert_eq!(session.take_outbound().len(), 2);
//! # Ok::<(), rulepad_editor::EditorError>(())
//! ```

mod errors;
mod merge;
mod projection;
mod protocol;
mod scheduler;
mod session;

pub use errors::EditorError;
pub use merge::apply_validation;
pub use projection::{
    ExcludeRow, FieldConflict, MetadataRow, RowId, RowSection, RowSet, RowView, ViewPatch,
};
pub use protocol::{
    FieldResult, InboundMessage, OutboundMessage, ReportedError, RowStatus, ValidationResult,
    ERROR_LABEL,
};
pub use scheduler::{SchedulerState, ValidationScheduler, DEFAULT_DEBOUNCE};
pub use session::{
    ClipboardFormat, EditSession, EditorView, ResultRow, RowEdit, PLACEHOLDER_TEXT,
};
