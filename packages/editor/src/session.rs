//! # Edit Session
//!
//! All state of one editor panel, threaded through the event handlers.
//!
//! An `EditSession` owns the text view content, the parsed [`Document`], the
//! visual rows, the validation timer and the evaluator output. Handlers run
//! one at a time and leave the text, the document and the rows consistent
//! before returning. The one allowed gap is a metadata row whose typed name is
//! blank or taken: that name stays in the row until it can be written.
//!
//! Two directions of sync are kept apart:
//!
//! - **rebuild**: text → document → rows (loading, text edits, entering the
//!   visual view); never writes back to the text
//! - **write-through**: row edit → mutation → document → text; never rebuilds
//!   the rows
//!
//! Handlers record what the outside world should see in two queues:
//! [`ViewPatch`]es for the renderer and [`OutboundMessage`]s for the
//! evaluator. Errors are also turned into inline state (parse error, conflict
//! markers) before they are returned.

use std::time::{Duration, Instant};

use rulepad_document::{
    decode_escaped, encode_escaped, parse, serialize, Document, DocumentError, ExcludeRule,
    MetadataRule, Mutation, MutationError, QueryKind, TextFormat, DEFAULT_DOCUMENT_TEXT,
};
use tracing::{debug, info, warn};

use crate::errors::EditorError;
use crate::merge::apply_validation;
use crate::projection::{FieldConflict, RowId, RowSection, RowSet, ViewPatch};
use crate::protocol::{FieldResult, InboundMessage, OutboundMessage, ReportedError};
use crate::scheduler::ValidationScheduler;

/// Text view content while no document is selected
pub const PLACEHOLDER_TEXT: &str = "Create/Load a file...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorView {
    Visual,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardFormat {
    /// Text view content as shown
    Plain,

    /// Compact JSON as an escaped string literal
    Escaped,
}

/// User edit on one input of a row
#[derive(Debug, Clone, PartialEq)]
pub enum RowEdit {
    Kind(QueryKind),
    Query(String),

    /// Metadata rows only
    Field(String),
}

/// One line of the evaluator's field table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: String,
    pub values: Vec<String>,
}

/// Editing state for one panel
pub struct EditSession {
    text: String,
    encoded: bool,
    document: Option<Document>,
    parse_error: Option<String>,
    rows: RowSet,
    scheduler: ValidationScheduler,
    view: EditorView,

    /// Increments whenever the document changes
    version: u64,

    results: Vec<ResultRow>,
    errors: Vec<String>,

    patches: Vec<ViewPatch>,
    outbox: Vec<OutboundMessage>,
}

impl EditSession {
    /// Create a session showing the placeholder
    pub fn new(debounce: Duration) -> Self {
        Self {
            text: PLACEHOLDER_TEXT.to_string(),
            encoded: false,
            document: None,
            parse_error: None,
            rows: RowSet::new(),
            scheduler: ValidationScheduler::new(debounce),
            view: EditorView::Visual,
            version: 0,
            results: Vec::new(),
            errors: Vec::new(),
            patches: Vec::new(),
            outbox: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Loading and views
    // ---------------------------------------------------------------------

    /// Replace the session content with a stored document, or the placeholder
    ///
    /// Requests validation immediately, dropping any pending debounce.
    pub fn load_document(&mut self, text: Option<&str>) -> Result<(), EditorError> {
        self.encoded = false;
        self.document = None;
        self.parse_error = None;
        self.version += 1;

        let result = match text {
            None => {
                self.text = PLACEHOLDER_TEXT.to_string();
                self.push_text_patch();
                let clear = self.rows.clear();
                self.patches.push(clear);
                self.patches.push(ViewPatch::ShowPlaceholder {
                    message: PLACEHOLDER_TEXT.to_string(),
                });
                Ok(())
            }
            Some(text) => {
                self.text = text.to_string();
                self.push_text_patch();
                let clear = self.rows.clear();
                self.patches.push(clear);
                self.rebuild_from_text()
            }
        };

        info!(version = self.version, placeholder = text.is_none(), "Loaded document");
        self.scheduler.cancel();
        self.request_validation();
        result
    }

    /// Replace the session content with the built-in default document
    pub fn reset_to_default(&mut self) -> Result<(), EditorError> {
        self.load_document(Some(DEFAULT_DOCUMENT_TEXT))
    }

    /// Switch between the visual and text views
    ///
    /// Entering the visual view decodes encoded text, rebuilds the rows from
    /// the text and requests validation immediately.
    pub fn switch_view(&mut self, view: EditorView) -> Result<(), EditorError> {
        let entering_visual = view == EditorView::Visual && self.view == EditorView::Text;
        self.view = view;

        if !entering_visual {
            return Ok(());
        }

        if self.is_placeholder() {
            self.patches.push(ViewPatch::ShowPlaceholder {
                message: PLACEHOLDER_TEXT.to_string(),
            });
            self.request_validation();
            return Ok(());
        }

        let result = self
            .set_encoded(false)
            .and_then(|()| self.rebuild_from_text());
        self.request_validation();
        result
    }

    // ---------------------------------------------------------------------
    // Text view
    // ---------------------------------------------------------------------

    /// Direct edit of the text view
    ///
    /// Text that parses replaces the document and rebuilds the rows. Text
    /// that does not parse is kept as typed; the document and rows stay as
    /// they were until it parses again.
    pub fn on_text_edited(
        &mut self,
        text: impl Into<String>,
        now: Instant,
    ) -> Result<(), EditorError> {
        self.text = text.into();

        let doc = self
            .parse_view_text()
            .map_err(|e| self.record_parse_error(e))?;
        self.parse_error = None;

        if self.document.as_ref() != Some(&doc) {
            let patches = self.rows.rebuild_from_document(&doc);
            self.patches.extend(patches);
            self.document = Some(doc);
            self.version += 1;
            debug!(version = self.version, "Document replaced from text");
            self.scheduler.schedule(now);
        }

        Ok(())
    }

    /// Re-indent the text view
    pub fn reformat(&mut self) -> Result<(), EditorError> {
        if self.is_placeholder() {
            return Err(EditorError::NoDocument);
        }

        let doc = self
            .parse_view_text()
            .map_err(|e| self.record_parse_error(e))?;

        self.text = serialize(&doc, TextFormat::Pretty)?;
        self.encoded = false;
        self.parse_error = None;
        self.push_text_patch();
        Ok(())
    }

    /// Flip the text view between JSON and its escaped string literal
    pub fn toggle_encoding(&mut self) -> Result<(), EditorError> {
        self.set_encoded(!self.encoded)
    }

    /// Text to put on the clipboard
    pub fn clipboard_text(&self, format: ClipboardFormat) -> Result<String, EditorError> {
        match format {
            ClipboardFormat::Plain => Ok(self.text.clone()),
            ClipboardFormat::Escaped => Ok(encode_escaped(&self.parse_view_text()?)?),
        }
    }

    // ---------------------------------------------------------------------
    // Visual view
    // ---------------------------------------------------------------------

    /// Add a blank row
    ///
    /// Exclude rows are written to the document straight away. Metadata rows
    /// start unnamed and only reach the document once named; returns `None`
    /// when an unnamed metadata row already exists.
    pub fn add_empty_row(
        &mut self,
        section: RowSection,
        now: Instant,
    ) -> Result<Option<RowId>, EditorError> {
        match section {
            RowSection::Exclude => self.add_exclude_row(ExcludeRule::default(), now).map(Some),
            RowSection::Metadata => {
                self.editable_document()?;

                if let Some(row) = self.rows.unnamed_metadata_row() {
                    debug!(row = %row.id, "Unnamed metadata row already present");
                    return Ok(None);
                }

                let (id, patch) = self.rows.push_metadata(None, MetadataRule::default());
                self.patches.push(patch);
                Ok(Some(id))
            }
        }
    }

    /// Append an exclude rule and its row
    pub fn add_exclude_row(
        &mut self,
        rule: ExcludeRule,
        now: Instant,
    ) -> Result<RowId, EditorError> {
        self.commit(&Mutation::InsertExclude { rule: rule.clone() }, now)?;

        let (id, patch) = self.rows.push_exclude(rule);
        self.patches.push(patch);
        Ok(id)
    }

    /// Add a named metadata rule and its row
    ///
    /// Fails with `DuplicateField` if the name is taken; nothing changes then.
    pub fn add_metadata_row(
        &mut self,
        field: &str,
        rule: MetadataRule,
        now: Instant,
    ) -> Result<RowId, EditorError> {
        let mutation = Mutation::SetMetadata {
            field: field.to_string(),
            previous_field: String::new(),
            rule: rule.clone(),
        };
        self.commit(&mutation, now)?;

        let (id, patch) = self.rows.push_metadata(Some(field.to_string()), rule);
        self.patches.push(patch);
        Ok(id)
    }

    /// Write a row edit through to the document
    pub fn on_row_edited(
        &mut self,
        id: RowId,
        edit: RowEdit,
        now: Instant,
    ) -> Result<(), EditorError> {
        match self.rows.section_of(id) {
            Some(RowSection::Exclude) => self.edit_exclude_row(id, edit, now),
            Some(RowSection::Metadata) => self.edit_metadata_row(id, edit, now),
            None => Err(EditorError::UnknownRow(id)),
        }
    }

    /// Remove a row and the entry behind it
    pub fn on_row_removed(&mut self, id: RowId, now: Instant) -> Result<(), EditorError> {
        self.editable_document()?;

        let mutation = if let Some(position) = self.rows.exclude_position(id) {
            Some(Mutation::RemoveExclude { index: position })
        } else if let Some(row) = self.rows.metadata_row(id) {
            row.field.clone().map(|field| Mutation::RemoveMetadata { field })
        } else {
            return Err(EditorError::UnknownRow(id));
        };

        if let Some(mutation) = mutation {
            match self.commit(&mutation, now) {
                Ok(()) => {}
                Err(EditorError::Mutation(e)) => {
                    warn!(row = %id, error = %e, "Removed row had no document entry");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(patch) = self.rows.remove(id) {
            self.patches.push(patch);
        }
        self.scheduler.schedule(now);
        Ok(())
    }

    fn edit_exclude_row(
        &mut self,
        id: RowId,
        edit: RowEdit,
        now: Instant,
    ) -> Result<(), EditorError> {
        let position = self
            .rows
            .exclude_position(id)
            .ok_or(EditorError::UnknownRow(id))?;

        let current = match self.editable_document()?.get_exclude(position) {
            Ok(rule) => rule.clone(),
            Err(e) => return Err(self.drop_stale_row(id, e)),
        };

        let rule = match edit {
            RowEdit::Kind(kind) => ExcludeRule { kind, ..current },
            RowEdit::Query(query) => ExcludeRule { query, ..current },
            RowEdit::Field(_) => return Err(EditorError::InvalidEdit(RowSection::Exclude)),
        };

        self.commit(
            &Mutation::SetExclude {
                index: position,
                rule: rule.clone(),
            },
            now,
        )?;

        if let Some(row) = self.rows.exclude_row_mut(id) {
            row.rule = rule;
        }
        Ok(())
    }

    fn edit_metadata_row(
        &mut self,
        id: RowId,
        edit: RowEdit,
        now: Instant,
    ) -> Result<(), EditorError> {
        self.editable_document()?;

        let row = self.rows.metadata_row(id).ok_or(EditorError::UnknownRow(id))?;
        let bound = row.field.clone();

        if let RowEdit::Field(name) = edit {
            return self.rename_metadata_row(id, bound, name, now);
        }

        let Some(field) = bound else {
            // Unnamed rows keep their rule locally until they are named
            if let Some(row) = self.rows.metadata_row_mut(id) {
                row.rule = with_edit(row.rule.clone(), edit);
            }
            return Ok(());
        };

        let current = match self.editable_document()?.get_metadata(&field) {
            Ok(rule) => rule.clone(),
            Err(e) => return Err(self.drop_stale_row(id, e)),
        };
        let rule = with_edit(current, edit);

        self.commit(
            &Mutation::SetMetadata {
                field: field.clone(),
                previous_field: field,
                rule: rule.clone(),
            },
            now,
        )?;

        if let Some(row) = self.rows.metadata_row_mut(id) {
            row.rule = rule;
        }
        Ok(())
    }

    /// Name edit on a metadata row
    ///
    /// A blank or taken name only marks the row; the document keeps the last
    /// good name until the row gets a free one.
    fn rename_metadata_row(
        &mut self,
        id: RowId,
        bound: Option<String>,
        name: String,
        now: Instant,
    ) -> Result<(), EditorError> {
        if let Some(row) = self.rows.metadata_row_mut(id) {
            row.draft = name.clone();
        }

        if bound.as_deref() == Some(name.as_str()) {
            self.set_conflict(id, None);
            return Ok(());
        }

        if name.is_empty() {
            self.set_conflict(id, Some(FieldConflict::Blank));
            return Ok(());
        }

        if self.editable_document()?.has_metadata(&name) {
            debug!(row = %id, field = %name, "Metadata field name already taken");
            self.set_conflict(id, Some(FieldConflict::Taken));
            return Err(MutationError::DuplicateField(name).into());
        }

        let rule = match &bound {
            Some(old) => match self.editable_document()?.get_metadata(old) {
                Ok(rule) => rule.clone(),
                Err(e) => return Err(self.drop_stale_row(id, e)),
            },
            None => self
                .rows
                .metadata_row(id)
                .map(|row| row.rule.clone())
                .unwrap_or_default(),
        };

        self.commit(
            &Mutation::SetMetadata {
                field: name.clone(),
                previous_field: bound.unwrap_or_default(),
                rule: rule.clone(),
            },
            now,
        )?;

        if let Some(row) = self.rows.metadata_row_mut(id) {
            row.field = Some(name);
            row.rule = rule;
        }
        self.set_conflict(id, None);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Evaluator traffic
    // ---------------------------------------------------------------------

    /// Send validation now, bypassing the debounce
    ///
    /// A pending timer is left running and fires on its own.
    pub fn fetch_now(&mut self) {
        self.request_validation();
    }

    /// Ask the evaluator to render the empty default document
    pub fn clear_page(&mut self) {
        self.outbox.push(OutboundMessage::Evaluate {
            document: DEFAULT_DOCUMENT_TEXT.to_string(),
        });
    }

    /// Start (or restart) the validation debounce
    pub fn schedule_validation(&mut self, now: Instant) {
        self.scheduler.schedule(now);
    }

    /// Fire the debounce timer if it is due
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.scheduler.poll(now) {
            return false;
        }

        self.request_validation();
        true
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Handle a message from the evaluator
    pub fn handle_message(&mut self, message: InboundMessage, now: Instant) {
        if let Some(results) = message.results {
            self.apply_results(results);
        }

        if let Some(result) = message.validation_result {
            self.errors = result.errors.iter().map(ReportedError::message).collect();

            let patches = apply_validation(&result, &mut self.rows);
            debug!(changed = patches.len(), "Applied validation result");
            self.patches.extend(patches);
        }

        if message.reload {
            self.scheduler.schedule(now);
        }
    }

    /// Document text as it should be sent to the evaluator
    ///
    /// Compact JSON when the text parses, the default document while the
    /// placeholder is shown, and the raw text otherwise so the evaluator can
    /// report what is wrong with it.
    pub fn outgoing_document(&self) -> String {
        if self.is_placeholder() {
            return DEFAULT_DOCUMENT_TEXT.to_string();
        }

        if self.parse_error.is_none() {
            if let Some(document) = &self.document {
                match serialize(document, TextFormat::Compact) {
                    Ok(text) => return text,
                    Err(e) => warn!(error = %e, "Sending raw text instead of document"),
                }
            }
        }

        self.text.clone()
    }

    fn request_validation(&mut self) {
        let document = self.outgoing_document();
        info!(version = self.version, bytes = document.len(), "Requesting validation");

        self.outbox.push(OutboundMessage::Validate {
            document: document.clone(),
        });
        self.outbox.push(OutboundMessage::Evaluate { document });
    }

    fn apply_results(&mut self, results: Vec<FieldResult>) {
        self.results.clear();
        self.errors.clear();

        for result in results {
            if result.is_error() {
                self.errors.push(result.message());
                continue;
            }

            match result.display_values() {
                Some(values) => self.results.push(ResultRow {
                    label: result.label,
                    values,
                }),
                None => warn!(label = %result.label, "Field result carries no value"),
            }
        }
    }

    // ---------------------------------------------------------------------
    // Queues and state
    // ---------------------------------------------------------------------

    /// Drain patches for the renderer
    pub fn take_patches(&mut self) -> Vec<ViewPatch> {
        std::mem::take(&mut self.patches)
    }

    /// Drain messages for the evaluator
    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text to persist: the JSON itself rather than its escaped form
    pub fn stored_text(&self) -> String {
        if !self.encoded {
            return self.text.clone();
        }

        match decode_escaped(&self.text).and_then(|doc| serialize(&doc, TextFormat::Pretty)) {
            Ok(text) => text,
            Err(_) => self.text.clone(),
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    pub fn view(&self) -> EditorView {
        self.view
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    pub fn is_placeholder(&self) -> bool {
        self.document.is_none() && self.text == PLACEHOLDER_TEXT
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// Evaluator errors to show inline
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    /// Whether rows and document agree, allowing for unnamed and conflicted rows
    pub fn is_consistent(&self) -> bool {
        match &self.document {
            Some(document) => self.rows.is_consistent_with(document),
            None => self.rows.is_empty(),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn editable_document(&self) -> Result<&Document, EditorError> {
        if self.parse_error.is_some() {
            return Err(EditorError::TextNotParsed);
        }
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    /// Apply a mutation, rewrite the text and restart the debounce
    fn commit(&mut self, mutation: &Mutation, now: Instant) -> Result<(), EditorError> {
        if self.parse_error.is_some() {
            return Err(EditorError::TextNotParsed);
        }

        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        document.apply(mutation)?;
        self.version += 1;
        debug!(mutation = mutation.name(), version = self.version, "Applied mutation");

        self.write_text()?;
        self.scheduler.schedule(now);
        Ok(())
    }

    fn write_text(&mut self) -> Result<(), EditorError> {
        let Some(document) = &self.document else {
            return Ok(());
        };

        self.text = if self.encoded {
            encode_escaped(document)?
        } else {
            serialize(document, TextFormat::Pretty)?
        };
        self.push_text_patch();
        Ok(())
    }

    fn rebuild_from_text(&mut self) -> Result<(), EditorError> {
        let doc = self
            .parse_view_text()
            .map_err(|e| self.record_parse_error(e))?;

        let patches = self.rows.rebuild_from_document(&doc);
        self.patches.extend(patches);
        self.document = Some(doc);
        self.parse_error = None;
        Ok(())
    }

    fn set_encoded(&mut self, encoded: bool) -> Result<(), EditorError> {
        if encoded == self.encoded {
            return Ok(());
        }
        if self.is_placeholder() {
            return Err(EditorError::NoDocument);
        }

        let doc = self
            .parse_view_text()
            .map_err(|e| self.record_parse_error(e))?;

        self.text = if encoded {
            encode_escaped(&doc)?
        } else {
            serialize(&doc, TextFormat::Pretty)?
        };
        self.encoded = encoded;
        self.parse_error = None;
        self.push_text_patch();
        Ok(())
    }

    fn parse_view_text(&self) -> Result<Document, DocumentError> {
        if self.encoded {
            decode_escaped(&self.text)
        } else {
            parse(&self.text)
        }
    }

    fn record_parse_error(&mut self, error: DocumentError) -> EditorError {
        debug!(error = %error, "Text view does not parse");
        self.parse_error = Some(error.to_string());
        error.into()
    }

    fn drop_stale_row(&mut self, id: RowId, error: MutationError) -> EditorError {
        warn!(row = %id, error = %error, "Row no longer matches the document, removing it");
        if let Some(patch) = self.rows.remove(id) {
            self.patches.push(patch);
        }
        EditorError::StaleRow(id)
    }

    fn set_conflict(&mut self, id: RowId, conflict: Option<FieldConflict>) {
        if let Some(row) = self.rows.metadata_row_mut(id) {
            if row.conflict != conflict {
                row.conflict = conflict;
                self.patches.push(ViewPatch::SetConflict { id, conflict });
            }
        }
    }

    fn push_text_patch(&mut self) {
        self.patches.push(ViewPatch::SetText {
            text: self.text.clone(),
        });
    }
}

fn with_edit(mut rule: MetadataRule, edit: RowEdit) -> MetadataRule {
    match edit {
        RowEdit::Kind(kind) => rule.kind = kind,
        RowEdit::Query(query) => rule.query = query,
        RowEdit::Field(_) => {}
    }
    rule
}
