//! # Panel
//!
//! One editor panel: an [`EditSession`] bound to a [`DocumentLibrary`].
//!
//! The panel adds what sits around the editing core: picking, creating,
//! saving and deleting stored documents, clipboard export and short-lived
//! notices. Every event is handled synchronously; the caller supplies the
//! current time and drains [`PanelUpdate`]s and outbound evaluator messages
//! afterwards.

use std::time::{Duration, Instant};

use rulepad_editor::{
    ClipboardFormat, EditSession, EditorView, InboundMessage, OutboundMessage, RowEdit, RowId,
    RowSection, ViewPatch,
};
use rulepad_storage::DocumentLibrary;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PanelConfig;
use crate::errors::PanelError;

pub const SAVE_NOTICE: &str = "Save successful";
pub const COPY_NOTICE: &str = "Copied!";

/// Input to the panel, from the user or the evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    SelectDocument(String),
    CreateDocument(String),
    Save,
    DeleteCurrent,

    TextEdited(String),
    Reformat,
    ToggleEncoding,
    SwitchView(EditorView),

    AddRow(RowSection),
    RowEdited { id: RowId, edit: RowEdit },
    RowRemoved(RowId),

    Copy(ClipboardFormat),
    FetchNow,
    ClearPage,

    Evaluator(InboundMessage),
    Shutdown,
}

/// Output for the host UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update", rename_all = "camelCase")]
pub enum PanelUpdate {
    View(ViewPatch),
    Documents {
        names: Vec<String>,
        current: Option<String>,
    },

    /// `None` clears the notice
    Notice {
        message: Option<String>,
    },
    Clipboard {
        text: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

pub struct Panel {
    session: EditSession,
    library: DocumentLibrary,
    current: Option<String>,
    notice: Option<Notice>,
    notice_duration: Duration,
    updates: Vec<PanelUpdate>,
}

impl Panel {
    pub fn new(config: &PanelConfig, library: DocumentLibrary) -> Self {
        Self {
            session: EditSession::new(config.debounce()),
            library,
            current: None,
            notice: None,
            notice_duration: config.notice_duration(),
            updates: Vec::new(),
        }
    }

    /// Show the document list and the placeholder, and validate once
    pub fn start(&mut self) -> Result<(), PanelError> {
        self.session.load_document(None)?;
        self.push_documents()
    }

    /// Dispatch one event
    ///
    /// A failing event leaves the panel usable; the error is for the caller
    /// to surface.
    pub fn handle_event(&mut self, event: PanelEvent, now: Instant) -> Result<(), PanelError> {
        match event {
            PanelEvent::SelectDocument(name) => self.select_document(&name)?,
            PanelEvent::CreateDocument(name) => self.create_document(&name)?,
            PanelEvent::Save => {
                self.save(now)?;
            }
            PanelEvent::DeleteCurrent => {
                self.delete_current()?;
            }
            PanelEvent::TextEdited(text) => self.session.on_text_edited(text, now)?,
            PanelEvent::Reformat => self.session.reformat()?,
            PanelEvent::ToggleEncoding => self.session.toggle_encoding()?,
            PanelEvent::SwitchView(view) => self.session.switch_view(view)?,
            PanelEvent::AddRow(section) => {
                self.session.add_empty_row(section, now)?;
            }
            PanelEvent::RowEdited { id, edit } => self.session.on_row_edited(id, edit, now)?,
            PanelEvent::RowRemoved(id) => self.session.on_row_removed(id, now)?,
            PanelEvent::Copy(format) => {
                self.copy(format, now)?;
            }
            PanelEvent::FetchNow => self.session.fetch_now(),
            PanelEvent::ClearPage => self.session.clear_page(),
            PanelEvent::Evaluator(message) => self.session.handle_message(message, now),
            PanelEvent::Shutdown => {}
        }
        Ok(())
    }

    /// Fire due timers: the validation debounce and notice expiry
    pub fn tick(&mut self, now: Instant) {
        self.session.poll(now);

        if self.notice.as_ref().is_some_and(|notice| notice.expires_at <= now) {
            self.notice = None;
            self.updates.push(PanelUpdate::Notice { message: None });
        }
    }

    /// Earliest instant `tick` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let notice = self.notice.as_ref().map(|notice| notice.expires_at);

        match (self.session.next_deadline(), notice) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    /// Save the current document, then load `name`
    ///
    /// Names outside the library load the placeholder. Text that does not
    /// parse still loads; the parse error is shown inline.
    pub fn select_document(&mut self, name: &str) -> Result<(), PanelError> {
        self.save_silently()?;

        let text = self.library.load(name)?;
        self.current = text.as_ref().map(|_| name.to_string());
        info!(document = name, found = self.current.is_some(), "Selected document");

        if let Err(e) = self.session.load_document(text.as_deref()) {
            debug!(document = name, error = %e, "Stored text does not parse");
        }
        self.push_documents()
    }

    /// Add a document with the default text and switch to it
    pub fn create_document(&mut self, name: &str) -> Result<(), PanelError> {
        self.library.create(name)?;
        self.select_document(name)
    }

    /// Store the current text; returns `false` without a selected document
    pub fn save(&mut self, now: Instant) -> Result<bool, PanelError> {
        let saved = self.save_silently()?;
        if saved {
            self.show_notice(SAVE_NOTICE, now);
        }
        Ok(saved)
    }

    /// Delete the selected document and fall back to the placeholder
    pub fn delete_current(&mut self) -> Result<bool, PanelError> {
        let Some(name) = self.current.take() else {
            return Err(PanelError::NoSelection);
        };

        let deleted = self.library.delete(&name)?;
        self.session.load_document(None)?;
        self.push_documents()?;
        Ok(deleted)
    }

    pub fn current_document(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn document_names(&self) -> Result<Vec<String>, PanelError> {
        Ok(self.library.names()?)
    }

    fn save_silently(&mut self) -> Result<bool, PanelError> {
        let Some(name) = &self.current else {
            return Ok(false);
        };
        Ok(self.library.save(name, &self.session.stored_text())?)
    }

    fn push_documents(&mut self) -> Result<(), PanelError> {
        let names = self.library.names()?;
        self.updates.push(PanelUpdate::Documents {
            names,
            current: self.current.clone(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Clipboard and notices
    // ---------------------------------------------------------------------

    pub fn copy(&mut self, format: ClipboardFormat, now: Instant) -> Result<String, PanelError> {
        let text = self.session.clipboard_text(format)?;
        self.updates.push(PanelUpdate::Clipboard { text: text.clone() });
        self.show_notice(COPY_NOTICE, now);
        Ok(text)
    }

    /// Notice still showing at `now`
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.expires_at > now)
            .map(|notice| notice.message.as_str())
    }

    fn show_notice(&mut self, message: &str, now: Instant) {
        self.notice = Some(Notice {
            message: message.to_string(),
            expires_at: now + self.notice_duration,
        });
        self.updates.push(PanelUpdate::Notice {
            message: Some(message.to_string()),
        });
    }

    // ---------------------------------------------------------------------
    // Queues
    // ---------------------------------------------------------------------

    /// Drain updates: view patches first, then panel updates
    pub fn take_updates(&mut self) -> Vec<PanelUpdate> {
        let mut updates: Vec<PanelUpdate> = self
            .session
            .take_patches()
            .into_iter()
            .map(PanelUpdate::View)
            .collect();
        updates.append(&mut self.updates);
        updates
    }

    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        self.session.take_outbound()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulepad_document::DEFAULT_DOCUMENT_TEXT;
    use rulepad_storage::MemoryStore;

    fn panel() -> Panel {
        let library = DocumentLibrary::new(Box::new(MemoryStore::new()));
        let mut panel = Panel::new(&PanelConfig::default(), library);
        panel.start().unwrap();
        panel.take_updates();
        panel.take_outbound();
        panel
    }

    #[test]
    fn test_start_shows_placeholder() {
        let library = DocumentLibrary::new(Box::new(MemoryStore::new()));
        let mut panel = Panel::new(&PanelConfig::default(), library);

        panel.start().unwrap();

        assert!(panel.session().is_placeholder());
        assert_eq!(panel.take_outbound().len(), 2);
        assert!(panel.take_updates().contains(&PanelUpdate::Documents {
            names: vec![],
            current: None
        }));
    }

    #[test]
    fn test_create_selects_new_document() {
        let mut panel = panel();

        panel.create_document("news").unwrap();

        assert_eq!(panel.current_document(), Some("news"));
        assert_eq!(panel.session().text(), DEFAULT_DOCUMENT_TEXT);
        assert_eq!(panel.document_names().unwrap(), vec!["news"]);
    }

    #[test]
    fn test_create_rejected_name_keeps_selection() {
        let mut panel = panel();
        panel.create_document("news").unwrap();

        let err = panel.create_document("__create").unwrap_err();

        assert!(matches!(err, PanelError::Storage(_)));
        assert_eq!(panel.current_document(), Some("news"));
    }

    #[test]
    fn test_select_saves_current_first() {
        let mut panel = panel();
        let now = Instant::now();
        panel.create_document("a").unwrap();
        panel.create_document("b").unwrap();
        panel
            .handle_event(PanelEvent::AddRow(RowSection::Exclude), now)
            .unwrap();

        panel.select_document("a").unwrap();
        panel.select_document("b").unwrap();

        assert_eq!(panel.session().document().unwrap().excludes().len(), 1);
    }

    #[test]
    fn test_select_unknown_loads_placeholder() {
        let mut panel = panel();

        panel.select_document("missing").unwrap();

        assert_eq!(panel.current_document(), None);
        assert!(panel.session().is_placeholder());
    }

    #[test]
    fn test_save_notice_expires() {
        let mut panel = panel();
        let now = Instant::now();
        panel.create_document("news").unwrap();

        assert!(panel.save(now).unwrap());
        assert_eq!(panel.notice(now), Some(SAVE_NOTICE));
        assert_eq!(panel.next_deadline(), Some(now + Duration::from_secs(2)));

        panel.take_updates();
        panel.tick(now + Duration::from_secs(2));

        assert_eq!(panel.notice(now + Duration::from_secs(2)), None);
        assert_eq!(
            panel.take_updates(),
            vec![PanelUpdate::Notice { message: None }]
        );
    }

    #[test]
    fn test_save_without_selection() {
        let mut panel = panel();
        assert!(!panel.save(Instant::now()).unwrap());
        assert_eq!(panel.notice(Instant::now()), None);
    }

    #[test]
    fn test_delete_current() {
        let mut panel = panel();
        panel.create_document("news").unwrap();

        assert!(panel.delete_current().unwrap());

        assert!(panel.session().is_placeholder());
        assert!(panel.document_names().unwrap().is_empty());
        assert!(matches!(panel.delete_current(), Err(PanelError::NoSelection)));
    }

    #[test]
    fn test_copy_escaped() {
        let mut panel = panel();
        let now = Instant::now();
        panel.create_document("news").unwrap();
        panel.take_updates();

        let text = panel.copy(ClipboardFormat::Escaped, now).unwrap();

        assert!(text.starts_with("\"[{\\\"for\\\""));
        assert_eq!(panel.notice(now), Some(COPY_NOTICE));
        assert!(panel
            .take_updates()
            .contains(&PanelUpdate::Clipboard { text }));
    }

    #[test]
    fn test_update_serialization() {
        let update = PanelUpdate::Notice {
            message: Some(SAVE_NOTICE.to_string()),
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"update":"notice","message":"Save successful"}"#
        );
    }
}
