use rulepad_editor::EditorError;
use rulepad_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No document selected")]
    NoSelection,
}
