//! Host abstraction: file dialogs, file writes, message boxes and settings storage.
//!
//! The desktop shell and the web build each implement [`Platform`]. Calls are
//! synchronous from the core's point of view; an asynchronous host resolves
//! the dialog first and then calls into [`crate::editor::Editor`].

/// A file picked in the open dialog, already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Info,
    Question,
    Warning,
    Error,
}

/// A blocking message box. The host returns the index of the pressed button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBox {
    pub kind: MessageKind,
    pub title: String,
    pub message: String,
    pub detail: Option<String>,
    pub buttons: Vec<String>,
}

/// Button indices of [`MessageBox::save_changes`].
pub const SAVE_BUTTON: usize = 0;
pub const DONT_SAVE_BUTTON: usize = 1;

impl MessageBox {
    /// A single-button error dialog.
    #[must_use]
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            title: title.into(),
            message: message.into(),
            detail: None,
            buttons: vec!["OK".into()],
        }
    }

    /// The Save / Don't Save / Cancel prompt shown before discarding changes.
    #[must_use]
    pub fn save_changes() -> Self {
        Self {
            kind: MessageKind::Warning,
            title: "Unsaved changes".into(),
            message: "Do you want to save the changes you made?".into(),
            detail: Some("Your changes will be lost if you don't save them.".into()),
            buttons: vec!["Save".into(), "Don't Save".into(), "Cancel".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },
    #[error("failed to read file: {0}")]
    Read(String),
    #[error("settings storage unavailable: {0}")]
    Storage(String),
}

/// Services the editor needs from its host window.
pub trait Platform {
    /// Show the open dialog and read the chosen file. `Ok(None)` when cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Read`] if the chosen file cannot be read.
    fn open_file_dialog(&mut self) -> Result<Option<OpenedFile>, PlatformError>;

    /// Show the save dialog. Returns the chosen path, or `None` when cancelled.
    fn save_file_dialog(&mut self, suggested: Option<&str>) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`PlatformError::Write`] on any I/O failure.
    fn write_file(&mut self, path: &str, content: &str) -> Result<(), PlatformError>;

    /// Show `message` and block until a button is pressed.
    fn message_box(&mut self, message: &MessageBox) -> usize;

    /// Raw settings JSON, or `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Storage`] if the store cannot be read.
    fn load_settings(&mut self) -> Result<Option<String>, PlatformError>;

    /// # Errors
    ///
    /// Returns [`PlatformError::Storage`] if the store cannot be written.
    fn store_settings(&mut self, json: &str) -> Result<(), PlatformError>;

    /// Reflect the document's modified state in the window chrome.
    fn set_dirty(&mut self, dirty: bool);
}
