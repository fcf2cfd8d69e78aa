//! Editor window: the engine plus its file lifecycle.
//!
//! DESIGN
//! ======
//! `Editor` owns one [`EngineCore`], the host [`Platform`], a [`DocumentCodec`]
//! and the persisted [`Settings`]. It handles the file commands the engine
//! leaves alone (new, open, save, save as, close) and forwards everything else.
//!
//! Failure handling follows what the user needs to see:
//! - a file that does not parse raises an error dialog and leaves the current
//!   document untouched;
//! - a failed write raises an error dialog and leaves the document dirty;
//! - discarding unsaved changes asks Save / Don't Save / Cancel first.
//!
//! After every call that can change the document the dirty flag is pushed to
//! the host, but only when it actually changed.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use crate::codec::{CodecError, DocumentCodec};
use crate::command::Command;
use crate::doc::Surface;
use crate::engine::{Action, EngineCore};
use crate::input::ClickMode;
use crate::platform::{DONT_SAVE_BUTTON, MessageBox, OpenedFile, Platform, PlatformError, SAVE_BUTTON};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("no document is open")]
    NoDocument,
    #[error("an image operation is in progress")]
    Busy,
}

/// Last path segment, for console messages.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

pub struct Editor<P: Platform, C: DocumentCodec> {
    pub engine: EngineCore,
    platform: P,
    codec: C,
    settings: Settings,
    reported_dirty: bool,
}

impl<P: Platform, C: DocumentCodec> Editor<P, C> {
    /// Create an editor and load settings from the host.
    pub fn new(mut platform: P, codec: C) -> Self {
        let settings = match platform.load_settings() {
            Ok(Some(text)) => Settings::from_json(&text),
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "settings unavailable; using defaults");
                Settings::default()
            }
        };
        let mut engine = EngineCore::new();
        engine.ui.view.show_score_frames = settings.show_score_frames;
        Self { engine, platform, codec, settings, reported_dirty: false }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    // --- Commands ---

    /// Run any command. File commands report their own failures through dialogs.
    pub fn execute(&mut self, command: Command) -> Vec<Action> {
        if !command.is_enabled(self.engine.menu_state()) {
            tracing::debug!(?command, "command disabled");
            return Vec::new();
        }
        let mut actions = Vec::new();
        let outcome = match command {
            Command::NewDocument => self.new_document().map(|_| ()),
            Command::Open => self.open().map(|_| ()),
            Command::Save => self.save().map(|_| ()),
            Command::SaveAs => self.save_as().map(|_| ()),
            Command::Close => self.close().map(|_| ()),
            Command::ShowSurface(_) | Command::ToggleScoreFrames => {
                actions = self.engine.execute(command);
                self.remember_view();
                Ok(())
            }
            other => {
                actions = self.engine.execute(other);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            tracing::warn!(?command, error = %e, "file command failed");
        }
        if command.is_file_command() {
            actions.extend(self.engine.request_render());
        }
        self.sync_dirty();
        actions
    }

    // --- File lifecycle ---

    /// Replace the document with an empty one. Returns false if the user kept the old one.
    ///
    /// # Errors
    ///
    /// Propagates a failed save from the unsaved-changes prompt.
    pub fn new_document(&mut self) -> Result<bool, EditorError> {
        self.engine.abort_gesture();
        if !self.confirm_discard()? {
            return Ok(false);
        }
        self.reset_view();
        self.engine.session.new_document();
        self.engine.zoom_to_fit();
        self.sync_dirty();
        Ok(true)
    }

    /// Ask the host for a file and open it. Returns false if cancelled.
    ///
    /// # Errors
    ///
    /// Returns the read or parse error after it has been shown to the user.
    pub fn open(&mut self) -> Result<bool, EditorError> {
        self.engine.abort_gesture();
        if !self.confirm_discard()? {
            return Ok(false);
        }
        let file = match self.platform.open_file_dialog() {
            Ok(Some(file)) => file,
            Ok(None) => return Ok(false),
            Err(e) => {
                self.show_error("Open failed", &e.to_string());
                return Err(e.into());
            }
        };
        self.open_file(file)?;
        Ok(true)
    }

    /// Load already-read file contents, e.g. a file passed on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Codec`] if the contents do not parse; the
    /// current document is left as it was.
    pub fn open_file(&mut self, file: OpenedFile) -> Result<(), EditorError> {
        let doc = match self.codec.parse(&file.content) {
            Ok(doc) => doc,
            Err(e) => {
                self.engine.session.console.error(format!("Failed to parse file: {e}"));
                self.show_error("Open failed", &format!("Failed to parse file: {e}"));
                return Err(e.into());
            }
        };
        self.reset_view();
        tracing::info!(path = %file.path, "opening document");
        self.engine.session.load(doc, Some(file.path.clone()));
        self.engine.zoom_to_fit();
        self.remember_recent(&file.path);
        self.sync_dirty();
        Ok(())
    }

    /// Save to the current path, or ask for one. Returns false if cancelled.
    ///
    /// # Errors
    ///
    /// Returns the serialize or write error after it has been shown to the
    /// user; the document stays dirty.
    pub fn save(&mut self) -> Result<bool, EditorError> {
        match self.engine.session.file_path().map(str::to_owned) {
            Some(path) => self.save_to(path).map(|()| true),
            None => self.save_as(),
        }
    }

    /// Ask for a path and save there. Returns false if cancelled.
    ///
    /// # Errors
    ///
    /// As [`Editor::save`].
    pub fn save_as(&mut self) -> Result<bool, EditorError> {
        self.ensure_saveable()?;
        let suggested = self.engine.session.file_path().map(str::to_owned);
        let Some(path) = self.platform.save_file_dialog(suggested.as_deref()) else {
            return Ok(false);
        };
        self.save_to(path)?;
        Ok(true)
    }

    /// Close the document. Returns false if the user cancelled.
    ///
    /// # Errors
    ///
    /// Propagates a failed save from the unsaved-changes prompt.
    pub fn close(&mut self) -> Result<bool, EditorError> {
        self.engine.abort_gesture();
        if !self.confirm_discard()? {
            return Ok(false);
        }
        self.reset_view();
        self.engine.session.close();
        self.engine.session.console.info("File closed");
        self.sync_dirty();
        Ok(true)
    }

    /// Whether the window may close now. Prompts if there are unsaved changes.
    ///
    /// # Errors
    ///
    /// Propagates a failed save from the prompt.
    pub fn confirm_discard(&mut self) -> Result<bool, EditorError> {
        if !self.engine.session.is_dirty() {
            return Ok(true);
        }
        match self.platform.message_box(&MessageBox::save_changes()) {
            SAVE_BUTTON => self.save(),
            DONT_SAVE_BUTTON => Ok(true),
            _ => Ok(false),
        }
    }

    // --- Internals ---

    fn ensure_saveable(&self) -> Result<(), EditorError> {
        if !self.engine.session.has_file() {
            return Err(EditorError::NoDocument);
        }
        if self.engine.session.is_busy() {
            return Err(EditorError::Busy);
        }
        Ok(())
    }

    fn save_to(&mut self, path: String) -> Result<(), EditorError> {
        self.ensure_saveable()?;
        self.engine.abort_gesture();
        self.engine.session.commit_preview();
        let written = self
            .codec
            .serialize(self.engine.session.doc())
            .map_err(EditorError::from)
            .and_then(|text| self.platform.write_file(&path, &text).map_err(EditorError::from));
        if let Err(e) = written {
            self.engine.session.console.error(format!("Save failed: {e}"));
            self.show_error("Save failed", &e.to_string());
            return Err(e);
        }
        tracing::info!(path = %path, "document saved");
        self.engine.session.console.success(format!("Saved: {}", file_name(&path)));
        self.remember_recent(&path);
        self.engine.session.mark_saved(path);
        self.sync_dirty();
        Ok(())
    }

    fn show_error(&mut self, title: &str, message: &str) {
        self.platform.message_box(&MessageBox::error(title, message));
    }

    fn reset_view(&mut self) {
        self.engine.abort_gesture();
        self.engine.set_click_mode(ClickMode::None);
        self.engine.ui.surface = Surface::Backglass;
        self.engine.set_image_size(Surface::Backglass, None);
        self.engine.set_image_size(Surface::Dmd, None);
    }

    fn remember_recent(&mut self, path: &str) {
        self.settings.add_recent_file(path);
        self.persist_settings();
    }

    fn remember_view(&mut self) {
        if self.settings.show_score_frames != self.engine.ui.view.show_score_frames {
            self.settings.show_score_frames = self.engine.ui.view.show_score_frames;
            self.persist_settings();
        }
    }

    fn persist_settings(&mut self) {
        let stored = self
            .settings
            .to_json()
            .map_err(|e| PlatformError::Storage(e.to_string()))
            .and_then(|json| self.platform.store_settings(&json));
        if let Err(e) = stored {
            tracing::warn!(error = %e, "failed to store settings");
        }
    }

    fn sync_dirty(&mut self) {
        let dirty = self.engine.session.is_dirty();
        if dirty != self.reported_dirty {
            self.reported_dirty = dirty;
            self.platform.set_dirty(dirty);
        }
    }
}
