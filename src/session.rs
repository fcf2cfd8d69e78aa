//! Per-window editing session.
//!
//! DESIGN
//! ======
//! `EditorSession` owns everything one editor window edits: the document,
//! the selection, the undo history, the event bus and the console log. There
//! are no module-level singletons, so two windows are simply two sessions.
//!
//! Every document mutation goes through a transaction opened here. The
//! wrappers forward to the [`UndoManager`] and turn its outcome into
//! notifications: a recorded commit emits `DataChanged` and
//! `UndoStackChanged` and re-derives the dirty flag from the save point.
//!
//! The edit operations themselves live in `ops.rs` as a second `impl` block.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::console::ConsoleLog;
use crate::doc::Document;
use crate::events::{EditorEvent, EventBus};
use crate::selection::{EntityKind, EntityRef, Selection};
use crate::undo::{Commit, EntityKey, Section, UndoManager};

/// One editor window's document, selection, history and notifications.
#[derive(Debug)]
pub struct EditorSession {
    pub(crate) doc: Document,
    pub(crate) selection: Selection,
    pub(crate) undo: UndoManager,
    pub events: EventBus,
    pub console: ConsoleLog,
    file_path: Option<String>,
    has_file: bool,
    dirty: bool,
    /// Live property previews not yet folded into a committed transaction.
    unsaved_preview: bool,
    /// A preview transaction is open and waits for `commit_preview`.
    pub(crate) preview_open: bool,
    next_bulb_id: u32,
    next_score_id: u32,
    /// Id of the image operation awaiting completion, if any.
    pub(crate) pending_image_op: Option<u64>,
    next_image_op_id: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self {
            doc: Document::new(),
            selection: Selection::new(),
            undo: UndoManager::new(),
            events: EventBus::new(),
            console: ConsoleLog::new(),
            file_path: None,
            has_file: false,
            dirty: false,
            unsaved_preview: false,
            preview_open: false,
            next_bulb_id: 1,
            next_score_id: 1,
            pending_image_op: None,
            next_image_op_id: 1,
        }
    }
}

impl EditorSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    #[must_use]
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    /// Whether a document is open (new or loaded). A closed session shows an empty canvas.
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.has_file
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether an image operation is waiting for the host to finish.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_image_op.is_some()
    }

    // --- Lifecycle ---

    /// Replace the document with an empty one.
    pub fn new_document(&mut self) {
        self.replace_document(Document::new(), None, true);
        self.console.info("New document created");
    }

    /// Replace the document with one read from `path`.
    pub fn load(&mut self, doc: Document, path: Option<String>) {
        let name = doc.info.name.clone();
        self.replace_document(doc, path, true);
        tracing::info!(path = ?self.file_path, bulbs = self.doc.bulbs.len(), scores = self.doc.scores.len(), "document loaded");
        self.console.success(format!("Loaded {}", if name.is_empty() { "document" } else { name.as_str() }));
    }

    /// Drop the document entirely.
    pub fn close(&mut self) {
        self.replace_document(Document::new(), None, false);
        tracing::info!("document closed");
    }

    fn replace_document(&mut self, doc: Document, path: Option<String>, has_file: bool) {
        if self.pending_image_op.take().is_some() || self.preview_open {
            self.undo.cancel();
        }
        self.preview_open = false;
        self.next_bulb_id = doc.max_bulb_id() + 1;
        self.next_score_id = doc.max_score_id() + 1;
        self.doc = doc;
        self.file_path = path.clone();
        self.has_file = has_file;
        self.undo.clear();
        self.unsaved_preview = false;
        self.selection.clear();
        self.emit(EditorEvent::SelectionChanged);
        self.emit(EditorEvent::DataChanged);
        self.emit(EditorEvent::UndoStackChanged);
        if has_file {
            self.emit(EditorEvent::FileLoaded { path });
        }
        self.refresh_dirty();
    }

    /// Record a successful save to `path`: the current history position becomes clean.
    pub fn mark_saved(&mut self, path: String) {
        self.undo.set_save_point();
        self.unsaved_preview = false;
        self.file_path = Some(path.clone());
        self.has_file = true;
        self.emit(EditorEvent::FileSaved { path });
        self.refresh_dirty();
    }

    // --- Transactions ---

    pub fn begin_transaction(&mut self, description: &str) {
        self.undo.begin(description);
    }

    /// Close the innermost transaction and notify if it was recorded.
    pub fn end_transaction(&mut self) -> Commit {
        let commit = self.undo.end(&self.doc);
        if commit == Commit::Recorded {
            self.unsaved_preview = false;
            self.emit(EditorEvent::DataChanged);
            self.emit(EditorEvent::UndoStackChanged);
            self.refresh_dirty();
        }
        commit
    }

    pub fn cancel_transaction(&mut self) {
        self.undo.cancel();
        self.preview_open = false;
    }

    /// Close the transaction opened by live property previews, if any.
    pub fn commit_preview(&mut self) {
        if self.preview_open {
            self.preview_open = false;
            self.end_transaction();
        }
    }

    pub fn mark_for_change(&mut self, key: &EntityKey) {
        self.undo.mark_for_change(&self.doc, key);
    }

    pub fn mark_for_create(&mut self, key: &EntityKey) {
        self.undo.mark_for_create(key);
    }

    pub fn mark_for_delete(&mut self, key: &EntityKey) {
        self.undo.mark_for_delete(&self.doc, key);
    }

    pub fn mark_section(&mut self, section: Section) {
        self.undo.mark_section(&self.doc, section);
    }

    // --- Undo / redo ---

    /// Undo the last transaction. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.commit_preview();
        let Some(description) = self.undo.undo(&mut self.doc) else {
            return false;
        };
        self.after_history_step("Undo", &description);
        true
    }

    /// Redo the last undone transaction. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.commit_preview();
        let Some(description) = self.undo.redo(&mut self.doc) else {
            return false;
        };
        self.after_history_step("Redo", &description);
        true
    }

    fn after_history_step(&mut self, verb: &str, description: &str) {
        tracing::debug!(verb, description, "history step");
        self.console.info(format!("{verb}: {description}"));
        self.prune_selection();
        self.emit(EditorEvent::DataChanged);
        self.emit(EditorEvent::UndoStackChanged);
        self.refresh_dirty();
    }

    // --- Selection ---

    pub fn select(&mut self, target: EntityRef, additive: bool) {
        self.selection.select(target, additive);
        self.emit(EditorEvent::SelectionChanged);
    }

    pub fn deselect(&mut self, target: EntityRef) {
        if self.selection.deselect(target) {
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    pub fn toggle_selection(&mut self, target: EntityRef) {
        self.selection.toggle(target);
        self.emit(EditorEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    pub fn set_selection(&mut self, bulbs: Vec<u32>, scores: Vec<u32>, primary: Option<EntityRef>) {
        self.selection.set(bulbs, scores, primary);
        self.emit(EditorEvent::SelectionChanged);
    }

    /// Whether `target` still exists in the document.
    #[must_use]
    pub fn exists(&self, target: EntityRef) -> bool {
        match target.kind {
            EntityKind::Bulb => self.doc.bulb(target.id).is_some(),
            EntityKind::Score => self.doc.score(target.id).is_some(),
        }
    }

    /// Drop selected ids whose entity no longer exists.
    pub(crate) fn prune_selection(&mut self) {
        let doc = &self.doc;
        let removed = self.selection.retain(|r| match r.kind {
            EntityKind::Bulb => doc.bulb(r.id).is_some(),
            EntityKind::Score => doc.score(r.id).is_some(),
        });
        if removed {
            self.emit(EditorEvent::SelectionChanged);
        }
    }

    // --- Ids ---

    /// Next bulb id: above every id ever handed out and every id in the document.
    pub(crate) fn allocate_bulb_id(&mut self) -> u32 {
        let id = self.next_bulb_id.max(self.doc.max_bulb_id() + 1);
        self.next_bulb_id = id + 1;
        id
    }

    pub(crate) fn allocate_score_id(&mut self) -> u32 {
        let id = self.next_score_id.max(self.doc.max_score_id() + 1);
        self.next_score_id = id + 1;
        id
    }

    pub(crate) fn allocate_image_op_id(&mut self) -> u64 {
        let id = self.next_image_op_id;
        self.next_image_op_id += 1;
        id
    }

    // --- Dirty tracking ---

    /// Flag uncommitted live edits (property previews) as unsaved.
    pub fn mark_preview_dirty(&mut self) {
        self.unsaved_preview = true;
        self.refresh_dirty();
    }

    pub(crate) fn refresh_dirty(&mut self) {
        let dirty = self.unsaved_preview || !self.undo.is_at_save_point();
        if dirty != self.dirty {
            self.dirty = dirty;
            self.emit(EditorEvent::DirtyChanged(dirty));
        }
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.events.emit(&event);
    }
}
