//! Transactional snapshot-diff undo/redo.
//!
//! Callers open a transaction, mark every entity or document section they are
//! about to touch, mutate the [`Document`] freely, and close the transaction.
//! Marking clones the entity's current state as `before`; closing clones the
//! state again as `after` and keeps only the snapshots that actually changed.
//! Undo writes every `before` back, redo every `after`.
//!
//! Transactions nest: only the outermost `begin` allocates a record and only
//! the matching outermost `end` commits it, so composite operations can call
//! smaller ones that open their own transactions.
//!
//! Misuse (a mark with no transaction open, an unbalanced `end`) is logged and
//! ignored. Applying a record never fails: an entity that is already gone, or
//! already present, is treated as being in the target state.

#[cfg(test)]
#[path = "undo_test.rs"]
mod undo_test;

use std::collections::BTreeMap;

use crate::consts::MAX_UNDO_STACK;
use crate::doc::{Animation, Bulb, DmdArea, Document, DocumentInfo, GrillHeights, ImageCollection, ScoreDisplay, Surface};
use crate::selection::{EntityKind, EntityRef};

/// Identity of an entity tracked by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKey {
    Bulb(u32),
    Score(u32),
    Animation(String),
}

impl From<EntityRef> for EntityKey {
    fn from(target: EntityRef) -> Self {
        match target.kind {
            EntityKind::Bulb => Self::Bulb(target.id),
            EntityKind::Score => Self::Score(target.id),
        }
    }
}

/// A whole-value document section tracked by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Info,
    Images,
    GrillHeights,
    DmdArea,
}

/// Before / after state of one tracked value. `None` means "absent".
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub before: Option<T>,
    pub after: Option<T>,
    before_index: Option<usize>,
    after_index: Option<usize>,
}

impl<T> Snapshot<T> {
    fn marked(before: Option<(usize, T)>) -> Self {
        let (before_index, before) = before.map_or((None, None), |(i, v)| (Some(i), Some(v)));
        Self { before, after: None, before_index, after_index: None }
    }

    fn side(&self, dir: Direction) -> (Option<&T>, Option<usize>) {
        match dir {
            Direction::Undo => (self.before.as_ref(), self.before_index),
            Direction::Redo => (self.after.as_ref(), self.after_index),
        }
    }
}

impl<T: PartialEq> Snapshot<T> {
    fn is_unchanged(&self) -> bool {
        self.before == self.after
    }
}

/// Outcome of [`UndoManager::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// An inner `end`; the outer transaction is still open.
    Nested,
    /// The transaction changed something and was pushed onto the undo stack.
    Recorded,
    /// Nothing changed; the transaction was dropped.
    Discarded,
    /// `end` without a matching `begin`.
    Unbalanced,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

/// One committed (or in-progress) transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoRecord {
    description: String,
    bulbs: BTreeMap<u32, Snapshot<Bulb>>,
    scores: BTreeMap<u32, Snapshot<ScoreDisplay>>,
    animations: BTreeMap<String, Snapshot<Animation>>,
    info: Option<Snapshot<DocumentInfo>>,
    images: Option<Snapshot<ImageCollection>>,
    grill: Option<Snapshot<GrillHeights>>,
    dmd_area: Option<Snapshot<DmdArea>>,
}

impl UndoRecord {
    fn new(description: &str) -> Self {
        Self { description: description.to_owned(), ..Self::default() }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn bulb(&self, id: u32) -> Option<&Snapshot<Bulb>> {
        self.bulbs.get(&id)
    }

    #[must_use]
    pub fn score(&self, id: u32) -> Option<&Snapshot<ScoreDisplay>> {
        self.scores.get(&id)
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Snapshot<Animation>> {
        self.animations.get(name)
    }

    /// Whether `section` is part of this record.
    #[must_use]
    pub fn touches(&self, section: Section) -> bool {
        match section {
            Section::Info => self.info.is_some(),
            Section::Images => self.images.is_some(),
            Section::GrillHeights => self.grill.is_some(),
            Section::DmdArea => self.dmd_area.is_some(),
        }
    }

    /// Number of tracked entities and sections.
    #[must_use]
    pub fn len(&self) -> usize {
        let sections = [self.info.is_some(), self.images.is_some(), self.grill.is_some(), self.dmd_area.is_some()];
        self.bulbs.len()
            + self.scores.len()
            + self.animations.len()
            + sections.into_iter().filter(|touched| *touched).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First mark of a key wins. `doc` is `None` for a creation mark.
    fn mark(&mut self, doc: Option<&Document>, key: &EntityKey) {
        match key {
            EntityKey::Bulb(id) => {
                self.bulbs
                    .entry(*id)
                    .or_insert_with(|| Snapshot::marked(doc.and_then(|d| find(&d.bulbs, |b| b.id == *id))));
            }
            EntityKey::Score(id) => {
                self.scores
                    .entry(*id)
                    .or_insert_with(|| Snapshot::marked(doc.and_then(|d| find(&d.scores, |s| s.id == *id))));
            }
            EntityKey::Animation(name) => {
                if !self.animations.contains_key(name) {
                    let before = doc.and_then(|d| find(&d.animations, |a| a.name == *name));
                    self.animations.insert(name.clone(), Snapshot::marked(before));
                }
            }
        }
    }

    fn mark_section(&mut self, doc: &Document, section: Section) {
        match section {
            Section::Info => {
                self.info.get_or_insert_with(|| Snapshot::marked(Some((0, doc.info.clone()))));
            }
            Section::Images => {
                self.images.get_or_insert_with(|| Snapshot::marked(Some((0, doc.images.clone()))));
            }
            Section::GrillHeights => {
                self.grill.get_or_insert_with(|| Snapshot::marked(Some((0, doc.grill))));
            }
            Section::DmdArea => {
                self.dmd_area.get_or_insert_with(|| Snapshot::marked(Some((0, doc.dmd_area))));
            }
        }
    }

    /// Capture `after` for everything marked and drop what did not change.
    fn close(&mut self, doc: &Document) {
        for (id, snap) in &mut self.bulbs {
            (snap.after_index, snap.after) = split(find(&doc.bulbs, |b| b.id == *id));
        }
        for (id, snap) in &mut self.scores {
            (snap.after_index, snap.after) = split(find(&doc.scores, |s| s.id == *id));
        }
        for (name, snap) in &mut self.animations {
            (snap.after_index, snap.after) = split(find(&doc.animations, |a| a.name == *name));
        }
        close_section(&mut self.info, &doc.info);
        close_section(&mut self.images, &doc.images);
        close_section(&mut self.grill, &doc.grill);
        close_section(&mut self.dmd_area, &doc.dmd_area);

        self.bulbs.retain(|_, s| !s.is_unchanged());
        self.scores.retain(|_, s| !s.is_unchanged());
        self.animations.retain(|_, s| !s.is_unchanged());
    }

    fn apply(&self, doc: &mut Document, dir: Direction) {
        apply_list(&mut doc.bulbs, &self.bulbs, dir, |b| &b.id);
        apply_list(&mut doc.scores, &self.scores, dir, |s| &s.id);
        apply_list(&mut doc.animations, &self.animations, dir, |a| &a.name);
        apply_section(&mut doc.info, self.info.as_ref(), dir);
        apply_section(&mut doc.images, self.images.as_ref(), dir);
        apply_section(&mut doc.grill, self.grill.as_ref(), dir);
        apply_section(&mut doc.dmd_area, self.dmd_area.as_ref(), dir);
    }
}

fn find<T: Clone>(list: &[T], pred: impl Fn(&T) -> bool) -> Option<(usize, T)> {
    list.iter().enumerate().find(|(_, item)| pred(item)).map(|(i, item)| (i, item.clone()))
}

fn split<T>(found: Option<(usize, T)>) -> (Option<usize>, Option<T>) {
    found.map_or((None, None), |(i, v)| (Some(i), Some(v)))
}

fn close_section<T: Clone + PartialEq>(slot: &mut Option<Snapshot<T>>, current: &T) {
    if let Some(snap) = slot {
        snap.after = Some(current.clone());
        snap.after_index = Some(0);
        if snap.is_unchanged() {
            *slot = None;
        }
    }
}

fn apply_section<T: Clone>(target: &mut T, snap: Option<&Snapshot<T>>, dir: Direction) {
    if let Some((Some(value), _)) = snap.map(|s| s.side(dir)) {
        *target = value.clone();
    }
}

/// Write one side of every snapshot into `list`.
///
/// Replacements and removals go first; re-insertions follow in ascending
/// recorded position, which restores the original order exactly.
fn apply_list<K: Ord, T: Clone>(
    list: &mut Vec<T>,
    snaps: &BTreeMap<K, Snapshot<T>>,
    dir: Direction,
    key_of: impl Fn(&T) -> &K,
) {
    let mut inserts: Vec<(usize, &T)> = Vec::new();
    for (key, snap) in snaps {
        let (target, index) = snap.side(dir);
        let existing = list.iter().position(|item| key_of(item) == key);
        match (target, existing) {
            (None, Some(pos)) => {
                list.remove(pos);
            }
            (Some(value), Some(pos)) => {
                if let Some(slot) = list.get_mut(pos) {
                    *slot = value.clone();
                }
            }
            (Some(value), None) => inserts.push((index.unwrap_or(usize::MAX), value)),
            (None, None) => {}
        }
    }
    inserts.sort_by_key(|(index, _)| *index);
    for (index, value) in inserts {
        let at = index.min(list.len());
        list.insert(at, value.clone());
    }
}

/// Linear undo history with nested transactions and a save point.
#[derive(Debug, Default)]
pub struct UndoManager {
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    current: Option<UndoRecord>,
    depth: usize,
    /// Undo-stack depth at the last save; `None` once that state is unreachable.
    save_point: Option<usize>,
}

impl UndoManager {
    #[must_use]
    pub fn new() -> Self {
        Self { save_point: Some(0), ..Self::default() }
    }

    // --- Transactions ---

    /// Open a transaction, or nest inside the one already open.
    pub fn begin(&mut self, description: &str) {
        self.depth += 1;
        if self.depth == 1 {
            self.current = Some(UndoRecord::new(description));
        }
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Rename the open transaction.
    pub fn describe(&mut self, description: &str) {
        if let Some(record) = self.current.as_mut() {
            description.clone_into(&mut record.description);
        }
    }

    /// The open transaction, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&UndoRecord> {
        self.current.as_ref()
    }

    /// Capture the current state of an existing entity before changing it.
    pub fn mark_for_change(&mut self, doc: &Document, key: &EntityKey) {
        self.mark(Some(doc), key, "change");
    }

    /// Record that an entity is about to be created: undo removes it.
    pub fn mark_for_create(&mut self, key: &EntityKey) {
        self.mark(None, key, "create");
    }

    /// Capture an entity that is about to be removed: undo re-inserts it.
    pub fn mark_for_delete(&mut self, doc: &Document, key: &EntityKey) {
        self.mark(Some(doc), key, "delete");
    }

    /// Capture a whole document section.
    pub fn mark_section(&mut self, doc: &Document, section: Section) {
        match self.current.as_mut() {
            Some(record) => record.mark_section(doc, section),
            None => tracing::warn!(?section, "section marked outside a transaction"),
        }
    }

    /// Mark every bulb, or every bulb on `surface`.
    pub fn mark_all_bulbs(&mut self, doc: &Document, surface: Option<Surface>) {
        let ids: Vec<u32> =
            doc.bulbs.iter().filter(|b| surface.is_none_or(|s| b.parent == s)).map(|b| b.id).collect();
        for id in ids {
            self.mark_for_change(doc, &EntityKey::Bulb(id));
        }
    }

    /// Mark every score, or every score on `surface`.
    pub fn mark_all_scores(&mut self, doc: &Document, surface: Option<Surface>) {
        let ids: Vec<u32> =
            doc.scores.iter().filter(|s| surface.is_none_or(|p| s.parent == p)).map(|s| s.id).collect();
        for id in ids {
            self.mark_for_change(doc, &EntityKey::Score(id));
        }
    }

    /// Mark every animation.
    pub fn mark_all_animations(&mut self, doc: &Document) {
        let names: Vec<String> = doc.animations.iter().map(|a| a.name.clone()).collect();
        for name in names {
            self.mark_for_change(doc, &EntityKey::Animation(name));
        }
    }

    fn mark(&mut self, doc: Option<&Document>, key: &EntityKey, kind: &'static str) {
        match self.current.as_mut() {
            Some(record) => record.mark(doc, key),
            None => tracing::warn!(?key, kind, "entity marked outside a transaction"),
        }
    }

    /// Close the innermost transaction. The outermost close diffs every
    /// snapshot against `doc` and records the transaction if anything changed.
    pub fn end(&mut self, doc: &Document) -> Commit {
        if self.depth == 0 {
            tracing::warn!("end_transaction without matching begin");
            return Commit::Unbalanced;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Commit::Nested;
        }
        let Some(mut record) = self.current.take() else {
            return Commit::Discarded;
        };
        record.close(doc);
        if record.is_empty() {
            tracing::debug!(description = %record.description, "transaction discarded: no changes");
            return Commit::Discarded;
        }
        tracing::debug!(description = %record.description, entries = record.len(), "transaction committed");
        self.push(record);
        Commit::Recorded
    }

    /// Abort the open transaction (at any nesting depth) without recording it.
    ///
    /// The document is not rolled back; callers cancel before mutating or
    /// restore on their own.
    pub fn cancel(&mut self) {
        if let Some(record) = self.current.take() {
            tracing::debug!(description = %record.description, "transaction cancelled");
        }
        self.depth = 0;
    }

    fn push(&mut self, record: UndoRecord) {
        if self.save_point.is_some_and(|sp| sp > self.undo_stack.len()) {
            self.save_point = None;
        }
        self.redo_stack.clear();
        self.undo_stack.push(record);
        if self.undo_stack.len() > MAX_UNDO_STACK {
            self.undo_stack.remove(0);
            self.save_point = self.save_point.and_then(|sp| sp.checked_sub(1));
        }
    }

    // --- History ---

    /// Revert the most recent transaction. Returns its description, or `None`
    /// if there is nothing to undo or a transaction is open.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        if self.is_open() {
            tracing::warn!("undo requested while a transaction is open");
            return None;
        }
        let record = self.undo_stack.pop()?;
        record.apply(doc, Direction::Undo);
        let description = record.description.clone();
        self.redo_stack.push(record);
        Some(description)
    }

    /// Re-apply the most recently undone transaction.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        if self.is_open() {
            tracing::warn!("redo requested while a transaction is open");
            return None;
        }
        let record = self.redo_stack.pop()?;
        record.apply(doc, Direction::Redo);
        let description = record.description.clone();
        self.undo_stack.push(record);
        Some(description)
    }

    /// Forget all history. The current state becomes the save point.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = None;
        self.depth = 0;
        self.save_point = Some(0);
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(UndoRecord::description)
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(UndoRecord::description)
    }

    /// Descriptions of the undo stack, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<&str> {
        self.undo_stack.iter().map(UndoRecord::description).collect()
    }

    /// Number of undoable transactions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The most recently committed transaction.
    #[must_use]
    pub fn last_record(&self) -> Option<&UndoRecord> {
        self.undo_stack.last()
    }

    // --- Save point ---

    /// Mark the current history position as saved.
    pub fn set_save_point(&mut self) {
        self.save_point = Some(self.undo_stack.len());
    }

    /// Whether the document is in the state it had at the last save.
    #[must_use]
    pub fn is_at_save_point(&self) -> bool {
        self.save_point == Some(self.undo_stack.len())
    }
}
