//! Document edit operations.
//!
//! DESIGN
//! ======
//! Each operation is one undo transaction: begin, mark what will change,
//! mutate, end. The record diff decides whether anything is pushed, so an
//! operation that turns out to be a no-op leaves the history untouched.
//!
//! Property panels edit in two phases. `preview_*` writes live values inside
//! a held-open "Edit properties" transaction (marked before the first write);
//! `update_*` nests its final write inside the same transaction and closes it,
//! so the whole burst undoes as one step.
//!
//! Image operations (resize, brightness, copy DMD from backglass) run in the
//! host. `begin_image_op` validates, opens the transaction and snapshots the
//! affected state, then hands back a [`PendingImageOp`]; nothing in the
//! document changes until `complete_image_op` receives the host's result.
//! A failed operation cancels the transaction and leaves the document as it was.

#[cfg(test)]
#[path = "ops_test.rs"]
mod ops_test;

use crate::consts::{DUPLICATE_OFFSET, MIN_ENTITY_SIZE};
use crate::doc::{
    Animation, BackgroundImage, Bounds, Bulb, Document, DocumentInfo, GrillKind, NamedImage, Placed, ScoreDisplay, Surface,
};
use crate::events::EditorEvent;
use crate::hit::ResizeHandle;
use crate::selection::{EntityKind, EntityRef};
use crate::session::EditorSession;
use crate::undo::{Commit, EntityKey, Section};

// =============================================================
// Errors
// =============================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("an image operation is in progress")]
    Busy,
    #[error("an animation named {0:?} already exists")]
    DuplicateAnimationName(String),
    #[error("animation {0:?} not found")]
    AnimationNotFound(String),
    #[error("animation name is empty")]
    EmptyAnimationName,
    #[error("no {} image loaded", .0.label())]
    NoImage(Surface),
    #[error("DMD copy area is not set")]
    EmptyCopyArea,
    #[error("image operation {0} is not pending")]
    StaleImageOp(u64),
    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("{0:?} not found")]
    NotFound(EntityRef),
    #[error("no illumination image at index {0}")]
    ImageIndex(usize),
}

/// Failure reported by the host while transforming image pixels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageOpError {
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("could not encode image: {0}")]
    Encode(String),
    #[error("{0}")]
    Failed(String),
}

// =============================================================
// Image operations
// =============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOpRequest {
    /// Rescale the surface image; entities on that surface scale with it.
    Resize { surface: Surface, from: (u32, u32), to: (u32, u32) },
    /// Shift brightness by `amount` percent (-100..=100).
    Brightness { surface: Surface, amount: i32, ignore_grill: bool },
    /// Crop the DMD copy area out of the backglass into the DMD image.
    CopyDmdFromBackglass,
}

impl ImageOpRequest {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "Resize image",
            Self::Brightness { .. } => "Adjust brightness",
            Self::CopyDmdFromBackglass => "Copy DMD from backglass",
        }
    }
}

/// Work handed to the host. Feed the result back through
/// [`EditorSession::complete_image_op`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImageOp {
    pub id: u64,
    pub request: ImageOpRequest,
    /// Base64 payload of the source image.
    pub source: String,
    /// Region of the source to keep.
    pub crop: Option<Bounds>,
    /// Bottom rows left untouched (brightness over the grill).
    pub protected_rows: u32,
}

/// The host's transformed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOpOutput {
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Grid slot for the `n`th bulb added without an explicit position.
fn default_bulb_slot(n: usize) -> (i32, i32) {
    let n = i32::try_from(n).unwrap_or(i32::MAX / 60);
    (100 + (n % 5) * 60, 100 + (n / 5) * 60)
}

fn default_score_slot(n: usize) -> (i32, i32) {
    let n = i32::try_from(n).unwrap_or(i32::MAX / 50);
    (200, 50 + n * 50)
}

fn floor_size(bounds: Bounds) -> Bounds {
    Bounds { width: bounds.width.max(MIN_ENTITY_SIZE), height: bounds.height.max(MIN_ENTITY_SIZE), ..bounds }
}

impl EditorSession {
    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.is_busy() { Err(EditError::Busy) } else { Ok(()) }
    }

    /// Run `apply` inside a one-shot transaction that marks `section`.
    fn edit_section(&mut self, description: &str, section: Section, apply: impl FnOnce(&mut Document)) -> bool {
        self.commit_preview();
        self.begin_transaction(description);
        self.mark_section(section);
        apply(&mut self.doc);
        self.end_transaction() == Commit::Recorded
    }

    // --- Entity geometry ---

    #[must_use]
    pub fn entity_bounds(&self, target: EntityRef) -> Option<Bounds> {
        match target.kind {
            EntityKind::Bulb => self.doc.bulb(target.id).map(Placed::bounds),
            EntityKind::Score => self.doc.score(target.id).map(Placed::bounds),
        }
    }

    /// Write `bounds` without opening a transaction. Callers hold one open.
    pub(crate) fn place(&mut self, target: EntityRef, bounds: Bounds) -> bool {
        let placed: Option<&mut dyn Placed> = match target.kind {
            EntityKind::Bulb => self.doc.bulb_mut(target.id).map(|b| b as &mut dyn Placed),
            EntityKind::Score => self.doc.score_mut(target.id).map(|s| s as &mut dyn Placed),
        };
        let Some(entity) = placed else { return false };
        entity.set_bounds(bounds);
        true
    }

    pub(crate) fn place_copy_area(&mut self, bounds: Bounds) {
        self.doc.dmd_area.set_copy_bounds(bounds);
    }

    // --- Create / delete ---

    /// Add a bulb at `at`, or at the next grid slot. The new bulb becomes the selection.
    pub fn add_bulb(&mut self, at: Option<(i32, i32)>, surface: Surface) -> Result<u32, EditError> {
        self.ensure_idle()?;
        self.commit_preview();
        let (x, y) = at.unwrap_or_else(|| default_bulb_slot(self.doc.bulbs.len()));
        let id = self.allocate_bulb_id();
        let mut bulb = Bulb::new(id);
        bulb.parent = surface;
        bulb.loc_x = x;
        bulb.loc_y = y;

        self.begin_transaction("Add bulb");
        self.mark_for_create(&EntityKey::Bulb(id));
        self.doc.bulbs.push(bulb);
        self.end_transaction();
        self.select(EntityRef::bulb(id), false);
        tracing::debug!(id, x, y, ?surface, "bulb added");
        Ok(id)
    }

    pub fn add_score(&mut self, at: Option<(i32, i32)>, surface: Surface) -> Result<u32, EditError> {
        self.ensure_idle()?;
        self.commit_preview();
        let (x, y) = at.unwrap_or_else(|| default_score_slot(self.doc.scores.len()));
        let id = self.allocate_score_id();
        let mut score = ScoreDisplay::new(id, surface);
        score.loc_x = x;
        score.loc_y = y;

        self.begin_transaction("Add score");
        self.mark_for_create(&EntityKey::Score(id));
        self.doc.scores.push(score);
        self.end_transaction();
        self.select(EntityRef::score(id), false);
        tracing::debug!(id, x, y, ?surface, "score added");
        Ok(id)
    }

    /// Delete every selected entity as one step. Returns how many were removed.
    pub fn delete_selected(&mut self) -> Result<usize, EditError> {
        self.ensure_idle()?;
        self.commit_preview();
        let targets: Vec<EntityRef> = self.selection.iter().filter(|t| self.exists(*t)).collect();
        if targets.is_empty() {
            return Ok(0);
        }

        self.begin_transaction(if targets.len() == 1 { "Delete" } else { "Delete items" });
        for target in &targets {
            self.mark_for_delete(&EntityKey::from(*target));
            match target.kind {
                EntityKind::Bulb => self.doc.bulbs.retain(|b| b.id != target.id),
                EntityKind::Score => self.doc.scores.retain(|s| s.id != target.id),
            }
        }
        self.end_transaction();
        self.clear_selection();
        self.console.info(format!("Deleted {} item(s)", targets.len()));
        Ok(targets.len())
    }

    /// Copy the selection, offset by [`DUPLICATE_OFFSET`], and select the copies.
    pub fn duplicate_selected(&mut self) -> Result<Vec<EntityRef>, EditError> {
        self.ensure_idle()?;
        self.commit_preview();
        let sources: Vec<EntityRef> = self.selection.iter().collect();
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        self.begin_transaction("Duplicate");
        let mut bulbs = Vec::new();
        let mut scores = Vec::new();
        for source in sources {
            match source.kind {
                EntityKind::Bulb => {
                    let Some(mut copy) = self.doc.bulb(source.id).cloned() else { continue };
                    let id = self.allocate_bulb_id();
                    copy.id = id;
                    copy.name = format!("{}_copy", copy.name);
                    copy.set_bounds(copy.bounds().offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET));
                    self.mark_for_create(&EntityKey::Bulb(id));
                    self.doc.bulbs.push(copy);
                    bulbs.push(id);
                }
                EntityKind::Score => {
                    let Some(mut copy) = self.doc.score(source.id).cloned() else { continue };
                    let id = self.allocate_score_id();
                    copy.id = id;
                    copy.set_bounds(copy.bounds().offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET));
                    self.mark_for_create(&EntityKey::Score(id));
                    self.doc.scores.push(copy);
                    scores.push(id);
                }
            }
        }
        self.end_transaction();

        let created: Vec<EntityRef> =
            bulbs.iter().map(|&id| EntityRef::bulb(id)).chain(scores.iter().map(|&id| EntityRef::score(id))).collect();
        self.set_selection(bulbs, scores, None);
        Ok(created)
    }

    // --- Geometry ---

    /// Translate every selected entity. Returns whether a step was recorded.
    pub fn move_selected(&mut self, dx: i32, dy: i32) -> Result<bool, EditError> {
        self.ensure_idle()?;
        if dx == 0 && dy == 0 {
            return Ok(false);
        }
        self.commit_preview();
        let targets: Vec<(EntityRef, Bounds)> =
            self.selection.iter().filter_map(|t| self.entity_bounds(t).map(|b| (t, b))).collect();
        if targets.is_empty() {
            return Ok(false);
        }

        self.begin_transaction("Move");
        for (target, bounds) in targets {
            self.mark_for_change(&EntityKey::from(target));
            self.place(target, bounds.offset(dx, dy));
        }
        Ok(self.end_transaction() == Commit::Recorded)
    }

    /// Drag one handle of `target` by `(dx, dy)` image pixels.
    pub fn resize_entity(&mut self, target: EntityRef, handle: ResizeHandle, dx: i32, dy: i32) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let Some(bounds) = self.entity_bounds(target) else {
            return Err(EditError::NotFound(target));
        };
        self.commit_preview();
        self.begin_transaction("Resize");
        self.mark_for_change(&EntityKey::from(target));
        self.place(target, bounds.resized(handle, dx, dy));
        Ok(self.end_transaction() == Commit::Recorded)
    }

    /// Select every bulb and score, optionally only those on `surface`.
    pub fn select_all(&mut self, surface: Option<Surface>) {
        let on = |s: Surface| surface.is_none_or(|want| want == s);
        let bulbs: Vec<u32> = self.doc.bulbs.iter().filter(|b| on(b.parent)).map(|b| b.id).collect();
        let scores: Vec<u32> = self.doc.scores.iter().filter(|s| on(s.parent)).map(|s| s.id).collect();
        self.set_selection(bulbs, scores, None);
    }

    // --- Property edits ---

    /// Write a live property value for bulb `id` without committing a step.
    pub fn preview_bulb(&mut self, id: u32, edit: impl FnOnce(&mut Bulb)) -> Result<(), EditError> {
        self.ensure_idle()?;
        if self.doc.bulb(id).is_none() {
            return Err(EditError::NotFound(EntityRef::bulb(id)));
        }
        self.open_preview();
        self.mark_for_change(&EntityKey::Bulb(id));
        if let Some(bulb) = self.doc.bulb_mut(id) {
            edit(bulb);
            bulb.set_bounds(floor_size(bulb.bounds()));
        }
        self.after_preview();
        Ok(())
    }

    pub fn preview_score(&mut self, id: u32, edit: impl FnOnce(&mut ScoreDisplay)) -> Result<(), EditError> {
        self.ensure_idle()?;
        if self.doc.score(id).is_none() {
            return Err(EditError::NotFound(EntityRef::score(id)));
        }
        self.open_preview();
        self.mark_for_change(&EntityKey::Score(id));
        if let Some(score) = self.doc.score_mut(id) {
            edit(score);
            score.set_bounds(floor_size(score.bounds()));
        }
        self.after_preview();
        Ok(())
    }

    /// Apply a committed property edit to bulb `id` as one undo step.
    pub fn update_bulb(&mut self, id: u32, description: &str, edit: impl FnOnce(&mut Bulb)) -> Result<bool, EditError> {
        self.ensure_idle()?;
        if self.doc.bulb(id).is_none() {
            return Err(EditError::NotFound(EntityRef::bulb(id)));
        }
        self.begin_transaction(description);
        self.mark_for_change(&EntityKey::Bulb(id));
        if let Some(bulb) = self.doc.bulb_mut(id) {
            edit(bulb);
            bulb.set_bounds(floor_size(bulb.bounds()));
        }
        Ok(self.finish_update(description))
    }

    pub fn update_score(
        &mut self,
        id: u32,
        description: &str,
        edit: impl FnOnce(&mut ScoreDisplay),
    ) -> Result<bool, EditError> {
        self.ensure_idle()?;
        if self.doc.score(id).is_none() {
            return Err(EditError::NotFound(EntityRef::score(id)));
        }
        self.begin_transaction(description);
        self.mark_for_change(&EntityKey::Score(id));
        if let Some(score) = self.doc.score_mut(id) {
            edit(score);
            score.set_bounds(floor_size(score.bounds()));
        }
        Ok(self.finish_update(description))
    }

    /// Edit table metadata (name, type, author...).
    pub fn update_info(&mut self, edit: impl FnOnce(&mut DocumentInfo)) -> Result<bool, EditError> {
        self.ensure_idle()?;
        Ok(self.edit_section("Edit table info", Section::Info, |doc| edit(&mut doc.info)))
    }

    fn open_preview(&mut self) {
        if !self.preview_open {
            self.begin_transaction("Edit properties");
            self.preview_open = true;
        }
    }

    fn after_preview(&mut self) {
        self.emit(EditorEvent::DataChanged);
        self.mark_preview_dirty();
    }

    /// Close an update transaction, folding any open preview into it.
    fn finish_update(&mut self, description: &str) -> bool {
        let commit = self.end_transaction();
        if !self.preview_open {
            return commit == Commit::Recorded;
        }
        self.undo.describe(description);
        self.preview_open = false;
        self.end_transaction() == Commit::Recorded
    }

    // --- Grill and DMD placement ---

    /// Set the grill (or mini grill) height in image pixels. Negative values clamp to 0.
    pub fn set_grill_height(&mut self, kind: GrillKind, value: i32) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let value = value.max(0);
        let (description, label) = match kind {
            GrillKind::Grill => ("Set grill height", "Grill height"),
            GrillKind::SmallGrill => ("Set mini grill height", "Mini grill height"),
        };
        let changed = self.edit_section(description, Section::GrillHeights, |doc| doc.grill.set(kind, value));
        if changed {
            self.console.info(format!("{label} set to {value}px"));
        }
        Ok(changed)
    }

    pub fn remove_grill_height(&mut self, kind: GrillKind) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let (description, label) = match kind {
            GrillKind::Grill => ("Remove grill height", "Grill height"),
            GrillKind::SmallGrill => ("Remove mini grill height", "Mini grill height"),
        };
        let changed = self.edit_section(description, Section::GrillHeights, |doc| doc.grill.set(kind, 0));
        if changed {
            self.console.info(format!("{label} removed"));
        }
        Ok(changed)
    }

    /// Where the DMD window sits when shown over the backglass.
    pub fn set_dmd_default_location(&mut self, x: i32, y: i32) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let changed = self.edit_section("Set DMD default location", Section::DmdArea, |doc| {
            doc.dmd_area.default_x = x.max(0);
            doc.dmd_area.default_y = y.max(0);
        });
        if changed {
            self.console.info(format!("DMD default location set to ({x}, {y})"));
        }
        Ok(changed)
    }

    pub fn clear_dmd_default_location(&mut self) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let changed = self.edit_section("Remove DMD default location", Section::DmdArea, |doc| {
            doc.dmd_area.default_x = 0;
            doc.dmd_area.default_y = 0;
        });
        if changed {
            self.console.info("DMD default location removed");
        }
        Ok(changed)
    }

    pub fn set_dmd_copy_area(&mut self, bounds: Bounds) -> Result<bool, EditError> {
        self.ensure_idle()?;
        let bounds = floor_size(bounds);
        Ok(self.edit_section("Set DMD copy area", Section::DmdArea, |doc| doc.dmd_area.set_copy_bounds(bounds)))
    }

    /// Give the copy area its starting rectangle (lower-middle third of the
    /// backglass) if it has none. Returns whether one was created.
    #[allow(clippy::cast_possible_truncation)]
    pub fn init_dmd_copy_area(&mut self, image_width: u32, image_height: u32) -> Result<bool, EditError> {
        self.ensure_idle()?;
        if self.doc.dmd_area.has_copy_area() || image_width == 0 || image_height == 0 {
            return Ok(false);
        }
        let (w, h) = (f64::from(image_width), f64::from(image_height));
        let bounds = Bounds::new(
            (w / 2.0 - w / 6.0).round() as i32,
            (h * 3.0 / 4.0).round() as i32,
            (w / 3.0).round() as i32,
            (h / 6.0).round() as i32,
        );
        self.set_dmd_copy_area(bounds)
    }

    // --- Animations ---

    /// Add (`previous_name` is `None`) or replace an animation. Names are unique.
    pub fn save_animation(&mut self, previous_name: Option<&str>, mut animation: Animation) -> Result<(), EditError> {
        self.ensure_idle()?;
        animation.name = animation.name.trim().to_owned();
        if animation.name.is_empty() {
            return Err(EditError::EmptyAnimationName);
        }
        let clashes = |doc: &Document, skip: Option<&str>| {
            doc.animations.iter().any(|a| a.name == animation.name && Some(a.name.as_str()) != skip)
        };

        match previous_name {
            None => {
                if clashes(&self.doc, None) {
                    return Err(EditError::DuplicateAnimationName(animation.name));
                }
                self.commit_preview();
                self.begin_transaction("Add animation");
                self.mark_for_create(&EntityKey::Animation(animation.name.clone()));
                self.doc.animations.push(animation);
            }
            Some(previous) => {
                let Some(index) = self.doc.animations.iter().position(|a| a.name == previous) else {
                    return Err(EditError::AnimationNotFound(previous.to_owned()));
                };
                if clashes(&self.doc, Some(previous)) {
                    return Err(EditError::DuplicateAnimationName(animation.name));
                }
                self.commit_preview();
                self.begin_transaction("Edit animation");
                self.mark_for_change(&EntityKey::Animation(previous.to_owned()));
                if animation.name != previous {
                    self.mark_for_create(&EntityKey::Animation(animation.name.clone()));
                }
                if let Some(slot) = self.doc.animations.get_mut(index) {
                    *slot = animation;
                }
            }
        }
        self.end_transaction();
        Ok(())
    }

    pub fn delete_animation(&mut self, name: &str) -> Result<(), EditError> {
        self.ensure_idle()?;
        if self.doc.animation(name).is_none() {
            return Err(EditError::AnimationNotFound(name.to_owned()));
        }
        self.commit_preview();
        self.begin_transaction("Delete animation");
        self.mark_for_delete(&EntityKey::Animation(name.to_owned()));
        self.doc.animations.retain(|a| a.name != name);
        self.end_transaction();
        Ok(())
    }

    // --- Image imports ---

    pub fn import_background_image(&mut self, file_name: &str, data: String) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.edit_section("Import backglass image", Section::Images, |doc| {
            doc.images.background = Some(BackgroundImage::main(file_name, data));
        });
        self.console.info(format!("Imported backglass image {file_name}"));
        Ok(())
    }

    pub fn import_dmd_image(&mut self, file_name: &str, data: String) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.edit_section("Import DMD image", Section::Images, |doc| {
            doc.images.dmd = Some(NamedImage::new(file_name, data));
        });
        self.console.info(format!("Imported DMD image {file_name}"));
        Ok(())
    }

    pub fn import_illumination_image(&mut self, file_name: &str, data: String) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.edit_section("Import illumination image", Section::Images, |doc| {
            doc.images.illuminated.push(NamedImage::new(file_name, data));
        });
        Ok(())
    }

    pub fn remove_illumination_image(&mut self, index: usize) -> Result<(), EditError> {
        self.ensure_idle()?;
        if index >= self.doc.images.illuminated.len() {
            return Err(EditError::ImageIndex(index));
        }
        self.edit_section("Remove illumination image", Section::Images, |doc| {
            doc.images.illuminated.remove(index);
        });
        Ok(())
    }

    // --- Host image operations ---

    /// Validate `request`, open its transaction and return the work for the host.
    ///
    /// Returns `Ok(None)` when the request would not change anything (same
    /// size, zero brightness). While an operation is pending every other edit
    /// fails with [`EditError::Busy`].
    pub fn begin_image_op(&mut self, request: ImageOpRequest) -> Result<Option<PendingImageOp>, EditError> {
        self.ensure_idle()?;
        let mut crop = None;
        let mut protected_rows = 0;
        let source = match &request {
            ImageOpRequest::Resize { surface, from, to } => {
                if to.0 == 0 || to.1 == 0 || from.0 == 0 || from.1 == 0 {
                    return Err(EditError::InvalidSize { width: to.0, height: to.1 });
                }
                if from == to {
                    return Ok(None);
                }
                self.doc.images.surface_data(*surface).ok_or(EditError::NoImage(*surface))?
            }
            ImageOpRequest::Brightness { surface, amount, ignore_grill } => {
                if *amount == 0 {
                    return Ok(None);
                }
                if *ignore_grill && *surface == Surface::Backglass {
                    protected_rows = u32::try_from(self.doc.grill.grill_height).unwrap_or(0);
                }
                self.doc.images.surface_data(*surface).ok_or(EditError::NoImage(*surface))?
            }
            ImageOpRequest::CopyDmdFromBackglass => {
                if !self.doc.dmd_area.has_copy_area() {
                    return Err(EditError::EmptyCopyArea);
                }
                crop = Some(self.doc.dmd_area.copy_bounds());
                self.doc.images.surface_data(Surface::Backglass).ok_or(EditError::NoImage(Surface::Backglass))?
            }
        }
        .to_owned();

        self.commit_preview();
        self.begin_transaction(request.description());
        self.mark_section(Section::Images);
        match &request {
            ImageOpRequest::Resize { surface, .. } => {
                self.undo.mark_all_bulbs(&self.doc, Some(*surface));
                self.undo.mark_all_scores(&self.doc, Some(*surface));
            }
            ImageOpRequest::CopyDmdFromBackglass => self.mark_section(Section::DmdArea),
            ImageOpRequest::Brightness { .. } => {}
        }
        let id = self.allocate_image_op_id();
        self.pending_image_op = Some(id);
        tracing::debug!(id, op = request.description(), "image operation started");
        Ok(Some(PendingImageOp { id, request, source, crop, protected_rows }))
    }

    /// Apply (or on error, abandon) a pending image operation.
    ///
    /// Returns `Ok(true)` when the result was applied and `Ok(false)` when the
    /// host reported an error and the transaction was cancelled.
    pub fn complete_image_op(
        &mut self,
        op: &PendingImageOp,
        result: Result<ImageOpOutput, ImageOpError>,
    ) -> Result<bool, EditError> {
        if self.pending_image_op != Some(op.id) {
            return Err(EditError::StaleImageOp(op.id));
        }
        self.pending_image_op = None;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                self.cancel_transaction();
                tracing::warn!(id = op.id, error = %e, "image operation failed");
                self.console.error(format!("{} failed: {e}", op.request.description()));
                return Ok(false);
            }
        };

        match op.request {
            ImageOpRequest::Resize { surface, from, to } => {
                let sx = f64::from(to.0) / f64::from(from.0);
                let sy = f64::from(to.1) / f64::from(from.1);
                for bulb in self.doc.bulbs.iter_mut().filter(|b| b.parent == surface) {
                    bulb.set_bounds(floor_size(bulb.bounds().scaled(sx, sy)));
                }
                for score in self.doc.scores.iter_mut().filter(|s| s.parent == surface) {
                    score.set_bounds(floor_size(score.bounds().scaled(sx, sy)));
                }
                self.doc.images.set_surface_data(surface, output.data);
                self.console.success(format!(
                    "Resized {} image to {}x{}",
                    surface.label(),
                    output.width,
                    output.height
                ));
            }
            ImageOpRequest::Brightness { surface, amount, .. } => {
                self.doc.images.set_surface_data(surface, output.data);
                self.console.success(format!("Adjusted {} brightness by {amount}%", surface.label()));
            }
            ImageOpRequest::CopyDmdFromBackglass => {
                self.doc.images.dmd = Some(NamedImage::new("DMD from backglass", output.data));
                if let Some(crop) = op.crop {
                    self.doc.dmd_area.default_x = crop.x;
                    self.doc.dmd_area.default_y = crop.y;
                }
                self.console.success(format!("Copied {}x{} DMD from backglass", output.width, output.height));
            }
        }
        self.end_transaction();
        Ok(true)
    }
}
