//! Editing engine: pointer, wheel, keyboard and command handling.
//!
//! DESIGN
//! ======
//! `EngineCore` holds everything that does not need a browser: the editing
//! session, camera, canvas metrics, view state and the gesture in progress.
//! Handlers take raw event data, mutate that state and return [`Action`]s for
//! the host (repaint, cursor, status bar, click-mode menu state, image work).
//! `Engine` wraps the core together with the canvas element and the decoded
//! surface images; it is the only part that holds browser objects.
//!
//! Drags are two-phase. Pointer-down records the world position and the
//! bounds of everything that will move; the undo transaction opens only once
//! the pointer has travelled past [`DRAG_THRESHOLD`], and every move rewrites
//! geometry from those origins plus the rounded total delta. Pointer-up,
//! cancel and leave all commit; leaving a click mode or replacing the document
//! aborts instead, putting the origins back. A gesture belongs to one pointer;
//! events from any other pointer are ignored until it ends, and so are
//! commands that would edit underneath it.
//!
//! Repaints are coalesced: [`EngineCore::request_render`] yields
//! `RenderNeeded` only for the first request since the last frame drained it.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::BTreeMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, CanvasMetrics, Point, Rect};
use crate::command::{Command, MenuState};
use crate::consts::{DEFAULT_CONTENT_HEIGHT, DEFAULT_CONTENT_WIDTH, DRAG_THRESHOLD, NUDGE_STEP, NUDGE_STEP_LARGE};
use crate::consts::{WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT, ZOOM_STEP};
use crate::doc::{Bounds, GrillKind, Surface};
use crate::events::EditorEvent;
use crate::hit::{self, CopyAreaHit};
use crate::input::{Button, ClickMode, Cursor, InputState, Key, Modifiers, PointerId, UiState, WheelDelta};
use crate::ops::{EditError, ImageOpError, ImageOpOutput, ImageOpRequest, PendingImageOp};
use crate::render::{self, SurfaceImages};
use crate::selection::{EntityKind, EntityRef};
use crate::session::EditorSession;
use crate::undo::{EntityKey, Section};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RenderNeeded,
    SetCursor(Cursor),
    /// World coordinates under the pointer, for the status bar.
    StatusCoords { x: i32, y: i32 },
    /// The special click mode changed; menus should update their check marks.
    ClickModeChanged(ClickMode),
    /// Run this image operation and report back through `complete_image_op`.
    ImageOpRequested(PendingImageOp),
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i32 {
    v.round() as i32
}

fn past_threshold(dx: f64, dy: f64) -> bool {
    dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD
}

fn arrow_nudge(key: &Key, step: i32) -> Option<Command> {
    let (dx, dy) = match key.0.as_str() {
        "ArrowLeft" => (-step, 0),
        "ArrowRight" => (step, 0),
        "ArrowUp" => (0, -step),
        "ArrowDown" => (0, step),
        _ => return None,
    };
    Some(Command::Nudge { dx, dy })
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub session: EditorSession,
    pub camera: Camera,
    pub canvas: CanvasMetrics,
    pub ui: UiState,
    pub input: InputState,
    backglass_size: Option<(u32, u32)>,
    dmd_size: Option<(u32, u32)>,
    render_pending: bool,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Viewport ---

    pub fn set_canvas(&mut self, metrics: CanvasMetrics) -> Vec<Action> {
        self.canvas = metrics;
        self.request_render().into_iter().collect()
    }

    /// Record the decoded size of a surface image. The host calls this
    /// whenever image data changes (load, import, undo of an image edit).
    pub fn set_image_size(&mut self, surface: Surface, size: Option<(u32, u32)>) {
        match surface {
            Surface::Backglass => self.backglass_size = size,
            Surface::Dmd => self.dmd_size = size,
        }
    }

    #[must_use]
    pub fn image_size(&self, surface: Surface) -> Option<(u32, u32)> {
        match surface {
            Surface::Backglass => self.backglass_size,
            Surface::Dmd => self.dmd_size,
        }
    }

    /// World extent of a surface: its image, or a default frame when none is loaded.
    #[must_use]
    pub fn content_size(&self, surface: Surface) -> (f64, f64) {
        self.image_size(surface)
            .map_or((DEFAULT_CONTENT_WIDTH, DEFAULT_CONTENT_HEIGHT), |(w, h)| (f64::from(w), f64::from(h)))
    }

    /// Convert a client-space pointer position to world coordinates.
    #[must_use]
    pub fn world_at(&self, client: Point) -> Point {
        self.camera.screen_to_world(self.canvas.client_to_canvas(client))
    }

    pub fn zoom_to_fit(&mut self) -> Vec<Action> {
        let (w, h) = self.content_size(self.ui.surface);
        if !self.camera.fit(w, h, self.canvas.backing_width, self.canvas.backing_height) {
            return Vec::new();
        }
        self.request_render().into_iter().collect()
    }

    /// Zoom around the canvas centre.
    pub fn zoom_by(&mut self, factor: f64) -> Vec<Action> {
        let centre = Point::new(self.canvas.backing_width * 0.5, self.canvas.backing_height * 0.5);
        self.camera.zoom_at(factor, centre);
        self.request_render().into_iter().collect()
    }

    /// 1:1 zoom with the active surface centred.
    pub fn reset_zoom(&mut self) -> Vec<Action> {
        let (w, h) = self.content_size(self.ui.surface);
        self.camera.set_zoom(1.0);
        self.camera.pan_x = (self.canvas.backing_width - w) / 2.0;
        self.camera.pan_y = (self.canvas.backing_height - h) / 2.0;
        self.request_render().into_iter().collect()
    }

    // --- Render scheduling ---

    /// Mark a repaint as pending. Returns `RenderNeeded` only if none was pending.
    pub fn request_render(&mut self) -> Option<Action> {
        if self.render_pending {
            return None;
        }
        self.render_pending = true;
        Some(Action::RenderNeeded)
    }

    /// Drain the pending flag. Returns whether a repaint was requested.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_pending)
    }

    // --- Queries ---

    #[must_use]
    pub fn menu_state(&self) -> MenuState {
        let undo = self.session.undo_manager();
        MenuState {
            has_file: self.session.has_file(),
            can_undo: undo.can_undo(),
            can_redo: undo.can_redo(),
            has_selection: !self.session.selection().is_empty(),
            busy: self.session.is_busy(),
        }
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, pointer: PointerId, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if self.input.is_active() {
            tracing::debug!(pointer, "pointer down ignored during gesture");
            return Vec::new();
        }
        self.session.commit_preview();
        let screen = self.canvas.client_to_canvas(client);
        let world = self.camera.screen_to_world(screen);
        let mut actions = Vec::new();

        if button == Button::Middle || (button == Button::Primary && modifiers.alt) {
            self.input = InputState::Panning { pointer, last_screen: screen };
            self.set_cursor(Cursor::Grabbing, &mut actions);
            return actions;
        }
        if button != Button::Primary || !self.session.has_file() || self.session.is_busy() {
            return actions;
        }

        match self.ui.click_mode {
            ClickMode::GrillHeight | ClickMode::SmallGrillHeight => {
                self.click_grill(world, &mut actions);
                return actions;
            }
            ClickMode::DmdCopyArea => {
                self.press_copy_area(pointer, world, &mut actions);
                return actions;
            }
            ClickMode::DmdDefaultLocation => {
                self.click_dmd_location(world, &mut actions);
                return actions;
            }
            ClickMode::None => {}
        }

        let filter = self.ui.hit_filter();
        let handle = hit::handle_at(self.session.doc(), self.session.selection(), world, self.camera.zoom, filter);
        if let Some((target, handle)) = handle {
            if let Some(origin) = self.session.entity_bounds(target) {
                tracing::debug!(?target, ?handle, "resize started");
                self.input = InputState::Resizing { pointer, target, handle, start_world: world, origin, undo_open: false };
                self.set_cursor(handle.cursor(), &mut actions);
                return actions;
            }
        }

        if let Some(target) = hit::entity_at(self.session.doc(), world, filter) {
            let keep = modifiers.shift || self.session.selection().is_selected(target);
            self.session.select(target, keep);
            let origins: BTreeMap<EntityRef, Bounds> =
                self.session.selection().iter().filter_map(|t| self.session.entity_bounds(t).map(|b| (t, b))).collect();
            tracing::debug!(count = origins.len(), "move started");
            self.input = InputState::Moving { pointer, start_world: world, origins, undo_open: false };
            self.set_cursor(Cursor::Move, &mut actions);
        } else {
            if !modifiers.shift {
                self.session.clear_selection();
            }
            self.input = InputState::Marquee { pointer, start_world: world, additive: modifiers.shift };
        }
        actions.extend(self.request_render());
        actions
    }

    pub fn on_pointer_move(&mut self, pointer: PointerId, client: Point) -> Vec<Action> {
        if self.input.pointer().is_some_and(|p| p != pointer) {
            return Vec::new();
        }
        let screen = self.canvas.client_to_canvas(client);
        let world = self.camera.screen_to_world(screen);
        let mut actions = vec![Action::StatusCoords { x: round_px(world.x), y: round_px(world.y) }];

        match std::mem::take(&mut self.input) {
            InputState::Idle => self.hover(world, &mut actions),
            InputState::Panning { pointer, last_screen } => {
                self.camera.pan_x += screen.x - last_screen.x;
                self.camera.pan_y += screen.y - last_screen.y;
                self.input = InputState::Panning { pointer, last_screen: screen };
                actions.extend(self.request_render());
            }
            InputState::Moving { pointer, start_world, origins, mut undo_open } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                if !undo_open && past_threshold(dx, dy) {
                    self.session.begin_transaction("Move");
                    for target in origins.keys() {
                        self.session.mark_for_change(&EntityKey::from(*target));
                    }
                    undo_open = true;
                }
                if undo_open {
                    let (dx, dy) = (round_px(dx), round_px(dy));
                    for (target, origin) in &origins {
                        self.session.place(*target, origin.offset(dx, dy));
                    }
                    self.after_live_edit(&mut actions);
                }
                self.input = InputState::Moving { pointer, start_world, origins, undo_open };
            }
            InputState::Resizing { pointer, target, handle, start_world, origin, mut undo_open } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                if !undo_open && past_threshold(dx, dy) {
                    self.session.begin_transaction("Resize");
                    self.session.mark_for_change(&EntityKey::from(target));
                    undo_open = true;
                }
                if undo_open {
                    self.session.place(target, origin.resized(handle, round_px(dx), round_px(dy)));
                    self.after_live_edit(&mut actions);
                }
                self.input = InputState::Resizing { pointer, target, handle, start_world, origin, undo_open };
            }
            InputState::Marquee { pointer, start_world, additive } => {
                self.ui.marquee = Some(Rect::from_corners(start_world, world));
                self.input = InputState::Marquee { pointer, start_world, additive };
                actions.extend(self.request_render());
            }
            InputState::MovingDmdCopyArea { pointer, start_world, origin, mut undo_open } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                if !undo_open && past_threshold(dx, dy) {
                    self.session.begin_transaction("Move DMD copy area");
                    self.session.mark_section(Section::DmdArea);
                    undo_open = true;
                }
                if undo_open {
                    self.session.place_copy_area(origin.offset(round_px(dx), round_px(dy)));
                    self.after_live_edit(&mut actions);
                }
                self.input = InputState::MovingDmdCopyArea { pointer, start_world, origin, undo_open };
            }
            InputState::ResizingDmdCopyArea { pointer, handle, start_world, origin, mut undo_open } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                if !undo_open && past_threshold(dx, dy) {
                    self.session.begin_transaction("Resize DMD copy area");
                    self.session.mark_section(Section::DmdArea);
                    undo_open = true;
                }
                if undo_open {
                    self.session.place_copy_area(origin.resized_anchored(handle, round_px(dx), round_px(dy)));
                    self.after_live_edit(&mut actions);
                }
                self.input = InputState::ResizingDmdCopyArea { pointer, handle, start_world, origin, undo_open };
            }
        }
        actions
    }

    /// End the gesture driven by `pointer`, committing any open transaction.
    pub fn on_pointer_up(&mut self, pointer: PointerId) -> Vec<Action> {
        if self.input.pointer() != Some(pointer) {
            return Vec::new();
        }
        self.finish_gesture()
    }

    /// Pointer capture lost. Treated like a release.
    pub fn on_pointer_cancel(&mut self, pointer: PointerId) -> Vec<Action> {
        self.on_pointer_up(pointer)
    }

    /// Pointer left the canvas. Treated like a release so drags always terminate.
    pub fn on_pointer_leave(&mut self, pointer: PointerId) -> Vec<Action> {
        self.on_pointer_up(pointer)
    }

    pub fn on_wheel(&mut self, client: Point, delta: WheelDelta) -> Vec<Action> {
        if delta.dy.abs() < f64::EPSILON {
            return Vec::new();
        }
        let factor = if delta.dy > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
        self.camera.zoom_at(factor, self.canvas.client_to_canvas(client));
        self.request_render().into_iter().collect()
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let command = if key.is("Escape") {
            Some(if self.ui.click_mode.is_active() { Command::CancelClickMode } else { Command::ClearSelection })
        } else if key.is("Delete") || key.is("Backspace") {
            Some(Command::DeleteSelected)
        } else if modifiers.command() && key.is("z") {
            Some(if modifiers.shift { Command::Redo } else { Command::Undo })
        } else if modifiers.command() && key.is("y") {
            Some(Command::Redo)
        } else if modifiers.command() && key.is("a") {
            Some(Command::SelectAll)
        } else if modifiers.command() && key.is("d") {
            Some(Command::DuplicateSelected)
        } else {
            arrow_nudge(key, if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP })
        };
        let Some(command) = command else {
            return Vec::new();
        };
        self.execute(command)
    }

    // --- Commands ---

    /// Run an editing or view command. File commands belong to [`crate::editor::Editor`].
    pub fn execute(&mut self, command: Command) -> Vec<Action> {
        if !command.is_enabled(self.menu_state()) {
            tracing::debug!(?command, "command disabled");
            return Vec::new();
        }
        let edits_document = matches!(
            command,
            Command::Undo
                | Command::Redo
                | Command::DeleteSelected
                | Command::DuplicateSelected
                | Command::Nudge { .. }
                | Command::AddBulb
                | Command::AddScore
                | Command::EnterClickMode(_)
                | Command::ShowSurface(_)
                | Command::ResizeImage { .. }
                | Command::AdjustBrightness { .. }
        );
        if edits_document && self.input.is_active() {
            tracing::debug!(?command, "command ignored during gesture");
            return Vec::new();
        }

        let mut actions = Vec::new();
        match command {
            Command::NewDocument | Command::Open | Command::Save | Command::SaveAs | Command::Close => {
                tracing::debug!(?command, "file command not handled by the canvas");
                return actions;
            }
            Command::Undo => {
                self.session.undo();
            }
            Command::Redo => {
                self.session.redo();
            }
            Command::DeleteSelected => {
                let result = self.session.delete_selected();
                self.report(result);
            }
            Command::DuplicateSelected => {
                let result = self.session.duplicate_selected();
                self.report(result);
            }
            Command::SelectAll => self.session.select_all(Some(self.ui.surface)),
            Command::SelectAllBulbs => {
                let surface = self.ui.surface;
                let bulbs = self.session.doc().bulbs.iter().filter(|b| b.parent == surface).map(|b| b.id).collect();
                self.session.set_selection(bulbs, Vec::new(), None);
            }
            Command::ClearSelection => self.session.clear_selection(),
            Command::Nudge { dx, dy } => {
                let result = self.session.move_selected(dx, dy);
                self.report(result);
            }
            Command::AddBulb => {
                self.ui.view.show_illumination_frames = true;
                let result = self.session.add_bulb(None, self.ui.surface);
                self.report(result);
            }
            Command::AddScore => {
                self.ui.view.show_score_frames = true;
                let result = self.session.add_score(None, self.ui.surface);
                self.report(result);
            }
            Command::ZoomIn => actions = self.zoom_by(ZOOM_STEP),
            Command::ZoomOut => actions = self.zoom_by(1.0 / ZOOM_STEP),
            Command::ZoomToFit => actions = self.zoom_to_fit(),
            Command::ResetZoom => actions = self.reset_zoom(),
            Command::ShowSurface(surface) => {
                if surface != self.ui.surface {
                    if self.ui.click_mode.is_active() {
                        actions.extend(self.set_click_mode(ClickMode::None));
                    }
                    self.ui.surface = surface;
                    actions.extend(self.zoom_to_fit());
                }
            }
            Command::ToggleIlluminationFrames => {
                self.ui.view.show_illumination_frames = !self.ui.view.show_illumination_frames;
            }
            Command::ToggleScoreFrames => self.ui.view.show_score_frames = !self.ui.view.show_score_frames,
            Command::ToggleIllumination => self.ui.view.show_illumination = !self.ui.view.show_illumination,
            Command::ToggleScoring => self.ui.view.show_scoring = !self.ui.view.show_scoring,
            Command::EnterClickMode(mode) => actions = self.set_click_mode(mode),
            Command::CancelClickMode => actions = self.set_click_mode(ClickMode::None),
            Command::ResizeImage { width, height } => {
                let surface = self.ui.surface;
                let result = match self.image_size(surface) {
                    Some(from) => self.session.begin_image_op(ImageOpRequest::Resize { surface, from, to: (width, height) }),
                    None => Err(EditError::NoImage(surface)),
                };
                if let Some(Some(op)) = self.report(result) {
                    actions.push(Action::ImageOpRequested(op));
                }
            }
            Command::AdjustBrightness { amount, ignore_grill } => {
                let request = ImageOpRequest::Brightness { surface: self.ui.surface, amount, ignore_grill };
                let result = self.session.begin_image_op(request);
                if let Some(Some(op)) = self.report(result) {
                    actions.push(Action::ImageOpRequested(op));
                }
            }
        }
        actions.extend(self.request_render());
        actions
    }

    /// Feed the host's result for a requested image operation back in.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::StaleImageOp`] if `op` is no longer pending.
    pub fn complete_image_op(
        &mut self,
        op: &PendingImageOp,
        result: Result<ImageOpOutput, ImageOpError>,
    ) -> Result<Vec<Action>, EditError> {
        let size = match &result {
            Ok(output) => Some((output.width, output.height)),
            Err(_) => None,
        };
        if self.session.complete_image_op(op, result)? {
            let surface = match op.request {
                ImageOpRequest::Resize { surface, .. } | ImageOpRequest::Brightness { surface, .. } => surface,
                ImageOpRequest::CopyDmdFromBackglass => Surface::Dmd,
            };
            self.set_image_size(surface, size);
        }
        Ok(self.request_render().into_iter().collect())
    }

    /// Enter or leave a special click mode. Entering one switches to the backglass.
    pub fn set_click_mode(&mut self, mode: ClickMode) -> Vec<Action> {
        let mut actions = Vec::new();
        if mode == self.ui.click_mode {
            return actions;
        }
        actions.extend(self.abort_gesture());
        if mode == ClickMode::DmdCopyArea {
            if let Some((w, h)) = self.image_size(Surface::Backglass) {
                let result = self.session.init_dmd_copy_area(w, h);
                self.report(result);
            }
        }
        if mode.is_active() {
            self.ui.surface = Surface::Backglass;
        }
        tracing::debug!(?mode, "click mode");
        self.ui.click_mode = mode;
        self.ui.hover_world = None;
        actions.push(Action::ClickModeChanged(mode));
        let cursor = match mode {
            ClickMode::GrillHeight | ClickMode::SmallGrillHeight | ClickMode::DmdDefaultLocation => Cursor::Crosshair,
            ClickMode::DmdCopyArea | ClickMode::None => Cursor::Default,
        };
        self.set_cursor(cursor, &mut actions);
        actions.extend(self.request_render());
        actions
    }

    /// Drop the gesture in progress without recording it. Geometry it changed
    /// is put back and its transaction is cancelled.
    pub fn abort_gesture(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let gesture = std::mem::take(&mut self.input);
        let undo_open = gesture.undo_open();
        match gesture {
            InputState::Idle => return actions,
            InputState::Panning { .. } => {}
            InputState::Marquee { .. } => self.ui.marquee = None,
            InputState::Moving { origins, .. } => {
                if undo_open {
                    for (target, origin) in origins {
                        self.session.place(target, origin);
                    }
                }
            }
            InputState::Resizing { target, origin, .. } => {
                if undo_open {
                    self.session.place(target, origin);
                }
            }
            InputState::MovingDmdCopyArea { origin, .. } | InputState::ResizingDmdCopyArea { origin, .. } => {
                if undo_open {
                    self.session.place_copy_area(origin);
                }
            }
        }
        if undo_open {
            self.session.cancel_transaction();
            self.session.emit(EditorEvent::DataChanged);
        }
        tracing::debug!(undo_open, "gesture aborted");
        self.set_cursor(Cursor::Default, &mut actions);
        actions.extend(self.request_render());
        actions
    }

    // --- Internals ---

    fn finish_gesture(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Idle => return actions,
            InputState::Panning { .. } => {}
            InputState::Marquee { additive, .. } => {
                if let Some(rect) = self.ui.marquee.take() {
                    let hits = hit::entities_in_rect(self.session.doc(), rect, self.ui.hit_filter());
                    self.select_hits(hits, additive);
                }
            }
            gesture => {
                if gesture.undo_open() {
                    self.session.end_transaction();
                }
            }
        }
        tracing::debug!("gesture finished");
        self.set_cursor(Cursor::Default, &mut actions);
        actions.extend(self.request_render());
        actions
    }

    fn select_hits(&mut self, hits: Vec<EntityRef>, additive: bool) {
        if additive {
            for target in hits {
                self.session.select(target, true);
            }
            return;
        }
        let (mut bulbs, mut scores) = (Vec::new(), Vec::new());
        for target in hits {
            match target.kind {
                EntityKind::Bulb => bulbs.push(target.id),
                EntityKind::Score => scores.push(target.id),
            }
        }
        self.session.set_selection(bulbs, scores, None);
    }

    fn after_live_edit(&mut self, actions: &mut Vec<Action>) {
        self.session.emit(EditorEvent::DataChanged);
        actions.extend(self.request_render());
    }

    fn hover(&mut self, world: Point, actions: &mut Vec<Action>) {
        let zoom = self.camera.zoom;
        let cursor = match self.ui.click_mode {
            ClickMode::GrillHeight | ClickMode::SmallGrillHeight => {
                self.track_hover(world, actions);
                let (w, h) = self.content_size(Surface::Backglass);
                if hit::grill_remove_at(&self.session.doc().grill, world, w, h, zoom).is_some() {
                    Cursor::Pointer
                } else {
                    Cursor::Crosshair
                }
            }
            ClickMode::DmdCopyArea => match hit::copy_area_at(&self.session.doc().dmd_area, world, zoom) {
                Some(CopyAreaHit::Capture) => Cursor::Pointer,
                Some(CopyAreaHit::Body) => Cursor::Move,
                Some(CopyAreaHit::Handle(handle)) => handle.cursor(),
                None => Cursor::Default,
            },
            ClickMode::DmdDefaultLocation => {
                self.track_hover(world, actions);
                let (dmd_width, _) = self.content_size(Surface::Dmd);
                if hit::dmd_location_remove_at(&self.session.doc().dmd_area, world, dmd_width, zoom) {
                    Cursor::Pointer
                } else {
                    Cursor::Crosshair
                }
            }
            ClickMode::None => {
                let filter = self.ui.hit_filter();
                let doc = self.session.doc();
                if let Some((_, handle)) = hit::handle_at(doc, self.session.selection(), world, zoom, filter) {
                    handle.cursor()
                } else if hit::entity_at(doc, world, filter).is_some() {
                    Cursor::Pointer
                } else {
                    Cursor::Default
                }
            }
        };
        self.set_cursor(cursor, actions);
    }

    fn track_hover(&mut self, world: Point, actions: &mut Vec<Action>) {
        if self.ui.hover_world != Some(world) {
            self.ui.hover_world = Some(world);
            actions.extend(self.request_render());
        }
    }

    fn click_grill(&mut self, world: Point, actions: &mut Vec<Action>) {
        let (w, h) = self.content_size(Surface::Backglass);
        let removed = hit::grill_remove_at(&self.session.doc().grill, world, w, h, self.camera.zoom);
        let result = if let Some(kind) = removed {
            self.session.remove_grill_height(kind)
        } else {
            let height = h - world.y;
            if !(0.0..=h).contains(&height) {
                return;
            }
            let kind =
                if self.ui.click_mode == ClickMode::SmallGrillHeight { GrillKind::SmallGrill } else { GrillKind::Grill };
            self.session.set_grill_height(kind, round_px(height))
        };
        self.report(result);
        actions.extend(self.set_click_mode(ClickMode::None));
    }

    fn click_dmd_location(&mut self, world: Point, actions: &mut Vec<Action>) {
        let (dmd_width, _) = self.content_size(Surface::Dmd);
        let result = if hit::dmd_location_remove_at(&self.session.doc().dmd_area, world, dmd_width, self.camera.zoom) {
            self.session.clear_dmd_default_location()
        } else {
            self.session.set_dmd_default_location(round_px(world.x), round_px(world.y))
        };
        self.report(result);
        actions.extend(self.set_click_mode(ClickMode::None));
    }

    fn press_copy_area(&mut self, pointer: PointerId, world: Point, actions: &mut Vec<Action>) {
        let area = &self.session.doc().dmd_area;
        let origin = area.copy_bounds();
        match hit::copy_area_at(area, world, self.camera.zoom) {
            Some(CopyAreaHit::Capture) => {
                let result = self.session.begin_image_op(ImageOpRequest::CopyDmdFromBackglass);
                if let Some(Some(op)) = self.report(result) {
                    actions.push(Action::ImageOpRequested(op));
                    actions.extend(self.set_click_mode(ClickMode::None));
                }
            }
            Some(CopyAreaHit::Body) => {
                self.input = InputState::MovingDmdCopyArea { pointer, start_world: world, origin, undo_open: false };
                self.set_cursor(Cursor::Move, actions);
            }
            Some(CopyAreaHit::Handle(handle)) => {
                self.input =
                    InputState::ResizingDmdCopyArea { pointer, handle, start_world: world, origin, undo_open: false };
                self.set_cursor(handle.cursor(), actions);
            }
            None => {}
        }
    }

    fn set_cursor(&mut self, cursor: Cursor, actions: &mut Vec<Action>) {
        if self.ui.cursor != cursor {
            self.ui.cursor = cursor;
            actions.push(Action::SetCursor(cursor));
        }
    }

    /// Surface a rejected edit in the console and carry on.
    fn report<T>(&mut self, result: Result<T, EditError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.session.console.warn(e.to_string());
                None
            }
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    images: SurfaceImages,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, images: SurfaceImages::default(), core: EngineCore::new() }
    }

    /// Re-read the canvas' on-screen rectangle and backing-store size.
    pub fn sync_canvas_metrics(&mut self) -> Vec<Action> {
        let rect = self.canvas.get_bounding_client_rect();
        self.core.set_canvas(CanvasMetrics {
            left: rect.left(),
            top: rect.top(),
            css_width: rect.width(),
            css_height: rect.height(),
            backing_width: f64::from(self.canvas.width()),
            backing_height: f64::from(self.canvas.height()),
        })
    }

    /// Install the decoded image for `surface` (or clear it).
    pub fn set_image(&mut self, surface: Surface, image: Option<HtmlImageElement>) -> Vec<Action> {
        let size = image.as_ref().map(|img| (img.natural_width(), img.natural_height()));
        self.core.set_image_size(surface, size);
        match surface {
            Surface::Backglass => self.images.backglass = image,
            Surface::Dmd => self.images.dmd = image,
        }
        self.core.request_render().into_iter().collect()
    }

    // --- Delegated input ---

    pub fn on_pointer_down(&mut self, pointer: PointerId, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(pointer, client, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, pointer: PointerId, client: Point) -> Vec<Action> {
        self.core.on_pointer_move(pointer, client)
    }

    pub fn on_pointer_up(&mut self, pointer: PointerId) -> Vec<Action> {
        self.core.on_pointer_up(pointer)
    }

    pub fn on_pointer_cancel(&mut self, pointer: PointerId) -> Vec<Action> {
        self.core.on_pointer_cancel(pointer)
    }

    pub fn on_pointer_leave(&mut self, pointer: PointerId) -> Vec<Action> {
        self.core.on_pointer_leave(pointer)
    }

    pub fn on_wheel(&mut self, client: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(client, delta)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    pub fn execute(&mut self, command: Command) -> Vec<Action> {
        self.core.execute(command)
    }

    // --- Render ---

    /// Draw the current state to the canvas. Safe to call redundantly.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self.context()?;
        render::draw(&ctx, &self.core, &self.images)
    }

    /// Paint once if a repaint was requested since the last frame.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Engine::render`].
    pub fn on_animation_frame(&mut self) -> Result<bool, JsValue> {
        if !self.core.take_render_request() {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    fn context(&self) -> Result<CanvasRenderingContext2d, JsValue> {
        self.canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)
    }
}
