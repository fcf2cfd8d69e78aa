//! Input model: modifier keys, buttons, cursors, click modes and the gesture state machine.
//!
//! `Modifiers`, `Button` and `Key` describe a raw event. `UiState` is the
//! persistent view state the renderer reads (active surface, frame toggles,
//! special click mode, hover position). `InputState` is the gesture tracked
//! between pointer-down and pointer-up, carrying everything needed to
//! recompute geometry from the gesture's start on every move.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::BTreeMap;

use crate::camera::{Point, Rect};
use crate::doc::{Bounds, Surface};
use crate::hit::{HitFilter, ResizeHandle};
use crate::selection::EntityRef;

/// Browser pointer id.
pub type PointerId = i32;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (`"Delete"`, `"ArrowLeft"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Case-insensitive comparison for single-letter shortcuts.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive = down (towards the user).
    pub dy: f64,
}

/// Mouse cursor the host should show over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Move,
    Grabbing,
    Crosshair,
    ResizeNwse,
    ResizeNesw,
    ResizeNs,
    ResizeEw,
}

impl Cursor {
    /// CSS `cursor` value.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Move => "move",
            Self::Grabbing => "grabbing",
            Self::Crosshair => "crosshair",
            Self::ResizeNwse => "nwse-resize",
            Self::ResizeNesw => "nesw-resize",
            Self::ResizeNs => "ns-resize",
            Self::ResizeEw => "ew-resize",
        }
    }
}

/// Special pick modes where a primary click sets a value instead of selecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    #[default]
    None,
    GrillHeight,
    SmallGrillHeight,
    DmdCopyArea,
    DmdDefaultLocation,
}

impl ClickMode {
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Self::None
    }
}

/// Visibility toggles. Frame toggles also gate hit-testing.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFlags {
    pub show_illumination_frames: bool,
    pub show_score_frames: bool,
    /// Draw the lit bulb overlay.
    pub show_illumination: bool,
    /// Draw score displays at all.
    pub show_scoring: bool,
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self { show_illumination_frames: false, show_score_frames: false, show_illumination: false, show_scoring: true }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Active tab.
    pub surface: Surface,
    pub view: ViewFlags,
    pub click_mode: ClickMode,
    /// Last pointer position in world space while a click mode is active.
    pub hover_world: Option<Point>,
    /// Rubber-band rectangle while a marquee gesture is active.
    pub marquee: Option<Rect>,
    pub cursor: Cursor,
}

impl UiState {
    /// Which entities pointer gestures may hit.
    #[must_use]
    pub fn hit_filter(&self) -> HitFilter {
        HitFilter {
            surface: self.surface,
            bulbs: self.view.show_illumination_frames,
            scores: self.view.show_score_frames,
        }
    }
}

/// Gesture in progress between pointer-down and pointer-up.
///
/// Drag variants keep the world position and entity bounds from the start of
/// the gesture; every move recomputes geometry from those origins. `undo_open`
/// flips once the pointer has travelled past the drag threshold and the
/// transaction has been opened.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        pointer: PointerId,
        /// Canvas-space position at the previous event.
        last_screen: Point,
    },
    /// Dragging every selected entity.
    Moving {
        pointer: PointerId,
        start_world: Point,
        origins: BTreeMap<EntityRef, Bounds>,
        undo_open: bool,
    },
    /// Dragging one handle of one entity.
    Resizing {
        pointer: PointerId,
        target: EntityRef,
        handle: ResizeHandle,
        start_world: Point,
        origin: Bounds,
        undo_open: bool,
    },
    /// Rubber-band selection.
    Marquee {
        pointer: PointerId,
        start_world: Point,
        additive: bool,
    },
    MovingDmdCopyArea {
        pointer: PointerId,
        start_world: Point,
        origin: Bounds,
        undo_open: bool,
    },
    ResizingDmdCopyArea {
        pointer: PointerId,
        handle: ResizeHandle,
        start_world: Point,
        origin: Bounds,
        undo_open: bool,
    },
}

impl InputState {
    /// The pointer driving the gesture, or `None` when idle.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::Idle => None,
            Self::Panning { pointer, .. }
            | Self::Moving { pointer, .. }
            | Self::Resizing { pointer, .. }
            | Self::Marquee { pointer, .. }
            | Self::MovingDmdCopyArea { pointer, .. }
            | Self::ResizingDmdCopyArea { pointer, .. } => Some(*pointer),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether the gesture has an undo transaction open.
    #[must_use]
    pub fn undo_open(&self) -> bool {
        match self {
            Self::Moving { undo_open, .. }
            | Self::Resizing { undo_open, .. }
            | Self::MovingDmdCopyArea { undo_open, .. }
            | Self::ResizingDmdCopyArea { undo_open, .. } => *undo_open,
            Self::Idle | Self::Panning { .. } | Self::Marquee { .. } => false,
        }
    }
}
