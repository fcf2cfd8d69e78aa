//! Shared numeric constants for the editor core.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 10.0;

/// Multiplier applied by the zoom-in / zoom-out commands.
pub const ZOOM_STEP: f64 = 1.2;

/// Zoom multiplier for one wheel notch towards the user (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Zoom multiplier for one wheel notch away from the user (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Screen padding in pixels left around the image by zoom-to-fit.
pub const FIT_PADDING_PX: f64 = 40.0;

/// Content size assumed when the active surface has no image yet.
pub const DEFAULT_CONTENT_WIDTH: f64 = 800.0;
pub const DEFAULT_CONTENT_HEIGHT: f64 = 600.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Drawn size of a resize handle, in world units at zoom 1.
pub const HANDLE_SIZE: f64 = 6.0;

/// Grab size of a resize handle in screen pixels; see `hit::handle_hit_radius`.
pub const HANDLE_HIT_SIZE: f64 = 24.0;

/// Side of the grill / DMD-location remove boxes, in screen pixels.
pub const REMOVE_BOX_PX: f64 = 12.0;

/// Inset of the grill remove box from the image's right edge, in screen pixels.
pub const REMOVE_BOX_INSET_PX: f64 = 15.0;

/// Gap between the DMD default-location rectangle and its remove box.
pub const REMOVE_BOX_GAP_PX: f64 = 5.0;

/// Side of the camera icon on the DMD copy area, in screen pixels.
pub const CAMERA_ICON_PX: f64 = 16.0;

/// Side of the DMD copy-area resize handles, in screen pixels.
pub const COPY_AREA_HANDLE_PX: f64 = 8.0;

/// Extra grab margin around DMD copy-area handles, in screen pixels.
pub const COPY_AREA_HIT_MARGIN_PX: f64 = 8.0;

// ── Editing ─────────────────────────────────────────────────────

/// Minimum width and height of a bulb or score after any resize.
pub const MIN_ENTITY_SIZE: i32 = 10;

/// A drag must travel more than this many world units before it opens a transaction.
pub const DRAG_THRESHOLD: f64 = 1.0;

/// Offset applied to duplicated entities on both axes.
pub const DUPLICATE_OFFSET: i32 = 20;

/// Arrow-key nudge distance, without and with shift.
pub const NUDGE_STEP: i32 = 1;
pub const NUDGE_STEP_LARGE: i32 = 10;

/// Maximum number of committed transactions kept for undo.
pub const MAX_UNDO_STACK: usize = 100;

// ── Ambient ─────────────────────────────────────────────────────

/// Lines retained by the console panel before the oldest are dropped.
pub const CONSOLE_CAPACITY: usize = 500;

/// Entries kept in the recent-files list.
pub const MAX_RECENT_FILES: usize = 10;
