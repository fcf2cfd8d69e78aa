//! Document model: the typed contents of a backglass file.
//!
//! A [`Document`] owns every editable entity: illumination bulbs, score
//! displays, animations, the image collection and a handful of scalar
//! sections (table metadata, grill heights, DMD placement). Entities are plain
//! data; all mutation goes through [`crate::session::EditorSession`] so the
//! undo engine can snapshot them.
//!
//! Every type here derives `Clone` field by field. `Color` is `Copy`, so a
//! cloned bulb never shares color storage with the live one, which is what the
//! undo snapshots rely on.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, Rect};
use crate::consts::MIN_ENTITY_SIZE;
use crate::hit::ResizeHandle;

/// Which drawing surface an entity belongs to (also the editor's active tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Surface {
    #[default]
    Backglass,
    #[serde(rename = "DMD")]
    Dmd,
}

impl Surface {
    /// Lower-case name for status messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Backglass => "backglass",
            Self::Dmd => "DMD",
        }
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba()` string with the alpha channel scaled by `opacity`.
    #[must_use]
    pub fn css(&self, opacity: f64) -> String {
        let alpha = f64::from(self.a) / 255.0 * opacity.clamp(0.0, 1.0);
        format!("rgba({}, {}, {}, {alpha:.3})", self.r, self.g, self.b)
    }
}

// =============================================================
// Enumerations
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableType {
    #[serde(rename = "EM")]
    Em,
    #[default]
    #[serde(rename = "SS")]
    Ss,
    #[serde(rename = "SSDMD")]
    SsDmd,
    #[serde(rename = "ORI")]
    Original,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DmdType {
    #[default]
    None,
    BuiltIn,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommType {
    #[default]
    #[serde(rename = "ROM")]
    Rom,
    B2S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DestType {
    #[default]
    Authentic,
    Fantasy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RomIdType {
    #[default]
    Lamp,
    Solenoid,
    GIString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum B2sIdType {
    Cyclic,
    #[default]
    Straight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotatingDirection {
    #[default]
    None,
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialState {
    #[default]
    Off,
    On,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DualMode {
    #[default]
    Both,
    Authentic,
    Fantasy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IlluminationMode {
    #[default]
    Standard,
    Flasher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightState {
    #[default]
    Off,
    On,
    NoChange,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBehaviour {
    #[default]
    Immediate,
    RunTillEnd,
    ReturnToFirstStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RollingDirection {
    #[default]
    Up,
    Down,
}

// =============================================================
// Geometry
// =============================================================

/// Integer bounding box of a bulb, score or DMD copy area, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive containment test against a world point.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        self.rect().contains(pt)
    }

    /// The same box as a floating-point rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect {
            x: f64::from(self.x),
            y: f64::from(self.y),
            width: f64::from(self.width),
            height: f64::from(self.height),
        }
    }

    /// Translate by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..self }
    }

    /// Apply a handle drag of `(dx, dy)`.
    ///
    /// Edges attached to the handle follow the pointer; afterwards width and
    /// height are floored at [`MIN_ENTITY_SIZE`] without moving any edge back.
    #[must_use]
    pub fn resized(self, handle: ResizeHandle, dx: i32, dy: i32) -> Self {
        let mut b = self;
        if handle.moves_left() {
            b.x += dx;
            b.width -= dx;
        }
        if handle.moves_right() {
            b.width += dx;
        }
        if handle.moves_top() {
            b.y += dy;
            b.height -= dy;
        }
        if handle.moves_bottom() {
            b.height += dy;
        }
        b.width = b.width.max(MIN_ENTITY_SIZE);
        b.height = b.height.max(MIN_ENTITY_SIZE);
        b
    }

    /// Like [`Bounds::resized`], but when a dimension clamps the edge opposite
    /// the handle stays where it was.
    #[must_use]
    pub fn resized_anchored(self, handle: ResizeHandle, dx: i32, dy: i32) -> Self {
        let mut b = self.resized(handle, dx, dy);
        if handle.moves_left() && self.width - dx < MIN_ENTITY_SIZE {
            b.x = self.x + self.width - MIN_ENTITY_SIZE;
        }
        if handle.moves_top() && self.height - dy < MIN_ENTITY_SIZE {
            b.y = self.y + self.height - MIN_ENTITY_SIZE;
        }
        b
    }

    /// Scale position and size independently per axis, rounding to whole pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn scaled(self, sx: f64, sy: f64) -> Self {
        let scale = |v: i32, s: f64| (f64::from(v) * s).round() as i32;
        Self {
            x: scale(self.x, sx),
            y: scale(self.y, sy),
            width: scale(self.width, sx),
            height: scale(self.height, sy),
        }
    }
}

/// An entity with a rectangular placement on a surface.
pub trait Placed {
    fn id(&self) -> u32;
    fn surface(&self) -> Surface;
    fn bounds(&self) -> Bounds;
    fn set_bounds(&mut self, bounds: Bounds);
}

// =============================================================
// Entities
// =============================================================

/// An illumination region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bulb {
    pub id: u32,
    pub name: String,
    pub parent: Surface,
    pub rom_id: i32,
    pub rom_id_type: RomIdType,
    pub rom_inverted: bool,
    pub b2s_id: i32,
    pub b2s_id_type: B2sIdType,
    pub light_color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dodge_color: Option<Color>,
    pub loc_x: i32,
    pub loc_y: i32,
    pub width: i32,
    pub height: i32,
    /// Glow intensity, 1 to 5.
    pub intensity: u8,
    pub is_image_snippet: bool,
    /// Base64 image payload for snippet bulbs.
    pub image_data: String,
    pub snippet_rotating_direction: RotatingDirection,
    pub text: String,
    pub text_alignment: i32,
    pub font_name: String,
    pub font_size: i32,
    pub font_style: i32,
    pub visible: bool,
    pub initial_state: InitialState,
    pub dual_mode: DualMode,
    pub illumination_mode: IlluminationMode,
    pub z_order: i32,
}

impl Bulb {
    /// A new bulb with editor defaults: yellow, 50×50 at (100, 100).
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: format!("Bulb{id}"),
            parent: Surface::Backglass,
            rom_id: 0,
            rom_id_type: RomIdType::Lamp,
            rom_inverted: false,
            b2s_id: 0,
            b2s_id_type: B2sIdType::Straight,
            light_color: Color::rgba(255, 255, 0, 255),
            dodge_color: None,
            loc_x: 100,
            loc_y: 100,
            width: 50,
            height: 50,
            intensity: 3,
            is_image_snippet: false,
            image_data: String::new(),
            snippet_rotating_direction: RotatingDirection::None,
            text: String::new(),
            text_alignment: 0,
            font_name: "Arial".into(),
            font_size: 12,
            font_style: 0,
            visible: true,
            initial_state: InitialState::Off,
            dual_mode: DualMode::Both,
            illumination_mode: IlluminationMode::Standard,
            z_order: 0,
        }
    }
}

impl Placed for Bulb {
    fn id(&self) -> u32 {
        self.id
    }

    fn surface(&self) -> Surface {
        self.parent
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(self.loc_x, self.loc_y, self.width, self.height)
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.loc_x = bounds.x;
        self.loc_y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }
}

/// A digit / reel score display region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDisplay {
    pub id: u32,
    pub parent: Surface,
    /// Reel or LED style name, e.g. `Dream7LED8` or `EMR_T1_0`.
    pub reel_type: String,
    pub digits: u32,
    pub spacing: i32,
    pub loc_x: i32,
    pub loc_y: i32,
    pub width: i32,
    pub height: i32,
    pub reel_color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reel_lit_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reel_dark_color: Option<Color>,
    pub glow: i32,
    pub thickness: i32,
    pub shear: i32,
    pub display_state: i32,
    pub b2s_start_digit: i32,
    pub b2s_score_type: i32,
    pub b2s_player_no: i32,
    pub visible: bool,
}

impl ScoreDisplay {
    /// A new seven-digit LED score with editor defaults.
    #[must_use]
    pub fn new(id: u32, parent: Surface) -> Self {
        Self {
            id,
            parent,
            reel_type: "Dream7LED8".into(),
            digits: 7,
            spacing: 5,
            loc_x: 100,
            loc_y: 100,
            width: 200,
            height: 50,
            reel_color: Color::rgba(255, 120, 0, 255),
            reel_lit_color: None,
            reel_dark_color: Some(Color::rgba(15, 15, 15, 255)),
            glow: 1500,
            thickness: 2000,
            shear: 10,
            display_state: 0,
            b2s_start_digit: 0,
            b2s_score_type: 1,
            b2s_player_no: i32::try_from(id).unwrap_or(1),
            visible: true,
        }
    }
}

impl Placed for ScoreDisplay {
    fn id(&self) -> u32 {
        self.id
    }

    fn surface(&self) -> Surface {
        self.parent
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(self.loc_x, self.loc_y, self.width, self.height)
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.loc_x = bounds.x;
        self.loc_y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }
}

/// One step of an animation: which signals go on / off and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    pub step: u32,
    pub on: String,
    pub off: String,
    pub wait_loops_after_on: u32,
    pub wait_loops_after_off: u32,
    pub pulse_switch: i32,
}

/// A named light sequence. The name is its identity within a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub name: String,
    pub dual_mode: DualMode,
    pub interval: u32,
    pub loops: u32,
    pub id_join: String,
    pub start_animation_at_rom_start: bool,
    pub light_at_start: LightState,
    pub light_at_end: LightState,
    pub animation_stop_behaviour: StopBehaviour,
    pub lock_at_last_step: bool,
    pub hide_at_start: bool,
    pub bring_to_front: bool,
    pub random_start: bool,
    pub random_quality: u32,
    pub steps: Vec<AnimationStep>,
}

impl Animation {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dual_mode: DualMode::Both,
            interval: 100,
            loops: 0,
            id_join: String::new(),
            start_animation_at_rom_start: false,
            light_at_start: LightState::NoChange,
            light_at_end: LightState::NoChange,
            animation_stop_behaviour: StopBehaviour::Immediate,
            lock_at_last_step: false,
            hide_at_start: false,
            bring_to_front: false,
            random_start: false,
            random_quality: 1,
            steps: Vec::new(),
        }
    }
}

// =============================================================
// Images
// =============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundImage {
    pub file_name: String,
    pub rom_id: i32,
    pub rom_id_type: RomIdType,
    #[serde(rename = "type")]
    pub kind: String,
    pub image_data: String,
}

impl BackgroundImage {
    /// A main backglass image as produced by "import image".
    #[must_use]
    pub fn main(file_name: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            rom_id: 0,
            rom_id_type: RomIdType::Lamp,
            kind: "Main".into(),
            image_data: image_data.into(),
        }
    }
}

/// A named base64 image payload (illuminated snippets and DMD images).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedImage {
    pub file_name: String,
    pub image_data: String,
}

impl NamedImage {
    #[must_use]
    pub fn new(file_name: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), image_data: image_data.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCollection {
    #[serde(default)]
    pub background: Option<BackgroundImage>,
    #[serde(default)]
    pub dmd: Option<NamedImage>,
    #[serde(default)]
    pub illuminated: Vec<NamedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ImageCollection {
    /// Base64 payload of the image shown on `surface`, if any.
    #[must_use]
    pub fn surface_data(&self, surface: Surface) -> Option<&str> {
        match surface {
            Surface::Backglass => self.background.as_ref().map(|img| img.image_data.as_str()),
            Surface::Dmd => self.dmd.as_ref().map(|img| img.image_data.as_str()),
        }
    }

    /// Replace the payload of the image shown on `surface`. Returns false if there is none.
    pub fn set_surface_data(&mut self, surface: Surface, data: String) -> bool {
        match surface {
            Surface::Backglass => self.background.as_mut().map(|img| img.image_data = data).is_some(),
            Surface::Dmd => self.dmd.as_mut().map(|img| img.image_data = data).is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelImage {
    pub name: String,
    pub count_of_intermediates: u32,
    pub image_data: String,
}

/// Reel artwork. Round-tripped with the document; not edited by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelCollection {
    pub count_of_intermediates: u32,
    pub rolling_direction: RollingDirection,
    pub rolling_interval: u32,
    pub images: Vec<ReelImage>,
    pub illuminated_images: BTreeMap<u32, Vec<ReelImage>>,
}

impl Default for ReelCollection {
    fn default() -> Self {
        Self {
            count_of_intermediates: 10,
            rolling_direction: RollingDirection::Up,
            rolling_interval: 30,
            images: Vec::new(),
            illuminated_images: BTreeMap::new(),
        }
    }
}

// =============================================================
// Document sections
// =============================================================

/// Scalar table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub version: String,
    pub name: String,
    pub table_type: TableType,
    pub dmd_type: DmdType,
    pub comm_type: CommType,
    pub dest_type: DestType,
    pub project_guid: String,
    pub assembly_guid: String,
    pub vs_name: String,
    pub dual_backglass: bool,
    pub author: String,
    pub artwork: String,
    pub game_name: String,
    pub add_em_defaults: bool,
    pub number_of_players: u32,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            version: "1.27".into(),
            name: String::new(),
            table_type: TableType::Ss,
            dmd_type: DmdType::None,
            comm_type: CommType::Rom,
            dest_type: DestType::Authentic,
            project_guid: uuid::Uuid::new_v4().to_string(),
            assembly_guid: uuid::Uuid::new_v4().to_string(),
            vs_name: String::new(),
            dual_backglass: false,
            author: String::new(),
            artwork: String::new(),
            game_name: String::new(),
            add_em_defaults: false,
            number_of_players: 4,
        }
    }
}

/// Grill heights measured up from the bottom of the backglass image. 0 = unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrillHeights {
    pub grill_height: i32,
    pub small_grill_height: i32,
}

/// Which of the two grill lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrillKind {
    Grill,
    SmallGrill,
}

impl GrillHeights {
    #[must_use]
    pub fn get(&self, kind: GrillKind) -> i32 {
        match kind {
            GrillKind::Grill => self.grill_height,
            GrillKind::SmallGrill => self.small_grill_height,
        }
    }

    pub fn set(&mut self, kind: GrillKind, value: i32) {
        match kind {
            GrillKind::Grill => self.grill_height = value,
            GrillKind::SmallGrill => self.small_grill_height = value,
        }
    }
}

/// Where the DMD sits on the backglass, and the backglass region it can be copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmdArea {
    pub default_x: i32,
    pub default_y: i32,
    pub copy_x: i32,
    pub copy_y: i32,
    pub copy_width: i32,
    pub copy_height: i32,
}

impl DmdArea {
    #[must_use]
    pub fn copy_bounds(&self) -> Bounds {
        Bounds::new(self.copy_x, self.copy_y, self.copy_width, self.copy_height)
    }

    pub fn set_copy_bounds(&mut self, bounds: Bounds) {
        self.copy_x = bounds.x;
        self.copy_y = bounds.y;
        self.copy_width = bounds.width;
        self.copy_height = bounds.height;
    }

    /// A copy area is usable only with a positive size.
    #[must_use]
    pub fn has_copy_area(&self) -> bool {
        self.copy_width > 0 && self.copy_height > 0
    }

    /// Whether a DMD default location has been set.
    #[must_use]
    pub fn has_default_location(&self) -> bool {
        self.default_x > 0 || self.default_y > 0
    }
}

// =============================================================
// Document
// =============================================================

/// The root aggregate of a backglass file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub info: DocumentInfo,
    #[serde(default)]
    pub grill: GrillHeights,
    #[serde(default)]
    pub dmd_area: DmdArea,
    #[serde(default)]
    pub bulbs: Vec<Bulb>,
    #[serde(default)]
    pub scores: Vec<ScoreDisplay>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default)]
    pub images: ImageCollection,
    #[serde(default)]
    pub reels: ReelCollection,
}

impl Document {
    /// An empty document with fresh project GUIDs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bulb(&self, id: u32) -> Option<&Bulb> {
        self.bulbs.iter().find(|b| b.id == id)
    }

    pub fn bulb_mut(&mut self, id: u32) -> Option<&mut Bulb> {
        self.bulbs.iter_mut().find(|b| b.id == id)
    }

    #[must_use]
    pub fn score(&self, id: u32) -> Option<&ScoreDisplay> {
        self.scores.iter().find(|s| s.id == id)
    }

    pub fn score_mut(&mut self, id: u32) -> Option<&mut ScoreDisplay> {
        self.scores.iter_mut().find(|s| s.id == id)
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }

    /// Largest bulb id in use, or 0.
    #[must_use]
    pub fn max_bulb_id(&self) -> u32 {
        self.bulbs.iter().map(|b| b.id).max().unwrap_or(0)
    }

    /// Largest score id in use, or 0.
    #[must_use]
    pub fn max_score_id(&self) -> u32 {
        self.scores.iter().map(|s| s.id).max().unwrap_or(0)
    }
}
