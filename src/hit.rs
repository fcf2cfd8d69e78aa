//! Hit-testing: which entity, resize handle or overlay control is under a world point.
//!
//! All tests work in world coordinates. Sizes that should look constant on
//! screen (handles, remove boxes, the copy-area camera icon) are given in
//! screen pixels and divided by the zoom here.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, Rect};
use crate::consts::{
    CAMERA_ICON_PX, COPY_AREA_HANDLE_PX, COPY_AREA_HIT_MARGIN_PX, HANDLE_HIT_SIZE, REMOVE_BOX_GAP_PX,
    REMOVE_BOX_INSET_PX, REMOVE_BOX_PX,
};
use crate::doc::{Bounds, DmdArea, Document, GrillHeights, GrillKind, Placed, Surface};
use crate::input::Cursor;
use crate::selection::{EntityRef, Selection};

/// The eight resize handles of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    Nw,
    N,
    Ne,
    W,
    E,
    Sw,
    S,
    Se,
}

impl ResizeHandle {
    /// Every handle, in hit-test order.
    pub const ALL: [Self; 8] = [Self::Nw, Self::N, Self::Ne, Self::W, Self::E, Self::Sw, Self::S, Self::Se];

    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// Centre of this handle on `bounds`: a corner or an edge midpoint.
    #[must_use]
    pub fn position(self, bounds: Bounds) -> Point {
        let r = bounds.rect();
        let x = if self.moves_left() {
            r.x
        } else if self.moves_right() {
            r.x + r.width
        } else {
            r.x + r.width / 2.0
        };
        let y = if self.moves_top() {
            r.y
        } else if self.moves_bottom() {
            r.y + r.height
        } else {
            r.y + r.height / 2.0
        };
        Point::new(x, y)
    }

    #[must_use]
    pub fn cursor(self) -> Cursor {
        match self {
            Self::Nw | Self::Se => Cursor::ResizeNwse,
            Self::Ne | Self::Sw => Cursor::ResizeNesw,
            Self::N | Self::S => Cursor::ResizeNs,
            Self::W | Self::E => Cursor::ResizeEw,
        }
    }
}

/// Which entities can be hit: those on `surface` whose frames are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitFilter {
    pub surface: Surface,
    pub bulbs: bool,
    pub scores: bool,
}

impl HitFilter {
    fn accepts(&self, entity: &impl Placed) -> bool {
        entity.surface() == self.surface
    }
}

/// Half-width, in world units, of the square grab area around a handle centre.
///
/// Never smaller than 12 world units and grows as the view zooms out, so
/// handles stay easy to grab on a zoomed-out canvas.
#[must_use]
pub fn handle_hit_radius(zoom: f64) -> f64 {
    HANDLE_HIT_SIZE.max(HANDLE_HIT_SIZE / zoom) / 2.0
}

/// Topmost entity containing `world`.
///
/// Bulbs come first, highest `z_order` winning (list order breaks ties), then
/// scores in list order.
#[must_use]
pub fn entity_at(doc: &Document, world: Point, filter: HitFilter) -> Option<EntityRef> {
    if filter.bulbs {
        let mut bulbs: Vec<_> = doc.bulbs.iter().filter(|b| filter.accepts(*b)).collect();
        bulbs.sort_by(|a, b| b.z_order.cmp(&a.z_order));
        if let Some(bulb) = bulbs.into_iter().find(|b| b.bounds().contains(world)) {
            return Some(EntityRef::bulb(bulb.id));
        }
    }
    if filter.scores {
        if let Some(score) = doc.scores.iter().filter(|s| filter.accepts(*s)).find(|s| s.bounds().contains(world)) {
            return Some(EntityRef::score(score.id));
        }
    }
    None
}

/// Resize handle of a selected entity under `world`. Bulb handles win over score handles.
#[must_use]
pub fn handle_at(
    doc: &Document,
    selection: &Selection,
    world: Point,
    zoom: f64,
    filter: HitFilter,
) -> Option<(EntityRef, ResizeHandle)> {
    let radius = handle_hit_radius(zoom);
    let bulbs = selection
        .bulbs()
        .iter()
        .filter(|_| filter.bulbs)
        .filter_map(|&id| doc.bulb(id))
        .filter(|b| filter.accepts(*b))
        .map(|b| (EntityRef::bulb(b.id), b.bounds()));
    let scores = selection
        .scores()
        .iter()
        .filter(|_| filter.scores)
        .filter_map(|&id| doc.score(id))
        .filter(|s| filter.accepts(*s))
        .map(|s| (EntityRef::score(s.id), s.bounds()));

    bulbs.chain(scores).find_map(|(target, bounds)| {
        ResizeHandle::ALL.into_iter().find_map(|handle| {
            let centre = handle.position(bounds);
            let hit = (world.x - centre.x).abs() <= radius && (world.y - centre.y).abs() <= radius;
            hit.then_some((target, handle))
        })
    })
}

/// Every hit-testable entity whose bounds intersect `rect`, bulbs first.
#[must_use]
pub fn entities_in_rect(doc: &Document, rect: Rect, filter: HitFilter) -> Vec<EntityRef> {
    let bulbs = doc
        .bulbs
        .iter()
        .filter(|_| filter.bulbs)
        .filter(|b| filter.accepts(*b) && b.bounds().rect().intersects(&rect))
        .map(|b| EntityRef::bulb(b.id));
    let scores = doc
        .scores
        .iter()
        .filter(|_| filter.scores)
        .filter(|s| filter.accepts(*s) && s.bounds().rect().intersects(&rect))
        .map(|s| EntityRef::score(s.id));
    bulbs.chain(scores).collect()
}

// =============================================================
// Overlay controls
// =============================================================

/// Remove box drawn at the right end of a grill line.
#[must_use]
pub fn grill_remove_box(grill: &GrillHeights, kind: GrillKind, image_width: f64, image_height: f64, zoom: f64) -> Option<Rect> {
    let height = grill.get(kind);
    if height <= 0 {
        return None;
    }
    let line_y = image_height - f64::from(height);
    let inset = REMOVE_BOX_INSET_PX / zoom;
    let size = REMOVE_BOX_PX / zoom;
    Some(Rect { x: image_width - inset, y: line_y - inset, width: size, height: size })
}

/// Which grill remove box, if any, is under `world`. The main grill wins.
#[must_use]
pub fn grill_remove_at(grill: &GrillHeights, world: Point, image_width: f64, image_height: f64, zoom: f64) -> Option<GrillKind> {
    [GrillKind::Grill, GrillKind::SmallGrill].into_iter().find(|&kind| {
        grill_remove_box(grill, kind, image_width, image_height, zoom).is_some_and(|r| r.contains(world))
    })
}

/// Part of the DMD copy-area overlay under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAreaHit {
    /// The camera icon: copy the area into the DMD image.
    Capture,
    Handle(ResizeHandle),
    Body,
}

/// Camera icon rectangle, including its 2-pixel frame.
#[must_use]
pub fn copy_area_camera_icon(area: &DmdArea, zoom: f64) -> Rect {
    let icon = CAMERA_ICON_PX / zoom;
    let inset = 3.0 / zoom;
    let frame = 2.0 / zoom;
    let b = area.copy_bounds().rect();
    Rect {
        x: b.x + b.width - icon - inset - frame,
        y: b.y + inset - frame,
        width: icon + 2.0 * frame,
        height: icon + 2.0 * frame,
    }
}

/// Hit-test the DMD copy area: camera icon, then handles, then body.
#[must_use]
pub fn copy_area_at(area: &DmdArea, world: Point, zoom: f64) -> Option<CopyAreaHit> {
    if !area.has_copy_area() {
        return None;
    }
    if copy_area_camera_icon(area, zoom).contains(world) {
        return Some(CopyAreaHit::Capture);
    }
    let bounds = area.copy_bounds();
    let reach = COPY_AREA_HANDLE_PX / zoom / 2.0 + COPY_AREA_HIT_MARGIN_PX / zoom;
    let handle = ResizeHandle::ALL.into_iter().find(|h| {
        let c = h.position(bounds);
        (world.x - c.x).abs() <= reach && (world.y - c.y).abs() <= reach
    });
    if let Some(handle) = handle {
        return Some(CopyAreaHit::Handle(handle));
    }
    bounds.contains(world).then_some(CopyAreaHit::Body)
}

/// Remove box to the right of the DMD default-location rectangle.
#[must_use]
pub fn dmd_location_remove_box(area: &DmdArea, dmd_width: f64, zoom: f64) -> Option<Rect> {
    if !area.has_default_location() {
        return None;
    }
    let size = REMOVE_BOX_PX / zoom;
    Some(Rect {
        x: f64::from(area.default_x) + dmd_width + REMOVE_BOX_GAP_PX / zoom,
        y: f64::from(area.default_y),
        width: size,
        height: size,
    })
}

#[must_use]
pub fn dmd_location_remove_at(area: &DmdArea, world: Point, dmd_width: f64, zoom: f64) -> bool {
    dmd_location_remove_box(area, dmd_width, zoom).is_some_and(|r| r.contains(world))
}
