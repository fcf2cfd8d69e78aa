//! Rendering: draws the active surface and its editing overlays to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the engine state and produces pixels; it never mutates the session.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::{Point, Rect};
use crate::consts::{CAMERA_ICON_PX, COPY_AREA_HANDLE_PX, HANDLE_SIZE};
use crate::doc::{Bounds, Document, GrillKind, Placed, Surface};
use crate::engine::EngineCore;
use crate::hit::{self, ResizeHandle};
use crate::input::{ClickMode, UiState};
use crate::selection::EntityKind;

/// Decoded images for the two surfaces. Owned by [`crate::engine::Engine`].
#[derive(Debug, Default)]
pub struct SurfaceImages {
    pub backglass: Option<HtmlImageElement>,
    pub dmd: Option<HtmlImageElement>,
}

impl SurfaceImages {
    #[must_use]
    pub fn get(&self, surface: Surface) -> Option<&HtmlImageElement> {
        match surface {
            Surface::Backglass => self.backglass.as_ref(),
            Surface::Dmd => self.dmd.as_ref(),
        }
    }
}

const BACKDROP: &str = "#2b2b2b";
const EMPTY_SURFACE: &str = "#000000";
const BULB_FRAME: &str = "#ffd400";
const SCORE_FRAME: &str = "#00c8ff";
const SELECTION: &str = "#1E90FF";
const GRILL_LINE: &str = "#ff4040";
const SMALL_GRILL_LINE: &str = "#ff9d40";
const COPY_AREA: &str = "#40ff80";
const DMD_LOCATION: &str = "#c040ff";
const LABEL_FONT_PX: f64 = 11.0;

/// Dash segment length in screen pixels.
const DASH_PX: f64 = 4.0;

/// Draw the full scene: image, entity frames, selection and click-mode overlays.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore, images: &SurfaceImages) -> Result<(), JsValue> {
    let doc = core.session.doc();
    let ui = &core.ui;
    let zoom = core.camera.zoom;

    // Layer 1: clear in canvas space, then switch to world space.
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(BACKDROP);
    ctx.fill_rect(0.0, 0.0, core.canvas.backing_width, core.canvas.backing_height);
    if !core.session.has_file() {
        return Ok(());
    }
    ctx.translate(core.camera.pan_x, core.camera.pan_y)?;
    ctx.scale(zoom, zoom)?;

    // Layer 2: surface image.
    let (width, height) = core.content_size(ui.surface);
    match images.get(ui.surface) {
        Some(img) => ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?,
        None => {
            ctx.set_fill_style_str(EMPTY_SURFACE);
            ctx.fill_rect(0.0, 0.0, width, height);
        }
    }

    // Layer 3: entities.
    draw_bulbs(ctx, doc, ui, zoom)?;
    draw_scores(ctx, doc, ui, zoom);

    // Layer 4: selection UI.
    draw_selection(ctx, core, zoom);
    if let Some(m) = ui.marquee {
        draw_marquee(ctx, m, zoom)?;
    }

    // Layer 5: click-mode overlays.
    if ui.surface == Surface::Backglass {
        draw_grill(ctx, core, width, height)?;
        match ui.click_mode {
            ClickMode::DmdCopyArea => draw_copy_area(ctx, doc, zoom)?,
            ClickMode::DmdDefaultLocation => draw_dmd_location(ctx, core)?,
            ClickMode::None | ClickMode::GrillHeight | ClickMode::SmallGrillHeight => {}
        }
    }
    Ok(())
}

// =============================================================
// Entities
// =============================================================

fn draw_bulbs(ctx: &CanvasRenderingContext2d, doc: &Document, ui: &UiState, zoom: f64) -> Result<(), JsValue> {
    let mut bulbs: Vec<_> = doc.bulbs.iter().filter(|b| b.parent == ui.surface && b.visible).collect();
    bulbs.sort_by_key(|b| b.z_order);

    if ui.view.show_illumination {
        for bulb in &bulbs {
            let r = bulb.bounds().rect();
            ctx.set_fill_style_str(&bulb.light_color.css(0.45));
            ctx.fill_rect(r.x, r.y, r.width, r.height);
        }
    }
    if !ui.view.show_illumination_frames {
        return Ok(());
    }

    ctx.save();
    ctx.set_line_width(1.0 / zoom);
    ctx.set_stroke_style_str(BULB_FRAME);
    ctx.set_font(&format!("{}px sans-serif", LABEL_FONT_PX / zoom));
    for bulb in &bulbs {
        let r = bulb.bounds().rect();
        ctx.stroke_rect(r.x, r.y, r.width, r.height);
        draw_label(ctx, &bulb.name, r, zoom)?;
    }
    ctx.restore();
    Ok(())
}

fn draw_scores(ctx: &CanvasRenderingContext2d, doc: &Document, ui: &UiState, zoom: f64) {
    if !ui.view.show_scoring || !ui.view.show_score_frames {
        return;
    }
    ctx.save();
    ctx.set_line_width(1.0 / zoom);
    ctx.set_stroke_style_str(SCORE_FRAME);
    for score in doc.scores.iter().filter(|s| s.parent == ui.surface && s.visible) {
        let r = score.bounds().rect();
        ctx.stroke_rect(r.x, r.y, r.width, r.height);

        // Digit dividers.
        if score.digits > 1 {
            let step = r.width / f64::from(score.digits);
            ctx.begin_path();
            for i in 1..score.digits {
                let x = r.x + step * f64::from(i);
                ctx.move_to(x, r.y);
                ctx.line_to(x, r.y + r.height);
            }
            ctx.stroke();
        }
    }
    ctx.restore();
}

/// Name tag above the top-left corner, on a dark plate.
fn draw_label(ctx: &CanvasRenderingContext2d, text: &str, r: Rect, zoom: f64) -> Result<(), JsValue> {
    if text.is_empty() {
        return Ok(());
    }
    let pad = 2.0 / zoom;
    let text_h = LABEL_FONT_PX / zoom;
    let text_w = ctx.measure_text(text)?.width();
    ctx.set_fill_style_str("rgba(0, 0, 0, 0.6)");
    ctx.fill_rect(r.x, r.y - text_h - 2.0 * pad, text_w + 2.0 * pad, text_h + 2.0 * pad);
    ctx.set_fill_style_str(BULB_FRAME);
    ctx.fill_text(text, r.x + pad, r.y - pad)?;
    Ok(())
}

// =============================================================
// Selection
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, core: &EngineCore, zoom: f64) {
    let filter = core.ui.hit_filter();
    let doc = core.session.doc();
    ctx.save();
    ctx.set_line_width(2.0 / zoom);
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_fill_style_str("#ffffff");
    for target in core.session.selection().iter() {
        let placed = match target.kind {
            EntityKind::Bulb => doc.bulb(target.id).filter(|_| filter.bulbs).map(|b| (b.surface(), b.bounds())),
            EntityKind::Score => doc.score(target.id).filter(|_| filter.scores).map(|s| (s.surface(), s.bounds())),
        };
        let Some((_, bounds)) = placed.filter(|(surface, _)| *surface == filter.surface) else { continue };
        let r = bounds.rect();
        ctx.stroke_rect(r.x, r.y, r.width, r.height);
        draw_handles(ctx, bounds, HANDLE_SIZE / zoom);
    }
    ctx.restore();
}

fn draw_handles(ctx: &CanvasRenderingContext2d, bounds: Bounds, size: f64) {
    for handle in ResizeHandle::ALL {
        let c = handle.position(bounds);
        ctx.fill_rect(c.x - size / 2.0, c.y - size / 2.0, size, size);
        ctx.stroke_rect(c.x - size / 2.0, c.y - size / 2.0, size, size);
    }
}

fn set_dashed(ctx: &CanvasRenderingContext2d, zoom: f64) -> Result<(), JsValue> {
    let dash_world = DASH_PX / zoom;
    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, marquee: Rect, zoom: f64) -> Result<(), JsValue> {
    ctx.save();
    set_dashed(ctx, zoom)?;
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_fill_style_str("rgba(30, 144, 255, 0.12)");
    ctx.set_line_width(1.0 / zoom);
    ctx.fill_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    ctx.stroke_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Click-mode overlays
// =============================================================

fn draw_grill(ctx: &CanvasRenderingContext2d, core: &EngineCore, width: f64, height: f64) -> Result<(), JsValue> {
    let grill = &core.session.doc().grill;
    let zoom = core.camera.zoom;
    let mode = core.ui.click_mode;
    let picking = matches!(mode, ClickMode::GrillHeight | ClickMode::SmallGrillHeight);

    ctx.save();
    ctx.set_line_width(2.0 / zoom);
    for (kind, color) in [(GrillKind::Grill, GRILL_LINE), (GrillKind::SmallGrill, SMALL_GRILL_LINE)] {
        let value = grill.get(kind);
        if value <= 0 {
            continue;
        }
        let y = height - f64::from(value);
        ctx.set_stroke_style_str(color);
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(width, y);
        ctx.stroke();
        if picking {
            if let Some(b) = hit::grill_remove_box(grill, kind, width, height, zoom) {
                draw_remove_box(ctx, b, color, zoom);
            }
        }
    }

    // Preview line under the pointer.
    if let (true, Some(hover)) = (picking, core.ui.hover_world) {
        set_dashed(ctx, zoom)?;
        ctx.set_stroke_style_str(if mode == ClickMode::SmallGrillHeight { SMALL_GRILL_LINE } else { GRILL_LINE });
        ctx.begin_path();
        ctx.move_to(0.0, hover.y);
        ctx.line_to(width, hover.y);
        ctx.stroke();
        ctx.set_line_dash(&js_sys::Array::new())?;
    }
    ctx.restore();
    Ok(())
}

fn draw_remove_box(ctx: &CanvasRenderingContext2d, b: Rect, color: &str, zoom: f64) {
    ctx.set_fill_style_str(color);
    ctx.fill_rect(b.x, b.y, b.width, b.height);
    let inset = 3.0 / zoom;
    ctx.set_stroke_style_str("#ffffff");
    ctx.begin_path();
    ctx.move_to(b.x + inset, b.y + inset);
    ctx.line_to(b.x + b.width - inset, b.y + b.height - inset);
    ctx.move_to(b.x + b.width - inset, b.y + inset);
    ctx.line_to(b.x + inset, b.y + b.height - inset);
    ctx.stroke();
}

fn draw_copy_area(ctx: &CanvasRenderingContext2d, doc: &Document, zoom: f64) -> Result<(), JsValue> {
    let area = &doc.dmd_area;
    if !area.has_copy_area() {
        return Ok(());
    }
    let bounds = area.copy_bounds();
    let r = bounds.rect();

    ctx.save();
    ctx.set_line_width(2.0 / zoom);
    set_dashed(ctx, zoom)?;
    ctx.set_stroke_style_str(COPY_AREA);
    ctx.set_fill_style_str("rgba(64, 255, 128, 0.12)");
    ctx.fill_rect(r.x, r.y, r.width, r.height);
    ctx.stroke_rect(r.x, r.y, r.width, r.height);
    ctx.set_line_dash(&js_sys::Array::new())?;

    // Camera icon: frame, body and lens.
    let icon = hit::copy_area_camera_icon(area, zoom);
    ctx.set_fill_style_str("rgba(0, 0, 0, 0.7)");
    ctx.fill_rect(icon.x, icon.y, icon.width, icon.height);
    let size = CAMERA_ICON_PX / zoom;
    let centre = Point::new(icon.x + icon.width / 2.0, icon.y + icon.height / 2.0);
    ctx.set_fill_style_str(COPY_AREA);
    ctx.fill_rect(centre.x - size * 0.4, centre.y - size * 0.25, size * 0.8, size * 0.55);
    ctx.set_fill_style_str("#000000");
    ctx.begin_path();
    ctx.arc(centre.x, centre.y + size * 0.02, size * 0.16, 0.0, std::f64::consts::TAU)?;
    ctx.fill();

    ctx.set_fill_style_str(COPY_AREA);
    ctx.set_stroke_style_str("#000000");
    ctx.set_line_width(1.0 / zoom);
    draw_handles(ctx, bounds, COPY_AREA_HANDLE_PX / zoom);
    ctx.restore();
    Ok(())
}

fn draw_dmd_location(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    let area = &core.session.doc().dmd_area;
    let zoom = core.camera.zoom;
    let (dmd_w, dmd_h) = core.content_size(Surface::Dmd);

    ctx.save();
    ctx.set_line_width(2.0 / zoom);
    ctx.set_stroke_style_str(DMD_LOCATION);
    if area.has_default_location() {
        ctx.stroke_rect(f64::from(area.default_x), f64::from(area.default_y), dmd_w, dmd_h);
        if let Some(b) = hit::dmd_location_remove_box(area, dmd_w, zoom) {
            draw_remove_box(ctx, b, DMD_LOCATION, zoom);
        }
    }
    if let Some(hover) = core.ui.hover_world {
        set_dashed(ctx, zoom)?;
        ctx.set_stroke_style_str(DMD_LOCATION);
        ctx.stroke_rect(hover.x.round(), hover.y.round(), dmd_w, dmd_h);
        ctx.set_line_dash(&js_sys::Array::new())?;
    }
    ctx.restore();
    Ok(())
}
