#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{BackgroundImage, Bulb, Document, ScoreDisplay};
use crate::input::ViewFlags;

// =============================================================
// Helpers
// =============================================================

const P1: PointerId = 1;
const P2: PointerId = 2;

fn bulb_at(id: u32, x: i32, y: i32) -> Bulb {
    let mut bulb = Bulb::new(id);
    bulb.loc_x = x;
    bulb.loc_y = y;
    bulb
}

/// An 800×600 canvas at identity camera, with `doc` loaded and every frame visible.
fn core_with(doc: Document) -> EngineCore {
    let mut core = EngineCore::new();
    core.set_canvas(CanvasMetrics::sized(800.0, 600.0));
    core.take_render_request();
    core.session.load(doc, Some("table.directb2s".into()));
    core.ui.view = ViewFlags { show_illumination_frames: true, show_score_frames: true, ..ViewFlags::default() };
    core
}

fn core_with_bulbs(bulbs: &[(u32, i32, i32)]) -> EngineCore {
    let mut doc = Document::new();
    for &(id, x, y) in bulbs {
        doc.bulbs.push(bulb_at(id, x, y));
    }
    core_with(doc)
}

fn with_backglass_image(mut core: EngineCore, w: u32, h: u32) -> EngineCore {
    let mut doc = core.session.doc().clone();
    doc.images.background = Some(BackgroundImage::main("bg.png", "QkFDSw=="));
    core.session.load(doc, Some("table.directb2s".into()));
    core.set_image_size(Surface::Backglass, Some((w, h)));
    core
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn key(name: &str) -> Key {
    Key(name.into())
}

fn click(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    let mut actions = core.on_pointer_down(P1, pt(x, y), Button::Primary, no_modifiers());
    actions.extend(core.on_pointer_up(P1));
    actions
}

fn drag(core: &mut EngineCore, from: (f64, f64), to: (f64, f64)) {
    core.on_pointer_down(P1, pt(from.0, from.1), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(to.0, to.1));
    core.on_pointer_up(P1);
}

fn bounds_of(core: &EngineCore, target: EntityRef) -> Option<Bounds> {
    core.session.entity_bounds(target)
}

fn has_action(actions: &[Action], pred: impl Fn(&Action) -> bool) -> bool {
    actions.iter().any(pred)
}

// =============================================================
// Moving
// =============================================================

#[test]
fn move_opens_transaction_only_past_threshold() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(110.5, 110.0));
    assert!(!core.session.undo_manager().is_open());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));

    core.on_pointer_move(P1, pt(130.0, 125.0));
    assert!(core.session.undo_manager().is_open());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(120, 115, 50, 50)));

    core.on_pointer_up(P1);
    assert!(!core.session.undo_manager().is_open());
    assert_eq!(core.session.undo_manager().undo_description(), Some("Move"));
}

#[test]
fn drag_geometry_follows_total_delta() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(150.0, 110.0));
    core.on_pointer_move(P1, pt(120.0, 110.0));
    core.on_pointer_up(P1);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(110, 100, 50, 50)));
    assert_eq!(core.session.undo_manager().depth(), 1);
}

#[test]
fn click_without_drag_selects_and_records_nothing() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    click(&mut core, 110.0, 110.0);
    assert!(core.session.selection().is_selected(EntityRef::bulb(1)));
    assert!(!core.session.undo_manager().can_undo());
    assert!(!core.session.is_dirty());
}

#[test]
fn dragging_a_selected_entity_moves_the_whole_selection() {
    let mut core = core_with_bulbs(&[(1, 100, 100), (2, 300, 300)]);
    core.session.set_selection(vec![1, 2], Vec::new(), None);
    drag(&mut core, (110.0, 110.0), (120.0, 130.0));
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(110, 120, 50, 50)));
    assert_eq!(bounds_of(&core, EntityRef::bulb(2)), Some(Bounds::new(310, 320, 50, 50)));

    core.execute(Command::Undo);
    assert_eq!(bounds_of(&core, EntityRef::bulb(2)), Some(Bounds::new(300, 300, 50, 50)));
}

#[test]
fn move_then_undo_restores_position() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    drag(&mut core, (110.0, 110.0), (140.0, 110.0));
    assert!(core.session.is_dirty());
    core.execute(Command::Undo);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
    assert!(!core.session.is_dirty());
}

#[test]
fn hidden_frames_are_not_hit() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.ui.view.show_illumination_frames = false;
    click(&mut core, 110.0, 110.0);
    assert!(core.session.selection().is_empty());
}

// =============================================================
// Resizing
// =============================================================

#[test]
fn dragging_a_handle_resizes() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    let actions = core.on_pointer_down(P1, pt(150.0, 150.0), Button::Primary, no_modifiers());
    assert!(has_action(&actions, |a| *a == Action::SetCursor(Cursor::ResizeNwse)));

    core.on_pointer_move(P1, pt(170.0, 160.0));
    core.on_pointer_up(P1);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 70, 60)));
    assert_eq!(core.session.undo_manager().undo_description(), Some("Resize"));
}

#[test]
fn resize_floors_at_minimum_size() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    drag(&mut core, (150.0, 150.0), (60.0, 60.0));
    let b = bounds_of(&core, EntityRef::bulb(1));
    assert_eq!(b.map(|b| (b.width, b.height)), Some((10, 10)));
}

// =============================================================
// Marquee
// =============================================================

#[test]
fn marquee_selects_intersecting_entities() {
    let mut core = core_with_bulbs(&[(1, 100, 100), (2, 300, 300)]);
    core.on_pointer_down(P1, pt(10.0, 10.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(200.0, 200.0));
    assert!(core.ui.marquee.is_some());
    core.on_pointer_up(P1);

    assert!(core.ui.marquee.is_none());
    assert!(core.session.selection().is_selected(EntityRef::bulb(1)));
    assert!(!core.session.selection().is_selected(EntityRef::bulb(2)));
    assert!(!core.session.undo_manager().can_undo());
}

#[test]
fn shift_marquee_adds_to_selection() {
    let mut core = core_with_bulbs(&[(1, 100, 100), (2, 300, 300)]);
    core.session.select(EntityRef::bulb(2), false);
    core.on_pointer_down(P1, pt(10.0, 10.0), Button::Primary, shift());
    core.on_pointer_move(P1, pt(200.0, 200.0));
    core.on_pointer_up(P1);
    assert_eq!(core.session.selection().len(), 2);
}

#[test]
fn marquee_picks_up_scores() {
    let mut doc = Document::new();
    doc.scores.push(ScoreDisplay::new(1, Surface::Backglass));
    let mut core = core_with(doc);
    core.on_pointer_down(P1, pt(90.0, 90.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(120.0, 120.0));
    core.on_pointer_up(P1);
    assert_eq!(core.session.selection().scores(), &[1]);
}

#[test]
fn click_on_empty_space_clears_selection() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    click(&mut core, 500.0, 500.0);
    assert!(core.session.selection().is_empty());
}

// =============================================================
// Pointer ownership
// =============================================================

#[test]
fn second_pointer_is_ignored_during_gesture() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    assert!(core.on_pointer_down(P2, pt(400.0, 400.0), Button::Primary, no_modifiers()).is_empty());
    assert!(core.on_pointer_move(P2, pt(300.0, 300.0)).is_empty());
    assert!(core.on_pointer_up(P2).is_empty());
    assert!(core.input.is_active());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
}

#[test]
fn add_commands_wait_for_the_drag_to_end() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(140.0, 110.0));
    assert!(core.execute(Command::AddBulb).is_empty());
    assert!(core.execute(Command::AddScore).is_empty());
    core.on_pointer_up(P1);
    assert_eq!(core.session.doc().bulbs.len(), 1);
    assert_eq!(core.session.undo_manager().history(), vec!["Move"]);

    core.execute(Command::Undo);
    assert_eq!(core.session.doc().bulbs.len(), 1);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
}

#[test]
fn aborted_drag_restores_geometry_and_records_nothing() {
    let mut core = core_with_bulbs(&[(1, 100, 100), (2, 300, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    core.session.select(EntityRef::bulb(2), true);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(150.0, 130.0));
    assert_eq!(bounds_of(&core, EntityRef::bulb(2)), Some(Bounds::new(340, 120, 50, 50)));

    core.abort_gesture();
    assert!(!core.input.is_active());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
    assert_eq!(bounds_of(&core, EntityRef::bulb(2)), Some(Bounds::new(300, 100, 50, 50)));

    core.on_pointer_move(P1, pt(200.0, 200.0));
    core.on_pointer_up(P1);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
    assert!(!core.session.undo_manager().can_undo());
    assert!(!core.session.is_dirty());
}

#[test]
fn commands_need_an_open_document() {
    let mut core = EngineCore::new();
    assert!(core.execute(Command::AddBulb).is_empty());
    assert!(core.execute(Command::EnterClickMode(ClickMode::GrillHeight)).is_empty());
    assert!(core.session.doc().bulbs.is_empty());
    assert_eq!(core.ui.click_mode, ClickMode::None);
}

#[test]
fn pointer_leave_commits_the_drag() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(140.0, 110.0));
    core.on_pointer_leave(P1);
    assert!(!core.input.is_active());
    assert!(core.session.undo_manager().can_undo());
}

#[test]
fn pointer_cancel_commits_the_drag() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(140.0, 110.0));
    core.on_pointer_cancel(P1);
    assert_eq!(core.session.undo_manager().depth(), 1);
}

#[test]
fn pointer_down_without_file_does_nothing() {
    let mut core = EngineCore::new();
    core.on_pointer_down(P1, pt(10.0, 10.0), Button::Primary, no_modifiers());
    assert!(!core.input.is_active());
}

// =============================================================
// Panning / zoom
// =============================================================

#[test]
fn middle_drag_pans() {
    let mut core = core_with_bulbs(&[]);
    let actions = core.on_pointer_down(P1, pt(0.0, 0.0), Button::Middle, no_modifiers());
    assert!(has_action(&actions, |a| *a == Action::SetCursor(Cursor::Grabbing)));
    core.on_pointer_move(P1, pt(50.0, 20.0));
    core.on_pointer_up(P1);
    assert_eq!((core.camera.pan_x, core.camera.pan_y), (50.0, 20.0));
}

#[test]
fn alt_primary_pans_over_entities() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, Modifiers { alt: true, ..Modifiers::default() });
    core.on_pointer_move(P1, pt(120.0, 110.0));
    core.on_pointer_up(P1);
    assert_eq!(core.camera.pan_x, 10.0);
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(100, 100, 50, 50)));
}

#[test]
fn wheel_zooms_around_pointer() {
    let mut core = core_with_bulbs(&[]);
    let anchor = pt(400.0, 300.0);
    let before = core.world_at(anchor);
    let actions = core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -120.0 });
    assert!(has_action(&actions, |a| *a == Action::RenderNeeded));
    assert!((core.camera.zoom - 1.1).abs() < 1e-9);
    let after = core.world_at(anchor);
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);

    core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: 120.0 });
    assert!((core.camera.zoom - 0.99).abs() < 1e-9);
}

#[test]
fn horizontal_only_wheel_is_ignored() {
    let mut core = core_with_bulbs(&[]);
    assert!(core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 30.0, dy: 0.0 }).is_empty());
    assert_eq!(core.camera.zoom, 1.0);
}

#[test]
fn zoom_to_fit_uses_image_size() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1520, 1120);
    core.execute(Command::ZoomToFit);
    assert!((core.camera.zoom - 0.5).abs() < 1e-9);
    assert!((core.camera.pan_x - 20.0).abs() < 1e-9);
}

#[test]
fn reset_zoom_centres_content() {
    let mut core = core_with_bulbs(&[]);
    core.camera.zoom = 3.0;
    core.execute(Command::ResetZoom);
    assert_eq!(core.camera.zoom, 1.0);
    assert_eq!((core.camera.pan_x, core.camera.pan_y), (0.0, 0.0));
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn delete_key_removes_selection_and_undo_restores() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    core.on_key_down(&key("Delete"), no_modifiers());
    assert!(core.session.doc().bulbs.is_empty());

    core.on_key_down(&key("z"), ctrl());
    assert_eq!(core.session.doc().bulbs.len(), 1);

    core.on_key_down(&key("Z"), Modifiers { shift: true, ..ctrl() });
    assert!(core.session.doc().bulbs.is_empty());
}

#[test]
fn arrows_nudge_selection() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    core.on_key_down(&key("ArrowRight"), no_modifiers());
    core.on_key_down(&key("ArrowDown"), shift());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(101, 110, 50, 50)));
    assert_eq!(core.session.undo_manager().depth(), 2);
}

#[test]
fn ctrl_a_selects_active_surface_only() {
    let mut doc = Document::new();
    doc.bulbs.push(bulb_at(1, 0, 0));
    let mut dmd_bulb = bulb_at(2, 0, 0);
    dmd_bulb.parent = Surface::Dmd;
    doc.bulbs.push(dmd_bulb);
    let mut core = core_with(doc);
    core.on_key_down(&key("a"), ctrl());
    assert_eq!(core.session.selection().bulbs(), &[1]);
}

#[test]
fn undo_key_is_ignored_during_gesture() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    drag(&mut core, (110.0, 110.0), (140.0, 110.0));
    core.on_pointer_down(P1, pt(140.0, 110.0), Button::Primary, no_modifiers());
    core.on_key_down(&key("z"), ctrl());
    assert!(core.session.undo_manager().can_undo());
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(130, 100, 50, 50)));
}

#[test]
fn escape_clears_selection_when_no_click_mode() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.session.select(EntityRef::bulb(1), false);
    core.on_key_down(&key("Escape"), no_modifiers());
    assert!(core.session.selection().is_empty());
}

#[test]
fn unbound_key_does_nothing() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    assert!(core.on_key_down(&key("q"), no_modifiers()).is_empty());
}

// =============================================================
// Click modes
// =============================================================

#[test]
fn grill_click_sets_height_from_bottom() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    let actions = click(&mut core, 500.0, 700.0);

    assert_eq!(core.session.doc().grill.grill_height, 100);
    assert_eq!(core.ui.click_mode, ClickMode::None);
    assert!(has_action(&actions, |a| *a == Action::ClickModeChanged(ClickMode::None)));
    assert_eq!(core.session.undo_manager().undo_description(), Some("Set grill height"));
}

#[test]
fn small_grill_click_sets_small_height() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    core.execute(Command::EnterClickMode(ClickMode::SmallGrillHeight));
    click(&mut core, 500.0, 760.4);
    assert_eq!(core.session.doc().grill.small_grill_height, 40);
    assert_eq!(core.session.doc().grill.grill_height, 0);
}

#[test]
fn grill_remove_box_clears_height() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    click(&mut core, 500.0, 700.0);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    // Box sits 15 px in from the right edge and 15 px above the line at y = 700.
    click(&mut core, 990.0, 690.0);
    assert_eq!(core.session.doc().grill.grill_height, 0);
    assert_eq!(core.session.undo_manager().undo_description(), Some("Remove grill height"));
}

#[test]
fn grill_click_below_image_is_ignored() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    click(&mut core, 500.0, 900.0);
    assert_eq!(core.session.doc().grill.grill_height, 0);
    assert_eq!(core.ui.click_mode, ClickMode::GrillHeight);
}

#[test]
fn entering_click_mode_switches_to_backglass() {
    let mut core = core_with_bulbs(&[]);
    core.execute(Command::ShowSurface(Surface::Dmd));
    let actions = core.execute(Command::EnterClickMode(ClickMode::DmdDefaultLocation));
    assert_eq!(core.ui.surface, Surface::Backglass);
    assert!(has_action(&actions, |a| *a == Action::SetCursor(Cursor::Crosshair)));
}

#[test]
fn dmd_location_click_rounds_and_exits() {
    let mut core = core_with_bulbs(&[]);
    core.execute(Command::EnterClickMode(ClickMode::DmdDefaultLocation));
    click(&mut core, 40.4, 30.6);
    assert_eq!((core.session.doc().dmd_area.default_x, core.session.doc().dmd_area.default_y), (40, 31));
    assert_eq!(core.ui.click_mode, ClickMode::None);
}

#[test]
fn dmd_location_remove_box_clears_location() {
    let mut core = core_with_bulbs(&[]);
    core.set_image_size(Surface::Dmd, Some((128, 32)));
    core.execute(Command::EnterClickMode(ClickMode::DmdDefaultLocation));
    click(&mut core, 40.0, 30.0);
    core.execute(Command::EnterClickMode(ClickMode::DmdDefaultLocation));
    // Remove box starts 5 px right of the DMD rectangle.
    click(&mut core, 40.0 + 128.0 + 8.0, 34.0);
    assert!(!core.session.doc().dmd_area.has_default_location());
}

#[test]
fn escape_cancels_click_mode_without_transaction() {
    let mut core = core_with_bulbs(&[]);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    let actions = core.on_key_down(&key("Escape"), no_modifiers());
    assert_eq!(core.ui.click_mode, ClickMode::None);
    assert!(has_action(&actions, |a| *a == Action::ClickModeChanged(ClickMode::None)));
    assert!(!core.session.undo_manager().can_undo());
}

#[test]
fn hover_in_grill_mode_tracks_pointer() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    let actions = core.on_pointer_move(P1, pt(300.0, 650.0));
    assert_eq!(core.ui.hover_world, Some(pt(300.0, 650.0)));
    assert!(has_action(&actions, |a| *a == Action::StatusCoords { x: 300, y: 650 }));
}

// =============================================================
// DMD copy area
// =============================================================

fn copy_area_core() -> EngineCore {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1200, 900);
    core.execute(Command::EnterClickMode(ClickMode::DmdCopyArea));
    core
}

#[test]
fn entering_copy_mode_initialises_area() {
    let core = copy_area_core();
    assert_eq!(core.session.doc().dmd_area.copy_bounds(), Bounds::new(400, 675, 400, 150));
}

#[test]
fn copy_area_body_drag_moves_area() {
    let mut core = copy_area_core();
    drag(&mut core, (500.0, 700.0), (520.0, 710.0));
    assert_eq!(core.session.doc().dmd_area.copy_bounds(), Bounds::new(420, 685, 400, 150));
    assert_eq!(core.session.undo_manager().undo_description(), Some("Move DMD copy area"));
    assert_eq!(core.ui.click_mode, ClickMode::DmdCopyArea);
}

#[test]
fn copy_area_handle_drag_resizes_anchored() {
    let mut core = copy_area_core();
    // Drag the west edge far past the east edge: width clamps, east edge stays.
    drag(&mut core, (400.0, 750.0), (900.0, 750.0));
    let b = core.session.doc().dmd_area.copy_bounds();
    assert_eq!((b.x, b.width), (790, 10));
    assert_eq!(core.session.undo_manager().undo_description(), Some("Resize DMD copy area"));
}

#[test]
fn escape_during_copy_area_drag_records_nothing() {
    let mut core = copy_area_core();
    let depth = core.session.undo_manager().depth();
    core.on_pointer_down(P1, pt(500.0, 700.0), Button::Primary, no_modifiers());
    core.on_pointer_move(P1, pt(520.0, 710.0));
    core.on_key_down(&key("Escape"), no_modifiers());

    assert_eq!(core.ui.click_mode, ClickMode::None);
    assert!(!core.input.is_active());
    assert_eq!(core.session.doc().dmd_area.copy_bounds(), Bounds::new(400, 675, 400, 150));
    core.on_pointer_up(P1);
    assert_eq!(core.session.undo_manager().depth(), depth);
}

#[test]
fn camera_icon_requests_copy_and_exits_mode() {
    let mut core = copy_area_core();
    let actions = click(&mut core, 785.0, 685.0);
    let op = actions.iter().find_map(|a| match a {
        Action::ImageOpRequested(op) => Some(op.clone()),
        _ => None,
    });
    let Some(op) = op else { panic!("no image op requested: {actions:?}") };
    assert_eq!(op.request, ImageOpRequest::CopyDmdFromBackglass);
    assert_eq!(op.crop, Some(Bounds::new(400, 675, 400, 150)));
    assert_eq!(core.ui.click_mode, ClickMode::None);
    assert!(core.session.is_busy());

    let output = ImageOpOutput { data: "RE1E".into(), width: 400, height: 150 };
    assert!(core.complete_image_op(&op, Ok(output)).is_ok());
    assert!(!core.session.is_busy());
    assert_eq!(core.image_size(Surface::Dmd), Some((400, 150)));
    assert_eq!(core.session.undo_manager().undo_description(), Some("Copy DMD from backglass"));
}

// =============================================================
// Image operations
// =============================================================

#[test]
fn resize_command_round_trip_updates_image_size() {
    let mut core = with_backglass_image(core_with_bulbs(&[(1, 100, 100)]), 1000, 800);
    let actions = core.execute(Command::ResizeImage { width: 500, height: 400 });
    let Some(Action::ImageOpRequested(op)) = actions.into_iter().find(|a| matches!(a, Action::ImageOpRequested(_))) else {
        panic!("resize was not requested");
    };

    let output = ImageOpOutput { data: "U01BTEw=".into(), width: 500, height: 400 };
    assert!(core.complete_image_op(&op, Ok(output)).is_ok());
    assert_eq!(core.image_size(Surface::Backglass), Some((500, 400)));
    assert_eq!(bounds_of(&core, EntityRef::bulb(1)), Some(Bounds::new(50, 50, 25, 25)));
}

#[test]
fn failed_image_op_keeps_image_size() {
    let mut core = with_backglass_image(core_with_bulbs(&[]), 1000, 800);
    let actions = core.execute(Command::AdjustBrightness { amount: 20, ignore_grill: false });
    let Some(Action::ImageOpRequested(op)) = actions.into_iter().find(|a| matches!(a, Action::ImageOpRequested(_))) else {
        panic!("brightness was not requested");
    };
    assert!(core.complete_image_op(&op, Err(ImageOpError::Failed("decoder crashed".into()))).is_ok());
    assert_eq!(core.image_size(Surface::Backglass), Some((1000, 800)));
    assert!(!core.session.undo_manager().can_undo());
}

#[test]
fn resize_without_image_warns_in_console() {
    let mut core = core_with_bulbs(&[]);
    let actions = core.execute(Command::ResizeImage { width: 10, height: 10 });
    assert!(!has_action(&actions, |a| matches!(a, Action::ImageOpRequested(_))));
    assert!(core.session.console.last().is_some_and(|l| l.text.contains("backglass")));
}

#[test]
fn busy_session_only_allows_panning() {
    let mut core = with_backglass_image(core_with_bulbs(&[(1, 100, 100)]), 1000, 800);
    core.execute(Command::AdjustBrightness { amount: 20, ignore_grill: false });
    assert!(core.session.is_busy());

    click(&mut core, 110.0, 110.0);
    assert!(core.session.selection().is_empty());

    core.on_pointer_down(P1, pt(0.0, 0.0), Button::Middle, no_modifiers());
    assert!(matches!(core.input, InputState::Panning { .. }));
}

// =============================================================
// Commands / hover / render scheduling
// =============================================================

#[test]
fn add_bulb_command_shows_frames() {
    let mut core = core_with_bulbs(&[]);
    core.ui.view = ViewFlags::default();
    core.execute(Command::AddBulb);
    assert!(core.ui.view.show_illumination_frames);
    assert_eq!(core.session.doc().bulbs.len(), 1);
}

#[test]
fn show_surface_cancels_click_mode() {
    let mut core = core_with_bulbs(&[]);
    core.execute(Command::EnterClickMode(ClickMode::GrillHeight));
    core.execute(Command::ShowSurface(Surface::Dmd));
    assert_eq!(core.ui.surface, Surface::Dmd);
    assert_eq!(core.ui.click_mode, ClickMode::None);
}

#[test]
fn file_commands_are_not_handled_by_the_core() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    assert!(core.execute(Command::Close).is_empty());
    assert!(core.session.has_file());
}

#[test]
fn hover_over_entity_shows_pointer() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    let actions = core.on_pointer_move(P1, pt(110.0, 110.0));
    assert!(has_action(&actions, |a| *a == Action::SetCursor(Cursor::Pointer)));
    let again = core.on_pointer_move(P1, pt(112.0, 110.0));
    assert!(!has_action(&again, |a| matches!(a, Action::SetCursor(_))));
}

#[test]
fn menu_state_reflects_session() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    assert!(!core.menu_state().has_selection);
    core.session.select(EntityRef::bulb(1), false);
    let state = core.menu_state();
    assert!(state.has_file && state.has_selection && !state.can_undo);
}

#[test]
fn render_requests_are_coalesced() {
    let mut core = EngineCore::new();
    assert_eq!(core.request_render(), Some(Action::RenderNeeded));
    assert_eq!(core.request_render(), None);
    assert!(core.take_render_request());
    assert!(!core.take_render_request());
    assert_eq!(core.request_render(), Some(Action::RenderNeeded));
}

#[test]
fn drag_requests_a_single_render_per_frame() {
    let mut core = core_with_bulbs(&[(1, 100, 100)]);
    core.on_pointer_down(P1, pt(110.0, 110.0), Button::Primary, no_modifiers());
    core.take_render_request();
    let first = core.on_pointer_move(P1, pt(130.0, 110.0));
    let second = core.on_pointer_move(P1, pt(140.0, 110.0));
    assert!(has_action(&first, |a| *a == Action::RenderNeeded));
    assert!(!has_action(&second, |a| *a == Action::RenderNeeded));
}
