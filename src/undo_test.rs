use super::*;
use crate::doc::{Animation, AnimationStep, BackgroundImage, Color, NamedImage};

// =============================================================
// Helpers
// =============================================================

fn doc_with_bulbs(ids: &[u32]) -> Document {
    let mut doc = Document::new();
    for &id in ids {
        doc.bulbs.push(Bulb::new(id));
    }
    doc
}

/// Run one committed transaction that moves bulb `id` by `dx`.
fn move_bulb(undo: &mut UndoManager, doc: &mut Document, id: u32, dx: i32) {
    undo.begin("Move bulb");
    undo.mark_for_change(doc, &EntityKey::Bulb(id));
    if let Some(b) = doc.bulb_mut(id) {
        b.loc_x += dx;
    }
    assert_eq!(undo.end(doc), Commit::Recorded);
}

// =============================================================
// Transactions
// =============================================================

#[test]
fn empty_transaction_leaves_history_unchanged() {
    let doc = Document::new();
    let mut undo = UndoManager::new();
    undo.begin("Nothing");
    assert_eq!(undo.end(&doc), Commit::Discarded);
    assert_eq!(undo.depth(), 0);
    assert!(!undo.can_undo());
}

#[test]
fn marked_but_unchanged_transaction_is_discarded() {
    let doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    undo.begin("Touch");
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    undo.mark_section(&doc, Section::GrillHeights);
    assert_eq!(undo.end(&doc), Commit::Discarded);
    assert_eq!(undo.depth(), 0);
}

#[test]
fn net_diff_keeps_only_changed_entities() {
    let mut doc = doc_with_bulbs(&[1, 2]);
    let mut undo = UndoManager::new();
    undo.begin("Move one");
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    undo.mark_for_change(&doc, &EntityKey::Bulb(2));
    doc.bulbs[0].loc_x = 5;
    undo.end(&doc);
    let record = undo.last_record().map(UndoRecord::len);
    assert_eq!(record, Some(1));
}

#[test]
fn mark_is_idempotent_and_keeps_first_state() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    undo.begin("Drag");
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    doc.bulbs[0].loc_x = 150;
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    doc.bulbs[0].loc_x = 175;

    let before_x = undo.pending().and_then(|r| r.bulb(1)).and_then(|s| s.before.as_ref()).map(|b| b.loc_x);
    assert_eq!(before_x, Some(100));

    undo.end(&doc);
    undo.undo(&mut doc);
    assert_eq!(doc.bulbs[0].loc_x, 100);
}

#[test]
fn nested_transactions_collapse_into_one() {
    let mut doc = doc_with_bulbs(&[1, 2]);
    let mut undo = UndoManager::new();
    undo.begin("Outer");
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    doc.bulbs[0].loc_x = 1;

    undo.begin("Inner");
    undo.mark_for_change(&doc, &EntityKey::Bulb(2));
    doc.bulbs[1].loc_x = 2;
    assert_eq!(undo.end(&doc), Commit::Nested);
    assert!(undo.is_open());

    assert_eq!(undo.end(&doc), Commit::Recorded);
    assert_eq!(undo.depth(), 1);
    assert_eq!(undo.undo_description(), Some("Outer"));

    undo.undo(&mut doc);
    assert_eq!(doc.bulbs[0].loc_x, 100);
    assert_eq!(doc.bulbs[1].loc_x, 100);
}

#[test]
fn end_without_begin_is_reported_and_harmless() {
    let doc = Document::new();
    let mut undo = UndoManager::new();
    assert_eq!(undo.end(&doc), Commit::Unbalanced);
    assert!(!undo.is_open());
    assert_eq!(undo.depth(), 0);
}

#[test]
fn marks_outside_a_transaction_are_ignored() {
    let doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    undo.mark_section(&doc, Section::Images);
    assert!(undo.pending().is_none());
}

#[test]
fn cancel_drops_the_open_transaction_at_any_depth() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    undo.begin("Outer");
    undo.begin("Inner");
    undo.mark_for_change(&doc, &EntityKey::Bulb(1));
    doc.bulbs[0].loc_x = 3;
    undo.cancel();
    assert!(!undo.is_open());
    assert_eq!(undo.end(&doc), Commit::Unbalanced);
    assert_eq!(undo.depth(), 0);
}

#[test]
fn undo_is_refused_while_open() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    move_bulb(&mut undo, &mut doc, 1, 10);
    undo.begin("Open");
    assert_eq!(undo.undo(&mut doc), None);
    assert_eq!(doc.bulbs[0].loc_x, 110);
}

// =============================================================
// Create / delete
// =============================================================

#[test]
fn undo_of_create_removes_and_redo_restores() {
    let mut doc = Document::new();
    let mut undo = UndoManager::new();
    undo.begin("Add bulb");
    undo.mark_for_create(&EntityKey::Bulb(1));
    doc.bulbs.push(Bulb::new(1));
    undo.end(&doc);

    assert_eq!(undo.undo(&mut doc).as_deref(), Some("Add bulb"));
    assert!(doc.bulbs.is_empty());
    assert_eq!(undo.redo(&mut doc).as_deref(), Some("Add bulb"));
    assert_eq!(doc.bulbs, vec![Bulb::new(1)]);
}

#[test]
fn undo_of_delete_restores_identical_entity_in_place() {
    let mut doc = doc_with_bulbs(&[1, 5, 9]);
    doc.bulbs[1].name = "Flasher1".into();
    doc.bulbs[1].light_color = Color::rgba(255, 0, 0, 255);
    let original = doc.clone();

    let mut undo = UndoManager::new();
    undo.begin("Delete");
    undo.mark_for_delete(&doc, &EntityKey::Bulb(5));
    doc.bulbs.retain(|b| b.id != 5);
    undo.end(&doc);

    undo.undo(&mut doc);
    assert_eq!(doc, original);
}

#[test]
fn create_then_delete_in_one_transaction_is_a_no_op() {
    let mut doc = Document::new();
    let mut undo = UndoManager::new();
    undo.begin("Transient");
    undo.mark_for_create(&EntityKey::Score(1));
    doc.scores.push(ScoreDisplay::new(1, Surface::Backglass));
    undo.mark_for_delete(&doc, &EntityKey::Score(1));
    doc.scores.clear();
    assert_eq!(undo.end(&doc), Commit::Discarded);
}

#[test]
fn missing_entities_are_skipped_silently() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    move_bulb(&mut undo, &mut doc, 1, 10);
    doc.bulbs.clear();
    // Replaying onto a document that lost the entity re-inserts it.
    undo.undo(&mut doc);
    assert_eq!(doc.bulbs.len(), 1);
    // Redo of a delete whose target is already gone does nothing.
    let mut other = Document::new();
    let mut u2 = UndoManager::new();
    other.bulbs.push(Bulb::new(4));
    u2.begin("Delete");
    u2.mark_for_delete(&other, &EntityKey::Bulb(4));
    other.bulbs.clear();
    u2.end(&other);
    u2.undo(&mut other);
    other.bulbs.clear();
    assert_eq!(u2.redo(&mut other).as_deref(), Some("Delete"));
    assert!(other.bulbs.is_empty());
}

// =============================================================
// Round trip across every kind
// =============================================================

#[test]
fn undo_all_then_redo_all_restores_final_state() {
    let mut doc = Document::new();
    let mut undo = UndoManager::new();

    undo.begin("Add bulb");
    undo.mark_for_create(&EntityKey::Bulb(1));
    doc.bulbs.push(Bulb::new(1));
    undo.end(&doc);

    undo.begin("Add score");
    undo.mark_for_create(&EntityKey::Score(1));
    doc.scores.push(ScoreDisplay::new(1, Surface::Dmd));
    undo.end(&doc);

    undo.begin("Add animation");
    undo.mark_for_create(&EntityKey::Animation("Attract".into()));
    let mut anim = Animation::new("Attract");
    anim.steps.push(AnimationStep { step: 1, on: "1".into(), ..AnimationStep::default() });
    doc.animations.push(anim);
    undo.end(&doc);

    undo.begin("Import image");
    undo.mark_section(&doc, Section::Images);
    doc.images.background = Some(BackgroundImage::main("bg.png", "AAAA"));
    doc.images.illuminated.push(NamedImage::new("lit.png", "BBBB"));
    undo.end(&doc);

    undo.begin("Grill");
    undo.mark_section(&doc, Section::GrillHeights);
    doc.grill.grill_height = 120;
    undo.end(&doc);

    undo.begin("DMD area");
    undo.mark_section(&doc, Section::DmdArea);
    doc.dmd_area.default_x = 30;
    doc.dmd_area.copy_width = 64;
    undo.end(&doc);

    undo.begin("Info");
    undo.mark_section(&doc, Section::Info);
    doc.info.name = "Medieval Madness".into();
    undo.end(&doc);

    move_bulb(&mut undo, &mut doc, 1, 20);

    let final_state = doc.clone();
    let n = undo.depth();
    assert_eq!(n, 8);

    for _ in 0..n {
        assert!(undo.undo(&mut doc).is_some());
    }
    assert!(doc.bulbs.is_empty());
    assert!(doc.scores.is_empty());
    assert!(doc.animations.is_empty());
    assert_eq!(doc.images, ImageCollection::default());
    assert_eq!(doc.grill, GrillHeights::default());
    assert_eq!(doc.dmd_area, DmdArea::default());
    assert!(doc.info.name.is_empty());

    for _ in 0..n {
        assert!(undo.redo(&mut doc).is_some());
    }
    assert_eq!(doc, final_state);
    assert!(!undo.can_redo());
}

#[test]
fn new_commit_clears_redo() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    move_bulb(&mut undo, &mut doc, 1, 10);
    undo.undo(&mut doc);
    assert!(undo.can_redo());
    move_bulb(&mut undo, &mut doc, 1, 5);
    assert!(!undo.can_redo());
    assert_eq!(undo.history(), vec!["Move bulb"]);
}

// =============================================================
// Cap and save point
// =============================================================

#[test]
fn stack_is_capped_and_oldest_dropped() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    for _ in 0..(MAX_UNDO_STACK + 5) {
        move_bulb(&mut undo, &mut doc, 1, 1);
    }
    assert_eq!(undo.depth(), MAX_UNDO_STACK);
    while undo.undo(&mut doc).is_some() {}
    // The five oldest moves can no longer be undone.
    assert_eq!(doc.bulbs[0].loc_x, 105);
}

#[test]
fn save_point_tracks_undo_and_redo() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    assert!(undo.is_at_save_point());
    move_bulb(&mut undo, &mut doc, 1, 1);
    assert!(!undo.is_at_save_point());
    undo.set_save_point();
    assert!(undo.is_at_save_point());
    undo.undo(&mut doc);
    assert!(!undo.is_at_save_point());
    undo.redo(&mut doc);
    assert!(undo.is_at_save_point());
}

#[test]
fn save_point_shifts_when_oldest_dropped() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    for _ in 0..MAX_UNDO_STACK {
        move_bulb(&mut undo, &mut doc, 1, 1);
    }
    undo.set_save_point();
    move_bulb(&mut undo, &mut doc, 1, 1);
    assert_eq!(undo.depth(), MAX_UNDO_STACK);
    assert!(!undo.is_at_save_point());
    undo.undo(&mut doc);
    assert!(undo.is_at_save_point());
}

#[test]
fn save_point_dropped_off_the_bottom_is_unreachable() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    for _ in 0..=MAX_UNDO_STACK {
        move_bulb(&mut undo, &mut doc, 1, 1);
    }
    while undo.undo(&mut doc).is_some() {}
    assert!(!undo.is_at_save_point());
}

#[test]
fn save_point_on_discarded_redo_branch_is_unreachable() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    move_bulb(&mut undo, &mut doc, 1, 1);
    move_bulb(&mut undo, &mut doc, 1, 1);
    undo.set_save_point();
    undo.undo(&mut doc);
    undo.undo(&mut doc);
    move_bulb(&mut undo, &mut doc, 1, 7);
    move_bulb(&mut undo, &mut doc, 1, 7);
    assert_eq!(undo.depth(), 2);
    assert!(!undo.is_at_save_point());
}

#[test]
fn clear_resets_history_and_save_point() {
    let mut doc = doc_with_bulbs(&[1]);
    let mut undo = UndoManager::new();
    move_bulb(&mut undo, &mut doc, 1, 1);
    undo.clear();
    assert!(!undo.can_undo());
    assert!(undo.is_at_save_point());
}

#[test]
fn mark_all_bulbs_filters_by_surface() {
    let mut doc = doc_with_bulbs(&[1, 2]);
    doc.bulbs[1].parent = Surface::Dmd;
    let mut undo = UndoManager::new();
    undo.begin("Rescale");
    undo.mark_all_bulbs(&doc, Some(Surface::Dmd));
    let pending = undo.pending();
    assert!(pending.and_then(|r| r.bulb(2)).is_some());
    assert!(pending.and_then(|r| r.bulb(1)).is_none());
    undo.cancel();
}
