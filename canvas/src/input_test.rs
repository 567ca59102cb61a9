#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Point
// =============================================================

#[test]
fn point_subtraction() {
    assert_eq!(Point::new(5.0, 7.0) - Point::new(2.0, 3.0), Point::new(3.0, 4.0));
}

#[test]
fn point_distance_is_euclidean() {
    assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
}

// =============================================================
// Pointer
// =============================================================

#[test]
fn pointer_at_has_no_movement() {
    let pointer = Pointer::at(4.0, 5.0);
    assert_eq!(pointer.position, Point::new(4.0, 5.0));
    assert_eq!(pointer.movement, Point::default());
}

#[test]
fn pointer_moved_carries_delta() {
    let pointer = Pointer::moved(4.0, 5.0, -1.0, 2.0);
    assert_eq!(pointer.movement, Point::new(-1.0, 2.0));
}

// =============================================================
// Handle
// =============================================================

#[test]
fn handle_accepts_unit_components() {
    for dx in -1..=1 {
        for dy in -1..=1 {
            let handle = Handle::new(dx, dy);
            assert_eq!(handle.is_some(), (dx, dy) != (0, 0), "dx={dx} dy={dy}");
        }
    }
}

#[test]
fn handle_rejects_out_of_range() {
    assert!(Handle::new(2, 0).is_none());
    assert!(Handle::new(0, -3).is_none());
}

#[test]
fn handle_constants_match_new() {
    assert_eq!(Handle::new(1, 1), Some(Handle::SE));
    assert_eq!(Handle::new(-1, -1), Some(Handle::NW));
    assert_eq!(Handle::new(1, 0), Some(Handle::E));
}

#[test]
fn handle_cursors() {
    assert_eq!(Handle::SE.cursor(), "nwse-resize");
    assert_eq!(Handle::NW.cursor(), "nwse-resize");
    assert_eq!(Handle::NE.cursor(), "nesw-resize");
    assert_eq!(Handle::E.cursor(), "ew-resize");
    assert_eq!(Handle::new(0, 1).map(Handle::cursor), Some("ns-resize"));
}

// =============================================================
// Target / Gesture
// =============================================================

#[test]
fn target_id_for_both_variants() {
    let id = ShapeId::from("s");
    assert_eq!(Target::Body(id.clone()).id(), &id);
    assert_eq!(Target::Handle(id.clone(), Handle::SE).id(), &id);
}

#[test]
fn gesture_default_is_idle() {
    assert_eq!(Gesture::default(), Gesture::Idle);
}
