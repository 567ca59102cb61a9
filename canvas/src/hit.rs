//! Hit-testing: which shape part lies under a point.
//!
//! Handles are tested before bodies so a press on a handle never also starts
//! a drag of the shape underneath. Within each pass, shapes are tested
//! top-most first (reverse draw order).

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_RADIUS;
use crate::doc::{Geometry, Shape, ShapeStore};
use crate::input::{Handle, Point, Target};

/// Resize handles of a shape with their canvas positions.
///
/// Rectangles get one handle per corner. Circles get a single `E` handle on
/// the rightmost point of the rim.
#[must_use]
pub fn handle_positions(shape: &Shape) -> Vec<(Handle, Point)> {
    match shape.geometry {
        Geometry::Circle { r } => vec![(Handle::E, Point::new(shape.x + r, shape.y))],
        Geometry::Rectangle { width, height } => Handle::CORNERS
            .iter()
            .map(|&handle| {
                let x = shape.x + width * f64::from(handle.dx() + 1) / 2.0;
                let y = shape.y + height * f64::from(handle.dy() + 1) / 2.0;
                (handle, Point::new(x, y))
            })
            .collect(),
    }
}

/// Whether `point` is inside the shape's body (edges inclusive).
#[must_use]
pub fn body_contains(shape: &Shape, point: Point) -> bool {
    match shape.geometry {
        Geometry::Circle { r } => point.distance_to(Point::new(shape.x, shape.y)) <= r,
        Geometry::Rectangle { width, height } => {
            point.x >= shape.x && point.x <= shape.x + width && point.y >= shape.y && point.y <= shape.y + height
        }
    }
}

/// Find the target under `point`, if any.
#[must_use]
pub fn hit_test(store: &ShapeStore, point: Point) -> Option<Target> {
    let shapes = store.all();

    let handle_hit = shapes.iter().rev().find_map(|shape| {
        handle_positions(shape)
            .into_iter()
            .find(|(_, at)| at.distance_to(point) <= HANDLE_RADIUS)
            .map(|(handle, _)| Target::Handle(shape.id.clone(), handle))
    });
    if handle_hit.is_some() {
        return handle_hit;
    }

    shapes
        .iter()
        .rev()
        .find(|shape| body_contains(shape, point))
        .map(|shape| Target::Body(shape.id.clone()))
}
