//! Rendering: stateless projection of the store into drawable primitives.
//!
//! The host's drawing surface (SVG DOM, canvas 2D, a terminal) consumes
//! [`Primitive`]s; nothing here mutates application state. The same
//! projection backs [`crate::svg::to_svg`], so what is saved is what is drawn.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::consts::{HANDLE_FILL, HANDLE_RADIUS};
use crate::doc::{Geometry, ShapeId, ShapeStore};
use crate::hit::handle_positions;
use crate::input::Handle;

/// One drawable element.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A circle shape.
    Circle { id: ShapeId, cx: f64, cy: f64, r: f64, fill: String },
    /// A rectangle shape.
    Rect { id: ShapeId, x: f64, y: f64, width: f64, height: f64, fill: String },
    /// A resize handle belonging to shape `id`.
    Handle { id: ShapeId, handle: Handle, cx: f64, cy: f64, r: f64, fill: &'static str },
}

/// Project every shape, in draw order. With `with_handles`, each shape is
/// followed by its resize handles so they draw on top of it.
#[must_use]
pub fn primitives(store: &ShapeStore, with_handles: bool) -> Vec<Primitive> {
    let mut out = Vec::with_capacity(store.len() * if with_handles { 5 } else { 1 });

    for shape in store.all() {
        out.push(match shape.geometry {
            Geometry::Circle { r } => Primitive::Circle {
                id: shape.id.clone(),
                cx: shape.x,
                cy: shape.y,
                r,
                fill: shape.fill.clone(),
            },
            Geometry::Rectangle { width, height } => Primitive::Rect {
                id: shape.id.clone(),
                x: shape.x,
                y: shape.y,
                width,
                height,
                fill: shape.fill.clone(),
            },
        });

        if with_handles {
            out.extend(handle_positions(shape).into_iter().map(|(handle, at)| Primitive::Handle {
                id: shape.id.clone(),
                handle,
                cx: at.x,
                cy: at.y,
                r: HANDLE_RADIUS,
                fill: HANDLE_FILL,
            }));
        }
    }

    out
}
