//! Input model: points, pointer events, resize handles, and gesture states.
//!
//! This module defines the types consumed by the gesture controller. A
//! `Pointer` is one pointer event as the host saw it. A `Target` says what the
//! pointer went down on. `Gesture` is the transient per-shape interaction
//! state tracked between pointer-down and pointer-up; it lives in the
//! controller, never on the stored shapes.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::ops::Sub;

use crate::doc::ShapeId;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    /// Absolute pointer position.
    pub position: Point,
    /// Movement since the previous pointer event (the browser's `movementX/Y`).
    pub movement: Point,
}

impl Pointer {
    /// A pointer event with no movement, e.g. a pointer-down.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { position: Point::new(x, y), movement: Point::default() }
    }

    /// A pointer-move event at `(x, y)` that travelled `(dx, dy)`.
    #[must_use]
    pub fn moved(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { position: Point::new(x, y), movement: Point::new(dx, dy) }
    }
}

/// Direction of a resize handle. Each component is -1, 0 or 1 and at least
/// one is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    dx: i8,
    dy: i8,
}

impl Handle {
    /// Bottom-right corner.
    pub const SE: Handle = Handle { dx: 1, dy: 1 };
    /// Top-right corner.
    pub const NE: Handle = Handle { dx: 1, dy: -1 };
    /// Bottom-left corner.
    pub const SW: Handle = Handle { dx: -1, dy: 1 };
    /// Top-left corner.
    pub const NW: Handle = Handle { dx: -1, dy: -1 };
    /// Right edge; the only handle a circle has.
    pub const E: Handle = Handle { dx: 1, dy: 0 };

    /// The four rectangle corner handles.
    pub const CORNERS: [Handle; 4] = [Self::SE, Self::NE, Self::SW, Self::NW];

    /// Build a handle, rejecting components outside `-1..=1` and the zero handle.
    #[must_use]
    pub fn new(dx: i8, dy: i8) -> Option<Self> {
        let valid = (-1..=1).contains(&dx) && (-1..=1).contains(&dy) && (dx, dy) != (0, 0);
        valid.then_some(Self { dx, dy })
    }

    #[must_use]
    pub fn dx(self) -> i8 {
        self.dx
    }

    #[must_use]
    pub fn dy(self) -> i8 {
        self.dy
    }

    /// CSS cursor name for this handle's direction.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match (self.dx, self.dy) {
            (0, _) => "ns-resize",
            (_, 0) => "ew-resize",
            (dx, dy) if dx == dy => "nwse-resize",
            _ => "nesw-resize",
        }
    }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The body of a shape: starts a drag.
    Body(ShapeId),
    /// One of a shape's resize handles: starts a resize.
    Handle(ShapeId, Handle),
}

impl Target {
    /// The shape this target belongs to.
    #[must_use]
    pub fn id(&self) -> &ShapeId {
        match self {
            Self::Body(id) | Self::Handle(id, _) => id,
        }
    }
}

/// Transient interaction state of one shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// Not being interacted with.
    #[default]
    Idle,
    /// Being moved. `offset` is pointer minus shape origin at grab time.
    Dragging { offset: Point },
    /// Being resized from `handle`.
    Resizing { handle: Handle },
}
