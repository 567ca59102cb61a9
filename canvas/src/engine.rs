//! Gesture controller: turns pointer events into shape mutations.
//!
//! DESIGN
//! ======
//! `Controller` owns the only copy of gesture state. Stored shapes never
//! carry drag or resize flags; the controller keeps at most one
//! `(ShapeId, Gesture)` pair, which encodes the single-active-pointer rule in
//! the type. Every handler mutates the store through [`ShapeStore::update`]
//! and returns the [`Action`]s the host needs to redraw or sync.
//!
//! RESIZE SEMANTICS
//! ================
//! Rectangles resize from per-event movement deltas, so a resize never jumps
//! when the grab point is off the handle center. Circles default to radial
//! resize: the radius becomes the pointer's distance from the center. The two
//! models differ on purpose; [`CircleResize::Delta`] puts circles on the
//! rectangle model for hosts that want one behavior.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, warn};

use crate::doc::{Geometry, Shape, ShapeId, ShapePatch, ShapeStore};
use crate::input::{Gesture, Handle, Point, Pointer, Target};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A shape changed in the store; `patch` holds exactly the changed fields.
    ShapeUpdated { id: ShapeId, patch: ShapePatch },
    /// The host should switch the pointer cursor.
    SetCursor(&'static str),
    /// The host should redraw.
    RenderNeeded,
}

/// How pulling a circle's handle changes its radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircleResize {
    /// Radius is the distance from the center to the pointer.
    #[default]
    Radial,
    /// Radius grows by the pointer movement projected on the handle direction.
    Delta,
}

/// Tunables for [`Controller`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerConfig {
    pub circle_resize: CircleResize,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    id: ShapeId,
    gesture: Gesture,
}

/// Pointer gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    config: ControllerConfig,
    active: Option<ActiveGesture>,
}

impl Controller {
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self { config, active: None }
    }

    #[must_use]
    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Gesture state of `id`. Every shape but the active one is idle.
    #[must_use]
    pub fn gesture(&self, id: &ShapeId) -> Gesture {
        match &self.active {
            Some(active) if &active.id == id => active.gesture,
            _ => Gesture::Idle,
        }
    }

    /// The shape currently being dragged or resized.
    #[must_use]
    pub fn active_id(&self) -> Option<&ShapeId> {
        self.active.as_ref().map(|a| &a.id)
    }

    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    // --- Input events ---

    /// Start a drag (body target) or resize (handle target).
    ///
    /// Ignored while another gesture is active, and for ids not in the store.
    pub fn pointer_down(&mut self, store: &ShapeStore, target: &Target, pointer: Pointer) -> Vec<Action> {
        if let Some(active) = &self.active {
            debug!(active = %active.id, target = %target.id(), "pointer-down ignored during active gesture");
            return Vec::new();
        }
        let Some(shape) = store.get(target.id()) else {
            debug!(target = %target.id(), "pointer-down on unknown shape ignored");
            return Vec::new();
        };

        let (gesture, cursor) = match target {
            Target::Body(_) => {
                let offset = pointer.position - Point::new(shape.x, shape.y);
                (Gesture::Dragging { offset }, "grabbing")
            }
            Target::Handle(_, handle) => (Gesture::Resizing { handle: *handle }, handle.cursor()),
        };

        self.active = Some(ActiveGesture { id: shape.id.clone(), gesture });
        vec![Action::SetCursor(cursor)]
    }

    /// Advance the active gesture. No-op when idle.
    pub fn pointer_move(&mut self, store: &mut ShapeStore, pointer: Pointer) -> Vec<Action> {
        let Some(active) = &self.active else {
            return Vec::new();
        };
        let Some(shape) = store.get(&active.id) else {
            warn!(id = %active.id, "gesture target vanished; cancelling gesture");
            self.active = None;
            return vec![Action::SetCursor("default")];
        };

        let patch = match active.gesture {
            Gesture::Idle => return Vec::new(),
            Gesture::Dragging { offset } => {
                let origin = pointer.position - offset;
                ShapePatch::position(origin.x, origin.y)
            }
            Gesture::Resizing { handle } => self.resize_patch(shape, handle, pointer),
        };

        let id = active.id.clone();
        store.update(&id, &patch);
        vec![Action::ShapeUpdated { id, patch }, Action::RenderNeeded]
    }

    /// End any gesture. Must be wired to a global listener, not a per-shape one,
    /// because the pointer can leave the shape while dragging.
    pub fn pointer_up(&mut self) -> Vec<Action> {
        self.finish()
    }

    /// Pointer left the canvas: same as pointer-up.
    pub fn pointer_leave(&mut self) -> Vec<Action> {
        self.finish()
    }

    /// Drop the active gesture without emitting actions, e.g. before the store
    /// is replaced by a loaded document.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    fn finish(&mut self) -> Vec<Action> {
        if self.active.take().is_some() {
            vec![Action::SetCursor("default")]
        } else {
            Vec::new()
        }
    }

    // --- Resize math ---

    fn resize_patch(&self, shape: &Shape, handle: Handle, pointer: Pointer) -> ShapePatch {
        match shape.geometry {
            Geometry::Rectangle { width, height } => {
                let (x, width) = resize_span(shape.x, width, pointer.movement.x, handle.dx());
                let (y, height) = resize_span(shape.y, height, pointer.movement.y, handle.dy());
                ShapePatch {
                    x: (handle.dx() < 0).then_some(x),
                    y: (handle.dy() < 0).then_some(y),
                    width: Some(width),
                    height: Some(height),
                    ..Default::default()
                }
            }
            Geometry::Circle { r } => {
                let r = match self.config.circle_resize {
                    CircleResize::Radial => pointer.position.distance_to(Point::new(shape.x, shape.y)),
                    CircleResize::Delta => {
                        r + pointer.movement.x * f64::from(handle.dx()) + pointer.movement.y * f64::from(handle.dy())
                    }
                };
                ShapePatch { r: Some(r.max(0.0)), ..Default::default() }
            }
        }
    }
}

/// Resize one axis of a rectangle. `dir` 1 grows the far edge; -1 grows the
/// near edge and keeps the far edge anchored; 0 leaves the axis alone.
fn resize_span(origin: f64, size: f64, delta: f64, dir: i8) -> (f64, f64) {
    match dir {
        1 => (origin, (size + delta).max(0.0)),
        -1 => {
            let far = origin + size;
            let size = (size - delta).max(0.0);
            (far - size, size)
        }
        _ => (origin, size),
    }
}
