//! Shared constants for the canvas crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Radius of a resize handle, used both for drawing and hit slop.
pub const HANDLE_RADIUS: f64 = 6.0;

// ── Document ────────────────────────────────────────────────────

/// Default canvas width for exported documents.
pub const CANVAS_WIDTH: f64 = 800.0;

/// Default canvas height for exported documents.
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Fill used when a loaded shape does not name one.
pub const DEFAULT_FILL: &str = "black";

/// Fill of resize handles.
pub const HANDLE_FILL: &str = "red";
