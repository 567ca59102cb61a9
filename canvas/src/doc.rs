//! Document model: shapes, sparse patches, and the in-memory store.
//!
//! This module defines what is on the canvas (`Shape`, `Geometry`), a
//! sparse-update type for incremental edits (`ShapePatch`), and the runtime
//! store that owns all live shapes (`ShapeStore`).
//!
//! Data flows into this layer from loaded documents (JSON deserialization via
//! [`crate::svg`]) and from the gesture controller (patches). The renderer
//! reads the store in insertion order, which is also draw order.
//!
//! INVARIANTS
//! ==========
//! - Ids are unique within a store and never change once a shape exists.
//! - `r`, `width` and `height` are never negative. Negative input is clamped
//!   to zero; non-finite input never reaches the store.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::consts::DEFAULT_FILL;

// =============================================================================
// IDS
// =============================================================================

/// Unique, immutable identifier of a shape.
///
/// Saved documents use both string (`"circle-1"`) and numeric (`1`) ids; both
/// deserialize into the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Unsigned(n) => Self(n.to_string()),
            RawId::Signed(n) => Self(n.to_string()),
        })
    }
}

// =============================================================================
// SHAPES
// =============================================================================

/// Kind-specific geometry. Serialized inline with a `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    /// Circle of radius `r` centered on the shape's `(x, y)`.
    Circle { r: f64 },
    /// Axis-aligned rectangle whose top-left corner is the shape's `(x, y)`.
    #[serde(alias = "rect")]
    Rectangle { width: f64, height: f64 },
}

/// A shape as stored in the document and in saved files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier for this shape.
    pub id: ShapeId,
    /// Center x for circles, left edge for rectangles.
    pub x: f64,
    /// Center y for circles, top edge for rectangles.
    pub y: f64,
    /// CSS fill color.
    #[serde(default = "default_fill")]
    pub fill: String,
    /// Kind and size.
    #[serde(flatten)]
    pub geometry: Geometry,
}

fn default_fill() -> String {
    DEFAULT_FILL.to_owned()
}

impl Shape {
    /// Build a circle.
    #[must_use]
    pub fn circle(id: impl Into<ShapeId>, x: f64, y: f64, r: f64, fill: impl Into<String>) -> Self {
        Self { id: id.into(), x, y, fill: fill.into(), geometry: Geometry::Circle { r } }
    }

    /// Build a rectangle.
    #[must_use]
    pub fn rectangle(
        id: impl Into<ShapeId>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), x, y, fill: fill.into(), geometry: Geometry::Rectangle { width, height } }
    }

    /// Whether every coordinate and size is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        let size_ok = match self.geometry {
            Geometry::Circle { r } => r.is_finite(),
            Geometry::Rectangle { width, height } => width.is_finite() && height.is_finite(),
        };
        self.x.is_finite() && self.y.is_finite() && size_ok
    }

    /// Clamp negative sizes to zero. Returns `true` if anything changed.
    pub fn clamp_sizes(&mut self) -> bool {
        match &mut self.geometry {
            Geometry::Circle { r } => clamp_in_place(r),
            Geometry::Rectangle { width, height } => {
                let w = clamp_in_place(width);
                let h = clamp_in_place(height);
                w || h
            }
        }
    }
}

fn clamp_in_place(value: &mut f64) -> bool {
    if *value < 0.0 {
        *value = 0.0;
        true
    } else {
        false
    }
}

/// The two shapes a fresh canvas starts with.
#[must_use]
pub fn default_shapes() -> Vec<Shape> {
    vec![
        Shape::circle("circle-1", 100.0, 100.0, 50.0, "blue"),
        Shape::rectangle("rect-1", 300.0, 200.0, 100.0, 100.0, "green"),
    ]
}

// =============================================================================
// PATCHES
// =============================================================================

/// Sparse update for a shape. Only present fields are applied; fields that do
/// not exist on the target's kind (e.g. `r` on a rectangle) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapePatch {
    /// New x, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// New y, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New radius (circles only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    /// New width (rectangles only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New height (rectangles only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl ShapePatch {
    /// Patch that moves a shape to `(x, y)`.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    fn apply_to(&self, shape: &mut Shape) {
        if let Some(x) = finite(self.x) {
            shape.x = x;
        }
        if let Some(y) = finite(self.y) {
            shape.y = y;
        }
        if let Some(fill) = &self.fill {
            shape.fill.clone_from(fill);
        }
        match &mut shape.geometry {
            Geometry::Circle { r } => {
                if let Some(value) = finite(self.r) {
                    *r = value.max(0.0);
                }
            }
            Geometry::Rectangle { width, height } => {
                if let Some(value) = finite(self.width) {
                    *width = value.max(0.0);
                }
                if let Some(value) = finite(self.height) {
                    *height = value.max(0.0);
                }
            }
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// =============================================================================
// STORE
// =============================================================================

/// Error returned by [`ShapeStore::add`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A shape with this id is already in the store.
    #[error("shape `{0}` already exists")]
    DuplicateId(ShapeId),
    /// The shape has a NaN or infinite coordinate or size.
    #[error("shape `{0}` has non-finite geometry")]
    NonFinite(ShapeId),
}

/// Outcome of [`ShapeStore::replace_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Shapes now in the store.
    pub loaded: usize,
    /// Loaded shapes whose negative sizes were clamped to zero.
    pub clamped: usize,
    /// Incoming shapes that were rejected.
    pub dropped: usize,
}

/// Ordered in-memory store of shapes. Insertion order is draw order.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: Vec<Shape>,
}

impl ShapeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Create a store holding [`default_shapes`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.replace_all(default_shapes());
        store
    }

    /// Append a shape. Negative sizes are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is taken and
    /// [`StoreError::NonFinite`] if any coordinate is NaN or infinite.
    pub fn add(&mut self, mut shape: Shape) -> Result<(), StoreError> {
        if !shape.is_finite() {
            return Err(StoreError::NonFinite(shape.id));
        }
        if self.contains(&shape.id) {
            return Err(StoreError::DuplicateId(shape.id));
        }
        shape.clamp_sizes();
        self.shapes.push(shape);
        Ok(())
    }

    /// Apply a patch to an existing shape. Unknown ids are logged and ignored;
    /// returns `false` in that case.
    pub fn update(&mut self, id: &ShapeId, patch: &ShapePatch) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| &s.id == id) else {
            warn!(%id, "update for unknown shape ignored");
            return false;
        };
        patch.apply_to(shape);
        true
    }

    /// Remove a shape by id, returning it if it was present.
    pub fn remove(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| &s.id == id)?;
        Some(self.shapes.remove(index))
    }

    /// Look up a shape by id.
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    /// Whether a shape with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// All shapes in draw order.
    #[must_use]
    pub fn all(&self) -> &[Shape] {
        &self.shapes
    }

    /// Replace every shape, validating each incoming entry.
    ///
    /// Negative sizes are clamped to zero. Entries with non-finite geometry or
    /// a repeated id are dropped. One bad entry never aborts the load.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) -> LoadReport {
        let mut report = LoadReport::default();
        self.shapes.clear();

        for mut shape in shapes {
            if !shape.is_finite() {
                warn!(id = %shape.id, "dropping shape with non-finite geometry");
                report.dropped += 1;
                continue;
            }
            if self.contains(&shape.id) {
                warn!(id = %shape.id, "dropping shape with duplicate id");
                report.dropped += 1;
                continue;
            }
            if shape.clamp_sizes() {
                warn!(id = %shape.id, "clamped negative shape size to zero");
                report.clamped += 1;
            }
            self.shapes.push(shape);
        }

        report.loaded = self.shapes.len();
        report
    }

    /// Number of shapes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the store holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
