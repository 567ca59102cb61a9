//! SVG document codec.
//!
//! Saved documents are ordinary SVG markup. Alongside the drawn elements, the
//! writer embeds the shape list as JSON inside a `<metadata>` element so a
//! document can be loaded back into an editable store without parsing SVG
//! geometry. The reader also accepts a bare JSON shape array, which is how
//! older documents were stored.
//!
//! Markup with neither form is still a valid document; it just has no
//! editable shapes.

#[cfg(test)]
#[path = "svg_test.rs"]
mod svg_test;

use serde_json::Value;
use tracing::{debug, warn};

use crate::doc::{Shape, ShapeStore};
use crate::render::{Primitive, primitives};

const METADATA_OPEN: &str = r#"<metadata id="svgpad-shapes">"#;
const METADATA_CLOSE: &str = "</metadata>";

/// Serialize the store as a standalone SVG document of the given size.
#[must_use]
pub fn to_svg(store: &ShapeStore, width: f64, height: f64) -> String {
    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    out.push('\n');

    match serde_json::to_string(store.all()) {
        Ok(json) => {
            out.push_str(METADATA_OPEN);
            out.push_str(&escape(&json));
            out.push_str(METADATA_CLOSE);
            out.push('\n');
        }
        Err(e) => warn!(error = %e, "could not embed shape list; document will not reload as shapes"),
    }

    for primitive in primitives(store, false) {
        let element = match primitive {
            Primitive::Circle { id, cx, cy, r, fill } => format!(
                r#"<circle id="{}" cx="{cx}" cy="{cy}" r="{r}" fill="{}"/>"#,
                escape(id.as_str()),
                escape(&fill)
            ),
            Primitive::Rect { id, x, y, width, height, fill } => format!(
                r#"<rect id="{}" x="{x}" y="{y}" width="{width}" height="{height}" fill="{}"/>"#,
                escape(id.as_str()),
                escape(&fill)
            ),
            Primitive::Handle { .. } => continue,
        };
        out.push_str(&element);
        out.push('\n');
    }

    out.push_str("</svg>");
    out
}

/// Extract editable shapes from a loaded document payload.
///
/// Accepts a bare JSON array of shapes or SVG markup written by [`to_svg`].
/// Malformed array elements are skipped with a warning; the rest still load.
#[must_use]
pub fn shapes_from_payload(payload: &str) -> Vec<Shape> {
    shape_list(payload).unwrap_or_default()
}

/// Like [`shapes_from_payload`], but `None` when the payload carries no
/// shape list at all, as opposed to an empty one.
#[must_use]
pub fn shape_list(payload: &str) -> Option<Vec<Shape>> {
    let trimmed = payload.trim_start();
    let json = if trimmed.starts_with('[') {
        trimmed.to_owned()
    } else if let Some(embedded) = embedded_json(payload) {
        embedded
    } else {
        debug!("document carries no shape list");
        return None;
    };

    let items: Vec<Value> = match serde_json::from_str(&json) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "shape list is not a JSON array");
            return None;
        }
    };

    let shapes = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Shape>(item) {
            Ok(shape) => Some(shape),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed shape");
                None
            }
        })
        .collect();
    Some(shapes)
}

fn embedded_json(markup: &str) -> Option<String> {
    let start = markup.find(METADATA_OPEN)? + METADATA_OPEN.len();
    let len = markup[start..].find(METADATA_CLOSE)?;
    Some(unescape(&markup[start..start + len]))
}

/// Escape text for use in XML attributes and character data.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
