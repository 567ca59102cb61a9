//! Shape canvas model for the SVG editor.
//!
//! This crate owns everything about the drawing that does not touch the
//! network: the ordered shape store, the pointer gesture state machine that
//! turns drags and handle pulls into store mutations, hit-testing, and the
//! projection of shapes into drawable primitives and SVG documents. The host
//! (UI framework or CLI) feeds pointer events in and draws what comes out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`doc`] | Shape types, sparse patches, and the [`doc::ShapeStore`] |
//! | [`input`] | Points, pointer events, resize handles, gesture states |
//! | [`engine`] | The [`engine::Controller`] gesture state machine |
//! | [`hit`] | Hit-testing shape bodies and resize handles |
//! | [`render`] | Stateless projection of the store into primitives |
//! | [`svg`] | SVG document writer and loaded-payload reader |
//! | [`consts`] | Shared numeric constants (handle radius, canvas size) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod render;
pub mod svg;
