//! Native client for the shape editor's document service.
//!
//! MODULES
//! =======
//! | Module    | Role                                                        |
//! |-----------|-------------------------------------------------------------|
//! | `config`  | Endpoint, timeout and session-file settings from the env    |
//! | `error`   | [`ClientError`], shared by every async operation            |
//! | `router`  | Matches inbound replies to pending requests (no I/O)        |
//! | `sync`    | [`SyncClient`]: the websocket connection and its tasks      |
//! | `session` | Login, registration, logout and token persistence           |
//! | `editor`  | [`Editor`]: canvas state wired to session and sync          |
//!
//! The canvas crate stays I/O-free; everything here that touches the network
//! goes through the [`Requester`] trait so it can be driven by a fake in tests.

pub mod config;
pub mod editor;
pub mod error;
mod router;
pub mod session;
pub mod sync;

pub use config::ClientConfig;
pub use editor::{Document, Editor};
pub use error::ClientError;
pub use session::{FileStorage, MemoryStorage, Session, SessionClient, SessionStorage};
pub use sync::{Offline, Requester, SyncClient};
