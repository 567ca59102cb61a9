//! Shared message model and JSON codec for the editor's websocket transport.
//!
//! This crate owns the wire representation spoken between the `client` crate
//! and the document service. Every message is a single JSON object in its own
//! text frame, discriminated by an `action` field. Outbound commands may carry
//! a `requestId`; services that echo it back get exact correlation, services
//! that don't are matched by reply `action` on the client side.
//!
//! DESIGN
//! ======
//! - Outbound [`Command`]s are a closed, typed set and serialize through serde.
//! - Inbound payloads are parsed by hand into [`Event`]s so a top-level
//!   `error` field can short-circuit routing regardless of `action`, and so
//!   unknown actions survive as [`Event::Unknown`] instead of failing decode.
//! - There is exactly one discriminator (`action`). Payloads that only carry
//!   bare `fileList` / `svgData` keys are rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by [`decode_event`], [`decode_request`] and [`encode_request`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame text is not valid JSON (or could not be serialized).
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The frame parsed, but the top-level value is not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,
    /// Neither an `action` nor an `error` field was present.
    #[error("payload has no `action` field")]
    MissingAction,
    /// A field required by the given action is absent or has the wrong type.
    #[error("`{action}` payload is missing field `{field}`")]
    MissingField { action: String, field: &'static str },
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Request categories. At most one request per category is in flight at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Login, registration and logout.
    Auth,
    /// File listing, loading and saving.
    Files,
}

/// A command sent to the document service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Authenticate with a username and password.
    Login { username: String, password: String },
    /// Create an account. The client follows success with a [`Command::Login`].
    CreateUser { username: String, password: String },
    /// End the session identified by `session_id`. No reply is expected.
    Logout { session_id: String },
    /// Ask for the names of all saved documents.
    GetFileList { session_id: String },
    /// Fetch one saved document's markup.
    GetFileByName { file_name: String, session_id: String },
    /// Store markup under a file name.
    #[serde(rename = "saveSVG")]
    SaveSvg {
        file_name: String,
        svg_data: String,
        session_id: String,
    },
}

impl Command {
    /// The `action` string this command is sent with.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::CreateUser { .. } => "createUser",
            Self::Logout { .. } => "logout",
            Self::GetFileList { .. } => "getFileList",
            Self::GetFileByName { .. } => "getFileByName",
            Self::SaveSvg { .. } => "saveSVG",
        }
    }

    /// The inbound `action` that answers this command, or `None` for
    /// fire-and-forget commands.
    #[must_use]
    pub fn reply_action(&self) -> Option<&'static str> {
        match self {
            Self::Login { .. } => Some("login"),
            Self::CreateUser { .. } => Some("createUser"),
            Self::Logout { .. } => None,
            Self::GetFileList { .. } => Some("fileList"),
            Self::GetFileByName { .. } => Some("svgData"),
            Self::SaveSvg { .. } => Some("saveSVG"),
        }
    }

    /// Which serialization lane this command belongs to.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Login { .. } | Self::CreateUser { .. } | Self::Logout { .. } => Category::Auth,
            Self::GetFileList { .. } | Self::GetFileByName { .. } | Self::SaveSvg { .. } => Category::Files,
        }
    }
}

/// A command plus its optional correlation id, as written to the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Client-chosen correlation id, echoed back by services that support it.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// The command itself; its fields are flattened next to `requestId`.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Wrap a command with a correlation id.
    #[must_use]
    pub fn new(request_id: impl Into<String>, command: Command) -> Self {
        Self { request_id: Some(request_id.into()), command }
    }
}

/// Encode a request as one JSON text frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_request(request: &Request) -> Result<String, CodecError> {
    Ok(serde_json::to_string(request)?)
}

/// Decode a request frame. Used by service-side code and test doubles.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON or an unknown `action`.
pub fn decode_request(text: &str) -> Result<Request, CodecError> {
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// INBOUND
// =============================================================================

/// A decoded inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Login accepted.
    LoggedIn { session_id: String, username: Option<String> },
    /// Account created. Some services issue a session here, some only a message.
    UserCreated {
        session_id: Option<String>,
        username: Option<String>,
        message: Option<String>,
    },
    /// Logout acknowledged.
    LoggedOut,
    /// Full list of saved document names, in service order.
    FileList(Vec<String>),
    /// Markup of a requested document.
    SvgData(String),
    /// Save acknowledged.
    Saved { file_name: Option<String> },
    /// Service-reported failure. `action` is set when the service named it.
    Error { action: Option<String>, message: String },
    /// Well-formed payload with an `action` this client does not handle.
    Unknown(String),
}

impl Event {
    /// The wire `action` this event arrived with, if known.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::LoggedIn { .. } => Some("login"),
            Self::UserCreated { .. } => Some("createUser"),
            Self::LoggedOut => Some("logout"),
            Self::FileList(_) => Some("fileList"),
            Self::SvgData(_) => Some("svgData"),
            Self::Saved { .. } => Some("saveSVG"),
            Self::Error { action, .. } => action.as_deref(),
            Self::Unknown(action) => Some(action),
        }
    }

    /// Whether this event reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// An inbound event with the correlation id the service echoed, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    /// Echoed `requestId`.
    pub request_id: Option<String>,
    /// The decoded event.
    pub event: Event,
}

/// Decode one inbound text frame.
///
/// A non-null top-level `error` short-circuits routing and always yields
/// [`Event::Error`], whatever the `action`.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON, [`CodecError::NotAnObject`]
/// for non-object payloads, [`CodecError::MissingAction`] when no `action` is
/// present, and [`CodecError::MissingField`] when a known action lacks a
/// required field.
pub fn decode_event(text: &str) -> Result<Inbound, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(CodecError::NotAnObject);
    };

    let request_id = optional_str(&map, "requestId");
    let action = map.get("action").and_then(Value::as_str);

    if let Some(error) = map.get("error").filter(|v| !v.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let event = Event::Error { action: action.map(str::to_owned), message };
        return Ok(Inbound { request_id, event });
    }

    let Some(action) = action else {
        return Err(CodecError::MissingAction);
    };

    let event = match action {
        "login" => Event::LoggedIn {
            session_id: required_str(&map, action, "sessionId")?,
            username: optional_str(&map, "username"),
        },
        "createUser" => Event::UserCreated {
            session_id: optional_str(&map, "sessionId"),
            username: optional_str(&map, "username"),
            message: optional_str(&map, "message"),
        },
        "logout" => Event::LoggedOut,
        "fileList" => {
            let names = map
                .get("fileList")
                .and_then(Value::as_array)
                .ok_or_else(|| missing(action, "fileList"))?;
            Event::FileList(
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
            )
        }
        "svgData" => Event::SvgData(required_str(&map, action, "svgData")?),
        "saveSVG" => Event::Saved { file_name: optional_str(&map, "fileName") },
        other => Event::Unknown(other.to_owned()),
    };

    Ok(Inbound { request_id, event })
}

fn optional_str(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn required_str(map: &Map<String, Value>, action: &str, field: &'static str) -> Result<String, CodecError> {
    optional_str(map, field).ok_or_else(|| missing(action, field))
}

fn missing(action: &str, field: &'static str) -> CodecError {
    CodecError::MissingField { action: action.to_owned(), field }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
