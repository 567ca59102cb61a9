//! Error type for session, sync and editor operations.

/// Everything a client operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not connected to the document service")]
    NotConnected,
    #[error("connection closed before a reply arrived")]
    Closed,
    #[error("timed out waiting for reply to `{0}`")]
    Timeout(&'static str),
    #[error("server returned error for {action}: {message}")]
    Server { action: String, message: String },
    #[error("username and password are required")]
    MissingCredentials,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("file name is required")]
    MissingFileName,
    #[error("unexpected `{got}` reply to `{expected}`")]
    UnexpectedReply { expected: &'static str, got: String },
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame codec error: {0}")]
    Codec(#[from] frames::CodecError),
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

impl ClientError {
    /// Whether the failure came from the transport rather than the service or
    /// the caller.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Closed | Self::Timeout(_) | Self::Ws(_))
    }
}
