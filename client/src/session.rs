//! Login state and token persistence.
//!
//! A [`SessionClient`] holds at most one [`Session`]. The token is created by a
//! successful login, kept in a [`SessionStorage`] so it survives restarts, and
//! destroyed on logout. Failed logins and registrations leave the current
//! state untouched.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use frames::{Command, Event};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::sync::Requester;

/// An authenticated user and the token the service issued for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    /// Persisted under the `sessionId` key.
    #[serde(rename = "sessionId")]
    pub token: String,
}

/// Where the session survives between runs.
pub trait SessionStorage: Send + Sync {
    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store exists but cannot be read.
    fn load(&self) -> Result<Option<Session>, ClientError>;

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn save(&self, session: &Session) -> Result<(), ClientError>;

    /// Forget the persisted session. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be modified.
    fn clear(&self) -> Result<(), ClientError>;
}

/// In-process storage; nothing outlives the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Session>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { slot: Mutex::new(Some(session)) }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// A small JSON file: `{"sessionId": "...", "username": "..."}`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        let text = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

/// Authentication flows over a [`Requester`].
#[derive(Debug)]
pub struct SessionClient<S> {
    storage: S,
    session: Option<Session>,
}

impl<S: SessionStorage> SessionClient<S> {
    /// Start logged out, ignoring anything persisted.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage, session: None }
    }

    /// Start from whatever session `storage` holds. An unreadable store is
    /// logged and treated as empty.
    #[must_use]
    pub fn restore(storage: S) -> Self {
        let session = match storage.load() {
            Ok(session) => session,
            Err(error) => {
                warn!(%error, "ignoring unreadable persisted session");
                None
            }
        };
        if let Some(session) = &session {
            info!(username = %session.username, "restored session");
        }
        Self { storage, session }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// The token, for privileged requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] when there is no session.
    pub fn require_token(&self) -> Result<&str, ClientError> {
        self.token().ok_or(ClientError::NotLoggedIn)
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Authenticate and persist the issued token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredentials`] before any network traffic
    /// when either field is empty, or the request's error otherwise. The
    /// current session is unchanged on failure.
    pub async fn login<R>(&mut self, requester: &R, username: &str, password: &str) -> Result<&Session, ClientError>
    where
        R: Requester + ?Sized,
    {
        check_credentials(username, password)?;
        let reply = requester
            .request(Command::Login { username: username.to_owned(), password: password.to_owned() })
            .await?;

        let session = match reply {
            Event::LoggedIn { session_id, username: confirmed } => {
                Session { username: confirmed.unwrap_or_else(|| username.to_owned()), token: session_id }
            }
            other => return Err(unexpected("login", &other)),
        };

        if let Err(error) = self.storage.save(&session) {
            warn!(%error, "session not persisted");
        }
        info!(username = %session.username, "logged in");
        Ok(self.session.insert(session))
    }

    /// Create an account, then log into it.
    ///
    /// # Errors
    ///
    /// Same as [`SessionClient::login`]; a rejected registration never
    /// attempts the login.
    pub async fn register<R>(&mut self, requester: &R, username: &str, password: &str) -> Result<&Session, ClientError>
    where
        R: Requester + ?Sized,
    {
        check_credentials(username, password)?;
        let reply = requester
            .request(Command::CreateUser { username: username.to_owned(), password: password.to_owned() })
            .await?;

        match reply {
            Event::UserCreated { message, .. } => {
                info!(%username, message = message.as_deref().unwrap_or(""), "account created");
            }
            other => return Err(unexpected("createUser", &other)),
        }
        self.login(requester, username, password).await
    }

    /// Drop the session locally and in storage, then tell the service.
    ///
    /// Local state is always cleared; a failed notification is only logged.
    pub async fn logout<R>(&mut self, requester: &R)
    where
        R: Requester + ?Sized,
    {
        let Some(session) = self.invalidate() else {
            return;
        };
        info!(username = %session.username, "logged out");
        if let Err(error) = requester.send(Command::Logout { session_id: session.token }).await {
            warn!(%error, "logout notification not delivered");
        }
    }

    /// Drop the session locally and in storage without telling the service,
    /// e.g. when the service no longer accepts the token.
    pub fn invalidate(&mut self) -> Option<Session> {
        if let Err(error) = self.storage.clear() {
            warn!(%error, "persisted session not cleared");
        }
        self.session.take()
    }
}

fn check_credentials(username: &str, password: &str) -> Result<(), ClientError> {
    if username.is_empty() || password.is_empty() {
        return Err(ClientError::MissingCredentials);
    }
    Ok(())
}

pub(crate) fn unexpected(expected: &'static str, event: &Event) -> ClientError {
    ClientError::UnexpectedReply { expected, got: event.action().unwrap_or("unknown").to_owned() }
}
