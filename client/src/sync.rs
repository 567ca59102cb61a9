//! Websocket connection to the document service.
//!
//! DESIGN
//! ======
//! `SyncClient::open` connects and spawns two tasks: a writer that drains an
//! unbounded outbound channel into the socket, and a reader that decodes each
//! text frame and either completes a pending request (via the [`Router`]) or
//! forwards it to the unsolicited event stream.
//!
//! Requests in the same [`Category`] are serialized by an async lane lock, so
//! at most one login-type and one file-type request are in flight at a time.
//! Every request carries a fresh `requestId`; replies without one are matched
//! by action. A reply echoing an id nobody waits for any more is dropped, so
//! an abandoned request can never change state after the fact.
//!
//! ERROR HANDLING
//! ==============
//! Malformed frames and unknown actions are logged and dropped; the
//! connection stays up. When either task stops, the connection is marked
//! closed and every pending request fails with [`ClientError::Closed`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use frames::{Category, Command, Event, Request};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::router::{Resolution, Router};

/// Request/response access to the document service.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Send `command` and wait for the reply it correlates with. A service
    /// error reply comes back as [`ClientError::Server`].
    async fn request(&self, command: Command) -> Result<Event, ClientError>;

    /// Send `command` without waiting for anything.
    async fn send(&self, command: Command) -> Result<(), ClientError>;
}

/// A [`Requester`] with no connection behind it. Every call fails with
/// [`ClientError::NotConnected`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl Requester for Offline {
    async fn request(&self, _command: Command) -> Result<Event, ClientError> {
        Err(ClientError::NotConnected)
    }

    async fn send(&self, _command: Command) -> Result<(), ClientError> {
        Err(ClientError::NotConnected)
    }
}

type Waiter = oneshot::Sender<Event>;

struct Shared {
    router: Mutex<Router<Waiter>>,
    open: AtomicBool,
}

impl Shared {
    fn router(&self) -> MutexGuard<'_, Router<Waiter>> {
        self.router.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shut_down(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("connection closed");
        }
        let abandoned = self.router().drain();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "failing requests still in flight");
        }
    }
}

/// Router entry for one in-flight request. Dropping it forgets the entry, so
/// a request future cancelled by its caller leaves nothing behind.
struct PendingGuard<'a> {
    shared: &'a Shared,
    request_id: String,
}

impl<'a> PendingGuard<'a> {
    fn register(shared: &'a Shared, command: &Command, waiter: Waiter) -> Self {
        let request_id = Uuid::new_v4().to_string();
        shared.router().register(request_id.clone(), command, waiter);
        Self { shared, request_id }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.shared.router().remove(&self.request_id).is_some() {
            debug!(request_id = %self.request_id, "request abandoned");
        }
    }
}

/// A live connection to the document service.
pub struct SyncClient {
    outbound: mpsc::UnboundedSender<Message>,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<Event>>,
    shared: Arc<Shared>,
    auth_lane: tokio::sync::Mutex<()>,
    files_lane: tokio::sync::Mutex<()>,
    timeout: Duration,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Connect to `config.ws_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] if the websocket handshake fails.
    pub async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(config.ws_url.as_str()).await?;
        info!(url = %config.ws_url, "connected to document service");
        Ok(Self::from_stream(stream, config.request_timeout))
    }

    /// Run the client over an already-established websocket.
    pub fn from_stream<S>(stream: WebSocketStream<S>, timeout: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, source) = stream.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared { router: Mutex::new(Router::default()), open: AtomicBool::new(true) });

        let writer = tokio::spawn(write_loop(sink, outbound_rx, Arc::clone(&shared)));
        let reader = tokio::spawn(read_loop(source, events_tx, Arc::clone(&shared)));

        Self {
            outbound,
            events: tokio::sync::Mutex::new(events_rx),
            shared,
            auth_lane: tokio::sync::Mutex::new(()),
            files_lane: tokio::sync::Mutex::new(()),
            timeout,
            reader: Some(reader),
            writer: Some(writer),
        }
    }

    /// Whether the connection is still up.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Number of requests waiting for a reply.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.router().len()
    }

    /// Wait for the next unsolicited event. Returns `None` once the
    /// connection is closed and every buffered event has been taken.
    pub async fn next_event(&self) -> Option<Event> {
        self.events.lock().await.recv().await
    }

    /// Take a buffered unsolicited event without waiting.
    #[must_use]
    pub fn try_next_event(&self) -> Option<Event> {
        self.events.try_lock().ok()?.try_recv().ok()
    }

    /// Send a close frame and stop both tasks.
    pub async fn close(&mut self) {
        if self.outbound.send(Message::Close(None)).is_err() {
            debug!("writer already stopped");
        }
        if let Some(mut writer) = self.writer.take() {
            if tokio::time::timeout(self.timeout, &mut writer).await.is_err() {
                warn!("writer did not stop in time");
            }
            writer.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.shared.shut_down();
    }

    fn lane(&self, category: Category) -> &tokio::sync::Mutex<()> {
        match category {
            Category::Auth => &self.auth_lane,
            Category::Files => &self.files_lane,
        }
    }

    fn write(&self, request: &Request) -> Result<(), ClientError> {
        if !self.is_open() {
            return Err(ClientError::NotConnected);
        }
        let text = frames::encode_request(request)?;
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| ClientError::NotConnected)
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        for task in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

#[async_trait]
impl Requester for SyncClient {
    async fn request(&self, command: Command) -> Result<Event, ClientError> {
        if command.reply_action().is_none() {
            // Logout is the only command the service never answers.
            self.send(command).await?;
            return Ok(Event::LoggedOut);
        }

        let _lane = self.lane(command.category()).lock().await;
        let action = command.action();
        let (tx, rx) = oneshot::channel();
        let pending = PendingGuard::register(&self.shared, &command, tx);
        let request_id = pending.request_id.clone();

        self.write(&Request::new(request_id.clone(), command))?;
        debug!(%request_id, action, "request sent");

        let reply = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => return Err(ClientError::Closed),
            Err(_) => {
                warn!(%request_id, action, timeout = ?self.timeout, "request timed out");
                return Err(ClientError::Timeout(action));
            }
        };

        match reply {
            Event::Error { action: failed, message } => {
                let failed = failed.unwrap_or_else(|| action.to_owned());
                warn!(action = %failed, %message, "service rejected request");
                Err(ClientError::Server { action: failed, message })
            }
            event => Ok(event),
        }
    }

    async fn send(&self, command: Command) -> Result<(), ClientError> {
        let _lane = self.lane(command.category()).lock().await;
        let request_id = Uuid::new_v4().to_string();
        let action = command.action();
        self.write(&Request::new(request_id.clone(), command))?;
        debug!(%request_id, action, "command sent");
        Ok(())
    }
}

async fn write_loop<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    shared: Arc<Shared>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(error) = sink.send(message).await {
            error!(%error, "websocket send failed");
            break;
        }
        if closing {
            break;
        }
    }
    shared.shut_down();
}

async fn read_loop<S>(mut source: SplitStream<WebSocketStream<S>>, events: mpsc::UnboundedSender<Event>, shared: Arc<Shared>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => route_frame(&shared, &events, text.as_str()),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => route_frame(&shared, &events, text),
                Err(_) => warn!(len = bytes.len(), "dropping non-UTF-8 binary frame"),
            },
            Ok(Message::Close(_)) => {
                debug!("service closed the connection");
                break;
            }
            Ok(_) => {}
            Err(error) => {
                error!(%error, "websocket receive failed");
                break;
            }
        }
    }
    shared.shut_down();
}

/// Decode one frame and hand it to its waiter or the event stream.
fn route_frame(shared: &Shared, events: &mpsc::UnboundedSender<Event>, text: &str) {
    let inbound = match frames::decode_event(text) {
        Ok(inbound) => inbound,
        Err(error) => {
            warn!(%error, "dropping malformed frame");
            return;
        }
    };
    if let Event::Unknown(action) = &inbound.event {
        warn!(%action, "ignoring unknown action");
        return;
    }

    let resolution = shared.router().resolve(&inbound);
    match resolution {
        Resolution::Reply(waiter) => {
            if waiter.send(inbound.event).is_err() {
                debug!("reply arrived after the requester gave up");
            }
        }
        Resolution::Stale(request_id) => {
            warn!(%request_id, action = inbound.event.action().unwrap_or("error"), "dropping reply to abandoned request");
        }
        Resolution::Unsolicited => {
            if let Event::Error { message, .. } = &inbound.event {
                warn!(%message, "uncorrelated service error");
            }
            if events.send(inbound.event).is_err() {
                debug!("event stream dropped");
            }
        }
    }
}
