//! The editor facade: one canvas, one session, one connection.
//!
//! `Editor` is what a UI host holds. Pointer events go to the canvas
//! [`Controller`]; document and account operations go through the
//! [`SessionClient`] and the [`Requester`]. Failures are returned to the
//! caller and also kept as a user-facing message in [`Editor::take_error`],
//! the way a browser client would raise an alert.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use canvas::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use canvas::doc::{LoadReport, Shape, ShapeStore};
use canvas::engine::{Action, Controller, ControllerConfig};
use canvas::hit::hit_test;
use canvas::input::{Point, Pointer, Target};
use canvas::render::{Primitive, primitives};
use canvas::svg::{shape_list, to_svg};
use frames::{Command, Event};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::session::{Session, SessionClient, SessionStorage, unexpected};
use crate::sync::Requester;

/// The markup most recently loaded or saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// `None` when the service pushed the markup without being asked.
    pub file_name: Option<String>,
    pub svg_markup: String,
}

pub struct Editor<R, S> {
    sync: R,
    session: SessionClient<S>,
    store: ShapeStore,
    controller: Controller,
    file_list: Vec<String>,
    document: Option<Document>,
    last_error: Option<String>,
}

impl<R: Requester, S: SessionStorage> Editor<R, S> {
    /// An editor showing the default shapes.
    pub fn new(sync: R, session: SessionClient<S>) -> Self {
        Self::with_config(sync, session, ControllerConfig::default())
    }

    pub fn with_config(sync: R, session: SessionClient<S>, config: ControllerConfig) -> Self {
        Self {
            sync,
            session,
            store: ShapeStore::with_defaults(),
            controller: Controller::new(config),
            file_list: Vec::new(),
            document: None,
            last_error: None,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn session(&self) -> &SessionClient<S> {
        &self.session
    }

    #[must_use]
    pub fn sync(&self) -> &R {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut R {
        &mut self.sync
    }

    /// Document names from the last `fileList` reply, in service order.
    #[must_use]
    pub fn file_list(&self) -> &[String] {
        &self.file_list
    }

    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Take the pending user-facing error message, if any.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Drawable primitives for the current canvas, handles included.
    #[must_use]
    pub fn primitives(&self) -> Vec<Primitive> {
        primitives(&self.store, true)
    }

    /// The current canvas as a standalone SVG document.
    #[must_use]
    pub fn export_svg(&self) -> String {
        to_svg(&self.store, CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    /// Replace every shape on the canvas, ending any gesture first.
    pub fn replace_shapes(&mut self, shapes: Vec<Shape>) -> LoadReport {
        self.controller.cancel();
        self.store.replace_all(shapes)
    }

    // --- Pointer input ---

    /// Pointer-down at `point`: hit-test, then start the matching gesture.
    pub fn pointer_down(&mut self, point: Point) -> Vec<Action> {
        match hit_test(&self.store, point) {
            Some(target) => self.pointer_down_on(&target, Pointer::at(point.x, point.y)),
            None => Vec::new(),
        }
    }

    /// Pointer-down on a target the host already resolved.
    pub fn pointer_down_on(&mut self, target: &Target, pointer: Pointer) -> Vec<Action> {
        self.controller.pointer_down(&self.store, target, pointer)
    }

    pub fn pointer_move(&mut self, pointer: Pointer) -> Vec<Action> {
        self.controller.pointer_move(&mut self.store, pointer)
    }

    pub fn pointer_up(&mut self) -> Vec<Action> {
        self.controller.pointer_up()
    }

    pub fn pointer_leave(&mut self) -> Vec<Action> {
        self.controller.pointer_leave()
    }

    // --- Account ---

    /// # Errors
    ///
    /// See [`SessionClient::login`].
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, ClientError> {
        let result = self.session.login(&self.sync, username, password).await.cloned();
        self.session_changed(result)
    }

    /// # Errors
    ///
    /// See [`SessionClient::register`].
    pub async fn register(&mut self, username: &str, password: &str) -> Result<Session, ClientError> {
        let result = self.session.register(&self.sync, username, password).await.cloned();
        self.session_changed(result)
    }

    /// Log out and forget the file list. Never fails.
    pub async fn logout(&mut self) {
        self.session.logout(&self.sync).await;
        self.file_list.clear();
    }

    // --- Documents ---

    /// Replace the file list with the service's current one.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotLoggedIn`] without a session, otherwise the
    /// request's error. The previous list is kept on failure.
    pub async fn refresh_file_list(&mut self) -> Result<&[String], ClientError> {
        let result = self.fetch_file_list().await;
        self.file_list = self.record(result)?;
        Ok(&self.file_list)
    }

    /// Fetch `file_name` and load its shapes, replacing the canvas.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingFileName`], [`ClientError::NotLoggedIn`], or the
    /// request's error. The canvas is untouched on failure.
    pub async fn load_document(&mut self, file_name: &str) -> Result<LoadReport, ClientError> {
        let result = self.fetch_document(file_name).await;
        let markup = self.record(result)?;
        Ok(self.install(Some(file_name.trim().to_owned()), markup))
    }

    /// Save the canvas as SVG under `file_name`.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingFileName`], [`ClientError::NotLoggedIn`], or the
    /// request's error.
    pub async fn save_document(&mut self, file_name: &str) -> Result<(), ClientError> {
        let markup = self.export_svg();
        let result = self.store_document(file_name, markup.clone()).await;
        self.record(result)?;
        info!(%file_name, bytes = markup.len(), "document saved");
        self.document = Some(Document { file_name: Some(file_name.trim().to_owned()), svg_markup: markup });
        Ok(())
    }

    /// Apply an event nobody was waiting for. Returns whether editor state
    /// changed.
    pub fn apply_event(&mut self, event: Event) -> bool {
        match event {
            Event::FileList(names) => {
                self.file_list = names;
                true
            }
            Event::SvgData(markup) => {
                self.install(None, markup);
                true
            }
            Event::Error { message, .. } => {
                self.last_error = Some(message);
                true
            }
            other => {
                debug!(action = other.action().unwrap_or("unknown"), "ignoring unsolicited event");
                false
            }
        }
    }

    async fn fetch_file_list(&self) -> Result<Vec<String>, ClientError> {
        let session_id = self.session.require_token()?.to_owned();
        match self.sync.request(Command::GetFileList { session_id }).await? {
            Event::FileList(names) => Ok(names),
            other => Err(unexpected("getFileList", &other)),
        }
    }

    async fn fetch_document(&self, file_name: &str) -> Result<String, ClientError> {
        let file_name = require_name(file_name)?;
        let session_id = self.session.require_token()?.to_owned();
        match self.sync.request(Command::GetFileByName { file_name, session_id }).await? {
            Event::SvgData(markup) => Ok(markup),
            other => Err(unexpected("getFileByName", &other)),
        }
    }

    async fn store_document(&self, file_name: &str, svg_data: String) -> Result<(), ClientError> {
        let file_name = require_name(file_name)?;
        let session_id = self.session.require_token()?.to_owned();
        match self.sync.request(Command::SaveSvg { file_name, svg_data, session_id }).await? {
            Event::Saved { .. } => Ok(()),
            other => Err(unexpected("saveSVG", &other)),
        }
    }

    fn install(&mut self, file_name: Option<String>, markup: String) -> LoadReport {
        let shapes = shape_list(&markup).unwrap_or_else(|| {
            if !markup.trim().is_empty() {
                warn!(file_name = file_name.as_deref().unwrap_or("<pushed>"), "document has no editable shapes");
                self.last_error = Some("document has no editable shapes".to_owned());
            }
            Vec::new()
        });
        let report = self.replace_shapes(shapes);
        info!(
            file_name = file_name.as_deref().unwrap_or("<pushed>"),
            loaded = report.loaded,
            clamped = report.clamped,
            dropped = report.dropped,
            "document loaded"
        );
        self.document = Some(Document { file_name, svg_markup: markup });
        report
    }

    /// The previous account's file list never outlives a new login.
    fn session_changed(&mut self, result: Result<Session, ClientError>) -> Result<Session, ClientError> {
        if result.is_ok() {
            self.file_list.clear();
        }
        self.record(result)
    }

    fn record<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(error) = &result {
            warn!(%error, "editor operation failed");
            self.last_error = Some(error.to_string());
        }
        result
    }
}

fn require_name(file_name: &str) -> Result<String, ClientError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(ClientError::MissingFileName);
    }
    Ok(trimmed.to_owned())
}
