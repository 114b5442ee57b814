//! Dashboard controller.
//!
//! Orchestrates the session, the upload history and the transport in response
//! to user actions. Data flows one way: an action mutates the session or the
//! history, and [`DashboardController::view`] recomputes the projection from
//! that state plus the search text.
//!
//! Every network action is split into `begin_*` (issue a request ticket and
//! capture its inputs) and `complete_*` (apply the response if the ticket is
//! still current). The async methods chain the two around the API call; a
//! caller driving overlapping requests can use the halves directly.

use chemviz_core::api::{ApiError, ApiResult, EquipmentApi, Registration, UploadFile};
use chemviz_core::config::REPORT_FILE_NAME;
use chemviz_core::error::{ChemvizError, Result};
use chemviz_core::history::HistoryState;
use chemviz_core::projection::DashboardView;
use chemviz_core::sequence::{RequestKind, RequestSequencer, RequestTicket};
use chemviz_core::session::{AuthState, Session, TokenRepository, validate_registration};
use chemviz_core::upload::{UploadId, UploadRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::notice::{self, Notice};

/// Why a history fetch was issued. A failed fetch at mount degrades to an
/// empty history quietly; a failed refresh keeps what is shown and says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Mount,
    Refresh,
}

/// An issued history fetch awaiting its response.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    ticket: RequestTicket,
    origin: FetchOrigin,
    token: Option<String>,
}

impl HistoryRequest {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn origin(&self) -> FetchOrigin {
        self.origin
    }
}

/// An issued upload awaiting its response.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    ticket: RequestTicket,
    token: String,
    file: UploadFile,
}

impl UploadRequest {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn file(&self) -> &UploadFile {
        &self.file
    }
}

pub struct DashboardController {
    api: Arc<dyn EquipmentApi>,
    tokens: Arc<dyn TokenRepository>,
    session: Session,
    history: HistoryState,
    search: String,
    sequencer: RequestSequencer,
    notices: Vec<Notice>,
    download_dir: PathBuf,
}

impl DashboardController {
    pub fn new(api: Arc<dyn EquipmentApi>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self {
            api,
            tokens,
            session: Session::new(),
            history: HistoryState::new(),
            search: String::new(),
            sequencer: RequestSequencer::new(),
            notices: Vec::new(),
            download_dir: PathBuf::from("."),
        }
    }

    /// Sets the directory `report.pdf` is saved into.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    // ============================================================================
    // State accessors
    // ============================================================================

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// The projection of the selected upload under the current search text.
    pub fn view(&self) -> Option<DashboardView<'_>> {
        DashboardView::project(&self.history, &self.search)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hands pending notices to the presenter.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ============================================================================
    // Mount and authentication
    // ============================================================================

    /// Reads the persisted token once and, when present, starts authenticated
    /// and fetches the history.
    ///
    /// The stored token is trusted optimistically; the first 401 downgrades.
    pub async fn mount(&mut self) -> AuthState {
        let stored = match self.tokens.load_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored session token");
                None
            }
        };

        self.session = stored.map(|token| Session::with_token(token)).unwrap_or_default();
        tracing::info!(state = ?self.state(), "Dashboard mounted");

        if self.session.is_authenticated() {
            self.fetch_history(FetchOrigin::Mount).await;
        }
        self.state()
    }

    /// Logs in and, on success, fetches the history once.
    ///
    /// Any failure is reported as "Invalid credentials" whatever the cause.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let ticket = self.sequencer.issue(RequestKind::Login);
        let result = self.api.login(username, password).await;

        if !self.sequencer.is_current(&ticket) {
            tracing::debug!("Discarding superseded login response");
            return Ok(());
        }

        match result {
            Ok(token) => {
                self.enter_authenticated(token).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(operation = "login", error = %e, "Login failed");
                self.notices.push(Notice::error(notice::INVALID_CREDENTIALS));
                Err(ChemvizError::auth(notice::INVALID_CREDENTIALS))
            }
        }
    }

    /// Validates locally, then creates the account.
    ///
    /// Server error messages are surfaced verbatim; anything else becomes
    /// "Registration failed". The session is left untouched.
    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Result<String> {
        if let Err(validation) = validate_registration(email, password) {
            self.notices.push(Notice::error(validation.to_string()));
            return Err(validation.into());
        }

        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.register(&registration).await {
            Ok(message) => {
                tracing::info!(%username, %message, "Account registered");
                self.notices.push(Notice::info(notice::ACCOUNT_CREATED));
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(operation = "register", error = %e, "Registration failed");
                let message = e
                    .server_message()
                    .unwrap_or(notice::REGISTRATION_FAILED)
                    .to_string();
                self.notices.push(Notice::error(message.clone()));
                Err(match e {
                    ApiError::Network(_) | ApiError::Decode(_) => ChemvizError::transport(message),
                    _ => ChemvizError::auth(message),
                })
            }
        }
    }

    /// Registers and, when that succeeds, logs in with the same credentials.
    pub async fn register_and_login(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<()> {
        self.register(username, email, password).await?;
        self.login(username, password).await
    }

    /// Clears the token and all session state. Never fails and issues no
    /// network call; responses still in flight are discarded on arrival.
    pub async fn logout(&mut self) {
        self.reset_session();
        if let Err(e) = self.tokens.clear_token().await {
            tracing::warn!(error = %e, "Failed to clear stored session token");
        }
        tracing::info!("Logged out");
    }

    async fn enter_authenticated(&mut self, token: String) {
        if let Err(e) = self.tokens.save_token(&token).await {
            // The in-memory session still works; it just won't survive a restart.
            tracing::warn!(error = %e, "Failed to persist session token");
        }
        self.session = Session::with_token(token);
        tracing::info!("Authenticated");
        self.fetch_history(FetchOrigin::Refresh).await;
    }

    fn reset_session(&mut self) {
        self.session.clear();
        self.history.clear();
        self.search.clear();
        self.sequencer.invalidate_all();
    }

    /// Authorization failure from any call: same clearing as logout.
    async fn downgrade(&mut self, operation: &'static str) {
        tracing::warn!(operation, "Authorization rejected; ending session");
        self.notices.push(Notice::error(notice::SESSION_EXPIRED));
        self.logout().await;
    }

    fn require_token(&self) -> Result<String> {
        self.session
            .token()
            .map(str::to_string)
            .ok_or(ChemvizError::Unauthenticated)
    }

    // ============================================================================
    // History
    // ============================================================================

    /// Re-fetches the history on user request.
    pub async fn refresh_history(&mut self) -> Result<()> {
        self.require_token()?;
        self.fetch_history(FetchOrigin::Refresh).await;
        Ok(())
    }

    async fn fetch_history(&mut self, origin: FetchOrigin) {
        let request = self.begin_history_fetch(origin);
        let result = self.api.fetch_history(request.token()).await;
        self.complete_history_fetch(request, result).await;
    }

    pub fn begin_history_fetch(&mut self, origin: FetchOrigin) -> HistoryRequest {
        HistoryRequest {
            ticket: self.sequencer.issue(RequestKind::History),
            origin,
            token: self.session.token().map(str::to_string),
        }
    }

    /// Applies a history response if it is the latest issued.
    ///
    /// Returns whether the response was applied.
    pub async fn complete_history_fetch(
        &mut self,
        request: HistoryRequest,
        result: ApiResult<Vec<UploadRecord>>,
    ) -> bool {
        if !self.sequencer.is_current(&request.ticket) {
            tracing::debug!(seq = request.ticket.seq(), "Discarding stale history response");
            return false;
        }

        match result {
            Ok(list) => {
                tracing::debug!(count = list.len(), "History fetched");
                self.history.on_history_fetched(list);
            }
            Err(ApiError::Unauthorized) if request.token.is_some() => {
                self.downgrade("history").await;
            }
            Err(e) => match request.origin {
                FetchOrigin::Mount => {
                    tracing::debug!(error = %e, "Initial history load failed");
                    self.history.degrade_to_empty();
                }
                FetchOrigin::Refresh => {
                    tracing::warn!(operation = "history", error = %e, "History refresh failed");
                    self.notices.push(Notice::error(notice::HISTORY_FAILED));
                }
            },
        }
        true
    }

    /// Selects a listed upload as the one the dashboard shows.
    pub fn select(&mut self, id: UploadId) -> Result<()> {
        self.require_token()?;
        let record = self.history.select(id)?;
        tracing::debug!(upload_id = %record.id, name = %record.name, "Upload selected");
        Ok(())
    }

    /// Updates the row filter. The projection picks it up immediately.
    pub fn set_search(&mut self, text: impl Into<String>) -> Result<()> {
        self.require_token()?;
        self.search = text.into();
        Ok(())
    }

    // ============================================================================
    // Upload
    // ============================================================================

    /// Uploads `file`, selects the result immediately and then refreshes the
    /// history to reconcile it.
    pub async fn upload(&mut self, file: Option<UploadFile>) -> Result<UploadId> {
        let request = self.begin_upload(file)?;
        let result = self.api.upload(request.token(), request.file()).await;
        let id = self.complete_upload(request, result).await?;
        self.fetch_history(FetchOrigin::Refresh).await;
        Ok(id)
    }

    /// Checks preconditions and issues the upload ticket.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a session, `NoFileSelected` without a file.
    /// Neither reaches the network.
    pub fn begin_upload(&mut self, file: Option<UploadFile>) -> Result<UploadRequest> {
        let token = self.require_token()?;
        let Some(file) = file else {
            self.notices.push(Notice::error(notice::SELECT_FILE_FIRST));
            return Err(ChemvizError::NoFileSelected);
        };

        Ok(UploadRequest {
            ticket: self.sequencer.issue(RequestKind::Upload),
            token,
            file,
        })
    }

    /// Applies an upload response: the record becomes the selection before
    /// any history refresh is issued.
    pub async fn complete_upload(
        &mut self,
        request: UploadRequest,
        result: ApiResult<UploadRecord>,
    ) -> Result<UploadId> {
        if !self.sequencer.is_current(&request.ticket) {
            tracing::debug!(seq = request.ticket.seq(), "Discarding stale upload response");
            return Err(ChemvizError::transport("Upload superseded"));
        }

        match result {
            Ok(record) => {
                let id = record.id;
                tracing::info!(upload_id = %id, file = %request.file.file_name, "Upload succeeded");
                self.history.on_upload_succeeded(record);
                Ok(id)
            }
            Err(ApiError::Unauthorized) => {
                self.notices.push(Notice::error(notice::UPLOAD_FAILED));
                self.downgrade("upload").await;
                Err(ChemvizError::auth(notice::SESSION_EXPIRED))
            }
            Err(e) => {
                tracing::warn!(operation = "upload", error = %e, "Upload failed");
                self.notices.push(Notice::error(notice::UPLOAD_FAILED));
                Err(ChemvizError::transport(notice::UPLOAD_FAILED))
            }
        }
    }

    // ============================================================================
    // Report
    // ============================================================================

    /// Downloads the PDF report and saves it as `report.pdf` in the download
    /// directory. Returns the saved path.
    pub async fn download_report(&mut self) -> Result<PathBuf> {
        let token = self.require_token()?;
        let ticket = self.sequencer.issue(RequestKind::Report);
        let result = self.api.download_report(&token).await;

        if !self.sequencer.is_current(&ticket) {
            tracing::debug!("Discarding stale report response");
            return Err(ChemvizError::transport("Report download superseded"));
        }

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(ApiError::Unauthorized) => {
                self.notices.push(Notice::error(notice::DOWNLOAD_FAILED));
                self.downgrade("report").await;
                return Err(ChemvizError::auth(notice::SESSION_EXPIRED));
            }
            Err(e) => {
                tracing::warn!(operation = "report", error = %e, "Report download failed");
                self.notices.push(Notice::error(notice::DOWNLOAD_FAILED));
                return Err(ChemvizError::transport(notice::DOWNLOAD_FAILED));
            }
        };

        match save_report(&self.download_dir, &bytes).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), size = bytes.len(), "Report saved");
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(operation = "report", error = %e, "Failed to save report");
                self.notices.push(Notice::error(notice::DOWNLOAD_FAILED));
                Err(e)
            }
        }
    }

    /// Asks the backend whether it is alive.
    pub async fn check_health(&self) -> Result<String> {
        self.api.health().await.map_err(|e| {
            tracing::warn!(operation = "health", error = %e, "Health check failed");
            ChemvizError::transport(e.to_string())
        })
    }
}

async fn save_report(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(REPORT_FILE_NAME);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
