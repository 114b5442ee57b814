//! Transport seam between the controller and the backend.
//!
//! The controller depends only on [`EquipmentApi`]; the HTTP implementation
//! lives in `chemviz-interaction` and tests substitute in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::upload::UploadRecord;

/// Failures reported by an [`EquipmentApi`] call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401: the credential is bad, expired or missing
    #[error("Unauthorized")]
    Unauthorized,

    /// The server answered with a non-success status
    #[error("Server rejected request ({status}){}", message_suffix(.message))]
    Rejected { status: u16, message: Option<String> },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// The server's own error message, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A local CSV file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Registration payload, already validated client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Backend operations consumed by the client.
///
/// Implementations hold no session state: the token is handed in per call.
#[async_trait]
pub trait EquipmentApi: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Creates an account and returns the server's confirmation message.
    async fn register(&self, registration: &Registration) -> ApiResult<String>;

    /// Uploads a CSV and returns the ingested record.
    async fn upload(&self, token: &str, file: &UploadFile) -> ApiResult<UploadRecord>;

    /// Lists past uploads, most recent first. The token is attached when present.
    async fn fetch_history(&self, token: Option<&str>) -> ApiResult<Vec<UploadRecord>>;

    /// Downloads the PDF report for the latest upload.
    async fn download_report(&self, token: &str) -> ApiResult<Vec<u8>>;

    /// Liveness probe.
    async fn health(&self) -> ApiResult<String>;
}
