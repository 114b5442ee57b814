//! User-visible notices.
//!
//! Failure notices are generic; the underlying cause goes to the
//! tracing diagnostics instead.

use serde::Serialize;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const ACCOUNT_CREATED: &str = "Account created! Please login.";
pub const SELECT_FILE_FIRST: &str = "Select a file first";
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const DOWNLOAD_FAILED: &str = "Failed to download report";
pub const HISTORY_FAILED: &str = "Failed to load upload history";
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
