//! Wire shapes of the backend API and their mapping into domain types.

use chemviz_core::upload::{RowRecord, Summary, UploadId, UploadRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body. The upload and register views send `error`; auth failures
/// from the framework send `detail`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn into_message(self) -> Option<String> {
        self.error.or(self.detail).filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of a successful upload. It carries no name or timestamp.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub dataset_id: i64,
    pub summary: Summary,
    #[serde(default)]
    pub rows: Vec<RowRecord>,
}

impl UploadResponse {
    /// Builds the record, taking the name from the local file and the
    /// timestamp from the moment the response was received.
    pub fn into_record(self, file_name: &str, received_at: DateTime<Utc>) -> UploadRecord {
        UploadRecord {
            id: UploadId(self.dataset_id),
            name: file_name.to_string(),
            uploaded_at: received_at,
            rows: self.rows,
            summary: self.summary,
        }
    }
}

/// One entry of the history list.
#[derive(Debug, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub rows: Vec<RowRecord>,
}

impl From<HistoryItem> for UploadRecord {
    fn from(item: HistoryItem) -> Self {
        UploadRecord {
            id: UploadId(item.id),
            name: item.name,
            uploaded_at: item.uploaded_at,
            rows: item.rows,
            summary: item.summary,
        }
    }
}

/// Accepts RFC 3339 timestamps and naive ones (taken as UTC).
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognized timestamp: {}", raw))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// `rows` may be null on entries stored before rows were kept.
fn deserialize_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RowRecord>, D::Error> {
    Ok(Option::<Vec<RowRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
