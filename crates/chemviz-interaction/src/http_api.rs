//! HttpEquipmentApi - REST client for the equipment analyzer backend.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST token/` login
//! - `POST register/`
//! - `POST upload/` multipart CSV upload
//! - `GET history/`
//! - `GET report/` PDF report
//! - `GET health/`

use async_trait::async_trait;
use chemviz_core::api::{ApiError, ApiResult, EquipmentApi, Registration, UploadFile};
use chemviz_core::config::ClientConfig;
use chemviz_core::upload::UploadRecord;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::dto::{
    ErrorResponse, HealthResponse, HistoryItem, LoginRequest, MessageResponse, RegisterRequest,
    TokenResponse, UploadResponse,
};

const CSV_MIME: &str = "text/csv";

/// Transport client implementing [`EquipmentApi`] over HTTP.
#[derive(Clone)]
pub struct HttpEquipmentApi {
    client: Client,
    config: ClientConfig,
}

impl HttpEquipmentApi {
    /// Creates a client for `config.api_base_url` with the configured timeout.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// Sends a request and maps transport failures and error statuses.
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(operation, error = %e, "Request failed before a response");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!(operation, "Server answered 401");
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ErrorResponse::parse(&body).into_message();
            tracing::debug!(operation, status = status.as_u16(), ?message, "Server rejected request");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> ApiResult<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::debug!(operation, error = %e, "Failed to decode response");
            ApiError::Decode(e.to_string())
        })
    }

    fn bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl EquipmentApi for HttpEquipmentApi {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let request = self
            .client
            .post(self.url("token/"))
            .json(&LoginRequest { username, password });

        let response = self.send("login", request).await?;
        let token: TokenResponse = Self::decode("login", response).await?;
        Ok(token.access)
    }

    async fn register(&self, registration: &Registration) -> ApiResult<String> {
        let request = self.client.post(self.url("register/")).json(&RegisterRequest {
            username: &registration.username,
            email: &registration.email,
            password: &registration.password,
        });

        let response = self.send("register", request).await?;
        let body: MessageResponse = Self::decode("register", response).await?;
        Ok(body
            .message
            .unwrap_or_else(|| "User created successfully".to_string()))
    }

    async fn upload(&self, token: &str, file: &UploadFile) -> ApiResult<UploadRecord> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(CSV_MIME)
            .map_err(|e| ApiError::Network(format!("Invalid upload part: {}", e)))?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(self.url("upload/"))
            .bearer_auth(token)
            .multipart(form);

        let response = self.send("upload", request).await?;
        let body: UploadResponse = Self::decode("upload", response).await?;
        if let Some(message) = &body.message {
            tracing::info!(dataset_id = body.dataset_id, %message, "Upload accepted");
        }
        Ok(body.into_record(&file.file_name, Utc::now()))
    }

    async fn fetch_history(&self, token: Option<&str>) -> ApiResult<Vec<UploadRecord>> {
        let request = Self::bearer(self.client.get(self.url("history/")), token);

        let response = self.send("history", request).await?;
        let items: Vec<HistoryItem> = Self::decode("history", response).await?;
        Ok(items.into_iter().map(UploadRecord::from).collect())
    }

    async fn download_report(&self, token: &str) -> ApiResult<Vec<u8>> {
        let request = self.client.get(self.url("report/")).bearer_auth(token);

        let response = self.send("report", request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Report stream interrupted: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> ApiResult<String> {
        let response = self.send("health", self.client.get(self.url("health/"))).await?;
        let body: HealthResponse = Self::decode("health", response).await?;
        Ok(body.status)
    }
}
