//! # Feature: Auxiliary Endpoints
//!
//! JSON request/response client for the study endpoints (upload, translate, tts, quiz, ...).
//! Every endpoint answers with at least `{ "success": bool }` plus either a payload or an
//! `error` string.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Upload endpoint path
pub const UPLOAD_ENDPOINT: &str = "/upload";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ApiResponse {
    pub fn ok(payload: Value) -> Self {
        ApiResponse {
            success: true,
            error: None,
            payload: match payload {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            error: Some(error.into()),
            payload: Map::new(),
        }
    }

    /// String field of the payload
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Error text, or a generic one when the server gave none
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// POST `body` as JSON to `endpoint` (a path such as `/translate`)
    async fn post_json(&self, endpoint: &str, body: Value) -> Result<ApiResponse>;

    /// Upload a file as multipart form data
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ApiResponse>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpBackend {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.server_url, endpoint.trim_start_matches('/'))
    }

    /// Endpoints report failures in the body, so non-2xx replies are still parsed
    /// when they carry JSON.
    async fn read_response(endpoint: &str, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read reply from {endpoint}"))?;

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                anyhow::bail!("{} returned {}: {}", endpoint, status, body)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to parse reply from {endpoint}")),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn post_json(&self, endpoint: &str, body: Value) -> Result<ApiResponse> {
        debug!("POST {endpoint}");
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {endpoint}"))?;

        Self::read_response(endpoint, response).await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ApiResponse> {
        debug!("Uploading {file_name} ({} bytes)", bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(UPLOAD_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .context("Failed to connect to upload endpoint")?;

        Self::read_response(UPLOAD_ENDPOINT, response).await
    }
}
