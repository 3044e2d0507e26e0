//! Remote sync transport: wire types and the HTTP client

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::SyncableActivity;

const HTTP_TIMEOUT_SECS: u64 = 15;

/// Response to an incremental pull
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Records changed since the requested cursor (or everything on first run)
    pub activities: Vec<SyncableActivity>,
    /// Authoritative server timestamp for cursor advancement
    pub sync_time: String,
}

/// Body of a batch or single-record push
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Mutations to submit; deletions are records with `deleted_at` set
    pub activities: Vec<SyncableActivity>,
    /// Client cursor, letting the server compute its own conflict set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
}

/// Response to a push
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Count of records the server accepted
    pub synced: usize,
    /// Ids the server rejected as conflicting (informational)
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Server-side records newer than what the client just sent
    #[serde(default)]
    pub server_activities: Vec<SyncableActivity>,
    /// Authoritative server timestamp for cursor advancement
    pub sync_time: String,
}

/// Seam between the sync engine and the remote store.
///
/// The engine only sees this trait; tests substitute in-memory fakes for the
/// HTTP implementation.
#[async_trait]
pub trait SyncTransport {
    /// Fetch records changed since `since`; `None` means all records
    async fn pull(&self, token: &str, since: Option<&str>) -> Result<PullResponse>;

    /// Submit a batch of mutations
    async fn push(&self, token: &str, request: &PushRequest) -> Result<PushResponse>;
}

/// HTTP/JSON implementation of [`SyncTransport`]
#[derive(Clone)]
pub struct HttpSyncTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    /// Create a transport against the given API base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { base_url, client })
    }

    fn activities_url(&self) -> String {
        format!("{}/api/activities", self.base_url)
    }
}

#[async_trait]
impl SyncTransport for HttpSyncTransport {
    async fn pull(&self, token: &str, since: Option<&str>) -> Result<PullResponse> {
        let mut request = self.client.get(self.activities_url()).bearer_auth(token);
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<PullResponse>().await?)
    }

    async fn push(&self, token: &str, request: &PushRequest) -> Result<PushResponse> {
        let response = self
            .client
            .post(self.activities_url())
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<PushResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "API base URL must not be empty".to_string(),
        ));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
