use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::ClientError;
use crate::models::claim::ClaimSubmissionRequest;
use crate::models::{CreateSessionRequest, LevelConfig, SessionDescriptor, UpdateSessionRequest};
use crate::services::submission::ClaimSink;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// HTTP client for the game session API.
#[derive(Clone)]
pub struct GameApiClient {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl GameApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/api/game/session/{}", self.base_url, session_id)
    }

    /// Not retried: a repeated create would open a second session.
    pub async fn create_session(
        &self,
        player_name: &str,
        level_id: u8,
    ) -> Result<SessionDescriptor, ClientError> {
        let url = format!("{}/api/game/session", self.base_url);
        let body = CreateSessionRequest {
            player_name: player_name.to_string(),
            level_id,
        };

        tracing::debug!("Creating session at {} for level {}", url, level_id);
        let response = self.http.post(&url).json(&body).send().await?;
        decode(response).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionDescriptor, ClientError> {
        let url = self.session_url(session_id);
        retry_async_with_config(self.retry.clone(), ClientError::is_transient, || async {
            match self.http.get(&url).send().await {
                Ok(response) => decode(response).await,
                Err(err) => Err(ClientError::from(err)),
            }
        })
        .await
    }

    pub async fn update_session(
        &self,
        session_id: &str,
        updates: &UpdateSessionRequest,
    ) -> Result<SessionDescriptor, ClientError> {
        let response = self
            .http
            .patch(self.session_url(session_id))
            .json(updates)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        let url = self.session_url(session_id);
        retry_async_with_config(self.retry.clone(), ClientError::is_transient, || async {
            match self.http.delete(&url).send().await {
                Ok(response) => ensure_success(response).await.map(|_| ()),
                Err(err) => Err(ClientError::from(err)),
            }
        })
        .await
    }

    /// Number of sessions the server currently holds.
    pub async fn active_sessions(&self) -> Result<usize, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/stats", self.base_url))
            .send()
            .await?;
        let stats: ServerStats = decode(response).await?;
        Ok(stats.active_sessions)
    }

    pub async fn levels(&self) -> Result<Vec<LevelSummary>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/levels", self.base_url))
            .send()
            .await?;
        decode(response).await
    }
}

#[derive(Debug, serde::Deserialize)]
struct ServerStats {
    active_sessions: usize,
}

/// Level entry as served by `GET /api/levels`.
#[derive(Debug, Clone, serde::Deserialize, PartialEq, Eq)]
pub struct LevelSummary {
    pub id: u8,
    pub title: String,
    pub required_claim_count: usize,
    pub time_limit_seconds: u32,
}

impl LevelSummary {
    pub fn matches(&self, level: &LevelConfig) -> bool {
        self.id == level.id
            && self.required_claim_count == level.required_claim_count
            && self.time_limit_seconds == level.time_limit_seconds
    }
}

#[async_trait]
impl ClaimSink for GameApiClient {
    /// Any 2xx counts as delivered; the body is not read.
    async fn submit_claim(&self, session_id: &str, claim: &str) -> Result<(), ClientError> {
        let url = format!("{}/submit", self.session_url(session_id));
        let body = ClaimSubmissionRequest {
            claim: claim.to_string(),
        };
        let response = self.http.post(&url).json(&body).send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ClientError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    ensure_success(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}
