use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::SessionStoreError;
use crate::metrics::{CLAIMS_RECEIVED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::claim::ClaimSubmissionResponse;
use crate::models::{
    CreateSessionRequest, LevelConfig, SessionDescriptor, SessionStatus, UpdateSessionRequest,
};
use crate::services::claim_validator::validate_claim;
use crate::services::game_controller::SessionParams;

struct SessionRecord {
    descriptor: SessionDescriptor,
    claims: Vec<String>,
}

/// In-memory registry behind the session HTTP API.
#[derive(Default)]
pub struct SessionService {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<SessionDescriptor, SessionStoreError> {
        let player_name = req.player_name.trim().to_string();
        let req = CreateSessionRequest {
            player_name,
            level_id: req.level_id,
        };
        req.validate()
            .map_err(|e| SessionStoreError::InvalidRequest(format!("Validation error: {}", e)))?;
        let level = LevelConfig::lookup(req.level_id)
            .map_err(|e| SessionStoreError::InvalidRequest(e.to_string()))?;

        let mut sessions = self.sessions.write().await;
        let session_id = loop {
            let candidate = SessionParams::generate_session_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let now = Utc::now();
        let descriptor = SessionDescriptor {
            session_id: session_id.clone(),
            player_name: req.player_name,
            level_id: level.id,
            status: SessionStatus::Active,
            required_claim_count: level.required_claim_count,
            time_limit_seconds: level.time_limit_seconds,
            claim_count: 0,
            created_at: now,
            updated_at: now,
        };

        sessions.insert(
            session_id.clone(),
            SessionRecord {
                descriptor: descriptor.clone(),
                claims: Vec::new(),
            },
        );

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        SESSIONS_ACTIVE.inc();

        tracing::info!(
            session_id = %session_id,
            level_id = level.id,
            "session created"
        );

        Ok(descriptor)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionDescriptor, SessionStoreError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|record| record.descriptor.clone())
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))
    }

    pub async fn update_session(
        &self,
        session_id: &str,
        req: UpdateSessionRequest,
    ) -> Result<SessionDescriptor, SessionStoreError> {
        let player_name = req.player_name.as_deref().map(str::trim).map(str::to_string);
        let req = UpdateSessionRequest {
            player_name,
            status: req.status,
        };
        req.validate()
            .map_err(|e| SessionStoreError::InvalidRequest(format!("Validation error: {}", e)))?;

        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;
        let descriptor = &mut record.descriptor;

        if let Some(status) = req.status {
            if !descriptor.status.accepts_claims() && status != descriptor.status {
                return Err(SessionStoreError::Closed(session_id.to_string()));
            }
            if descriptor.status.accepts_claims() && !status.accepts_claims() {
                SESSIONS_ACTIVE.dec();
                let label = match status {
                    SessionStatus::Completed => "completed",
                    _ => "abandoned",
                };
                SESSIONS_TOTAL.with_label_values(&[label]).inc();
            }
            descriptor.status = status;
        }
        if let Some(player_name) = req.player_name {
            descriptor.player_name = player_name;
        }
        descriptor.updated_at = Utc::now();

        tracing::info!(
            session_id = %session_id,
            status = ?descriptor.status,
            "session updated"
        );

        Ok(descriptor.clone())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), SessionStoreError> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;

        if removed.descriptor.status.accepts_claims() {
            SESSIONS_ACTIVE.dec();
        }
        SESSIONS_TOTAL.with_label_values(&["deleted"]).inc();
        tracing::info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    /// Records one claim; only claims that pass local validation are stored.
    pub async fn submit_claim(
        &self,
        session_id: &str,
        claim: &str,
    ) -> Result<ClaimSubmissionResponse, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;

        if !record.descriptor.status.accepts_claims() {
            return Err(SessionStoreError::Closed(session_id.to_string()));
        }

        let check = validate_claim(claim);
        CLAIMS_RECEIVED_TOTAL
            .with_label_values(&[if check.valid { "true" } else { "false" }])
            .inc();

        if !check.valid {
            tracing::debug!(session_id = %session_id, message = %check.message, "claim rejected");
            return Err(SessionStoreError::InvalidClaim(check.message));
        }

        record.claims.push(claim.trim().to_string());
        record.descriptor.claim_count = record.claims.len();
        record.descriptor.updated_at = Utc::now();

        Ok(ClaimSubmissionResponse {
            session_id: session_id.to_string(),
            claim_number: record.claims.len(),
            is_valid: true,
            feedback: check.message,
        })
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
