use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::GameError;

pub mod claim;
pub mod timer;

/// Difficulty tier of the game. Fixed at compile time, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelConfig {
    pub id: u8,
    pub title: &'static str,
    pub difficulty: &'static str,
    pub description: &'static str,
    pub required_claim_count: usize,
    pub time_limit_seconds: u32,
}

pub static LEVELS: [LevelConfig; 3] = [
    LevelConfig {
        id: 1,
        title: "기본 청구항 작성",
        difficulty: "EASY",
        description: "간단한 독립항을 작성하세요",
        required_claim_count: 1,
        time_limit_seconds: 300,
    },
    LevelConfig {
        id: 2,
        title: "종속항 작성",
        difficulty: "NORMAL",
        description: "독립항을 기반으로 종속항을 작성하세요",
        required_claim_count: 3,
        time_limit_seconds: 600,
    },
    LevelConfig {
        id: 3,
        title: "복합 청구항 세트",
        difficulty: "HARD",
        description: "여러 독립항과 종속항을 포함한 청구항 세트를 작성하세요",
        required_claim_count: 5,
        time_limit_seconds: 900,
    },
];

impl LevelConfig {
    pub fn get(id: u8) -> Option<&'static LevelConfig> {
        LEVELS.iter().find(|level| level.id == id)
    }

    pub fn lookup(id: u8) -> Result<&'static LevelConfig, GameError> {
        Self::get(id).ok_or(GameError::UnknownLevel(id))
    }

    pub fn all() -> &'static [LevelConfig] {
        &LEVELS
    }

    /// Level offered after a successful attempt; `None` once the last level is cleared.
    pub fn next(&self) -> Option<&'static LevelConfig> {
        self.id.checked_add(1).and_then(Self::get)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn accepts_claims(self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::Active)
    }
}

/// Server-side view of a session, returned by every lifecycle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub player_name: String,
    pub level_id: u8,
    pub status: SessionStatus,
    pub required_claim_count: usize,
    pub time_limit_seconds: u32,
    pub claim_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "player_name must be between 1 and 100 characters"
    ))]
    pub player_name: String,

    #[validate(range(min = 1, max = 3, message = "level_id must be between 1 and 3"))]
    pub level_id: u8,
}

/// Partial update for `PATCH /api/game/session/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 1,
        max = 100,
        message = "player_name must be between 1 and 100 characters"
    ))]
    pub player_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}
