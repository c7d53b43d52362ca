use serde::{Deserialize, Serialize};

/// Outcome of validating the claim at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub index: usize,
    pub valid: bool,
    pub message: String,
    #[serde(default)]
    pub warning: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateValidation {
    pub results: Vec<ValidationResult>,
    pub has_errors: bool,
}

/// What moved the session out of collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Manual,
    TimerExpired,
}

/// Terminal result of one attempt, produced exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: String,
    pub player_name: String,
    pub level_id: u8,
    pub claims: Vec<String>,
    pub success: bool,
    pub validation: Vec<ValidationResult>,
    pub feedback: Vec<String>,
    pub trigger: SubmitTrigger,
    /// Seconds the countdown had run when the session was submitted.
    pub elapsed_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSubmissionRequest {
    pub claim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSubmissionResponse {
    pub session_id: String,
    pub claim_number: usize,
    pub is_valid: bool,
    pub feedback: String,
}

/// Body of `POST /api/claims/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimValidationRequest {
    pub claim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimValidationResponse {
    pub claim: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}
