use axum::Json;

use crate::{
    extractors::AppJson,
    models::claim::{ClaimValidationRequest, ClaimValidationResponse},
    services::claim_validator::{validate_claim, KEYWORD_HINT},
};

/// Stateless check of a single claim; no session involved.
pub async fn validate(AppJson(req): AppJson<ClaimValidationRequest>) -> Json<ClaimValidationResponse> {
    let check = validate_claim(&req.claim);

    let (errors, warnings, info) = if !check.valid {
        (vec![check.message], Vec::new(), Vec::new())
    } else if check.warning {
        (Vec::new(), vec![KEYWORD_HINT.to_string()], vec![check.message])
    } else {
        (Vec::new(), Vec::new(), vec![check.message])
    };

    Json(ClaimValidationResponse {
        claim: req.claim,
        is_valid: check.valid,
        errors,
        warnings,
        info,
    })
}
