//! Local claim rules: length bounds, a technical-vocabulary hint, and the
//! all-claims-must-validate pass/fail decision.

use crate::models::claim::{AggregateValidation, ValidationResult};

pub const MIN_CLAIM_CHARS: usize = 20;
pub const MAX_CLAIM_CHARS: usize = 1000;

/// Device, unit, -er suffix, system, method, means, configuration, comprising, feature.
pub const TECHNICAL_KEYWORDS: [&str; 9] = [
    "장치", "부", "기", "시스템", "방법", "수단", "구성", "포함", "특징",
];

const VALID_MESSAGE: &str = "✅ 올바른 형식입니다";
pub const KEYWORD_HINT: &str = "기술 용어가 부족할 수 있습니다 (장치, 구성, 특징 등 포함 권장)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimIssue {
    Empty,
    TooShort { length: usize },
    TooLong { length: usize },
}

impl ClaimIssue {
    pub fn message(&self) -> String {
        match self {
            ClaimIssue::Empty => "청구항 내용이 비어있습니다".to_string(),
            ClaimIssue::TooShort { length } => format!(
                "청구항이 너무 짧습니다 (현재: {}자, 최소: {}자)",
                length, MIN_CLAIM_CHARS
            ),
            ClaimIssue::TooLong { length } => format!(
                "청구항이 너무 깁니다 (현재: {}자, 최대: {}자)",
                length, MAX_CLAIM_CHARS
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCheck {
    pub valid: bool,
    pub message: String,
    /// Valid, but no technical keyword was found. Never blocks submission.
    pub warning: bool,
    pub issue: Option<ClaimIssue>,
}

impl ClaimCheck {
    fn rejected(issue: ClaimIssue) -> Self {
        Self {
            valid: false,
            message: issue.message(),
            warning: false,
            issue: Some(issue),
        }
    }

    pub fn into_result(self, index: usize) -> ValidationResult {
        ValidationResult {
            index,
            valid: self.valid,
            message: self.message,
            warning: self.warning,
        }
    }
}

/// Length in characters of the trimmed claim.
pub fn claim_length(text: &str) -> usize {
    text.trim().chars().count()
}

pub fn has_technical_keyword(text: &str) -> bool {
    TECHNICAL_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Checks run in order empty, too short, too long, keyword hint; the first hit is reported.
pub fn validate_claim(text: &str) -> ClaimCheck {
    let length = claim_length(text);

    if length == 0 {
        return ClaimCheck::rejected(ClaimIssue::Empty);
    }
    if length < MIN_CLAIM_CHARS {
        return ClaimCheck::rejected(ClaimIssue::TooShort { length });
    }
    if length > MAX_CLAIM_CHARS {
        return ClaimCheck::rejected(ClaimIssue::TooLong { length });
    }

    if has_technical_keyword(text) {
        ClaimCheck {
            valid: true,
            message: VALID_MESSAGE.to_string(),
            warning: false,
            issue: None,
        }
    } else {
        ClaimCheck {
            valid: true,
            message: format!("{} (⚠️ 기술용어 권장)", VALID_MESSAGE),
            warning: true,
            issue: None,
        }
    }
}

pub fn validate_all<S: AsRef<str>>(claims: &[S]) -> AggregateValidation {
    let results: Vec<ValidationResult> = claims
        .iter()
        .enumerate()
        .map(|(index, claim)| validate_claim(claim.as_ref()).into_result(index))
        .collect();
    let has_errors = results.iter().any(|r| !r.valid);

    AggregateValidation {
        results,
        has_errors,
    }
}

/// Claims meeting the length floor, regardless of the upper bound or keywords.
pub fn count_length_valid<S: AsRef<str>>(claims: &[S]) -> usize {
    claims
        .iter()
        .filter(|c| claim_length(c.as_ref()) >= MIN_CLAIM_CHARS)
        .count()
}

/// Passes only when enough claims meet the floor and no claim in the set is invalid.
pub fn decide_success<S: AsRef<str>>(claims: &[S], required_count: usize) -> bool {
    count_length_valid(claims) >= required_count && !validate_all(claims).has_errors
}

/// Claims meeting the length floor, with their positions, in order.
pub fn submittable_claims<S: AsRef<str>>(claims: &[S]) -> Vec<(usize, String)> {
    claims
        .iter()
        .enumerate()
        .filter(|(_, claim)| claim_length(claim.as_ref()) >= MIN_CLAIM_CHARS)
        .map(|(index, claim)| (index, claim.as_ref().to_string()))
        .collect()
}

/// Summary lines shown after a submit.
pub fn feedback_messages<S: AsRef<str>>(
    claims: &[S],
    required_count: usize,
    validation: &AggregateValidation,
) -> Vec<String> {
    let valid_count = count_length_valid(claims);
    if valid_count >= required_count && !validation.has_errors {
        return vec!["✅ 모든 청구항이 요구사항을 충족했습니다!".to_string()];
    }

    let mut messages = vec![format!(
        "📊 제출된 청구항: {}개 / {}개 필요",
        valid_count, required_count
    )];
    if validation.has_errors {
        messages.push("⚠️ 일부 청구항이 검증 오류가 있습니다".to_string());
    }
    messages
}

/// Player-facing one-liner for a single check.
pub fn format_validation_result(check: &ClaimCheck) -> String {
    if !check.valid {
        return format!("❌ {}", check.message);
    }
    if check.warning {
        return format!("⚠️ {}", KEYWORD_HINT);
    }
    "✅ 청구항이 유효합니다".to_string()
}
