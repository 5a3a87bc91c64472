// --- File: crates/frontdesk_gcal/src/classify.rs ---
//! Provider error classification.
//!
//! Every provider failure passes through here exactly once so that the
//! "credential is dead, reconnect" condition is recognized uniformly and is
//! never conflated with a transient provider error. Pure and stateless;
//! call sites own the follow-up (credential invalidation, status mapping).

use crate::service::GcalError;
use serde::Serialize;

/// Fixed error code surfaced to every caller on a reauth condition.
pub const REAUTH_ERROR_CODE: &str = "google_reauth_required";

/// Classification result for one provider failure. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderFailure {
    pub reauth_required: bool,
    pub invalid_grant: bool,
    pub http_status: Option<u16>,
    pub message: String,
}

/// Classifies a raw status/message pair.
///
/// Reauthorization is required when the message carries `invalid_grant`,
/// token expired/revoked phrasing, or the internal sentinel, regardless of
/// which HTTP status the provider attached.
pub fn classify_parts(http_status: Option<u16>, message: &str) -> ProviderFailure {
    let lower = message.to_lowercase();
    let invalid_grant = lower.contains("invalid_grant");
    let token_dead = lower.contains("token") && (lower.contains("expired") || lower.contains("revoked"));
    let sentinel = lower.contains(REAUTH_ERROR_CODE);

    ProviderFailure {
        reauth_required: invalid_grant || token_dead || sentinel,
        invalid_grant,
        http_status,
        message: message.to_string(),
    }
}

/// Classifies a typed Google API error, extracting the HTTP status where
/// the error shape carries one.
pub fn classify_api_error(error: &google_calendar3::Error) -> ProviderFailure {
    let http_status = match error {
        google_calendar3::Error::Failure(response) => Some(response.status().as_u16()),
        google_calendar3::Error::BadRequest(value) => value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|code| code.as_u64())
            .map(|code| code as u16),
        _ => None,
    };

    classify_parts(http_status, &error.to_string())
}

/// Classifies any calendar-core error.
pub fn classify(error: &GcalError) -> ProviderFailure {
    match error {
        GcalError::ApiError(api_error) => classify_api_error(api_error),
        GcalError::NoCredential | GcalError::ReauthRequired => ProviderFailure {
            reauth_required: true,
            invalid_grant: false,
            http_status: Some(401),
            message: error.to_string(),
        },
        other => classify_parts(None, &other.to_string()),
    }
}
