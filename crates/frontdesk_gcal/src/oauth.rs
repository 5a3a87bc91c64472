// --- File: crates/frontdesk_gcal/src/oauth.rs ---
//! OAuth exchange for per-tenant calendar credentials.
//!
//! The state token round-trips `{business_id, purpose, next}` through the
//! provider signed with HMAC-SHA256, so the callback can be attributed to a
//! tenant and a capability without any session state. A tenant may connect
//! several provider scopes independently; `purpose` keeps the callbacks
//! apart.

use crate::service::GcalError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as base64_engine, Engine};
use constant_time_eq::constant_time_eq;
use frontdesk_config::GcalConfig;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Purpose value for the calendar capability.
pub const PURPOSE_CALENDAR: &str = "calendar";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested at consent. Calendar for booking, Gmail send for the
/// confirmation mail that goes out under the tenant's identity.
pub const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/gmail.send",
];

/// Payload carried through the provider in the `state` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthState {
    pub business_id: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("malformed state token")]
    Malformed,
    #[error("state signature mismatch")]
    BadSignature,
}

fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Encodes and signs a state token: `base64url(json) "." hex(hmac)`.
pub fn encode_state(secret: &str, state: &OAuthState) -> Result<String, GcalError> {
    let payload = serde_json::to_vec(state)
        .map_err(|e| GcalError::Auth(format!("Failed to encode state: {}", e)))?;
    let signature = sign(secret, &payload);
    Ok(format!("{}.{}", base64_engine.encode(&payload), signature))
}

/// Verifies and decodes a state token.
pub fn decode_state(secret: &str, token: &str) -> Result<OAuthState, StateError> {
    let (payload_b64, signature) = token.split_once('.').ok_or(StateError::Malformed)?;
    let payload = base64_engine
        .decode(payload_b64)
        .map_err(|_| StateError::Malformed)?;

    let expected = sign(secret, &payload);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(StateError::BadSignature);
    }

    serde_json::from_slice(&payload).map_err(|_| StateError::Malformed)
}

/// Builds the provider consent URL carrying the signed state.
///
/// `access_type=offline` + `prompt=consent` so a refresh token is issued;
/// the provider only returns one on first consent otherwise.
pub fn build_authorize_url(config: &GcalConfig, state: &str) -> Result<String, GcalError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing client_id in GcalConfig".to_string()))?;
    let redirect_uri = config
        .redirect_uri
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing redirect_uri in GcalConfig".to_string()))?;

    let scope = OAUTH_SCOPES.join(" ");
    let query = serde_urlencoded::to_string([
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("scope", scope.as_str()),
        ("access_type", "offline"),
        ("prompt", "consent"),
        ("state", state),
    ])
    .map_err(|e| GcalError::Auth(format!("Failed to encode authorize URL: {}", e)))?;

    Ok(format!("{}?{}", GOOGLE_AUTH_URL, query))
}

/// Token-endpoint response for the authorization-code grant.
#[derive(Deserialize, Debug, Clone)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Exchanges an authorization code for credentials.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &GcalConfig,
    code: &str,
) -> Result<GoogleTokenResponse, GcalError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing client_id in GcalConfig".to_string()))?;
    let client_secret = config
        .client_secret
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing client_secret in GcalConfig".to_string()))?;
    let redirect_uri = config
        .redirect_uri
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing redirect_uri in GcalConfig".to_string()))?;

    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("redirect_uri", redirect_uri),
    ];

    let response = http
        .post(GOOGLE_TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| {
            error!("Failed to reach token endpoint: {}", e);
            GcalError::Auth(format!("Token exchange failed: {}", e))
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(GcalError::Auth(format!(
            "Token endpoint returned {}: {}",
            status, body
        )));
    }

    response
        .json::<GoogleTokenResponse>()
        .await
        .map_err(|e| GcalError::Auth(format!("Token response parse failed: {}", e)))
}

/// The provider only returns a refresh token on first consent; on
/// re-consent the stored credential must survive.
pub fn merge_refresh_token(new: Option<String>, existing: Option<String>) -> Option<String> {
    new.filter(|token| !token.is_empty()).or(existing)
}
