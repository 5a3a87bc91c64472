// File: crates/frontdesk_gcal/src/auth.rs
use crate::service::GcalError;
use frontdesk_config::GcalConfig;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{authorized_user::AuthorizedUserSecret, AuthorizedUserAuthenticator},
    CalendarHub,
};

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;
pub type TenantAuth = google_calendar3::yup_oauth2::authenticator::Authenticator<Connector>;

/// Builds a calendar hub from one tenant's stored refresh credential.
///
/// Returns the hub plus a clone of the authenticator so callers can fetch
/// raw access tokens for sibling APIs (the confirmation mail goes out
/// through the same credential). Building does not hit the network; a dead
/// credential only surfaces on the first provider call.
pub async fn create_tenant_hub(
    config: &GcalConfig,
    refresh_token: &str,
) -> Result<(HubType, TenantAuth), GcalError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing client_id in GcalConfig".to_string()))?;
    let client_secret = config
        .client_secret
        .as_deref()
        .ok_or_else(|| GcalError::Auth("Missing client_secret in GcalConfig".to_string()))?;

    let secret = AuthorizedUserSecret {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        refresh_token: refresh_token.to_string(),
        key_type: "authorized_user".to_string(),
    };

    let auth = AuthorizedUserAuthenticator::builder(secret)
        .build()
        .await
        .map_err(|e| GcalError::Auth(format!("Failed to build authenticator: {}", e)))?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| GcalError::Auth(format!("Failed to load TLS roots: {}", e)))?
        .https_or_http()
        .enable_http1()
        .build();

    // Create client without specifying body type
    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    let hub = CalendarHub::new(client, auth.clone());

    Ok((hub, auth))
}
