// --- File: crates/frontdesk_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g., DATABASE_URL loaded via APP_DATABASE__URL or DATABASE_URL
}

// --- Google Calendar / OAuth Config ---
// Holds non-secret OAuth client settings. Secrets are expected via env
// overrides: APP_GCAL__CLIENT_SECRET, APP_GCAL__STATE_SECRET.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GcalConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider for the OAuth callback.
    pub redirect_uri: Option<String>,
    /// HMAC key for the signed OAuth state token.
    pub state_secret: Option<String>,
    /// The operator's own business; resolves straight to `primary_calendar_id`.
    pub primary_business_id: Option<String>,
    pub primary_calendar_id: Option<String>,
    /// Time zone applied to freshly provisioned calendars.
    pub time_zone: Option<String>,
    /// Where the OAuth callback lands when no `next` was carried in state.
    pub connect_success_url: Option<String>,
    /// Error page for failed callbacks; gets a `reason` query parameter.
    pub connect_error_url: Option<String>,
}

// --- Admin / maintenance Config ---
// Secret loaded via env override: APP_ADMIN__SHARED_SECRET
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub shared_secret: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}
