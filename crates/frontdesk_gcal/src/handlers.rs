// File: crates/frontdesk_gcal/src/handlers.rs
use crate::auth::create_tenant_hub;
use crate::backfill::{tag_legacy_events, BackfillSummary};
use crate::booking::{
    book_appointment, require_credential, surface_provider_error, validate_booking_request,
    BookAppointmentRequest, BookingOutcome,
};
use crate::classify::REAUTH_ERROR_CODE;
use crate::notify::GmailMailSender;
use crate::oauth::{
    build_authorize_url, decode_state, encode_state, exchange_code, merge_refresh_token,
    OAuthState, PURPOSE_CALENDAR,
};
use crate::resolver::CalendarResolver;
use crate::service::{GcalError, GoogleCalendarProvider};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Json, Redirect},
};
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use frontdesk_common::error::HttpStatusCode;
use frontdesk_common::models::Business;
use frontdesk_common::services::{CalendarProvider, EventSummary};
use frontdesk_config::{AppConfig, GcalConfig};
use frontdesk_db::repositories::{
    BusinessRepository, SqlAppointmentRepository, SqlBusinessRepository, SqlTaskRepository,
};
use frontdesk_db::DbClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Header carrying the operator secret for maintenance endpoints.
const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

// Define shared state needed by calendar handlers
#[derive(Clone)]
pub struct GcalState {
    pub config: Arc<AppConfig>,
    pub db: DbClient,
    pub resolver: Arc<CalendarResolver>,
    pub http: reqwest::Client,
}

fn error_response(error: &GcalError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match error {
        GcalError::Conflict(conflicts) => json!({
            "success": false,
            "error": "slot_conflict",
            "conflicts": conflicts,
        }),
        GcalError::NoCredential | GcalError::ReauthRequired => json!({
            "error": REAUTH_ERROR_CODE,
        }),
        other => json!({ "error": other.to_string() }),
    };
    (status, Json(body))
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn gcal_config(state: &GcalState) -> Result<&GcalConfig, (StatusCode, Json<Value>)> {
    state.config.gcal.as_ref().ok_or_else(|| {
        error!("GCal configuration missing in AppConfig.");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Server configuration error: GCal config missing." })),
        )
    })
}

fn parse_time(value: &str, field: &str) -> Result<DateTime<Utc>, (StatusCode, Json<Value>)> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| bad_request(&format!("Invalid {} format (RFC3339)", field)))
}

async fn load_business(
    state: &GcalState,
    business_id: &str,
) -> Result<Business, (StatusCode, Json<Value>)> {
    let businesses = SqlBusinessRepository::new(state.db.clone());
    match businesses.find(business_id).await {
        Ok(Some(business)) => Ok(business),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown business: {}", business_id) })),
        )),
        Err(e) => {
            error!("Failed to load business {}: {}", business_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load business record" })),
            ))
        }
    }
}

// --- OAuth connect & callback ---

#[derive(Deserialize, Debug)]
pub struct ConnectQuery {
    pub business_id: String,
    pub next: Option<String>,
}

/// Handler to start the provider consent flow for a business.
#[axum::debug_handler]
pub async fn connect_google_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let gcal = gcal_config(&state)?;
    let secret = gcal.state_secret.as_deref().ok_or_else(|| {
        error!("state_secret missing in GcalConfig.");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Server configuration error: state secret missing." })),
        )
    })?;

    let oauth_state = OAuthState {
        business_id: query.business_id,
        purpose: PURPOSE_CALENDAR.to_string(),
        next: query.next,
    };
    let token = encode_state(secret, &oauth_state).map_err(|e| error_response(&e))?;
    let url = build_authorize_url(gcal, &token).map_err(|e| error_response(&e))?;

    Ok(Redirect::temporary(&url))
}

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn error_redirect(config: &GcalConfig, reason: &str) -> Redirect {
    let base = config
        .connect_error_url
        .clone()
        .unwrap_or_else(|| "/connect/error".to_string());
    let separator = if base.contains('?') { '&' } else { '?' };
    Redirect::temporary(&format!("{}{}reason={}", base, separator, reason))
}

/// Handler for the OAuth callback.
///
/// Never errors out of the redirect contract: every failure mode lands on
/// the error page with a machine-readable `reason`.
#[axum::debug_handler]
pub async fn oauth_callback_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let gcal = state.config.gcal.clone().unwrap_or_default();

    let (Some(code), Some(state_token)) = (query.code, query.state) else {
        return error_redirect(&gcal, "missing_code_or_state");
    };

    let Some(secret) = gcal.state_secret.as_deref() else {
        error!("state_secret missing in GcalConfig; cannot verify callback.");
        return error_redirect(&gcal, "exception");
    };

    let oauth_state = match decode_state(secret, &state_token) {
        Ok(decoded) => decoded,
        Err(e) => {
            info!("Rejecting OAuth callback: {}", e);
            return error_redirect(&gcal, "bad_state");
        }
    };

    let businesses = SqlBusinessRepository::new(state.db.clone());
    let business = match businesses.find(&oauth_state.business_id).await {
        Ok(Some(business)) => business,
        _ => return error_redirect(&gcal, "bad_business"),
    };

    let tokens = match exchange_code(&state.http, &gcal, &code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("OAuth code exchange failed: {}", e);
            return error_redirect(&gcal, "exception");
        }
    };

    // The provider only returns a refresh token on first consent; keep the
    // stored credential rather than overwrite it with nothing.
    let Some(refresh_token) =
        merge_refresh_token(tokens.refresh_token, business.calendar_refresh_token)
    else {
        return error_redirect(&gcal, "no_refresh_token");
    };

    if let Err(e) = businesses
        .save_calendar_credential(&business.id, &refresh_token)
        .await
    {
        error!("Failed to persist credential for {}: {}", business.id, e);
        return error_redirect(&gcal, "exception");
    }

    info!("Calendar connected for business {}", business.id);

    let next = oauth_state
        .next
        .or_else(|| gcal.connect_success_url.clone())
        .unwrap_or_else(|| "/".to_string());
    let separator = if next.contains('?') { '&' } else { '?' };
    Redirect::temporary(&format!(
        "{}{}{}=connected",
        next, separator, oauth_state.purpose
    ))
}

// --- Calendar events ---

#[derive(Deserialize, Debug)]
pub struct EventsQuery {
    #[serde(alias = "businessId")]
    pub business_id: String,
    #[serde(alias = "timeMin")]
    pub time_min: String,
    #[serde(alias = "timeMax")]
    pub time_max: String,
}

#[derive(Serialize, Debug)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<EventSummary>,
    pub business_id: String,
}

/// Handler to list a business's events in a time range.
#[axum::debug_handler]
pub async fn list_events_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, (StatusCode, Json<Value>)> {
    let gcal = gcal_config(&state)?;
    let time_min = parse_time(&query.time_min, "time_min")?;
    let time_max = parse_time(&query.time_max, "time_max")?;

    let business = load_business(&state, &query.business_id).await?;
    let refresh_token = require_credential(&business).map_err(|e| error_response(&e))?;

    let (hub, _auth) = create_tenant_hub(gcal, refresh_token)
        .await
        .map_err(|e| error_response(&e))?;
    let provider = GoogleCalendarProvider::new(Arc::new(hub));
    let businesses = SqlBusinessRepository::new(state.db.clone());

    let calendar_id = match state
        .resolver
        .resolve(&provider, &business.id, Some(&business.name))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            let surfaced = surface_provider_error(&businesses, &business.id, e).await;
            return Err(error_response(&surfaced));
        }
    };

    let events = match provider.list_events(&calendar_id, time_min, time_max).await {
        Ok(events) => events,
        Err(e) => {
            let surfaced = surface_provider_error(&businesses, &business.id, e).await;
            return Err(error_response(&surfaced));
        }
    };

    Ok(Json(EventsResponse {
        success: true,
        events,
        business_id: business.id,
    }))
}

// --- Booking ---

/// Handler to book an appointment.
#[axum::debug_handler]
pub async fn book_appointment_handler(
    State(state): State<Arc<GcalState>>,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<Json<BookingOutcome>, (StatusCode, Json<Value>)> {
    let gcal = gcal_config(&state)?;

    // Validation first: a malformed request never reaches the provider,
    // and never costs a credential lookup either.
    validate_booking_request(&payload).map_err(|e| error_response(&e))?;

    let business = load_business(&state, &payload.business_id).await?;
    let refresh_token = require_credential(&business).map_err(|e| error_response(&e))?;

    let (hub, auth) = create_tenant_hub(gcal, refresh_token)
        .await
        .map_err(|e| error_response(&e))?;
    let provider = GoogleCalendarProvider::new(Arc::new(hub));
    let mailer = GmailMailSender::new(state.http.clone(), auth);
    let businesses = SqlBusinessRepository::new(state.db.clone());
    let appointments = SqlAppointmentRepository::new(state.db.clone());
    let tasks = SqlTaskRepository::new(state.db.clone());

    match book_appointment(
        &provider,
        &businesses,
        &appointments,
        &tasks,
        &mailer,
        state.resolver.as_ref(),
        &business,
        payload,
    )
    .await
    {
        Ok(outcome) => {
            info!(
                "Booked event {} for business {} (notification_sent: {})",
                outcome.event_id, business.id, outcome.notification_sent
            );
            Ok(Json(outcome))
        }
        Err(e) => Err(error_response(&e)),
    }
}

// --- Legacy backfill ---

#[derive(Deserialize, Debug)]
pub struct TagLegacyQuery {
    #[serde(alias = "businessId")]
    pub business_id: String,
    #[serde(alias = "timeMin")]
    pub time_min: String,
    #[serde(alias = "timeMax")]
    pub time_max: String,
}

/// Handler for the operator-gated legacy tagging job.
#[axum::debug_handler]
pub async fn tag_legacy_handler(
    State(state): State<Arc<GcalState>>,
    headers: HeaderMap,
    Query(query): Query<TagLegacyQuery>,
) -> Result<Json<BackfillSummary>, (StatusCode, Json<Value>)> {
    let expected_secret = state
        .config
        .admin
        .as_ref()
        .and_then(|admin| admin.shared_secret.clone())
        .ok_or_else(|| {
            error!("Admin shared secret not configured.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Server configuration error: admin secret missing." })),
            )
        })?;

    let provided_secret = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": format!("Missing {} header", ADMIN_SECRET_HEADER) })),
            )
        })?;

    if !constant_time_eq(provided_secret.as_bytes(), expected_secret.as_bytes()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid admin secret" })),
        ));
    }

    let gcal = gcal_config(&state)?;
    let time_min = parse_time(&query.time_min, "time_min")?;
    let time_max = parse_time(&query.time_max, "time_max")?;

    let business = load_business(&state, &query.business_id).await?;
    let refresh_token = require_credential(&business).map_err(|e| error_response(&e))?;

    let (hub, _auth) = create_tenant_hub(gcal, refresh_token)
        .await
        .map_err(|e| error_response(&e))?;
    let provider = GoogleCalendarProvider::new(Arc::new(hub));
    let businesses = SqlBusinessRepository::new(state.db.clone());

    let calendar_id = match state
        .resolver
        .resolve(&provider, &business.id, Some(&business.name))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            let surfaced = surface_provider_error(&businesses, &business.id, e).await;
            return Err(error_response(&surfaced));
        }
    };

    match tag_legacy_events(&provider, &calendar_id, &business.id, time_min, time_max).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            let surfaced = surface_provider_error(&businesses, &business.id, e).await;
            Err(error_response(&surfaced))
        }
    }
}
