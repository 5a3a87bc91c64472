// --- File: crates/frontdesk_gcal/src/routes.rs ---

use crate::handlers::{
    book_appointment_handler, connect_google_handler, list_events_handler,
    oauth_callback_handler, tag_legacy_handler, GcalState,
};
use crate::resolver::CalendarResolver;
use axum::{
    routing::{get, post},
    Router,
};
use frontdesk_config::AppConfig;
use frontdesk_db::DbClient;
use std::sync::Arc;

/// Creates a router containing all routes for the calendar feature.
pub fn routes(config: Arc<AppConfig>, db: DbClient) -> Router {
    let gcal_config = config.gcal.clone().unwrap_or_default();
    let state = Arc::new(GcalState {
        config,
        db,
        resolver: Arc::new(CalendarResolver::new(&gcal_config)),
        http: reqwest::Client::new(),
    });

    Router::new()
        .route("/oauth/google/connect", get(connect_google_handler))
        .route("/oauth/callback", get(oauth_callback_handler))
        .route("/calendar/events", get(list_events_handler))
        .route("/calendar/book", post(book_appointment_handler))
        .route("/calendar/tag-legacy", post(tag_legacy_handler))
        .with_state(state)
}
