// File: crates/frontdesk_gcal/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::backfill::BackfillSummary;
use crate::booking::{BookAppointmentRequest, BookingOutcome};

#[utoipa::path(
    get,
    path = "/calendar/events",
    params(
        ("business_id" = String, Query, description = "Tenant identifier"),
        ("time_min" = String, Query, description = "Window start, RFC3339", example = "2025-03-01T00:00:00Z"),
        ("time_max" = String, Query, description = "Window end, RFC3339", example = "2025-03-08T00:00:00Z")
    ),
    responses(
        (status = 200, description = "Events in range",
         example = json!({
             "success": true,
             "events": [
                 {
                     "event_id": "abc123xyz456",
                     "summary": "Consultation: Dana Fox",
                     "description": "Customer: Dana Fox",
                     "start_time": "2025-03-01T10:00:00+00:00",
                     "end_time": "2025-03-01T11:00:00+00:00",
                     "status": "confirmed",
                     "html_link": null
                 }
             ],
             "business_id": "biz-1"
         })
        ),
        (status = 400, description = "Invalid time window",
         example = json!({ "error": "Invalid time_min format (RFC3339)" })
        ),
        (status = 401, description = "Credential expired or missing",
         example = json!({ "error": "google_reauth_required" })
        ),
        (status = 500, description = "Provider error", body = String)
    )
)]
fn doc_list_events_handler() {}

#[utoipa::path(
    post,
    path = "/calendar/book",
    request_body(content = BookAppointmentRequest, example = json!({
        "business_id": "biz-1",
        "customer_name": "Dana Fox",
        "customer_email": "dana@example.com",
        "customer_phone": "+15550100",
        "service": "Consultation",
        "start_time": "2025-03-01T10:00:00Z",
        "end_time": "2025-03-01T11:00:00Z"
    })),
    responses(
        (status = 200, description = "Booking result", body = BookingOutcome,
         example = json!({
             "success": true,
             "appointment_id": 12,
             "event_id": "abc123xyz456",
             "event_link": "https://calendar.example/abc123xyz456",
             "meet_link": "https://meet.example/abc123xyz456",
             "task_id": 7,
             "notification_sent": true,
             "message": "Appointment booked and confirmation sent."
         })
        ),
        (status = 400, description = "Missing or malformed fields",
         example = json!({ "error": "customer_email is required" })
        ),
        (status = 401, description = "Credential expired or missing",
         example = json!({ "error": "google_reauth_required" })
        ),
        (status = 409, description = "Slot already booked",
         example = json!({
             "success": false,
             "error": "slot_conflict",
             "conflicts": []
         })
        ),
        (status = 500, description = "Provider or storage error", body = String)
    )
)]
fn doc_book_appointment_handler() {}

#[utoipa::path(
    post,
    path = "/calendar/tag-legacy",
    params(
        ("business_id" = String, Query, description = "Tenant identifier"),
        ("time_min" = String, Query, description = "Window start, RFC3339"),
        ("time_max" = String, Query, description = "Window end, RFC3339"),
        ("x-admin-secret" = String, Header, description = "Operator secret")
    ),
    responses(
        (status = 200, description = "Backfill counts", body = BackfillSummary,
         example = json!({
             "scanned": 40,
             "eligible": 12,
             "patched": 11,
             "skipped": 0,
             "errors": 1
         })
        ),
        (status = 400, description = "Missing window or business id"),
        (status = 401, description = "Bad operator secret")
    )
)]
fn doc_tag_legacy_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_list_events_handler,
        doc_book_appointment_handler,
        doc_tag_legacy_handler
    ),
    components(
        schemas(
            BookAppointmentRequest,
            BookingOutcome,
            BackfillSummary
        )
    ),
    tags(
        (name = "calendar", description = "Tenant calendar connection and booking API")
    ),
    servers(
        (url = "/api", description = "Main API prefix")
    )
)]
pub struct FrontdeskApiDoc;
