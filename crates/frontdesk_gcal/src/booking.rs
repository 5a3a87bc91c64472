// --- File: crates/frontdesk_gcal/src/booking.rs ---
//! Booking orchestration.
//!
//! One appointment request runs through: validation, calendar resolution,
//! conflict check, event insertion, record persistence, then the
//! best-effort followups (companion task, confirmation mail). The conflict
//! check and the insertion are two separate provider calls; the provider
//! offers no conditional insert, so two concurrent requests can still race
//! past each other. That limitation is accepted, not hidden.

use crate::classify::classify;
use crate::resolver::{business_marker, CalendarResolver};
use crate::service::GcalError;
use chrono::{DateTime, Utc};
use frontdesk_common::models::{Appointment, Business, CompanionTask};
use frontdesk_common::services::{CalendarProvider, MailSender, NewCalendarEvent};
use frontdesk_db::repositories::{AppointmentRepository, BusinessRepository, TaskRepository};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Budget for each best-effort side effect, so a slow mail gateway cannot
/// hold the booking response hostage.
pub const SIDE_EFFECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookAppointmentRequest {
    pub business_id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: String,
    /// Service label shown in the event summary, e.g. "Consultation".
    pub service: Option<String>,
    pub start_time: String, // ISO 8601 format string
    pub end_time: String,   // ISO 8601 format string
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingOutcome {
    pub success: bool,
    pub appointment_id: Option<i64>,
    pub event_id: String,
    pub event_link: Option<String>,
    pub meet_link: Option<String>,
    pub task_id: Option<i64>,
    pub notification_sent: bool,
    pub message: String,
}

/// Parsed, validated slot.
#[derive(Debug, Clone, Copy)]
pub struct BookingSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Validates a booking request without touching the provider.
///
/// Missing required fields and malformed times fail here, before any
/// credential lookup or provider call is made.
pub fn validate_booking_request(request: &BookAppointmentRequest) -> Result<BookingSlot, GcalError> {
    if request.business_id.trim().is_empty() {
        return Err(GcalError::Validation("business_id is required".to_string()));
    }
    if request.customer_name.trim().is_empty() {
        return Err(GcalError::Validation(
            "customer_name is required".to_string(),
        ));
    }
    if request.customer_email.trim().is_empty() {
        return Err(GcalError::Validation(
            "customer_email is required".to_string(),
        ));
    }

    let start = DateTime::parse_from_rfc3339(&request.start_time)
        .map_err(|e| GcalError::TimeParseError(format!("Invalid start_time: {}", e)))?
        .with_timezone(&Utc);
    let end = DateTime::parse_from_rfc3339(&request.end_time)
        .map_err(|e| GcalError::TimeParseError(format!("Invalid end_time: {}", e)))?
        .with_timezone(&Utc);

    if end <= start {
        return Err(GcalError::Validation(
            "End time must be after start time".to_string(),
        ));
    }

    Ok(BookingSlot { start, end })
}

/// The stored credential, or the fail-fast no-credential error.
pub fn require_credential(business: &Business) -> Result<&str, GcalError> {
    business
        .calendar_refresh_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or(GcalError::NoCredential)
}

/// Routes a provider failure through the classifier.
///
/// Every reauth-classified failure invalidates the stored credential,
/// unconditionally, so later calls fail fast instead of replaying a dead
/// token. Other failures pass through unchanged.
pub async fn surface_provider_error<B: BusinessRepository>(
    businesses: &B,
    business_id: &str,
    error: GcalError,
) -> GcalError {
    let failure = classify(&error);
    if failure.reauth_required {
        warn!(
            "Provider rejected credential for business {} (invalid_grant: {}): {}",
            business_id, failure.invalid_grant, failure.message
        );
        if let Err(db_error) = businesses.mark_needs_reauth(business_id, true).await {
            error!(
                "Failed to flag business {} for reauth: {}",
                business_id, db_error
            );
        }
        return GcalError::ReauthRequired;
    }
    error
}

fn event_summary_line(request: &BookAppointmentRequest) -> String {
    match request.service.as_deref() {
        Some(service) if !service.trim().is_empty() => {
            format!("{}: {}", service, request.customer_name)
        }
        _ => format!("Appointment: {}", request.customer_name),
    }
}

fn event_description(request: &BookAppointmentRequest) -> String {
    let mut lines = vec![format!("Customer: {}", request.customer_name)];
    if let Some(phone) = request.customer_phone.as_deref() {
        lines.push(format!("Phone: {}", phone));
    }
    lines.push(format!("Email: {}", request.customer_email));
    if let Some(service) = request.service.as_deref() {
        lines.push(format!("Service: {}", service));
    }
    lines.push(business_marker(&request.business_id));
    lines.join("\n")
}

fn confirmation_body(request: &BookAppointmentRequest, slot: &BookingSlot, meet_link: Option<&str>) -> String {
    let mut body = format!(
        "Hi {},\n\nYour appointment is confirmed.\n\nWhen: {} to {}\n",
        request.customer_name,
        slot.start.to_rfc3339(),
        slot.end.to_rfc3339(),
    );
    if let Some(service) = request.service.as_deref() {
        body.push_str(&format!("Service: {}\n", service));
    }
    if let Some(link) = meet_link {
        body.push_str(&format!("Join: {}\n", link));
    }
    body.push_str("\nSee you then!\n");
    body
}

/// Books one appointment for a business.
///
/// Failure policy per step: validation and credential problems
/// short-circuit before any mutation; a detected conflict short-circuits
/// with the conflicting events; once the provider event exists, only a
/// local-persistence failure is fatal (the provider event intentionally
/// remains, with no compensating delete), and the task/notification steps
/// are logged best-effort.
#[allow(clippy::too_many_arguments)]
pub async fn book_appointment<P, B, A, T, M>(
    provider: &P,
    businesses: &B,
    appointments: &A,
    tasks: &T,
    mailer: &M,
    resolver: &CalendarResolver,
    business: &Business,
    request: BookAppointmentRequest,
) -> Result<BookingOutcome, GcalError>
where
    P: CalendarProvider<Error = GcalError>,
    B: BusinessRepository,
    A: AppointmentRepository,
    T: TaskRepository,
    M: MailSender,
{
    let slot = validate_booking_request(&request)?;

    let calendar_id = match resolver
        .resolve(provider, &business.id, Some(&business.name))
        .await
    {
        Ok(id) => id,
        Err(e) => return Err(surface_provider_error(businesses, &business.id, e).await),
    };

    // Conflict check. Not atomic with the insert below; the provider has
    // no compare-and-swap, so a concurrent booking can still slip in
    // between these two calls.
    let existing = match provider.list_events(&calendar_id, slot.start, slot.end).await {
        Ok(events) => events,
        Err(e) => return Err(surface_provider_error(businesses, &business.id, e).await),
    };
    if !existing.is_empty() {
        info!(
            "Booking conflict for business {}: {} existing event(s) in slot",
            business.id,
            existing.len()
        );
        return Err(GcalError::Conflict(existing));
    }

    let created = match provider
        .insert_event(
            &calendar_id,
            NewCalendarEvent {
                summary: event_summary_line(&request),
                description: event_description(&request),
                start_time: slot.start,
                end_time: slot.end,
                attendee_email: Some(request.customer_email.clone()),
                request_meet_link: true,
            },
        )
        .await
    {
        Ok(created) => created,
        Err(e) => return Err(surface_provider_error(businesses, &business.id, e).await),
    };

    info!(
        "Created event {} for business {}",
        created.event_id, business.id
    );

    // Fast path persistence. The provider event already exists; if this
    // write fails the event is orphaned upstream and the error says so.
    let appointment = appointments
        .create(Appointment {
            id: None,
            business_id: business.id.clone(),
            customer_id: request.customer_id.clone(),
            customer_name: request.customer_name.clone(),
            customer_phone: request.customer_phone.clone(),
            customer_email: request.customer_email.clone(),
            service: request.service.clone(),
            start_time: slot.start.to_rfc3339(),
            end_time: slot.end.to_rfc3339(),
            event_id: created.event_id.clone(),
            event_link: created.html_link.clone(),
            meet_link: created.meet_link.clone(),
            status: "confirmed".to_string(),
            created_at: None,
            updated_at: None,
        })
        .await
        .map_err(|e| {
            error!(
                "Appointment record failed for business {}; provider event {} remains: {}",
                business.id, created.event_id, e
            );
            GcalError::Storage(format!(
                "appointment not recorded (provider event {} exists): {}",
                created.event_id, e
            ))
        })?;

    // Companion task, best-effort.
    let task_id = match tokio::time::timeout(
        SIDE_EFFECT_TIMEOUT,
        tasks.create(CompanionTask {
            id: None,
            business_id: business.id.clone(),
            title: event_summary_line(&request),
            due_at: slot.start.to_rfc3339(),
            event_id: Some(created.event_id.clone()),
            meet_link: created.meet_link.clone(),
            attendee_email: Some(request.customer_email.clone()),
            created_at: None,
        }),
    )
    .await
    {
        Ok(Ok(task)) => task.id,
        Ok(Err(e)) => {
            warn!(
                "Companion task failed for event {}: {}",
                created.event_id, e
            );
            None
        }
        Err(_) => {
            warn!("Companion task timed out for event {}", created.event_id);
            None
        }
    };

    // Confirmation mail through the tenant's own credential, best-effort.
    let notification_sent = match tokio::time::timeout(
        SIDE_EFFECT_TIMEOUT,
        mailer.send_email(
            &request.customer_email,
            &format!("Appointment confirmed: {}", event_summary_line(&request)),
            &confirmation_body(&request, &slot, created.meet_link.as_deref()),
        ),
    )
    .await
    {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(
                "Confirmation mail failed for event {}: {}",
                created.event_id, e
            );
            false
        }
        Err(_) => {
            warn!(
                "Confirmation mail timed out for event {}",
                created.event_id
            );
            false
        }
    };

    let message = if notification_sent {
        "Appointment booked and confirmation sent.".to_string()
    } else {
        "Appointment booked. Confirmation email could not be sent.".to_string()
    };

    Ok(BookingOutcome {
        success: true,
        appointment_id: appointment.id,
        event_id: created.event_id,
        event_link: created.html_link,
        meet_link: created.meet_link,
        task_id,
        notification_sent,
        message,
    })
}
