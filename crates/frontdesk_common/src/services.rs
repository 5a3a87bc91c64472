// --- File: crates/frontdesk_common/src/services.rs ---
//! Service abstractions for external systems.
//!
//! These traits decouple the booking core from the concrete calendar and
//! mail implementations, which makes the orchestration logic testable with
//! in-memory providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A provider-side calendar resource (one per tenant once provisioned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResource {
    pub id: String,
    pub summary: String,
    /// Carries the tenant marker for mapping re-derivation.
    pub description: Option<String>,
}

/// Request to provision a new calendar resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCalendar {
    pub summary: String,
    pub description: String,
    pub time_zone: String,
}

/// An existing event, as listed for conflict checks and the events endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: String,
    pub html_link: Option<String>,
}

/// Minimal event projection used by the backfill job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStub {
    pub event_id: String,
    pub description: Option<String>,
    pub status: String,
}

/// A new event to insert for a booking.
#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_email: Option<String>,
    /// Ask the provider to attach a generated meeting link.
    pub request_meet_link: bool,
}

/// Result of an event insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: String,
    pub status: String,
    pub html_link: Option<String>,
    pub meet_link: Option<String>,
}

/// Operations the booking core needs from a calendar provider, scoped to
/// one tenant's credential.
pub trait CalendarProvider: Send + Sync {
    /// Error type returned by provider operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enumerate the calendar resources the credential can see.
    fn list_calendars(&self) -> BoxFuture<'_, Vec<CalendarResource>, Self::Error>;

    /// Provision a new calendar resource.
    fn create_calendar(&self, calendar: NewCalendar)
        -> BoxFuture<'_, CalendarResource, Self::Error>;

    /// List events overlapping `[time_min, time_max)`, cancelled ones excluded.
    fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<EventSummary>, Self::Error>;

    /// Same window, minimal projection (id, description, status only).
    fn list_event_stubs(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<EventStub>, Self::Error>;

    /// Insert a new event.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error>;

    /// Replace an event's description (used to tag legacy events).
    fn patch_event_description(
        &self,
        calendar_id: &str,
        event_id: &str,
        description: &str,
    ) -> BoxFuture<'_, (), Self::Error>;
}

/// Outbound mail, sent under the tenant's own identity.
pub trait MailSender: Send + Sync {
    /// Error type returned by mail operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a plain-text email.
    fn send_email(&self, to: &str, subject: &str, body: &str)
        -> BoxFuture<'_, (), Self::Error>;
}
