// --- File: crates/frontdesk_gcal/src/service.rs ---
//! Google Calendar provider implementation.
//!
//! This module implements the [`CalendarProvider`] trait over a per-tenant
//! `CalendarHub`, plus the error type every calendar operation in this crate
//! speaks.

use chrono::{DateTime, Utc};
use frontdesk_common::error::HttpStatusCode;
use frontdesk_common::services::{
    BoxFuture, CalendarProvider, CalendarResource, CreatedEvent, EventStub, EventSummary,
    NewCalendar, NewCalendarEvent,
};
use google_calendar3::api::{
    Calendar, ConferenceData, ConferenceSolutionKey, CreateConferenceRequest, Event,
    EventAttendee, EventDateTime,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::auth::HubType;

/// Errors that can occur when interacting with the calendar provider or
/// orchestrating a booking against it.
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Validation error: {0}")]
    Validation(String),
    /// Slot already occupied; carries the conflicting events for display.
    #[error("Booking conflict")]
    Conflict(Vec<EventSummary>),
    /// No refresh credential stored for the business.
    #[error("No calendar credential stored for this business")]
    NoCredential,
    /// The stored credential was rejected by the provider.
    #[error("Calendar authorization expired or revoked")]
    ReauthRequired,
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HttpStatusCode for GcalError {
    fn status_code(&self) -> u16 {
        match self {
            GcalError::TimeParseError(_) | GcalError::Validation(_) => 400,
            GcalError::NoCredential | GcalError::ReauthRequired => 401,
            GcalError::Conflict(_) => 409,
            GcalError::ApiError(_) | GcalError::Auth(_) | GcalError::Storage(_) => 500,
        }
    }
}

/// Google Calendar provider over one tenant's authenticated hub.
pub struct GoogleCalendarProvider {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarProvider {
    /// Create a new provider from a tenant's calendar hub.
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

fn event_time_to_rfc3339(time: Option<EventDateTime>, end_of_day: bool) -> Option<String> {
    match time {
        Some(t) => match t.date_time {
            Some(dt) => Some(dt.to_rfc3339()),
            None => t.date.map(|d| {
                if end_of_day {
                    format!("{}T23:59:59Z", d)
                } else {
                    format!("{}T00:00:00Z", d)
                }
            }),
        },
        None => None,
    }
}

impl CalendarProvider for GoogleCalendarProvider {
    type Error = GcalError;

    /// Enumerates the calendar resources visible to the tenant credential,
    /// following pagination. Used by the identity resolver to find the
    /// marker-bearing calendar after a process restart.
    fn list_calendars(&self) -> BoxFuture<'_, Vec<CalendarResource>, Self::Error> {
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let mut resources = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut call = calendar_hub.calendar_list().list();
                if let Some(token) = &page_token {
                    call = call.page_token(token);
                }
                let (_response, list) = call.doit().await?;

                if let Some(items) = list.items {
                    for entry in items {
                        resources.push(CalendarResource {
                            id: entry.id.unwrap_or_default(),
                            summary: entry.summary.unwrap_or_default(),
                            description: entry.description,
                        });
                    }
                }

                page_token = list.next_page_token;
                if page_token.is_none() {
                    break;
                }
            }

            Ok(resources)
        })
    }

    /// Provisions a new calendar resource carrying the tenant marker in its
    /// description.
    fn create_calendar(
        &self,
        calendar: NewCalendar,
    ) -> BoxFuture<'_, CalendarResource, Self::Error> {
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let new_calendar = Calendar {
                summary: Some(calendar.summary.clone()),
                description: Some(calendar.description.clone()),
                time_zone: Some(calendar.time_zone.clone()),
                ..Default::default()
            };

            let (_response, created) = calendar_hub.calendars().insert(new_calendar).doit().await?;

            info!("Created calendar resource: {:?}", created.id);

            Ok(CalendarResource {
                id: created.id.unwrap_or_default(),
                summary: created.summary.unwrap_or(calendar.summary),
                description: created.description.or(Some(calendar.description)),
            })
        })
    }

    /// Lists events overlapping `[time_min, time_max)`, cancelled events
    /// excluded. This is the conflict-check read of the booking engine and
    /// the body of the events endpoint.
    fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<EventSummary>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let mut events = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut call = calendar_hub
                    .events()
                    .list(&calendar_id)
                    .time_min(time_min)
                    .time_max(time_max)
                    .single_events(true) // Expand recurring events
                    .order_by("startTime");
                if let Some(token) = &page_token {
                    call = call.page_token(token);
                }
                let (_response, events_list) = call.doit().await?;

                if let Some(items) = events_list.items {
                    for event in items {
                        let status = event.status.unwrap_or_else(|| "confirmed".to_string());
                        if status == "cancelled" {
                            continue;
                        }

                        events.push(EventSummary {
                            event_id: event.id.unwrap_or_default(),
                            summary: event.summary.unwrap_or_default(),
                            description: event.description,
                            start_time: event_time_to_rfc3339(event.start, false),
                            end_time: event_time_to_rfc3339(event.end, true),
                            status,
                            html_link: event.html_link,
                        });
                    }
                }

                page_token = events_list.next_page_token;
                if page_token.is_none() {
                    break;
                }
            }

            Ok(events)
        })
    }

    /// Same window with a minimal field projection; the backfill job uses
    /// this to stay cheap over large historical windows.
    fn list_event_stubs(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<EventStub>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let mut stubs = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut call = calendar_hub
                    .events()
                    .list(&calendar_id)
                    .time_min(time_min)
                    .time_max(time_max)
                    .single_events(true)
                    .param("fields", "items(id,description,status),nextPageToken");
                if let Some(token) = &page_token {
                    call = call.page_token(token);
                }
                let (_response, events_list) = call.doit().await?;

                if let Some(items) = events_list.items {
                    for event in items {
                        stubs.push(EventStub {
                            event_id: event.id.unwrap_or_default(),
                            description: event.description,
                            status: event.status.unwrap_or_else(|| "confirmed".to_string()),
                        });
                    }
                }

                page_token = events_list.next_page_token;
                if page_token.is_none() {
                    break;
                }
            }

            Ok(stubs)
        })
    }

    /// Inserts a new event. Provider-side attendee notifications are
    /// suppressed; the booking engine sends its own confirmation.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            if event.end_time <= event.start_time {
                return Err(GcalError::Validation(
                    "End time must be after start time".to_string(),
                ));
            }

            let request_meet_link = event.request_meet_link;

            let mut new_event = Event {
                summary: Some(event.summary),
                description: Some(event.description),
                start: Some(EventDateTime {
                    date_time: Some(event.start_time),
                    time_zone: Some("UTC".to_string()), // Store event times in UTC
                    ..Default::default()
                }),
                end: Some(EventDateTime {
                    date_time: Some(event.end_time),
                    time_zone: Some("UTC".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };

            if let Some(email) = event.attendee_email {
                new_event.attendees = Some(vec![EventAttendee {
                    email: Some(email),
                    ..Default::default()
                }]);
            }

            if request_meet_link {
                new_event.conference_data = Some(ConferenceData {
                    create_request: Some(CreateConferenceRequest {
                        request_id: Some(uuid::Uuid::new_v4().to_string()),
                        conference_solution_key: Some(ConferenceSolutionKey {
                            type_: Some("hangoutsMeet".to_string()),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                });
            }

            let mut call = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .send_updates("none");
            if request_meet_link {
                call = call.conference_data_version(1);
            }

            let (_response, created) = call.doit().await?;

            let meet_link = created.hangout_link.clone().or_else(|| {
                created
                    .conference_data
                    .and_then(|data| data.entry_points)
                    .and_then(|points| {
                        points
                            .into_iter()
                            .find(|p| p.entry_point_type.as_deref() == Some("video"))
                    })
                    .and_then(|p| p.uri)
            });

            Ok(CreatedEvent {
                event_id: created.id.unwrap_or_default(),
                status: created.status.unwrap_or_else(|| "confirmed".to_string()),
                html_link: created.html_link,
                meet_link,
            })
        })
    }

    /// Replaces an event's description; the backfill job uses this to stamp
    /// the tenant marker onto legacy events.
    fn patch_event_description(
        &self,
        calendar_id: &str,
        event_id: &str,
        description: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let description = description.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let patch = Event {
                description: Some(description),
                ..Default::default()
            };

            calendar_hub
                .events()
                .patch(patch, &calendar_id, &event_id)
                .send_updates("none")
                .doit()
                .await?;

            Ok(())
        })
    }
}
