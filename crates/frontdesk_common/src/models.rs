// --- File: crates/frontdesk_common/src/models.rs ---
//! Domain models shared between the persistence layer and the calendar core.

use serde::{Deserialize, Serialize};

/// Connection state of a tenant's calendar credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalendarConnectionStatus {
    #[default]
    Unconnected,
    Connected,
    NeedsReauth,
}

impl CalendarConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarConnectionStatus::Unconnected => "unconnected",
            CalendarConnectionStatus::Connected => "connected",
            CalendarConnectionStatus::NeedsReauth => "needs_reauth",
        }
    }

    /// Parses the stored string form; unknown values fall back to unconnected.
    pub fn parse(value: &str) -> Self {
        match value {
            "connected" => CalendarConnectionStatus::Connected,
            "needs_reauth" => CalendarConnectionStatus::NeedsReauth,
            _ => CalendarConnectionStatus::Unconnected,
        }
    }
}

/// A tenant. The unit of credential and data isolation.
///
/// Invariant: at most one active refresh credential at a time. The credential
/// is replaced by a successful re-consent and cleared only by the
/// reauthorization-failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    /// IANA time zone of the business, used for display and provisioning.
    pub timezone: Option<String>,
    /// Opaque long-lived provider credential; None until first consent.
    pub calendar_refresh_token: Option<String>,
    pub calendar_connection_status: CalendarConnectionStatus,
    /// RFC3339 stamps; TEXT in storage.
    pub calendar_connected_at: Option<String>,
    pub calendar_needs_reauth_at: Option<String>,
}

/// One booked slot, recorded after the provider event exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Option<i64>,
    pub business_id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: String,
    pub service: Option<String>,
    /// RFC3339.
    pub start_time: String,
    pub end_time: String,
    /// Provider-side event identifier.
    pub event_id: String,
    pub event_link: Option<String>,
    pub meet_link: Option<String>,
    /// "confirmed" today; "cancelled" is reserved.
    pub status: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Lightweight work item mirroring an appointment. Created best-effort;
/// its absence never invalidates the appointment itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionTask {
    pub id: Option<i64>,
    pub business_id: String,
    pub title: String,
    /// RFC3339 due stamp, normally the appointment start.
    pub due_at: String,
    pub event_id: Option<String>,
    pub meet_link: Option<String>,
    pub attendee_email: Option<String>,
    pub created_at: Option<String>,
}
