// --- File: crates/frontdesk_gcal/src/resolver.rs ---
//! Tenant-to-calendar identity resolution.
//!
//! Each business owns exactly one provider-side calendar, identified by a
//! `[businessId:<id>]` marker in the calendar description. The marker is
//! authoritative: it lets the mapping be re-derived after a restart, so the
//! in-process cache is only ever an accelerator.

use crate::service::GcalError;
use chrono_tz::Tz;
use frontdesk_common::services::{CalendarProvider, NewCalendar};
use frontdesk_config::GcalConfig;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Marker embedded in a calendar (and event) description to tie the
/// provider resource back to a tenant.
pub fn business_marker(business_id: &str) -> String {
    format!("[businessId:{}]", business_id)
}

/// Whether a description carries the marker for this tenant.
pub fn has_marker(description: Option<&str>, business_id: &str) -> bool {
    description
        .map(|d| d.contains(&business_marker(business_id)))
        .unwrap_or(false)
}

/// Resolves (or provisions) the calendar resource of a tenant.
pub struct CalendarResolver {
    primary_business_id: Option<String>,
    primary_calendar_id: Option<String>,
    default_time_zone: String,
    cache: Mutex<HashMap<String, String>>,
    // One async mutex per tenant around the search-then-provision path, so
    // two concurrent first resolutions cannot both provision a calendar.
    provision_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CalendarResolver {
    pub fn new(config: &GcalConfig) -> Self {
        let configured_tz = config.time_zone.as_deref().unwrap_or("UTC");
        let default_time_zone = match Tz::from_str(configured_tz) {
            Ok(tz) => tz.name().to_string(),
            Err(_) => "UTC".to_string(),
        };

        Self {
            primary_business_id: config.primary_business_id.clone(),
            primary_calendar_id: config.primary_calendar_id.clone(),
            default_time_zone,
            cache: Mutex::new(HashMap::new()),
            provision_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The cached mapping for a tenant, if any.
    pub fn cached(&self, business_id: &str) -> Option<String> {
        self.cache.lock().unwrap().get(business_id).cloned()
    }

    fn remember(&self, business_id: &str, calendar_id: &str) {
        self.cache
            .lock()
            .unwrap()
            .insert(business_id.to_string(), calendar_id.to_string());
    }

    fn provision_gate(&self, business_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.provision_locks
            .lock()
            .unwrap()
            .entry(business_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Resolves the provider calendar id for a tenant.
    ///
    /// Order, first match wins: configured primary tenant, process cache,
    /// provider search for the marker, provisioning. Idempotent: once a
    /// marker-bearing calendar exists, every call returns the same id.
    pub async fn resolve<P>(
        &self,
        provider: &P,
        business_id: &str,
        display_name: Option<&str>,
    ) -> Result<String, GcalError>
    where
        P: CalendarProvider<Error = GcalError>,
    {
        if let (Some(primary_id), Some(calendar_id)) =
            (&self.primary_business_id, &self.primary_calendar_id)
        {
            if primary_id == business_id {
                self.remember(business_id, calendar_id);
                return Ok(calendar_id.clone());
            }
        }

        if let Some(hit) = self.cached(business_id) {
            return Ok(hit);
        }

        let gate = self.provision_gate(business_id);
        let _guard = gate.lock().await;

        // A concurrent resolution may have landed while we waited.
        if let Some(hit) = self.cached(business_id) {
            return Ok(hit);
        }

        let marker = business_marker(business_id);

        let calendars = provider.list_calendars().await?;
        if let Some(found) = calendars
            .iter()
            .find(|calendar| has_marker(calendar.description.as_deref(), business_id))
        {
            debug!(
                "Resolved calendar {} for business {} via marker",
                found.id, business_id
            );
            self.remember(business_id, &found.id);
            return Ok(found.id.clone());
        }

        let summary = match display_name {
            Some(name) => format!("{} Appointments", name),
            None => format!("Appointments ({})", business_id),
        };

        let created = provider
            .create_calendar(NewCalendar {
                summary,
                description: marker,
                time_zone: self.default_time_zone.clone(),
            })
            .await?;

        info!(
            "Provisioned calendar {} for business {}",
            created.id, business_id
        );
        self.remember(business_id, &created.id);
        Ok(created.id)
    }
}
