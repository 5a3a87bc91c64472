// --- File: crates/frontdesk_gcal/src/backfill.rs ---
//! Legacy event tagging.
//!
//! Operator-gated maintenance job that stamps the tenant marker onto
//! historical events that predate per-tenant tagging. Eligibility is
//! "no marker yet", which makes reruns over the same window no-ops.

use crate::resolver::{business_marker, has_marker};
use crate::service::GcalError;
use chrono::{DateTime, Utc};
use frontdesk_common::services::CalendarProvider;
use serde::Serialize;
use tracing::{info, warn};

/// Aggregate counts of one backfill run.
///
/// Invariants: `eligible == patched + skipped + errors`, `scanned >= eligible`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BackfillSummary {
    pub scanned: u64,
    pub eligible: u64,
    pub patched: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Tags every unmarked event in the window with the tenant marker.
///
/// Patches run sequentially to stay inside provider rate limits; a patch
/// failure is counted and the batch continues.
pub async fn tag_legacy_events<P>(
    provider: &P,
    calendar_id: &str,
    business_id: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
) -> Result<BackfillSummary, GcalError>
where
    P: CalendarProvider<Error = GcalError>,
{
    let marker = business_marker(business_id);
    let stubs = provider
        .list_event_stubs(calendar_id, time_min, time_max)
        .await?;

    let mut summary = BackfillSummary {
        scanned: stubs.len() as u64,
        ..Default::default()
    };

    for stub in stubs {
        if has_marker(stub.description.as_deref(), business_id) {
            // Already tagged; not eligible, which is what makes reruns idempotent.
            continue;
        }
        summary.eligible += 1;

        if stub.event_id.is_empty() || stub.status == "cancelled" {
            summary.skipped += 1;
            continue;
        }

        let tagged = match stub.description.as_deref() {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{}\n{}", existing, marker)
            }
            _ => marker.clone(),
        };

        match provider
            .patch_event_description(calendar_id, &stub.event_id, &tagged)
            .await
        {
            Ok(()) => summary.patched += 1,
            Err(e) => {
                warn!("Failed to tag event {}: {}", stub.event_id, e);
                summary.errors += 1;
            }
        }
    }

    info!(
        "Backfill for business {} on calendar {}: scanned {}, eligible {}, patched {}, skipped {}, errors {}",
        business_id,
        calendar_id,
        summary.scanned,
        summary.eligible,
        summary.patched,
        summary.skipped,
        summary.errors
    );

    Ok(summary)
}
