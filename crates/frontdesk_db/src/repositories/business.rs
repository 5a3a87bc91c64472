//! Repository for businesses (tenants)
//!
//! This is the credential store of the system: one OAuth refresh credential
//! per business plus the connection-status fields the UI banners read.

use crate::error::DbError;

pub use frontdesk_common::models::{Business, CalendarConnectionStatus};

/// Repository for business records and their calendar credentials.
pub trait BusinessRepository {
    /// Create the businesses table if it does not exist yet.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Find a business by id.
    fn find(
        &self,
        business_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Business>, DbError>> + Send;

    /// Insert or update a business record. Credential fields are left
    /// untouched on update; they belong to the credential paths below.
    fn upsert(
        &self,
        business: Business,
    ) -> impl std::future::Future<Output = Result<Business, DbError>> + Send;

    /// Store a freshly obtained refresh credential.
    ///
    /// The token must be non-empty; callers decide the new-vs-existing merge
    /// before calling. Marks the connection `connected`, stamps the
    /// connection time and clears any needs-reauth marker.
    fn save_calendar_credential(
        &self,
        business_id: &str,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Flag the business as needing reauthorization.
    ///
    /// With `clear_token` the stored credential is removed as well, so later
    /// calls fail fast with a no-credential error instead of replaying a
    /// dead token against the provider.
    fn mark_needs_reauth(
        &self,
        business_id: &str,
        clear_token: bool,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;
}
