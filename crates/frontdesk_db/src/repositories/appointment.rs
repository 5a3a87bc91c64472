//! Repository for appointment records

use crate::error::DbError;

pub use frontdesk_common::models::Appointment;

/// Repository for appointments.
///
/// Records are created by the booking engine once the provider event exists
/// and are never mutated by the calendar core afterwards.
pub trait AppointmentRepository {
    /// Create the appointments table if it does not exist yet.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Persist an appointment, returning it with its id set.
    fn create(
        &self,
        appointment: Appointment,
    ) -> impl std::future::Future<Output = Result<Appointment, DbError>> + Send;

    /// Find an appointment by its provider event id.
    fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// All appointments of one business, newest first.
    fn list_for_business(
        &self,
        business_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Appointment>, DbError>> + Send;
}
