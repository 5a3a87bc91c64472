//! Repository for companion tasks

use crate::error::DbError;

pub use frontdesk_common::models::CompanionTask;

/// Repository for companion tasks.
///
/// Creation is best-effort from the booking engine's point of view; a
/// failure here is logged by the caller and never fails the booking.
pub trait TaskRepository {
    /// Create the tasks table if it does not exist yet.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Persist a task, returning it with its id set.
    fn create(
        &self,
        task: CompanionTask,
    ) -> impl std::future::Future<Output = Result<CompanionTask, DbError>> + Send;

    /// All tasks of one business, soonest due first.
    fn list_for_business(
        &self,
        business_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CompanionTask>, DbError>> + Send;
}
