//! Repositories for Frontdesk records
//!
//! Each record type gets a trait (so the calendar core can substitute
//! in-memory fakes in tests) and a SQL implementation over [`crate::DbClient`].

pub mod appointment;
pub mod appointment_sql;
pub mod business;
pub mod business_sql;
pub mod task;
pub mod task_sql;

pub use appointment::AppointmentRepository;
pub use appointment_sql::SqlAppointmentRepository;
pub use business::BusinessRepository;
pub use business_sql::SqlBusinessRepository;
pub use task::TaskRepository;
pub use task_sql::SqlTaskRepository;
