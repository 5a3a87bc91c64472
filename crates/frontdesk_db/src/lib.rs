// --- File: crates/frontdesk_db/src/lib.rs ---
//! Persistence for Frontdesk: the tenant credential store plus appointment
//! and companion-task records, behind repository traits so the booking core
//! can be tested without a database.

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
