// --- File: crates/frontdesk_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for Frontdesk crates that do not carry their own.
///
/// Feature crates keep their own thiserror enums; this one covers glue code
/// (startup, config plumbing) and provides the shared status-code mapping.
#[derive(Error, Debug)]
pub enum FrontdeskError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., resource already booked)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
///
/// Implemented by error types so the HTTP layer can map domain errors
/// onto status codes in one place.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for FrontdeskError {
    fn status_code(&self) -> u16 {
        match self {
            FrontdeskError::ConfigError(_) => 500,
            FrontdeskError::AuthError(_) => 401,
            FrontdeskError::ValidationError(_) => 400,
            FrontdeskError::DatabaseError(_) => 500,
            FrontdeskError::ExternalServiceError { .. } => 502,
            FrontdeskError::ConflictError(_) => 409,
            FrontdeskError::NotFoundError(_) => 404,
            FrontdeskError::InternalError(_) => 500,
        }
    }
}

impl From<std::io::Error> for FrontdeskError {
    fn from(err: std::io::Error) -> Self {
        FrontdeskError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for FrontdeskError {
    fn from(err: serde_json::Error) -> Self {
        FrontdeskError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> FrontdeskError {
    FrontdeskError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> FrontdeskError {
    FrontdeskError::ValidationError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> FrontdeskError {
    FrontdeskError::InternalError(message.to_string())
}
