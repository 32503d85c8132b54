//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request payload exceeds a configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::ExternalService(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Returns true for errors caused by the client request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
