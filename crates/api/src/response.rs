//! JSON response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use docvault_shared::AppError;

/// Envelope returned by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Human-readable outcome.
    pub message: String,
    /// Stable error code, present on failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    /// Payload, `null` when there is none.
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            error: None,
            data: Some(data),
        }
    }

    /// Successful response without a payload.
    pub fn empty(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            error: None,
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Failure response for an application error.
    #[must_use]
    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: err.status_code(),
            message: err.to_string(),
            error: Some(err.error_code()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Render an application error as an envelope response.
pub fn error_response(err: &AppError) -> Response {
    ApiResponse::from_error(err).into_response()
}
