use crate::services::WeatherError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use thiserror::Error as ThisError;

/// Errors returned by the JSON endpoints
#[derive(ThisError, Debug)]
pub enum ApiError {
    /// Missing or malformed client input
    #[error("{0}")]
    BadRequest(String),

    /// Request body above the configured limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Upstream provider answered with an error status
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: Value,
    },

    /// Upstream provider could not be reached
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Missing configuration, processing failures and anything unexpected
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream { status, .. } => *status,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        let message = err.to_string();
        match err {
            WeatherError::Upstream {
                status, details, ..
            } => ApiError::Upstream {
                // Statuses outside 100-999 cannot be forwarded as-is
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
                details,
            },
            WeatherError::Unavailable(_) => ApiError::ServiceUnavailable(message),
            WeatherError::Unexpected(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) => tracing::error!("Internal error: {}", self),
            ApiError::Upstream { status, details, .. } => {
                tracing::error!(status = status.as_u16(), details = %details, "Upstream error: {}", self);
            },
            ApiError::ServiceUnavailable(_) => tracing::error!("Upstream unavailable: {}", self),
            ApiError::BadRequest(_) | ApiError::PayloadTooLarge(_) => {
                tracing::debug!("Client error: {}", self);
            },
        }

        let status = self.status_code();
        let body = match self {
            ApiError::Upstream {
                message, details, ..
            } => json!({ "error": message, "details": details }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
