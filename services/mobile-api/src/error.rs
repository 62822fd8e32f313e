//! Error types for the mobile API service.
//!
//! Every failure surfaces as a single `{"error": "..."}` JSON object; the
//! HTTP status conveys the kind. Underlying causes are logged server-side
//! only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Self::Internal(ref cause) = self {
            tracing::error!(cause = %cause, "Internal API error");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<aura_auth_core::AuthError> for ApiError {
    fn from(err: aura_auth_core::AuthError) -> Self {
        match err.status_code() {
            400 => Self::BadRequest(err.to_string()),
            401 => Self::Unauthorized,
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<aura_billing_core::BillingError> for ApiError {
    fn from(err: aura_billing_core::BillingError) -> Self {
        match err.status_code() {
            400 => Self::BadRequest(err.to_string()),
            404 => Self::NotFound,
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<aura_db::DbError> for ApiError {
    fn from(err: aura_db::DbError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
