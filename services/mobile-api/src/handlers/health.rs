//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// GET /health
///
/// Liveness probe
pub async fn health() -> &'static str {
    "OK"
}

/// GET /ready
///
/// Readiness probe: verifies the database answers
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
