use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness check for the worker runtime
///
/// Answers without touching the speech model so a slow model never fails
/// the check.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
