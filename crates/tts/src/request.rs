use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::error::TtsError;

/// Extractor for JSON job bodies
///
/// Unlike `axum::Json`, malformed bodies are rejected with the pipeline's
/// own error shape so callers always see `{error, error_type}`.
pub struct ExtractPayload<T>(pub T);

/// Body limit for job requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        if !is_json(&parts.headers) {
            return Err((
                http::StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Content-Type, expected: 'Content-Type: application/json'",
            )
                .into_response());
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                (
                    http::StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body is too large, limit is {BODY_LIMIT_BYTES} bytes"),
                )
                    .into_response()
            } else {
                TtsError::Validation(format!("failed to read request body: {err}")).into_response()
            }
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|e| TtsError::Validation(format!("invalid job payload: {e}")).into_response())
    }
}

/// Accepts `application/json` with optional parameters such as charset
fn is_json(headers: &http::HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
