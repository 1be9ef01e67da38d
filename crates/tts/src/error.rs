use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Failure of a synthesis job, tagged with the stage that produced it
#[derive(Debug, Error)]
pub enum TtsError {
    /// Malformed or missing input, reported verbatim
    #[error("{0}")]
    Validation(String),

    /// Reference audio could not be retrieved
    #[error("Failed to fetch reference audio: {0}")]
    Fetch(String),

    /// The speech model failed to produce audio
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// The waveform could not be compressed
    #[error("Audio encoding failed: {0}")]
    Encoding(String),

    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    /// If Some(message), the detail is safe to show
    /// If None, it's an internal fault and should not leak details
    #[error("Internal server error")]
    Internal(Option<String>),
}

impl TtsError {
    /// Get the appropriate HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Fetch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Synthesis(_) => StatusCode::BAD_GATEWAY,
            Self::Encoding(_) | Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error kind string for the response
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Fetch(_) => "fetch_error",
            Self::Synthesis(_) => "synthesis_error",
            Self::Encoding(_) => "encoding_error",
            Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to callers
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(Some(message)) => message.clone(),
            Self::Internal(None) | Self::Config(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Body returned to the caller for this failure
    pub fn to_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.client_message(),
            error_type: self.error_type(),
        }
    }
}

/// Failure payload, `{ "error": ..., "error_type": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: &'static str,
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
