#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod encode;
mod error;
pub mod fetch;
mod handler;
mod http_client;
pub mod model;
mod request;
mod server;
pub mod text;
mod types;
pub mod validate;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use tracing::Instrument;

pub use error::{ErrorResponse, Result, TtsError};
pub use handler::{RequestHandler, Stage};
pub use model::SpeechModel;
pub use server::PipelineBuilder;
pub use types::{Bitrate, Job, Segment, SynthesisRequest, SynthesisResponse, Waveform};
use request::ExtractPayload;

/// Build the request handler from configuration
pub fn build_handler(config: &voxworker_config::Config) -> anyhow::Result<Arc<RequestHandler>> {
    let handler = Arc::new(
        PipelineBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize speech pipeline: {e}"))?,
    );
    Ok(handler)
}

/// Create the endpoint router for synthesis jobs
pub fn endpoint_router() -> Router<Arc<RequestHandler>> {
    Router::new().route("/runsync", post(run_sync))
}

/// Run one job to completion and return its output
async fn run_sync(
    State(handler): State<Arc<RequestHandler>>,
    ExtractPayload(job): ExtractPayload<Job>,
) -> Result<Json<SynthesisResponse>> {
    let job_id = job.id.as_deref().unwrap_or("-");
    let span = tracing::info_span!("job", job_id);

    let response = async {
        tracing::debug!("synthesis job received");
        handler.handle(&job.input).await
    }
    .instrument(span)
    .await?;

    Ok(Json(response))
}
