pub mod remote;
mod wav;

use std::path::Path;

use async_trait::async_trait;

pub use remote::RemoteModel;
pub use wav::decode_wav;

use crate::{
    error::{Result, TtsError},
    types::Waveform,
};

/// Opaque text-to-speech capability
///
/// Constructed once per process and shared read-only between requests.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Generate speech for `text`, conditioned on `reference` audio when given
    async fn synthesize(
        &self,
        text: &str,
        reference: Option<&Path>,
        exaggeration: f32,
        cfg_weight: f32,
    ) -> anyhow::Result<Waveform>;

    /// Native output sample rate in Hz
    fn sample_rate(&self) -> u32;

    fn name(&self) -> &str;
}

/// Call the model, surfacing every failure as [`TtsError::Synthesis`]
pub async fn invoke(
    model: &dyn SpeechModel,
    text: &str,
    reference: Option<&Path>,
    exaggeration: f32,
    cfg_weight: f32,
) -> Result<Waveform> {
    tracing::debug!(
        model = model.name(),
        text_len = text.len(),
        has_reference = reference.is_some(),
        exaggeration,
        cfg_weight,
        "invoking speech model"
    );

    let waveform = model
        .synthesize(text, reference, exaggeration, cfg_weight)
        .await
        .map_err(|e| {
            tracing::error!(model = model.name(), "speech synthesis failed: {e:#}");
            TtsError::Synthesis(format!("{e:#}"))
        })?;

    if waveform.is_empty() || waveform.sample_rate == 0 {
        return Err(TtsError::Synthesis("model returned an empty waveform".to_string()));
    }

    Ok(waveform)
}
