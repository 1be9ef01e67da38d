use std::{path::Path, sync::Arc, time::Duration};

use serde_json::{Map, Value};

use crate::{
    encode,
    error::{Result, TtsError},
    fetch::{AudioFetcher, StagedAudio},
    model::{self, SpeechModel},
    types::{Segment, SynthesisRequest, SynthesisResponse, Waveform},
    validate::{PauseLimits, validate_with},
};

/// Pipeline stage a job is in, used for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Validating,
    Fetching,
    Synthesizing,
    Encoding,
    Responding,
}

/// Runs one job from raw input to encoded response
///
/// Stages run strictly in sequence. A staged reference clip is released
/// before `handle` returns, whatever the outcome.
pub struct RequestHandler {
    model: Arc<dyn SpeechModel>,
    fetcher: AudioFetcher,
    limits: PauseLimits,
}

impl RequestHandler {
    pub const fn new(model: Arc<dyn SpeechModel>, fetcher: AudioFetcher, limits: PauseLimits) -> Self {
        Self { model, fetcher, limits }
    }

    /// Native sample rate of the shared model
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    /// Process one job input
    pub async fn handle(&self, input: &Map<String, Value>) -> Result<SynthesisResponse> {
        let mut stage = Stage::Validating;

        let result = self.execute(input, &mut stage).await;

        match &result {
            Ok(response) => tracing::info!(
                sample_rate = response.sample_rate,
                payload_len = response.audio_base64.len(),
                "synthesis job completed"
            ),
            Err(e) => tracing::warn!(
                %stage,
                error_type = e.error_type(),
                "synthesis job failed: {e}"
            ),
        }

        result
    }

    async fn execute(&self, input: &Map<String, Value>, stage: &mut Stage) -> Result<SynthesisResponse> {
        enter(stage, Stage::Validating);
        let request = validate_with(input, &self.limits)?;

        let staged = if request.audio_prompt_url.is_some() {
            enter(stage, Stage::Fetching);
            self.fetcher.fetch(request.audio_prompt_url.as_ref()).await?
        } else {
            None
        };

        let result = self.render(&request, staged.as_ref(), stage).await;

        if let Some(staged) = staged {
            staged.release();
        }

        result
    }

    async fn render(
        &self,
        request: &SynthesisRequest,
        staged: Option<&StagedAudio>,
        stage: &mut Stage,
    ) -> Result<SynthesisResponse> {
        enter(stage, Stage::Synthesizing);
        let waveform = self.synthesize(request, staged.map(StagedAudio::path)).await?;

        enter(stage, Stage::Encoding);
        let sample_rate = waveform.sample_rate;
        let bitrate = request.bitrate;
        let audio_base64 = tokio::task::spawn_blocking(move || encode::encode(&waveform, bitrate))
            .await
            .map_err(|e| {
                tracing::error!("encoding task failed: {e}");
                TtsError::Internal(None)
            })??;

        enter(stage, Stage::Responding);
        Ok(SynthesisResponse::mp3(audio_base64, sample_rate))
    }

    /// Synthesize every speech segment and splice in pause silence
    async fn synthesize(&self, request: &SynthesisRequest, reference: Option<&Path>) -> Result<Waveform> {
        let mut pieces = Vec::with_capacity(request.segments.len());

        for segment in &request.segments {
            match segment {
                Segment::Speech(text) => {
                    let waveform = model::invoke(
                        self.model.as_ref(),
                        text,
                        reference,
                        request.exaggeration,
                        request.cfg_weight,
                    )
                    .await?;
                    pieces.push(Piece::Speech(waveform));
                }
                Segment::Pause(duration) => pieces.push(Piece::Pause((*duration).min(self.limits.max_pause))),
            }
        }

        let sample_rate = pieces
            .iter()
            .find_map(|piece| match piece {
                Piece::Speech(waveform) => Some(waveform.sample_rate),
                Piece::Pause(_) => None,
            })
            .unwrap_or_else(|| self.model.sample_rate());

        let mut combined = Waveform::new(Vec::new(), sample_rate);
        for piece in pieces {
            match piece {
                Piece::Speech(waveform) => combined.append(waveform)?,
                Piece::Pause(duration) => combined.extend_silence(duration),
            }
        }

        Ok(combined)
    }
}

enum Piece {
    Speech(Waveform),
    Pause(Duration),
}

fn enter(current: &mut Stage, next: Stage) {
    tracing::debug!(stage = %next, "entering stage");
    *current = next;
}
