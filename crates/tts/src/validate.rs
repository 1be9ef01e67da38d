use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;
use voxworker_config::SynthesisConfig;

use crate::{
    error::{Result, TtsError},
    text,
    types::{Bitrate, Segment, SynthesisRequest},
};

pub const DEFAULT_EXAGGERATION: f32 = 0.5;
pub const DEFAULT_CFG_WEIGHT: f32 = 0.5;

/// Bounds on the segment list a job's text may expand into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseLimits {
    /// Each marker is shortened to this
    pub max_pause: Duration,
    /// Summed silence beyond this is rejected
    pub max_total: Duration,
    pub max_segments: usize,
}

impl From<&SynthesisConfig> for PauseLimits {
    fn from(config: &SynthesisConfig) -> Self {
        Self {
            max_pause: config.max_pause,
            max_total: config.max_total_pause,
            max_segments: config.max_segments,
        }
    }
}

impl Default for PauseLimits {
    fn default() -> Self {
        Self::from(&SynthesisConfig::default())
    }
}

/// Build a [`SynthesisRequest`] from raw job input with default limits
pub fn validate(input: &Map<String, Value>) -> Result<SynthesisRequest> {
    validate_with(input, &PauseLimits::default())
}

/// Build a [`SynthesisRequest`] from raw job input
///
/// Out-of-range `exaggeration` and `cfg_weight` are clamped into `[0, 1]`
/// and unknown `mp3_bitrate` tokens fall back to `128k`; neither is an error.
/// Pauses are capped at `limits.max_pause` each, and a job whose segments
/// exceed `limits` is rejected.
pub fn validate_with(input: &Map<String, Value>, limits: &PauseLimits) -> Result<SynthesisRequest> {
    let text = match input.get("text") {
        Some(Value::String(raw)) => text::sanitize(raw),
        _ => String::new(),
    };

    if text.is_empty() {
        return Err(TtsError::Validation("text is required".to_string()));
    }

    let segments = text::split_pauses(&text);
    if !segments.iter().any(|s| matches!(s, Segment::Speech(_))) {
        return Err(TtsError::Validation(
            "no speakable text found after parsing pause markers".to_string(),
        ));
    }
    let segments = bound_segments(segments, limits)?;

    Ok(SynthesisRequest {
        audio_prompt_url: audio_prompt_url(input)?,
        exaggeration: unit_interval(input, "exaggeration", DEFAULT_EXAGGERATION)?,
        cfg_weight: unit_interval(input, "cfg_weight", DEFAULT_CFG_WEIGHT)?,
        bitrate: bitrate(input),
        text,
        segments,
    })
}

fn bound_segments(segments: Vec<Segment>, limits: &PauseLimits) -> Result<Vec<Segment>> {
    if segments.len() > limits.max_segments {
        return Err(TtsError::Validation(format!(
            "text has {} segments, the limit is {}",
            segments.len(),
            limits.max_segments
        )));
    }

    let mut total = Duration::ZERO;
    let segments: Vec<Segment> = segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Pause(duration) => {
                if duration > limits.max_pause {
                    tracing::debug!(?duration, max = ?limits.max_pause, "pause capped");
                }
                let capped = duration.min(limits.max_pause);
                total = total.saturating_add(capped);
                Segment::Pause(capped)
            }
            speech @ Segment::Speech(_) => speech,
        })
        .collect();

    if total > limits.max_total {
        return Err(TtsError::Validation(format!(
            "pause markers add {:.1}s of silence, the limit is {:.1}s",
            total.as_secs_f64(),
            limits.max_total.as_secs_f64()
        )));
    }

    Ok(segments)
}

fn audio_prompt_url(input: &Map<String, Value>) -> Result<Option<Url>> {
    let invalid = || TtsError::Validation("audio_prompt_url must be a well-formed http(s) URL".to_string());

    let raw = match input.get("audio_prompt_url") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
        Some(Value::String(raw)) => raw.trim(),
        Some(_) => return Err(invalid()),
    };

    let url = Url::parse(raw).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }

    Ok(Some(url))
}

#[allow(clippy::cast_possible_truncation)]
fn unit_interval(input: &Map<String, Value>, field: &str, default: f32) -> Result<f32> {
    let value = match input.get(field) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| TtsError::Validation(format!("{field} must be a number")))?;

    if value.is_nan() {
        tracing::warn!("{field} is NaN, using default {default}");
        return Ok(default);
    }

    let clamped = value.clamp(0.0, 1.0);
    if !(0.0..=1.0).contains(&value) {
        tracing::debug!("{field}={value} clamped to {clamped}");
    }

    Ok(clamped as f32)
}

fn bitrate(input: &Map<String, Value>) -> Bitrate {
    match input.get("mp3_bitrate") {
        None | Some(Value::Null) => Bitrate::default(),
        Some(Value::String(token)) => Bitrate::from_token(token).unwrap_or_else(|| {
            tracing::warn!("unrecognized mp3_bitrate '{token}', using {}", Bitrate::default().as_str());
            Bitrate::default()
        }),
        Some(other) => {
            tracing::warn!("mp3_bitrate must be a string, got {other}, using {}", Bitrate::default().as_str());
            Bitrate::default()
        }
    }
}
