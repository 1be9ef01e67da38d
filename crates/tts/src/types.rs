use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Result, TtsError};

/// One invocation as delivered by the serverless runtime
#[derive(Debug, Default, Deserialize)]
pub struct Job {
    /// Runtime-assigned job identifier, used for log correlation only
    #[serde(default)]
    pub id: Option<String>,
    /// Untyped input parameters, validated by [`crate::validate`]
    #[serde(default)]
    pub input: Map<String, Value>,
}

/// MP3 bitrates accepted in `mp3_bitrate`
///
/// Output below 32 kHz, including the model's native 24 kHz, is MPEG-2
/// Layer III, which tops out at 160 kbps. `192k`, `256k` and `320k` are
/// accepted but encoded at 160 kbps there, see [`crate::encode::effective_bitrate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Bitrate {
    #[strum(serialize = "32k")]
    Kbps32,
    #[strum(serialize = "48k")]
    Kbps48,
    #[strum(serialize = "64k")]
    Kbps64,
    #[strum(serialize = "96k")]
    Kbps96,
    #[default]
    #[strum(serialize = "128k")]
    Kbps128,
    #[strum(serialize = "160k")]
    Kbps160,
    #[strum(serialize = "192k")]
    Kbps192,
    #[strum(serialize = "256k")]
    Kbps256,
    #[strum(serialize = "320k")]
    Kbps320,
}

impl Bitrate {
    /// Parse a token such as `"128k"`, ignoring case and surrounding whitespace
    pub fn from_token(token: &str) -> Option<Self> {
        token.trim().parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub const fn kbps(self) -> u32 {
        match self {
            Self::Kbps32 => 32,
            Self::Kbps48 => 48,
            Self::Kbps64 => 64,
            Self::Kbps96 => 96,
            Self::Kbps128 => 128,
            Self::Kbps160 => 160,
            Self::Kbps192 => 192,
            Self::Kbps256 => 256,
            Self::Kbps320 => 320,
        }
    }
}

/// Piece of the input text between `[pause:N]` markers
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text to be spoken
    Speech(String),
    /// Silence inserted by a pause marker
    Pause(Duration),
}

/// Validated, immutable parameters of one synthesis job
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Sanitized text, guaranteed non-blank
    pub text: String,
    /// `text` split on pause markers, contains at least one speech segment
    pub segments: Vec<Segment>,
    /// Voice reference clip to stage before synthesis
    pub audio_prompt_url: Option<Url>,
    /// Expressiveness, within `[0.0, 1.0]`
    pub exaggeration: f32,
    /// Classifier-free guidance weight, within `[0.0, 1.0]`
    pub cfg_weight: f32,
    pub bitrate: Bitrate,
}

/// Mono audio samples in `[-1.0, 1.0]` with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the audio
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Append another waveform recorded at the same sample rate
    pub fn append(&mut self, other: Self) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(TtsError::Synthesis(format!(
                "segment sample rate {} Hz does not match {} Hz",
                other.sample_rate, self.sample_rate
            )));
        }

        self.samples.extend(other.samples);
        Ok(())
    }

    /// Append `duration` of silence
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn extend_silence(&mut self, duration: Duration) {
        let count = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        self.samples.resize(self.samples.len() + count, 0.0);
    }
}

/// Successful job output
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisResponse {
    /// Base64-encoded MP3 stream
    pub audio_base64: String,
    pub sample_rate: u32,
    /// Always `"mp3"`
    pub format: &'static str,
}

impl SynthesisResponse {
    pub const fn mp3(audio_base64: String, sample_rate: u32) -> Self {
        Self {
            audio_base64,
            sample_rate,
            format: "mp3",
        }
    }
}
