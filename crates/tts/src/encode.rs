use base64::{Engine, engine::general_purpose::STANDARD};
use mp3lame_encoder::{Builder, FlushNoGap, MonoPcm, Quality};

use crate::{
    error::{Result, TtsError},
    types::{Bitrate, Waveform},
};

/// LAME needs at least this much room to flush its final frames
const FLUSH_BUFFER_BYTES: usize = 7200;

/// Below this rate LAME writes MPEG-2/2.5 frames, which stop at 160 kbps
const MPEG1_MIN_SAMPLE_RATE: u32 = 32_000;

/// Compress a waveform to constant-bitrate MP3 and base64-encode it
pub fn encode(waveform: &Waveform, bitrate: Bitrate) -> Result<String> {
    let mp3 = encode_mp3(waveform, bitrate)?;

    tracing::debug!(
        bitrate = bitrate.as_str(),
        duration_ms = waveform.duration().as_millis(),
        bytes = mp3.len(),
        "encoded mp3"
    );

    Ok(STANDARD.encode(mp3))
}

/// Compress a waveform to a mono constant-bitrate MP3 stream
pub fn encode_mp3(waveform: &Waveform, bitrate: Bitrate) -> Result<Vec<u8>> {
    if waveform.is_empty() {
        return Err(TtsError::Encoding("cannot encode an empty waveform".to_string()));
    }

    if waveform.sample_rate == 0 {
        return Err(TtsError::Encoding("sample rate must be greater than 0".to_string()));
    }

    let mut builder =
        Builder::new().ok_or_else(|| TtsError::Encoding("failed to allocate MP3 encoder".to_string()))?;

    builder.set_num_channels(1).map_err(codec_error)?;
    builder.set_sample_rate(waveform.sample_rate).map_err(codec_error)?;
    builder
        .set_brate(lame_bitrate(effective_bitrate(bitrate, waveform.sample_rate)))
        .map_err(codec_error)?;
    builder.set_quality(Quality::Good).map_err(codec_error)?;

    let mut encoder = builder.build().map_err(codec_error)?;

    let pcm = to_pcm16(&waveform.samples);
    let mut mp3 = Vec::new();

    mp3.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));
    encoder.encode_to_vec(MonoPcm(&pcm), &mut mp3).map_err(codec_error)?;

    mp3.reserve(FLUSH_BUFFER_BYTES);
    encoder.flush_to_vec::<FlushNoGap>(&mut mp3).map_err(codec_error)?;

    if mp3.is_empty() {
        return Err(TtsError::Encoding("encoder produced no output".to_string()));
    }

    Ok(mp3)
}

/// Highest bitrate the MPEG version chosen for `sample_rate` can carry
pub fn effective_bitrate(bitrate: Bitrate, sample_rate: u32) -> Bitrate {
    let ceiling = if sample_rate < MPEG1_MIN_SAMPLE_RATE { Bitrate::Kbps160 } else { Bitrate::Kbps320 };

    if bitrate.kbps() > ceiling.kbps() {
        tracing::debug!(
            requested = bitrate.as_str(),
            used = ceiling.as_str(),
            sample_rate,
            "bitrate lowered to the MPEG-2 maximum"
        );
        return ceiling;
    }

    bitrate
}

const fn lame_bitrate(bitrate: Bitrate) -> mp3lame_encoder::Bitrate {
    use mp3lame_encoder::Bitrate as Lame;

    match bitrate {
        Bitrate::Kbps32 => Lame::Kbps32,
        Bitrate::Kbps48 => Lame::Kbps48,
        Bitrate::Kbps64 => Lame::Kbps64,
        Bitrate::Kbps96 => Lame::Kbps96,
        Bitrate::Kbps128 => Lame::Kbps128,
        Bitrate::Kbps160 => Lame::Kbps160,
        Bitrate::Kbps192 => Lame::Kbps192,
        Bitrate::Kbps256 => Lame::Kbps256,
        Bitrate::Kbps320 => Lame::Kbps320,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|sample| {
            let sample = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
            (sample * f32::from(i16::MAX)).round() as i16
        })
        .collect()
}

fn codec_error(error: impl std::fmt::Debug) -> TtsError {
    tracing::error!("mp3 codec failure: {error:?}");
    TtsError::Encoding(format!("mp3 codec error: {error:?}"))
}
