use std::io::Cursor;

use anyhow::Context;
use hound::{SampleFormat, WavReader};

use crate::types::Waveform;

/// Decode a WAV payload into a mono waveform
///
/// Integer PCM of any width and 32-bit float are accepted. Multi-channel
/// audio is averaged down to one channel.
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(bytes: &[u8]) -> anyhow::Result<Waveform> {
    let mut reader = WavReader::new(Cursor::new(bytes)).context("model returned invalid WAV data")?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to read float samples")?,
        SampleFormat::Int => {
            let scale = 2.0_f32.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<_, _>>()
                .context("failed to read integer samples")?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(Waveform::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use hound::{WavSpec, WavWriter};

    use super::*;

    fn wav_bytes<F>(spec: WavSpec, write: F) -> Vec<u8>
    where
        F: FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>),
    {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_16_bit_mono() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |writer| {
            for sample in [0_i16, 16_384, -32_768] {
                writer.write_sample(sample).unwrap();
            }
        });

        let waveform = decode_wav(&bytes).unwrap();

        assert_eq!(waveform.sample_rate, 24_000);
        assert_eq!(waveform.samples.len(), 3);
        assert!(waveform.samples[0].abs() < f32::EPSILON);
        assert!((waveform.samples[1] - 0.5).abs() < f32::EPSILON);
        assert!((waveform.samples[2] + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn averages_stereo_float() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |writer| {
            for sample in [0.2_f32, 0.4, -1.0, 1.0] {
                writer.write_sample(sample).unwrap();
            }
        });

        let waveform = decode_wav(&bytes).unwrap();

        assert_eq!(waveform.sample_rate, 44_100);
        assert_eq!(waveform.samples.len(), 2);
        assert!((waveform.samples[0] - 0.3).abs() < 1e-6);
        assert!(waveform.samples[1].abs() < 1e-6);
    }

    #[test]
    fn rejects_non_wav_payload() {
        let err = decode_wav(b"{\"error\": \"busy\"}").unwrap_err();
        assert!(err.to_string().contains("invalid WAV"));
    }
}
