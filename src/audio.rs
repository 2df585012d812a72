//! Upload normalization: decode an audio container into the mono 16 kHz
//! waveform the speech engine consumes.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("audio decoding failed: {0}")]
    DecodeFailed(String),
}

/// Decoded audio at the normalized channel count and sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub duration_seconds: f64,
}

/// Decode an uploaded container into mono 16 kHz f32 PCM. The extension
/// hint, when present, narrows symphonia's format probe.
pub fn normalize(data: &[u8], ext_hint: Option<&str>) -> Result<Waveform, DecodeError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::DecodeFailed(format!("probe: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::DecodeFailed("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::DecodeFailed("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::DecodeFailed(format!("codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(DecodeError::DecodeFailed(format!("packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "skipping corrupt audio frame");
                continue;
            }
            Err(e) => {
                return Err(DecodeError::DecodeFailed(format!("decode: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }
        let channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let frame_samples = sample_buf.samples();

        if channels > 1 {
            for frame in frame_samples.chunks(channels) {
                samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        } else {
            samples.extend_from_slice(frame_samples);
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::DecodeFailed(
            "no audio samples decoded".to_string(),
        ));
    }

    if source_rate != TARGET_SAMPLE_RATE {
        samples = resample(&samples, source_rate, TARGET_SAMPLE_RATE)?;
    }

    let duration_seconds = round2(samples.len() as f64 / TARGET_SAMPLE_RATE as f64);

    tracing::debug!(
        samples = samples.len(),
        duration_seconds,
        "audio normalized to 16 kHz mono PCM"
    );

    Ok(Waveform {
        samples,
        duration_seconds,
    })
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, DecodeError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| DecodeError::DecodeFailed(format!("resampler init: {}", e)))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let result = resampler
            .process(&[input], None)
            .map_err(|e| DecodeError::DecodeFailed(format!("resample: {}", e)))?;

        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    // The tail chunk is zero-padded; trim back to the expected length.
    let expected_len = (samples.len() as f64 * ratio) as usize;
    output.truncate(expected_len);

    Ok(output)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal RIFF/WAVE writer for 16-bit PCM test input.
    fn wav_bytes(rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let byte_rate = rate * channels as u32 * 2;
        let block_align = channels * 2;
        let data_len = (samples.len() * 2) as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    fn sine(rate: u32, seconds: f64) -> Vec<i16> {
        let n = (rate as f64 * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / rate as f64;
                ((t * 440.0 * 2.0 * std::f64::consts::PI).sin() * 8000.0) as i16
            })
            .collect()
    }

    #[test]
    fn decodes_mono_wav_at_target_rate() {
        let pcm = sine(TARGET_SAMPLE_RATE, 0.1);
        let wav = wav_bytes(TARGET_SAMPLE_RATE, 1, &pcm);

        let waveform = normalize(&wav, Some("wav")).expect("decode wav");
        assert_eq!(waveform.samples.len(), 1600);
        assert_eq!(waveform.duration_seconds, 0.1);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        // Left and right cancel out, so the mono mix is silence.
        let frames = 800;
        let mut interleaved = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            interleaved.push(6000i16);
            interleaved.push(-6000i16);
        }
        let wav = wav_bytes(TARGET_SAMPLE_RATE, 2, &interleaved);

        let waveform = normalize(&wav, Some("wav")).expect("decode stereo wav");
        assert_eq!(waveform.samples.len(), frames);
        assert!(waveform.samples.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn resamples_to_16khz() {
        let pcm = sine(8_000, 1.0);
        let wav = wav_bytes(8_000, 1, &pcm);

        let waveform = normalize(&wav, Some("wav")).expect("decode 8 kHz wav");
        assert_eq!(waveform.samples.len(), 16_000);
        assert_eq!(waveform.duration_seconds, 1.0);
    }

    #[test]
    fn rejects_garbage_input() {
        let err = normalize(b"definitely not audio", None).unwrap_err();
        assert!(err.to_string().contains("audio decoding failed"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(normalize(&[], None).is_err());
    }

    #[test]
    fn rounds_duration_to_two_decimals() {
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(0.0), 0.0);
    }
}
