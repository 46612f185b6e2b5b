//! Waveform normalizer and WAV writer.
//!
//! Engine waveforms arrive as `(batch, channels, samples)` floats in no
//! particular range. They are flattened to `channels x (batch * samples)`,
//! peak-normalized, clipped to [-1, 1] and quantized to 16-bit PCM.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use ndarray::Array3;

use crate::engine::AudioMetadata;
use crate::error::{Result, SynthError};
use crate::types::AudioFacts;

/// Full-scale value for 16-bit PCM.
const I16_SCALE: f32 = 32767.0;

/// 16-bit PCM samples, interleaved per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub channels: u16,
    pub frames: usize,
    /// True when the input was silent or non-finite and zeros were produced.
    pub degenerate: bool,
}

/// Normalizes a `(batch, channels, samples)` waveform into interleaved PCM.
///
/// Batch entries are concatenated along time. A zero or non-finite peak
/// yields all-zero samples with `degenerate` set.
pub fn normalize_waveform(waveform: &Array3<f32>) -> Result<PcmAudio> {
    let (batch, channels, samples) = waveform.dim();
    let channels = u16::try_from(channels)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| SynthError::engine(format!("waveform has {} channels", channels)))?;
    let frames = batch * samples;

    let finite = waveform.iter().all(|s| s.is_finite());
    let peak = waveform.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    let degenerate = !finite || peak == 0.0;

    let mut pcm = Vec::with_capacity(frames * channels as usize);
    if degenerate {
        pcm.resize(frames * channels as usize, 0);
    } else {
        for frame in 0..frames {
            let (b, n) = (frame / samples, frame % samples);
            for d in 0..channels as usize {
                let normalized = (waveform[[b, d, n]] / peak).clamp(-1.0, 1.0);
                // `as` truncates toward zero.
                pcm.push((normalized * I16_SCALE) as i16);
            }
        }
    }

    Ok(PcmAudio {
        samples: pcm,
        channels,
        frames,
        degenerate,
    })
}

/// Writes interleaved 16-bit PCM to a WAV file.
pub fn write_wav_i16(audio: &PcmAudio, path: &Path, sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: audio.channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| SynthError::write_failed(path, e))?;
    for sample in &audio.samples {
        writer
            .write_sample(*sample)
            .map_err(|e| SynthError::write_failed(path, e))?;
    }
    writer
        .finalize()
        .map_err(|e| SynthError::write_failed(path, e))?;

    Ok(())
}

/// Normalizes a waveform and writes it at the engine's native rate.
pub fn persist_waveform(
    waveform: &Array3<f32>,
    metadata: &AudioMetadata,
    path: &Path,
) -> Result<AudioFacts> {
    let audio = normalize_waveform(waveform)?;
    if audio.degenerate {
        let warning = SynthError::degenerate_output("waveform peak is zero or non-finite, writing silence");
        tracing::warn!(code = %warning.code, path = %path.display(), "{}", warning.message);
    }

    write_wav_i16(&audio, path, metadata.sample_rate)?;
    tracing::debug!(
        path = %path.display(),
        frames = audio.frames,
        channels = audio.channels,
        sample_rate = metadata.sample_rate,
        "wav written"
    );

    Ok(AudioFacts {
        sample_rate: metadata.sample_rate,
        channels: audio.channels,
        frames: audio.frames,
        degenerate: audio.degenerate,
    })
}
