//! WAV bridging
//!
//! The pipeline itself works purely on decoded in-memory buffers; this
//! module is the thin hand-off at the binary's edge. Compressed formats
//! and their codecs stay external collaborators.

use crate::error::{MixdownError, Result};
use crate::types::AudioBuffer;
use std::path::Path;
use tracing::debug;

/// Load a mono or stereo WAV file into an `AudioBuffer`
///
/// 16/24/32-bit integer and 32-bit float sample formats are normalized to
/// [-1.0, 1.0]. Files with more than two channels are rejected.
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path).map_err(|e| MixdownError::analysis(
        path.display().to_string(),
        format!("failed to read WAV: {e}"),
    ))?;
    let spec = reader.spec();
    debug!(
        "Loading {}: {} ch, {} Hz, {}-bit {:?}",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );
    if spec.channels == 0 || spec.channels > 2 {
        return Err(MixdownError::Shape {
            channels: spec.channels as usize,
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| wav_error(path, e))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| wav_error(path, e))?
        }
    };

    let buffer = match spec.channels {
        1 => AudioBuffer::mono(interleaved, spec.sample_rate),
        _ => {
            let frames = interleaved.len() / 2;
            let mut left = Vec::with_capacity(frames);
            let mut right = Vec::with_capacity(frames);
            for chunk in interleaved.chunks_exact(2) {
                left.push(chunk[0]);
                right.push(chunk[1]);
            }
            AudioBuffer::stereo(left, right, spec.sample_rate)
        }
    };
    Ok(buffer)
}

/// Write a buffer as a 16-bit PCM WAV file
pub fn save_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| MixdownError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    for sample in buffer.interleaved() {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(clamped).map_err(|e| MixdownError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    writer.finalize().map_err(|e| MixdownError::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("Wrote {} frames to {}", buffer.len(), path.display());
    Ok(())
}

fn wav_error(path: &Path, e: hound::Error) -> MixdownError {
    MixdownError::analysis(path.display().to_string(), format!("bad WAV data: {e}"))
}
