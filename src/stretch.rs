//! Pitch-preserving tempo matching
//!
//! WSOLA (waveform-similarity overlap-add) stretcher tuned for rhythmic
//! material: overlapping Hann-windowed grains are taken from the input at a
//! rate scaled by the tempo ratio, each grain snapped to the most similar
//! nearby waveform position before overlap-add. Channels of a stereo buffer
//! are stretched independently with identical grain timing.

use crate::error::{MixdownError, Result};
use crate::types::AudioBuffer;
use std::f64::consts::PI;
use tracing::debug;

const MIN_SPEED_RATIO: f64 = 0.5;
const MAX_SPEED_RATIO: f64 = 2.0;
const SILENCE_ENERGY: f32 = 1e-6;
const SIMILARITY_THRESHOLD: f32 = 0.2;

/// Stretch a buffer from tempo `original_bpm` to `target_bpm`
///
/// The playback speed ratio is `target / original`, so output length is
/// approximately `len * original / target`. Equal tempos are an exact no-op.
pub fn stretch_to_tempo(
    buffer: &AudioBuffer,
    original_bpm: f64,
    target_bpm: f64,
) -> Result<AudioBuffer> {
    if original_bpm <= 0.0 || target_bpm <= 0.0 {
        return Err(MixdownError::InvalidRate {
            original: original_bpm,
            target: target_bpm,
        });
    }
    let channels = buffer.channel_count();
    if channels == 0 || channels > 2 {
        return Err(MixdownError::Shape { channels });
    }
    if original_bpm == target_bpm {
        return Ok(buffer.clone());
    }

    let mut ratio = target_bpm / original_bpm;
    debug!(
        "Stretching {} frames by speed ratio {:.4} ({:.1} -> {:.1} BPM)",
        buffer.len(),
        ratio,
        original_bpm,
        target_bpm
    );

    // A single WSOLA pass handles at most a 2x speed change; larger ratios
    // cascade through repeated passes so output length stays ~len / ratio
    let wsola = Wsola::new(buffer.sample_rate());
    let mut channels: Vec<Vec<f32>> = buffer.channels().to_vec();
    while (ratio - 1.0).abs() > 1e-9 {
        let pass = ratio.clamp(MIN_SPEED_RATIO, MAX_SPEED_RATIO);
        channels = channels.iter().map(|ch| wsola.stretch(ch, pass)).collect();
        ratio /= pass;
    }

    Ok(AudioBuffer::from_planar(channels, buffer.sample_rate()))
}

/// WSOLA time-stretcher for a fixed sample rate
pub struct Wsola {
    window_size: usize,
    hop: usize,
    search_radius: usize,
    window: Vec<f32>,
}

impl Wsola {
    /// Build a stretcher with a ~25 ms grain for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let mut window_size = ((sample_rate.max(1) as f32) * 0.025).round() as usize;
        window_size = window_size.clamp(256, 4096);
        if window_size % 2 != 0 {
            window_size += 1;
        }
        let hop = window_size / 2;
        let search_radius = hop / 2;
        let window = hann_window(window_size);
        Self {
            window_size,
            hop,
            search_radius,
            window,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Stretch one channel by the given speed ratio, preserving pitch
    ///
    /// One pass supports ratios in [0.5, 2.0]; values outside are clamped,
    /// so callers needing a larger change cascade passes. Inputs shorter
    /// than two grains pass through unchanged (near-identity is acceptable
    /// for such fragments).
    pub fn stretch(&self, input: &[f32], ratio: f64) -> Vec<f32> {
        if input.is_empty() || self.hop == 0 {
            return input.to_vec();
        }
        let ratio = ratio.clamp(MIN_SPEED_RATIO, MAX_SPEED_RATIO);
        if (ratio - 1.0).abs() < 1e-3 {
            return input.to_vec();
        }
        if input.len() < self.window_size * 2 {
            return input.to_vec();
        }

        let output_len = ((input.len() as f64) / ratio).round().max(1.0) as usize;
        let mut output = vec![0.0f32; output_len];

        // Seed the head with the first window verbatim
        let initial = self.window_size.min(output_len);
        for i in 0..initial {
            output[i] = input[i] * self.window[i];
        }

        let mut analysis_pos = self.hop as f64 * ratio;
        let mut synthesis_pos = self.hop;
        let max_analysis_start = input.len().saturating_sub(self.window_size);

        while synthesis_pos + self.window_size <= output_len && max_analysis_start > 0 {
            let expected = analysis_pos.round() as isize;
            let expected_clamped = expected.clamp(0, max_analysis_start as isize) as usize;
            let search_start = (expected - self.search_radius as isize).max(0) as usize;
            let search_end = ((expected + self.search_radius as isize)
                .min(max_analysis_start as isize))
            .max(0) as usize;

            // Tail of what is already synthesized, to match against
            let prev_start = synthesis_pos.saturating_sub(self.hop);
            let prev_tail = &output[prev_start..synthesis_pos];
            let prev_energy = prev_tail.iter().map(|v| v * v).sum::<f32>();

            let mut best_pos = expected_clamped;
            let mut best_score = f32::NEG_INFINITY;
            if prev_energy > SILENCE_ENERGY {
                for candidate in search_start..=search_end {
                    let mut sum_xy = 0.0f32;
                    let mut sum_y2 = 0.0f32;
                    for i in 0..self.hop {
                        let prev = prev_tail[i];
                        let next = input[candidate + i];
                        sum_xy += prev * next;
                        sum_y2 += next * next;
                    }
                    if sum_y2 <= SILENCE_ENERGY {
                        continue;
                    }
                    let score = sum_xy / (prev_energy * sum_y2).sqrt();
                    if score > best_score {
                        best_score = score;
                        best_pos = candidate;
                    }
                }
            }

            let chosen = if best_score < SIMILARITY_THRESHOLD {
                expected_clamped
            } else {
                best_pos
            };

            for i in 0..self.window_size {
                output[synthesis_pos + i] += input[chosen + i] * self.window[i];
            }

            analysis_pos += self.hop as f64 * ratio;
            synthesis_pos += self.hop;
        }

        output
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| {
            let phase = 2.0 * PI * (i as f64) / denom;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}
