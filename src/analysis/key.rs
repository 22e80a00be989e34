//! Key estimation via time-averaged chroma
//!
//! An STFT magnitude spectrogram is folded onto the 12 pitch classes
//! (27.5 Hz - 4.2 kHz), averaged across time, and the class with maximum
//! average energy wins. No major/minor mode is inferred from the signal;
//! mode conventions live in the harmonic compatibility table.
//!
//! Silent or very short buffers yield a degenerate, effectively arbitrary
//! class. That is accepted input-dependent behavior, not special-cased.

use crate::analysis::traits::KeyEstimator;
use crate::error::{MixdownError, Result};
use crate::types::{AudioBuffer, PitchClass};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;
use tracing::debug;

/// STFT frame size (bin resolution ~10.8 Hz at 44.1 kHz)
const FRAME_SIZE: usize = 4096;
/// Hop between frames (50% overlap)
const HOP_SIZE: usize = 2048;

/// Pitch fold range: A0 up to roughly C8
const MIN_FREQ: f64 = 27.5;
const MAX_FREQ: f64 = 4186.0;

/// Chroma-profile key estimator
#[derive(Debug, Default)]
pub struct ChromaKeyEstimator;

impl ChromaKeyEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl KeyEstimator for ChromaKeyEstimator {
    fn estimate(&self, buffer: &AudioBuffer) -> Result<PitchClass> {
        if buffer.is_empty() {
            return Err(MixdownError::analysis("", "empty buffer"));
        }
        if buffer.sample_rate() == 0 {
            return Err(MixdownError::analysis("", "sample rate must be positive"));
        }

        let mono = buffer.to_mono();
        let profile = chroma_profile(&mono, buffer.sample_rate());

        // Argmax over the averaged profile; ties and all-zero profiles
        // resolve to the lowest class, which is acceptable for degenerate
        // input.
        let mut best = 0usize;
        for pc in 1..12 {
            if profile[pc] > profile[best] {
                best = pc;
            }
        }

        let key = PitchClass::from_index(best);
        debug!("Chroma profile argmax: {key} ({:?})", profile);
        Ok(key)
    }

    fn name(&self) -> &'static str {
        "chroma-stft"
    }
}

/// Time-averaged 12-element pitch-class energy profile
pub fn chroma_profile(samples: &[f32], sample_rate: u32) -> [f64; 12] {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FRAME_SIZE);
    let window = hann_window(FRAME_SIZE);

    let mut profile = [0.0f64; 12];
    let mut frames = 0usize;

    let mut start = 0;
    loop {
        let mut spectrum = windowed_frame(samples, start, &window);
        fft.process(&mut spectrum);

        for (bin, value) in spectrum.iter().enumerate().take(FRAME_SIZE / 2).skip(1) {
            let freq = bin as f64 * sample_rate as f64 / FRAME_SIZE as f64;
            if !(MIN_FREQ..=MAX_FREQ).contains(&freq) {
                continue;
            }
            profile[pitch_class_of(freq)] += value.norm_sqr() as f64;
        }
        frames += 1;

        start += HOP_SIZE;
        if start + FRAME_SIZE > samples.len() {
            break;
        }
    }

    if frames > 0 {
        for energy in profile.iter_mut() {
            *energy /= frames as f64;
        }
    }
    profile
}

/// Nearest pitch class for a frequency (A4 = 440 Hz = class 9)
fn pitch_class_of(freq: f64) -> usize {
    let semitones_from_a4 = (12.0 * (freq / 440.0).log2()).round() as i64;
    (semitones_from_a4 + 9).rem_euclid(12) as usize
}

/// One zero-padded, Hann-windowed frame as complex input
fn windowed_frame(samples: &[f32], start: usize, window: &[f32]) -> Vec<Complex<f32>> {
    (0..FRAME_SIZE)
        .map(|i| {
            let s = samples.get(start + i).copied().unwrap_or(0.0);
            Complex::new(s * window[i], 0.0)
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / (size - 1) as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_tone;

    fn estimate(buffer: &AudioBuffer) -> PitchClass {
        ChromaKeyEstimator::new().estimate(buffer).unwrap()
    }

    #[test]
    fn a4_sine_detects_a() {
        let buffer = sine_tone(440.0, 44100, 3.0);
        assert_eq!(estimate(&buffer), PitchClass::A);
    }

    #[test]
    fn c4_sine_detects_c() {
        let buffer = sine_tone(261.63, 44100, 3.0);
        assert_eq!(estimate(&buffer), PitchClass::C);
    }

    #[test]
    fn e5_sine_detects_e() {
        let buffer = sine_tone(659.25, 48000, 3.0);
        assert_eq!(estimate(&buffer), PitchClass::E);
    }

    #[test]
    fn chord_detects_root_with_dominant_energy() {
        // C major chord with the root loudest
        let sr = 44100u32;
        let c = sine_tone(261.63, sr, 2.0);
        let e = sine_tone(329.63, sr, 2.0);
        let g = sine_tone(392.0, sr, 2.0);
        let mixed: Vec<f32> = c.channels()[0]
            .iter()
            .zip(e.channels()[0].iter())
            .zip(g.channels()[0].iter())
            .map(|((c, e), g)| c * 0.6 + e * 0.2 + g * 0.2)
            .collect();
        let buffer = AudioBuffer::mono(mixed, sr);
        assert_eq!(estimate(&buffer), PitchClass::C);
    }

    #[test]
    fn silence_yields_some_class_without_failing() {
        let buffer = AudioBuffer::mono(vec![0.0; 44100], 44100);
        // Degenerate input: any class is acceptable, failure is not
        let _ = estimate(&buffer);
    }

    #[test]
    fn short_buffer_is_zero_padded_not_rejected() {
        let buffer = sine_tone(440.0, 44100, 0.05);
        assert_eq!(estimate(&buffer), PitchClass::A);
    }

    #[test]
    fn empty_buffer_is_an_analysis_error() {
        let buffer = AudioBuffer::mono(Vec::new(), 44100);
        assert!(ChromaKeyEstimator::new().estimate(&buffer).is_err());
    }

    #[test]
    fn pitch_class_folding() {
        assert_eq!(pitch_class_of(440.0), 9); // A4
        assert_eq!(pitch_class_of(880.0), 9); // A5
        assert_eq!(pitch_class_of(261.63), 0); // C4
        assert_eq!(pitch_class_of(27.5), 9); // A0
    }
}
