//! Tempo estimation via onset-envelope autocorrelation
//!
//! Pipeline: frame-energy onset envelope (half-wave rectified energy flux),
//! FFT-accelerated autocorrelation of the envelope, peak pick in the valid
//! BPM lag range with parabolic refinement, half/double folding into the
//! plausible range, rounded to an integer BPM.
//!
//! Detection is approximate by design: material with no clear periodicity
//! still yields a best-effort estimate, and half/double-tempo confusion on
//! ambiguous input is accepted rather than corrected.

use crate::analysis::traits::TempoEstimator;
use crate::error::{MixdownError, Result};
use crate::types::AudioBuffer;
use rustfft::{num_complex::Complex, FftPlanner};
use tracing::debug;

/// FFT frame size for the energy envelope
const FRAME_SIZE: usize = 1024;
/// Hop between energy frames (50% overlap)
const HOP_SIZE: usize = 512;

/// Lag search range in BPM
const MIN_BPM: f64 = 40.0;
const MAX_BPM: f64 = 200.0;

/// Returned when the envelope carries no usable periodicity (e.g., silence)
const FALLBACK_BPM: f64 = 120.0;

/// A divisor-lag peak must reach this fraction of the dominant peak to be
/// accepted as the fundamental period
const SUBHARMONIC_RATIO: f32 = 0.5;

const EPSILON: f32 = 1e-10;

/// Autocorrelation-based tempo estimator
#[derive(Debug, Default)]
pub struct OnsetTempoEstimator;

impl OnsetTempoEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl TempoEstimator for OnsetTempoEstimator {
    fn estimate(&self, buffer: &AudioBuffer) -> Result<f64> {
        if buffer.is_empty() {
            return Err(MixdownError::analysis("", "empty buffer"));
        }
        if buffer.sample_rate() == 0 {
            return Err(MixdownError::analysis("", "sample rate must be positive"));
        }

        let mono = buffer.to_mono();
        let envelope = onset_envelope(&mono);
        let frame_rate = buffer.sample_rate() as f64 / HOP_SIZE as f64;

        let bpm = match pick_tempo(&envelope, frame_rate) {
            Some(bpm) => bpm,
            None => {
                debug!("No usable periodicity, falling back to {} BPM", FALLBACK_BPM);
                FALLBACK_BPM
            }
        };

        debug!(
            "Estimated tempo {:.0} BPM from {} envelope frames",
            bpm,
            envelope.len()
        );
        Ok(bpm)
    }

    fn name(&self) -> &'static str {
        "onset-autocorrelation"
    }
}

/// Half-wave rectified frame-energy flux
fn onset_envelope(samples: &[f32]) -> Vec<f32> {
    let mut energies = Vec::new();
    let mut start = 0;
    while start + FRAME_SIZE <= samples.len() {
        let frame = &samples[start..start + FRAME_SIZE];
        energies.push(frame.iter().map(|s| s * s).sum::<f32>());
        start += HOP_SIZE;
    }
    if energies.is_empty() && !samples.is_empty() {
        // Shorter than one frame: single partial-frame energy
        energies.push(samples.iter().map(|s| s * s).sum::<f32>());
    }

    energies
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .collect()
}

/// Pick the dominant tempo from the envelope autocorrelation
fn pick_tempo(envelope: &[f32], frame_rate: f64) -> Option<f64> {
    let min_lag = (60.0 * frame_rate / MAX_BPM).ceil() as usize;
    let max_lag = (60.0 * frame_rate / MIN_BPM).floor() as usize;
    if min_lag == 0 || envelope.len() <= max_lag + 1 {
        return None;
    }

    let acf = autocorrelate(envelope);

    let mut best_lag = 0usize;
    let mut best_value = EPSILON;
    for lag in min_lag..=max_lag {
        if acf[lag] > best_value {
            best_value = acf[lag];
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return None;
    }

    // When the beat period is a non-integer number of envelope frames, the
    // quantized onsets align better at integer multiples of the period, so
    // the global maximum can land on a subharmonic lag (half, third or
    // quarter tempo). Walk down to the shortest divisor lag that still
    // carries a comparable peak; that lag is the fundamental.
    loop {
        let mut stepped = false;
        for divisor in [4usize, 3, 2] {
            let approx = (best_lag as f64 / divisor as f64).round() as usize;
            if approx < min_lag {
                continue;
            }
            let lo = approx.saturating_sub(1).max(min_lag);
            let hi = (approx + 1).min(max_lag);
            let candidate = (lo..=hi)
                .max_by(|&a, &b| acf[a].total_cmp(&acf[b]))
                .unwrap_or(approx);
            if candidate < best_lag && acf[candidate] >= SUBHARMONIC_RATIO * acf[best_lag] {
                best_lag = candidate;
                stepped = true;
                break;
            }
        }
        if !stepped {
            break;
        }
    }

    let refined = refine_peak(&acf, best_lag);
    let mut bpm = 60.0 * frame_rate / refined;

    // Fold implausible half/double estimates into range
    while bpm < MIN_BPM {
        bpm *= 2.0;
    }
    while bpm > MAX_BPM {
        bpm /= 2.0;
    }

    Some(bpm.round())
}

/// FFT-accelerated autocorrelation: ACF = IFFT(|FFT(x)|^2)
fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let padded = (2 * n).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(padded);
    let inverse = planner.plan_fft_inverse(padded);

    let mut spectrum: Vec<Complex<f32>> = signal
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(padded)
        .collect();

    forward.process(&mut spectrum);
    for c in spectrum.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    inverse.process(&mut spectrum);

    let scale = 1.0 / padded as f32;
    spectrum.iter().take(n).map(|c| c.re * scale).collect()
}

/// Parabolic interpolation around an autocorrelation peak
///
/// Recovers fractional-lag periodicities that fall between frame boundaries.
fn refine_peak(acf: &[f32], lag: usize) -> f64 {
    if lag == 0 || lag + 1 >= acf.len() {
        return lag as f64;
    }
    let alpha = acf[lag - 1] as f64;
    let beta = acf[lag] as f64;
    let gamma = acf[lag + 1] as f64;
    let denom = alpha - 2.0 * beta + gamma;
    if denom.abs() < f64::EPSILON {
        return lag as f64;
    }
    let delta = 0.5 * (alpha - gamma) / denom;
    lag as f64 + delta.clamp(-0.5, 0.5)
}
