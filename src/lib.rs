//! mixdown - Offline DJ Mix Assembly
//!
//! Assembles a continuous DJ mix from a set of independent, already-decoded
//! tracks: estimates each track's tempo and musical key, groups tracks by
//! compatibility, tempo-matches where a group demands it, and stitches
//! everything into one continuous waveform with crossfades and an optional
//! ornamental effect overlay.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `audio`: WAV bridging (decoded buffers in, decoded buffer out)
//! - `analysis`: tempo and key estimation (swappable backends)
//! - `harmonic`: static circle-of-fifths compatibility table
//! - `grouping`: harmonic / tempo-cluster / tempo-sort strategies
//! - `stretch`: WSOLA pitch-preserving tempo matching
//! - `assemble`: the crossfade/hard-join assembly state machine
//! - `overlay`: randomized effect overlay
//! - `pipeline`: orchestration (parallel analysis, sequential assembly)
//! - `export`: diagnostics JSON output
//!
//! # Example
//!
//! ```no_run
//! use mixdown::config::MixSettings;
//! use mixdown::types::{AudioBuffer, SourceTrack};
//!
//! let sources = vec![SourceTrack {
//!     source_id: "one".to_string(),
//!     buffer: AudioBuffer::mono(vec![0.0; 44100 * 30], 44100),
//! }];
//! let output = mixdown::pipeline::run(sources, None, &MixSettings::default())
//!     .expect("mix failed");
//! println!("{} diagnostics", output.diagnostics.len());
//! ```

pub mod analysis;
pub mod assemble;
pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod harmonic;
pub mod overlay;
pub mod pipeline;
pub mod stretch;
pub mod types;

// Re-export key types at crate root
pub use error::{MixdownError, Result};
pub use types::{AudioBuffer, MixOutput, PitchClass, SourceTrack, Track, TrackDiagnostic};

#[cfg(test)]
pub(crate) mod testing {
    //! Synthetic signal fixtures shared by unit tests

    use crate::types::AudioBuffer;
    use std::f32::consts::PI;

    /// Mono sine tone at the given frequency
    pub fn sine_tone(frequency_hz: f32, sample_rate: u32, duration_secs: f32) -> AudioBuffer {
        let frames = (duration_secs * sample_rate as f32) as usize;
        let samples = (0..frames)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * PI * frequency_hz * t).sin() * 0.5
            })
            .collect();
        AudioBuffer::mono(samples, sample_rate)
    }

    /// Mono click track: decaying 1 kHz bursts at regular beat intervals
    pub fn click_track(bpm: f64, sample_rate: u32, duration_secs: f64) -> AudioBuffer {
        let frames = (sample_rate as f64 * duration_secs) as usize;
        let mut samples = vec![0.0f32; frames];
        let frames_per_beat = 60.0 / bpm * sample_rate as f64;
        let click_frames = (sample_rate as f64 * 0.005) as usize;

        let mut beat = 0.0f64;
        while (beat as usize) < frames {
            let start = beat as usize;
            for j in 0..click_frames {
                let idx = start + j;
                if idx < frames {
                    let t = j as f32 / sample_rate as f32;
                    samples[idx] = (2.0 * PI * 1000.0 * t).sin() * (-t * 500.0).exp() * 0.8;
                }
            }
            beat += frames_per_beat;
        }
        AudioBuffer::mono(samples, sample_rate)
    }
}
