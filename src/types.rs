//! Core data types for mixdown
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// Musical primitives
// =============================================================================

/// The 12 pitch classes in Western music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    /// Convert from numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn from_index(index: usize) -> Self {
        match index % 12 {
            0 => PitchClass::C,
            1 => PitchClass::Cs,
            2 => PitchClass::D,
            3 => PitchClass::Ds,
            4 => PitchClass::E,
            5 => PitchClass::F,
            6 => PitchClass::Fs,
            7 => PitchClass::G,
            8 => PitchClass::Gs,
            9 => PitchClass::A,
            10 => PitchClass::As,
            _ => PitchClass::B,
        }
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> usize {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    /// Standard notation (e.g., "C", "F#", "A#")
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Major or Minor scale
///
/// A notation convention used by the compatibility table; never inferred
/// from the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

/// A pitch class paired with a mode convention (e.g., "Amin", "F#")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub pitch_class: PitchClass,
    pub mode: Mode,
}

impl KeySignature {
    pub const fn major(pitch_class: PitchClass) -> Self {
        Self {
            pitch_class,
            mode: Mode::Major,
        }
    }

    pub const fn minor(pitch_class: PitchClass) -> Self {
        Self {
            pitch_class,
            mode: Mode::Minor,
        }
    }
}

impl std::fmt::Display for KeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            Mode::Major => write!(f, "{}", self.pitch_class),
            Mode::Minor => write!(f, "{}min", self.pitch_class),
        }
    }
}

// =============================================================================
// Audio buffer
// =============================================================================

/// Decoded audio samples, mono or stereo, normalized to [-1.0, 1.0]
///
/// Channels are stored planar (one `Vec<f32>` per channel) with equal frame
/// counts. Decoding from and encoding to compressed formats happens outside
/// the crate; this is the in-memory hand-off representation.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Create a stereo buffer; channels are truncated to the shorter one
    pub fn stereo(mut left: Vec<f32>, mut right: Vec<f32>, sample_rate: u32) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            channels: vec![left, right],
            sample_rate,
        }
    }

    /// Build from raw planar channels; frame counts are equalized by truncation
    pub fn from_planar(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for ch in &mut channels {
            ch.truncate(frames);
        }
        Self {
            channels,
            sample_rate,
        }
    }

    /// Number of frames (samples per channel)
    pub fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds (0.0 for an invalid sample rate)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0 {
            self.len() as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }

    /// Borrow the planar channel data
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Mutably borrow the planar channel data
    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Consume the buffer, yielding its channels
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Downmix to a single channel by averaging
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => {
                let frames = self.len();
                let scale = 1.0 / n as f32;
                (0..frames)
                    .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                    .collect()
            }
        }
    }

    /// Convert to the given channel count (mono upmix duplicates the channel,
    /// stereo downmix averages). Other target counts are unchanged inputs only.
    pub fn with_channel_count(self, target: usize) -> Self {
        if self.channel_count() == target {
            return self;
        }
        let sample_rate = self.sample_rate;
        match target {
            1 => {
                let mono = self.to_mono();
                AudioBuffer::mono(mono, sample_rate)
            }
            2 if self.channel_count() == 1 => {
                let mono = self.channels.into_iter().next().unwrap_or_default();
                AudioBuffer::stereo(mono.clone(), mono, sample_rate)
            }
            _ => self,
        }
    }

    /// Get interleaved samples [L, R, L, R, ...] (identity for mono)
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.len();
        let mut out = Vec::with_capacity(frames * self.channel_count());
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }
}

// =============================================================================
// Track representation
// =============================================================================

/// A raw input recording, not yet analyzed
#[derive(Debug, Clone)]
pub struct SourceTrack {
    /// Identifier for diagnostics and dedup (e.g., file stem)
    pub source_id: String,
    pub buffer: AudioBuffer,
}

/// An input recording after analysis
///
/// Tempo and key are computed exactly once, from the same unmodified buffer.
/// The assembler consumes a Track by value, so it is mixed at most once.
#[derive(Debug, Clone)]
pub struct Track {
    pub source_id: String,
    pub buffer: AudioBuffer,
    /// Estimated tempo in beats per minute (positive)
    pub tempo: f64,
    /// Detected dominant pitch class (no mode inference)
    pub key: PitchClass,
}

/// An ordered sequence of tracks sharing a compatibility criterion
#[derive(Debug)]
pub struct Group {
    /// Human-readable criterion, e.g., "key:A" or "cluster:0"
    pub label: String,
    pub tracks: Vec<Track>,
    /// Shared tempo the group is stretched to before assembly
    /// (set by the clustering strategy only)
    pub target_tempo: Option<f64>,
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Per-track diagnostic record emitted by every pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDiagnostic {
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_tempo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_key: Option<PitchClass>,
    /// True if the track passed the admission filter and was mixed
    pub admitted: bool,
    /// Label of the group the track was mixed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Reason the track was excluded (analysis failure or low tempo)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Final pipeline output: the mix plus per-track diagnostics
#[derive(Debug)]
pub struct MixOutput {
    pub mix: AudioBuffer,
    pub diagnostics: Vec<TrackDiagnostic>,
}
