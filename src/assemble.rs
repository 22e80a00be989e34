//! Mix assembly: the crossfade/hard-join state machine
//!
//! Segments arrive in mix order as (buffer, tempo) pairs and fold
//! left-to-right into one accumulator. The first segment is taken verbatim.
//! Every later segment joins by one of two policies:
//!
//! - Crossfade join (both tempos at or above the threshold): keep the first
//!   75% of the accumulator and the last 75% of the incoming segment, then
//!   blend them where they meet over the configured crossfade duration with
//!   linear gain ramps (100%/0% -> 0%/100%).
//! - Hard join (either tempo below the threshold): plain concatenation, no
//!   trimming, no fade.
//!
//! The crossfade window is clamped to the samples actually available on
//! each kept side, so short segments degrade gracefully instead of
//! producing out-of-bounds regions.
//!
//! Assembly is inherently sequential: each step's output is the next
//! step's input, so this state machine is never parallelized.

use crate::error::{MixdownError, Result};
use crate::types::AudioBuffer;
use tracing::debug;

/// Fraction of the accumulator kept ahead of a crossfade join
const LEAD_KEEP: f64 = 0.75;
/// Fraction of the incoming segment dropped before a crossfade join
const TAIL_SKIP: f64 = 0.25;

/// Accumulating mix timeline
///
/// Exclusively owned by the assembly pass; `finish()` consumes it.
pub struct MixAssembler {
    bpm_threshold: f64,
    crossfade_ms: u64,
    timeline: Option<AudioBuffer>,
    last_tempo: f64,
    segments_joined: usize,
}

impl MixAssembler {
    pub fn new(bpm_threshold: f64, crossfade_ms: u64) -> Self {
        Self {
            bpm_threshold,
            crossfade_ms,
            timeline: None,
            last_tempo: 0.0,
            segments_joined: 0,
        }
    }

    /// Number of segments appended so far
    pub fn len(&self) -> usize {
        self.segments_joined
    }

    pub fn is_empty(&self) -> bool {
        self.segments_joined == 0
    }

    /// Append the next segment, deciding the join policy from the previous
    /// and current tempos
    pub fn push(&mut self, segment: AudioBuffer, tempo: f64) -> Result<()> {
        let timeline = match self.timeline.take() {
            None => {
                debug!("Timeline starts with {} frames", segment.len());
                segment
            }
            Some(acc) => {
                if acc.channel_count() != segment.channel_count() {
                    return Err(MixdownError::Shape {
                        channels: segment.channel_count(),
                    });
                }
                if self.last_tempo >= self.bpm_threshold && tempo >= self.bpm_threshold {
                    crossfade_join(acc, segment, self.crossfade_ms)?
                } else {
                    hard_join(acc, segment)
                }
            }
        };
        self.timeline = Some(timeline);
        self.last_tempo = tempo;
        self.segments_joined += 1;
        Ok(())
    }

    /// Finish assembly, yielding the final mix
    pub fn finish(self) -> Result<AudioBuffer> {
        self.timeline.ok_or(MixdownError::EmptyTimeline)
    }
}

/// Fold an ordered segment sequence into one buffer
pub fn assemble(
    segments: impl IntoIterator<Item = (AudioBuffer, f64)>,
    bpm_threshold: f64,
    crossfade_ms: u64,
) -> Result<AudioBuffer> {
    let mut assembler = MixAssembler::new(bpm_threshold, crossfade_ms);
    for (buffer, tempo) in segments {
        assembler.push(buffer, tempo)?;
    }
    assembler.finish()
}

/// Plain concatenation: output length is exactly the sum of inputs
fn hard_join(a: AudioBuffer, b: AudioBuffer) -> AudioBuffer {
    debug!("Hard join: {} + {} frames", a.len(), b.len());
    let sample_rate = a.sample_rate();
    let mut channels = a.into_channels();
    for (dst, src) in channels.iter_mut().zip(b.into_channels()) {
        dst.extend(src);
    }
    AudioBuffer::from_planar(channels, sample_rate)
}

/// Trimmed, blended join: keep 75% of `a`, the last 75% of `b`, and overlap
/// the boundary over the crossfade duration
fn crossfade_join(a: AudioBuffer, b: AudioBuffer, crossfade_ms: u64) -> Result<AudioBuffer> {
    let sample_rate = a.sample_rate();
    let keep_a = (a.len() as f64 * LEAD_KEEP) as usize;
    let skip_b = (b.len() as f64 * TAIL_SKIP) as usize;
    let keep_b = b.len() - skip_b;

    if keep_a == 0 || keep_b == 0 {
        return Err(MixdownError::CrossfadeRange {
            reason: format!(
                "trimmed segments leave nothing to blend ({keep_a} and {keep_b} frames)"
            ),
        });
    }

    let configured = (crossfade_ms as f64 / 1000.0 * sample_rate as f64) as usize;
    // Clamp to what both kept sides can actually provide
    let overlap = configured.min(keep_a).min(keep_b).max(1);

    debug!(
        "Crossfade join: keep {} of {}, {} of {}, overlap {} frames",
        keep_a,
        a.len(),
        keep_b,
        b.len(),
        overlap
    );

    let out_len = keep_a + keep_b - overlap;
    let mut channels = Vec::with_capacity(a.channel_count());
    for (ch_a, ch_b) in a.channels().iter().zip(b.channels()) {
        let lead = &ch_a[..keep_a];
        let tail = &ch_b[skip_b..];

        let mut out = Vec::with_capacity(out_len);
        out.extend_from_slice(&lead[..keep_a - overlap]);
        for i in 0..overlap {
            let t = i as f32 / overlap as f32;
            out.push(lead[keep_a - overlap + i] * (1.0 - t) + tail[i] * t);
        }
        out.extend_from_slice(&tail[overlap..]);
        channels.push(out);
    }

    Ok(AudioBuffer::from_planar(channels, sample_rate))
}
