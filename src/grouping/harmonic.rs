//! Harmonic grouping: bucket by detected key, sort by tempo within a bucket
//!
//! Bucket membership is exact pitch-class equality of the detected key; the
//! compatibility table is not consulted for membership, only available for
//! cross-bucket ordering decisions. Buckets iterate in first-seen order,
//! which is deterministic for a given input order.

use crate::error::Result;
use crate::grouping::{reject_empty, GroupingStrategy};
use crate::types::{Group, PitchClass, Track};
use tracing::debug;

#[derive(Debug, Default)]
pub struct HarmonicGrouping;

impl HarmonicGrouping {
    pub fn new() -> Self {
        Self
    }
}

impl GroupingStrategy for HarmonicGrouping {
    fn group(&self, tracks: Vec<Track>) -> Result<Vec<Group>> {
        reject_empty(&tracks)?;

        // First-seen key order keeps bucket iteration deterministic
        let mut buckets: Vec<(PitchClass, Vec<Track>)> = Vec::new();
        for track in tracks {
            match buckets.iter_mut().find(|(key, _)| *key == track.key) {
                Some((_, bucket)) => bucket.push(track),
                None => buckets.push((track.key, vec![track])),
            }
        }

        let groups = buckets
            .into_iter()
            .map(|(key, mut bucket)| {
                // Stable: identical tempos keep their input order
                bucket.sort_by(|a, b| a.tempo.total_cmp(&b.tempo));
                debug!("Key bucket {key}: {} tracks", bucket.len());
                Group {
                    label: format!("key:{key}"),
                    tracks: bucket,
                    target_tempo: None,
                }
            })
            .collect();

        Ok(groups)
    }

    fn name(&self) -> &'static str {
        "harmonic"
    }
}
