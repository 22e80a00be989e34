//! Degenerate strategy: no grouping, one tempo-sorted sequence
//!
//! The whole admitted set becomes a single group ordered by ascending
//! tempo. Join policy alone (crossfade vs. hard join) handles the
//! transitions.

use crate::error::Result;
use crate::grouping::{reject_empty, GroupingStrategy};
use crate::types::{Group, Track};

#[derive(Debug, Default)]
pub struct TempoSort;

impl TempoSort {
    pub fn new() -> Self {
        Self
    }
}

impl GroupingStrategy for TempoSort {
    fn group(&self, mut tracks: Vec<Track>) -> Result<Vec<Group>> {
        reject_empty(&tracks)?;
        tracks.sort_by(|a, b| a.tempo.total_cmp(&b.tempo));
        Ok(vec![Group {
            label: "all".to_string(),
            tracks,
            target_tempo: None,
        }])
    }

    fn name(&self) -> &'static str {
        "tempo-sort"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::test_support::track;
    use crate::types::PitchClass;

    #[test]
    fn single_group_sorted_by_tempo() {
        let tracks = vec![
            track("c", 140.0, PitchClass::C),
            track("a", 100.0, PitchClass::G),
            track("b", 120.0, PitchClass::E),
        ];
        let groups = TempoSort::new().group(tracks).unwrap();
        assert_eq!(groups.len(), 1);
        let tempos: Vec<f64> = groups[0].tracks.iter().map(|t| t.tempo).collect();
        assert_eq!(tempos, vec![100.0, 120.0, 140.0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let tracks = vec![
            track("x", 120.0, PitchClass::C),
            track("y", 120.0, PitchClass::C),
        ];
        let groups = TempoSort::new().group(tracks).unwrap();
        let ids: Vec<&str> = groups[0]
            .tracks
            .iter()
            .map(|t| t.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "y"]);
    }
}
