//! Compatibility grouping strategies
//!
//! Three interchangeable policies decide the mix order: harmonic bucketing
//! by detected key, unsupervised tempo clustering, and a degenerate
//! whole-set tempo sort. All produce a partition of the admitted tracks.

pub mod cluster;
pub mod harmonic;
pub mod tempo_sort;

use crate::error::{MixdownError, Result};
use crate::types::{Group, Track};
use serde::{Deserialize, Serialize};

pub use cluster::TempoClustering;
pub use harmonic::HarmonicGrouping;
pub use tempo_sort::TempoSort;

/// Grouping policy: consumes the admitted set, yields ordered, disjoint groups
pub trait GroupingStrategy: Send + Sync {
    /// Partition tracks into ordered groups
    ///
    /// Fails with `EmptyInput` when given zero tracks.
    fn group(&self, tracks: Vec<Track>) -> Result<Vec<Group>>;

    /// Name of this strategy (for logging)
    fn name(&self) -> &'static str;
}

/// Strategy selector carried in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Bucket by detected key, ascending tempo within a bucket
    Harmonic,
    /// Partition by tempo proximity (1-D k-means)
    TempoCluster,
    /// One group, whole set sorted by ascending tempo
    TempoSort,
}

/// Instantiate the strategy selected by configuration
pub fn strategy_for(kind: StrategyKind, cluster_count: usize) -> Box<dyn GroupingStrategy> {
    match kind {
        StrategyKind::Harmonic => Box::new(HarmonicGrouping::new()),
        StrategyKind::TempoCluster => Box::new(TempoClustering::new(cluster_count)),
        StrategyKind::TempoSort => Box::new(TempoSort::new()),
    }
}

pub(crate) fn reject_empty(tracks: &[Track]) -> Result<()> {
    if tracks.is_empty() {
        Err(MixdownError::EmptyInput)
    } else {
        Ok(())
    }
}
