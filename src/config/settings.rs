//! Runtime configuration settings

use crate::grouping::StrategyKind;

/// Default admission threshold in BPM
pub const DEFAULT_BPM_THRESHOLD: f64 = 90.0;
/// Default crossfade duration in milliseconds
pub const DEFAULT_CROSSFADE_MS: u64 = 4000;
/// Default cluster count for the tempo-cluster strategy
pub const DEFAULT_CLUSTER_COUNT: usize = 3;
/// Default head margin before the earliest effect placement
pub const DEFAULT_HEAD_MARGIN_MS: u64 = 5000;

/// Runtime settings for one pipeline run
#[derive(Debug, Clone)]
pub struct MixSettings {
    /// Minimum tempo for a track to be admitted into the mix
    pub bpm_threshold: f64,
    /// Crossfade overlap duration in milliseconds
    pub crossfade_ms: u64,
    /// Grouping policy
    pub grouping: StrategyKind,
    /// Cluster count (tempo-cluster strategy only)
    pub cluster_count: usize,
    /// Head margin for effect overlay placement, in milliseconds
    pub head_margin_ms: u64,
    /// Seed for the overlay position; None draws from entropy
    pub seed: Option<u64>,
    /// Number of analysis worker threads
    pub analysis_threads: usize,
    /// Show a progress bar during analysis
    pub show_progress: bool,
}

impl MixSettings {
    /// Validate values a caller could plausibly get wrong
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.bpm_threshold <= 0.0 {
            return Err(crate::error::MixdownError::Config(format!(
                "bpm_threshold must be positive, got {}",
                self.bpm_threshold
            )));
        }
        if self.crossfade_ms == 0 {
            return Err(crate::error::MixdownError::Config(
                "crossfade_ms must be positive".to_string(),
            ));
        }
        if self.cluster_count == 0 {
            return Err(crate::error::MixdownError::Config(
                "cluster_count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            bpm_threshold: DEFAULT_BPM_THRESHOLD,
            crossfade_ms: DEFAULT_CROSSFADE_MS,
            grouping: StrategyKind::Harmonic,
            cluster_count: DEFAULT_CLUSTER_COUNT,
            head_margin_ms: DEFAULT_HEAD_MARGIN_MS,
            seed: None,
            analysis_threads: num_cpus::get().saturating_sub(1).max(1),
            show_progress: true,
        }
    }
}
