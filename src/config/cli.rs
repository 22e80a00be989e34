//! CLI argument parsing

use crate::config::settings::{
    MixSettings, DEFAULT_BPM_THRESHOLD, DEFAULT_CLUSTER_COUNT, DEFAULT_CROSSFADE_MS,
};
use crate::grouping::StrategyKind;
use clap::Parser;
use std::path::PathBuf;

/// mixdown - offline DJ mix assembly
///
/// Analyzes decoded WAV tracks for tempo and musical key, groups them by
/// compatibility, tempo-matches where needed, and stitches them into one
/// continuous mix with crossfades.
#[derive(Parser, Debug)]
#[command(name = "mixdown")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input path (WAV file or directory of WAV files)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory for the mix and diagnostics
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Minimum BPM for a track to be admitted into the mix
    #[arg(long, value_name = "BPM", default_value_t = DEFAULT_BPM_THRESHOLD)]
    pub bpm_threshold: f64,

    /// Crossfade overlap duration in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_CROSSFADE_MS)]
    pub crossfade_ms: u64,

    /// Grouping strategy
    #[arg(long, value_enum, default_value = "harmonic")]
    pub strategy: StrategyKind,

    /// Cluster count (tempo-cluster strategy only)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CLUSTER_COUNT)]
    pub clusters: usize,

    /// WAV file overlaid at a random interior position of the final mix
    #[arg(long, value_name = "PATH")]
    pub effect: Option<PathBuf>,

    /// Seed for the effect overlay position (reproducible runs)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Number of analysis worker threads (defaults to CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Scan subdirectories recursively
    #[arg(short, long, default_value = "true")]
    pub recursive: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bar)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Build runtime settings from the parsed arguments
    pub fn to_settings(&self) -> MixSettings {
        let default_threads = num_cpus::get().saturating_sub(1).max(1);
        MixSettings {
            bpm_threshold: self.bpm_threshold,
            crossfade_ms: self.crossfade_ms,
            grouping: self.strategy,
            cluster_count: self.clusters,
            seed: self.seed,
            analysis_threads: self.threads.unwrap_or(default_threads),
            show_progress: !self.quiet,
            ..MixSettings::default()
        }
    }
}
