//! Pipeline orchestration
//!
//! Coordinates the full run: parallel per-track analysis, the admission
//! filter, compatibility grouping, tempo matching, sequential assembly,
//! and the optional effect overlay. Per-track analysis failures are
//! recovered locally with a diagnostic; structural failures abort the run.

use crate::analysis::{ChromaKeyEstimator, KeyEstimator, OnsetTempoEstimator, TempoEstimator};
use crate::assemble::MixAssembler;
use crate::config::MixSettings;
use crate::error::{MixdownError, Result};
use crate::grouping::strategy_for;
use crate::overlay::overlay_effect;
use crate::stretch::stretch_to_tempo;
use crate::types::{AudioBuffer, MixOutput, SourceTrack, Track, TrackDiagnostic};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the full mix pipeline over decoded source tracks
///
/// Returns the final mix buffer and one diagnostic record per input track.
pub fn run(
    sources: Vec<SourceTrack>,
    effect: Option<&AudioBuffer>,
    settings: &MixSettings,
) -> Result<MixOutput> {
    let pipeline_start = Instant::now();
    settings.validate()?;
    configure_thread_pool(settings.analysis_threads)?;

    if sources.is_empty() {
        return Err(MixdownError::EmptyInput);
    }

    // Phase 1: Analysis (parallel; each track owns its buffer exclusively)
    let analysis_start = Instant::now();
    info!("Analyzing {} tracks", sources.len());
    let (analyzed, mut diagnostics) = analyze_tracks(sources, settings);
    info!(
        "Analysis completed in {:.2}s",
        analysis_start.elapsed().as_secs_f64()
    );

    // Phase 2: Admission filter
    let mut admitted = Vec::new();
    for track in analyzed {
        if track.tempo >= settings.bpm_threshold {
            admitted.push(track);
        } else {
            info!(
                "Excluding '{}': {:.0} BPM below threshold {:.0}",
                track.source_id, track.tempo, settings.bpm_threshold
            );
            if let Some(diag) = find_diag(&mut diagnostics, &track.source_id) {
                diag.admitted = false;
                diag.failure = Some(format!(
                    "tempo {:.0} below admission threshold {:.0}",
                    track.tempo, settings.bpm_threshold
                ));
            }
        }
    }
    if admitted.is_empty() {
        return Err(MixdownError::EmptyInput);
    }

    // Mixed mono/stereo inputs are normalized to a common channel count;
    // mixed sample rates would need resampling, which is out of scope here
    let admitted = normalize_channels(admitted)?;

    // Phase 3: Grouping
    let strategy = strategy_for(settings.grouping, settings.cluster_count);
    info!(
        "Grouping {} admitted tracks with '{}' strategy",
        admitted.len(),
        strategy.name()
    );
    let groups = strategy.group(admitted)?;
    for group in &groups {
        for track in &group.tracks {
            if let Some(diag) = find_diag(&mut diagnostics, &track.source_id) {
                diag.admitted = true;
                diag.group = Some(group.label.clone());
            }
        }
    }

    // Phase 4: Tempo matching + sequential assembly (left fold, never parallel)
    let mut assembler = MixAssembler::new(settings.bpm_threshold, settings.crossfade_ms);
    for group in groups {
        debug!("Assembling group '{}'", group.label);
        let target = group.target_tempo;
        for track in group.tracks {
            let (buffer, tempo) = match target {
                Some(target) if target != track.tempo => {
                    debug!(
                        "Stretching '{}' {:.0} -> {:.0} BPM",
                        track.source_id, track.tempo, target
                    );
                    (stretch_to_tempo(&track.buffer, track.tempo, target)?, target)
                }
                Some(target) => (track.buffer, target),
                None => (track.buffer, track.tempo),
            };
            assembler.push(buffer, tempo)?;
        }
    }
    let mut mix = assembler.finish()?;

    // Phase 5: Optional effect overlay
    if let Some(effect) = effect {
        if effect.sample_rate() != mix.sample_rate() {
            return Err(MixdownError::Config(format!(
                "effect sample rate {} does not match mix rate {}",
                effect.sample_rate(),
                mix.sample_rate()
            )));
        }
        let head_margin =
            (settings.head_margin_ms as f64 / 1000.0 * mix.sample_rate() as f64) as usize;
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let position = overlay_effect(&mut mix, effect, head_margin, &mut rng)?;
        info!(
            "Effect overlaid at {:.1}s",
            position as f64 / mix.sample_rate() as f64
        );
    }

    info!(
        "Mix of {:.1}s assembled in {:.2}s total",
        mix.duration_secs(),
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(MixOutput { mix, diagnostics })
}

/// Estimate tempo and key for every source in parallel
///
/// Failing tracks become failure diagnostics; the run continues.
fn analyze_tracks(
    sources: Vec<SourceTrack>,
    settings: &MixSettings,
) -> (Vec<Track>, Vec<TrackDiagnostic>) {
    let tempo_estimator: Arc<dyn TempoEstimator> = Arc::new(OnsetTempoEstimator::new());
    let key_estimator: Arc<dyn KeyEstimator> = Arc::new(ChromaKeyEstimator::new());

    let progress = if settings.show_progress {
        let pb = ProgressBar::new(sources.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<(Option<Track>, TrackDiagnostic)> = sources
        .into_par_iter()
        .map(|source| {
            let outcome = analyze_single(source, &tempo_estimator, &key_estimator);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            outcome
        })
        .collect();
    if let Some(pb) = progress {
        pb.finish_with_message("Analysis complete");
    }

    let mut tracks = Vec::new();
    let mut diagnostics = Vec::new();
    for (track, diag) in outcomes {
        if let Some(track) = track {
            tracks.push(track);
        }
        diagnostics.push(diag);
    }
    (tracks, diagnostics)
}

fn analyze_single(
    source: SourceTrack,
    tempo_estimator: &Arc<dyn TempoEstimator>,
    key_estimator: &Arc<dyn KeyEstimator>,
) -> (Option<Track>, TrackDiagnostic) {
    let SourceTrack { source_id, buffer } = source;
    debug!("Analyzing '{source_id}' ({} frames)", buffer.len());

    // Both estimates come from the same, unmodified buffer
    let result = tempo_estimator
        .estimate(&buffer)
        .and_then(|tempo| key_estimator.estimate(&buffer).map(|key| (tempo, key)));

    match result {
        Ok((tempo, key)) => {
            debug!("Analyzed '{source_id}': {tempo:.0} BPM, key {key}");
            let diag = TrackDiagnostic {
                source_id: source_id.clone(),
                estimated_tempo: Some(tempo),
                estimated_key: Some(key),
                admitted: false, // set true once grouped
                group: None,
                failure: None,
            };
            (
                Some(Track {
                    source_id,
                    buffer,
                    tempo,
                    key,
                }),
                diag,
            )
        }
        Err(e) => {
            // Estimators don't know which source they analyze; stamp it here
            let e = match e {
                MixdownError::Analysis { reason, .. } => {
                    MixdownError::analysis(source_id.clone(), reason)
                }
                other => other,
            };
            warn!("Skipping '{source_id}': {e}");
            let diag = TrackDiagnostic {
                source_id,
                estimated_tempo: None,
                estimated_key: None,
                admitted: false,
                group: None,
                failure: Some(e.to_string()),
            };
            (None, diag)
        }
    }
}

/// Upmix mono tracks when any admitted track is stereo; reject mixed rates
fn normalize_channels(tracks: Vec<Track>) -> Result<Vec<Track>> {
    let sample_rate = tracks[0].buffer.sample_rate();
    if let Some(other) = tracks
        .iter()
        .find(|t| t.buffer.sample_rate() != sample_rate)
    {
        return Err(MixdownError::Config(format!(
            "mixed sample rates: '{}' is {} Hz, expected {} Hz (resample inputs first)",
            other.source_id,
            other.buffer.sample_rate(),
            sample_rate
        )));
    }

    let channels = tracks
        .iter()
        .map(|t| t.buffer.channel_count())
        .max()
        .unwrap_or(1);
    Ok(tracks
        .into_iter()
        .map(|mut t| {
            t.buffer = t.buffer.with_channel_count(channels);
            t
        })
        .collect())
}

fn find_diag<'a>(
    diagnostics: &'a mut [TrackDiagnostic],
    source_id: &str,
) -> Option<&'a mut TrackDiagnostic> {
    diagnostics.iter_mut().find(|d| d.source_id == source_id)
}

/// Configure the Rayon thread pool
fn configure_thread_pool(num_threads: usize) -> Result<()> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => {
            debug!("Configured thread pool with {num_threads} threads");
            Ok(())
        }
        Err(e) => {
            // Already initialized (e.g., in tests) is fine
            if e.to_string().contains("already been initialized") {
                debug!("Thread pool already initialized, using existing pool");
                Ok(())
            } else {
                Err(MixdownError::Config(format!(
                    "Failed to configure thread pool: {e}"
                )))
            }
        }
    }
}
