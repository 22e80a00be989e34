//! Integration tests for the mixdown pipeline
//!
//! End-to-end scenarios over synthetic signals: click tracks with a known
//! tempo and a sustained carrier tone that pins the detected key.

use mixdown::config::MixSettings;
use mixdown::grouping::StrategyKind;
use mixdown::types::{AudioBuffer, SourceTrack};
use mixdown::MixdownError;
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44100;

/// Generate a click track at a known BPM with a sustained tone underneath
///
/// The decaying 1 kHz clicks carry the tempo; the quieter continuous tone
/// dominates the time-averaged chroma and so fixes the detected key.
fn synthetic_track(bpm: f64, carrier_hz: f32, duration_secs: f64) -> AudioBuffer {
    let frames = (SAMPLE_RATE as f64 * duration_secs) as usize;
    let mut samples = vec![0.0f32; frames];

    // Sustained carrier
    for (i, sample) in samples.iter_mut().enumerate() {
        let t = i as f32 / SAMPLE_RATE as f32;
        *sample = (2.0 * PI * carrier_hz * t).sin() * 0.3;
    }

    // Clicks on the beat grid
    let frames_per_beat = 60.0 / bpm * SAMPLE_RATE as f64;
    let click_frames = (SAMPLE_RATE as f64 * 0.005) as usize;
    let mut beat = 0.0f64;
    while (beat as usize) < frames {
        let start = beat as usize;
        for j in 0..click_frames {
            if start + j < frames {
                let t = j as f32 / SAMPLE_RATE as f32;
                samples[start + j] += (2.0 * PI * 1000.0 * t).sin() * (-t * 500.0).exp() * 0.7;
            }
        }
        beat += frames_per_beat;
    }

    AudioBuffer::mono(samples, SAMPLE_RATE)
}

fn source(id: &str, bpm: f64, carrier_hz: f32) -> SourceTrack {
    SourceTrack {
        source_id: id.to_string(),
        buffer: synthetic_track(bpm, carrier_hz, 8.0),
    }
}

fn test_settings() -> MixSettings {
    MixSettings {
        show_progress: false,
        analysis_threads: 2,
        seed: Some(1),
        ..MixSettings::default()
    }
}

const A4: f32 = 440.0;
const C4: f32 = 261.63;

#[test]
fn scenario_a_same_key_tracks_crossfade_into_one_group() {
    // Two mono tracks at ~120 BPM, same key, threshold 90
    let sources = vec![source("one", 120.0, A4), source("two", 120.0, A4)];
    let input_len: usize = sources.iter().map(|s| s.buffer.len()).sum();

    let output = mixdown::pipeline::run(sources, None, &test_settings()).unwrap();

    // Both admitted into the same key group
    assert!(output.diagnostics.iter().all(|d| d.admitted));
    let groups: Vec<_> = output
        .diagnostics
        .iter()
        .map(|d| d.group.clone().unwrap())
        .collect();
    assert_eq!(groups[0], groups[1]);

    // A single crossfade join trims the result below the input sum
    assert!(output.mix.len() < input_len);
    assert!(!output.mix.is_empty());
}

#[test]
fn scenario_b_slow_track_is_excluded_and_reported() {
    // Tempos 60, 130, 140 with threshold 90: the 60 BPM track drops out
    let sources = vec![
        source("slow", 60.0, A4),
        source("mid", 130.0, A4),
        source("fast", 140.0, A4),
    ];

    let output = mixdown::pipeline::run(sources, None, &test_settings()).unwrap();

    let slow = output
        .diagnostics
        .iter()
        .find(|d| d.source_id == "slow")
        .unwrap();
    assert!(!slow.admitted);
    assert!(slow.failure.as_deref().unwrap().contains("threshold"));
    assert!(slow.group.is_none());

    let admitted: Vec<_> = output.diagnostics.iter().filter(|d| d.admitted).collect();
    assert_eq!(admitted.len(), 2);
    assert!(!output.mix.is_empty());
}

#[test]
fn scenario_c_tempo_clusters_ignore_key() {
    // tempo_cluster with 2 clusters over tempos [70, 72, 140, 142],
    // threshold lowered so all four are admitted; keys deliberately differ
    let sources = vec![
        source("s1", 70.0, A4),
        source("s2", 72.0, C4),
        source("f1", 140.0, A4),
        source("f2", 142.0, C4),
    ];
    let settings = MixSettings {
        bpm_threshold: 50.0,
        grouping: StrategyKind::TempoCluster,
        cluster_count: 2,
        ..test_settings()
    };

    let output = mixdown::pipeline::run(sources, None, &settings).unwrap();

    assert!(output.diagnostics.iter().all(|d| d.admitted));
    let group_of = |id: &str| {
        output
            .diagnostics
            .iter()
            .find(|d| d.source_id == id)
            .and_then(|d| d.group.clone())
            .unwrap()
    };
    // Partitioned by tempo proximity, independent of detected key
    assert_eq!(group_of("s1"), group_of("s2"));
    assert_eq!(group_of("f1"), group_of("f2"));
    assert_ne!(group_of("s1"), group_of("f1"));
}

#[test]
fn failing_track_is_recovered_and_run_continues() {
    let sources = vec![
        source("good", 120.0, A4),
        SourceTrack {
            source_id: "broken".to_string(),
            buffer: AudioBuffer::mono(Vec::new(), SAMPLE_RATE),
        },
        source("also-good", 124.0, A4),
    ];

    let output = mixdown::pipeline::run(sources, None, &test_settings()).unwrap();

    let broken = output
        .diagnostics
        .iter()
        .find(|d| d.source_id == "broken")
        .unwrap();
    assert!(!broken.admitted);
    assert!(broken.estimated_tempo.is_none());
    // The failure record names the source it belongs to
    assert!(
        broken.failure.as_deref().unwrap().contains("broken"),
        "failure should name the source: {:?}",
        broken.failure
    );

    assert_eq!(output.diagnostics.iter().filter(|d| d.admitted).count(), 2);
}

#[test]
fn run_aborts_when_nothing_survives_admission() {
    let sources = vec![source("slow", 60.0, A4)];
    let settings = MixSettings {
        bpm_threshold: 150.0,
        ..test_settings()
    };
    let err = mixdown::pipeline::run(sources, None, &settings).unwrap_err();
    assert!(matches!(err, MixdownError::EmptyInput));
}

#[test]
fn raising_the_threshold_never_admits_more_tracks() {
    let build = || {
        vec![
            source("a", 100.0, A4),
            source("b", 120.0, A4),
            source("c", 140.0, A4),
        ]
    };
    let admitted_at = |threshold: f64| {
        let settings = MixSettings {
            bpm_threshold: threshold,
            ..test_settings()
        };
        mixdown::pipeline::run(build(), None, &settings)
            .map(|o| {
                o.diagnostics
                    .iter()
                    .filter(|d| d.admitted)
                    .map(|d| d.source_id.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };

    let low = admitted_at(90.0);
    let high = admitted_at(130.0);
    assert!(high.len() <= low.len());
    for id in &high {
        assert!(low.contains(id), "{id} admitted at 130 but not at 90");
    }
}

#[test]
fn effect_overlay_is_deterministic_with_a_seed() {
    let effect = synthetic_track(120.0, 880.0, 0.5);
    let run_once = || {
        let sources = vec![source("one", 120.0, A4), source("two", 122.0, A4)];
        let settings = MixSettings {
            seed: Some(99),
            ..test_settings()
        };
        mixdown::pipeline::run(sources, Some(&effect), &settings).unwrap()
    };

    let first = run_once();
    let second = run_once();
    assert_eq!(first.mix, second.mix);
}

#[test]
fn effect_overlay_rejects_a_too_short_mix() {
    // Effect longer than the whole mix can never fit the margins
    let effect = synthetic_track(120.0, 880.0, 30.0);
    let sources = vec![source("one", 120.0, A4)];
    let err = mixdown::pipeline::run(sources, Some(&effect), &test_settings()).unwrap_err();
    assert!(matches!(err, MixdownError::InsufficientLength { .. }));
}

#[test]
fn mixed_sample_rates_abort_the_run() {
    let mut sources = vec![source("a", 120.0, A4)];
    let other_rate = {
        let buffer = source("b", 120.0, A4).buffer;
        AudioBuffer::mono(buffer.to_mono(), 48000)
    };
    sources.push(SourceTrack {
        source_id: "b".to_string(),
        buffer: other_rate,
    });

    let err = mixdown::pipeline::run(sources, None, &test_settings()).unwrap_err();
    assert!(matches!(err, MixdownError::Config(_)));
}

#[test]
fn mono_and_stereo_inputs_mix_together() {
    let mono = source("mono", 120.0, A4);
    let stereo_samples = source("x", 124.0, A4).buffer.to_mono();
    let stereo = SourceTrack {
        source_id: "stereo".to_string(),
        buffer: AudioBuffer::stereo(stereo_samples.clone(), stereo_samples, SAMPLE_RATE),
    };

    let output = mixdown::pipeline::run(vec![mono, stereo], None, &test_settings()).unwrap();
    assert_eq!(output.mix.channel_count(), 2);
}

#[test]
fn tempo_sort_strategy_orders_the_whole_set() {
    let sources = vec![
        source("fast", 140.0, A4),
        source("slow", 100.0, C4),
        source("mid", 120.0, A4),
    ];
    let settings = MixSettings {
        grouping: StrategyKind::TempoSort,
        ..test_settings()
    };

    let output = mixdown::pipeline::run(sources, None, &settings).unwrap();
    assert!(output.diagnostics.iter().all(|d| d.admitted));
    assert!(output
        .diagnostics
        .iter()
        .all(|d| d.group.as_deref() == Some("all")));
}

#[test]
fn wav_files_round_trip_through_the_bridging_layer() {
    use mixdown::audio::{load_wav, save_wav};
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("track.wav");

    let buffer = synthetic_track(120.0, A4, 2.0);
    save_wav(&buffer, &path).unwrap();
    let loaded = load_wav(&path).unwrap();

    assert_eq!(loaded.len(), buffer.len());
    assert_eq!(loaded.sample_rate(), SAMPLE_RATE);
}
