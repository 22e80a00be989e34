//! mixdown CLI entry point

use clap::Parser;
use mixdown::audio::{load_wav, save_wav};
use mixdown::config::Cli;
use mixdown::pipeline;
use mixdown::types::SourceTrack;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let settings = cli.to_settings();

    // Discover and load WAV inputs
    let paths = discover_wavs(&cli.input, cli.recursive);
    if paths.is_empty() {
        eprintln!("No WAV files found in {}", cli.input.display());
        return ExitCode::FAILURE;
    }
    let mut sources = Vec::new();
    for path in &paths {
        match load_wav(path) {
            Ok(buffer) => sources.push(SourceTrack {
                source_id: source_id_for(path),
                buffer,
            }),
            Err(e) => warn!("Skipping {}: {e}", path.display()),
        }
    }

    // Optional effect sample
    let effect = match &cli.effect {
        Some(path) => match load_wav(path) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                eprintln!("Error: cannot load effect sample: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    match pipeline::run(sources, effect.as_ref(), &settings) {
        Ok(output) => {
            if let Err(e) = std::fs::create_dir_all(&cli.output) {
                eprintln!("Error: cannot create output directory: {e}");
                return ExitCode::FAILURE;
            }

            let mix_path = cli.output.join("mix.wav");
            if let Err(e) = save_wav(&output.mix, &mix_path) {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
            let json_path = cli.output.join("mixdown.json");
            if let Err(e) = mixdown::export::write_json(&output.diagnostics, &json_path) {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }

            let admitted = output.diagnostics.iter().filter(|d| d.admitted).count();
            println!();
            println!(
                "Mixed {} of {} tracks into {} ({:.1}s)",
                admitted,
                output.diagnostics.len(),
                mix_path.display(),
                output.mix.duration_secs()
            );
            for diag in output.diagnostics.iter().filter(|d| !d.admitted) {
                println!(
                    "  excluded {}: {}",
                    diag.source_id,
                    diag.failure.as_deref().unwrap_or("unknown reason")
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.input.exists() {
        return Err(format!(
            "Input path does not exist: {}\n  Tip: mixdown -i ~/Music/set -o ./out",
            cli.input.display()
        ));
    }
    if let Some(effect) = &cli.effect {
        if !effect.exists() {
            return Err(format!("Effect sample does not exist: {}", effect.display()));
        }
    }
    Ok(())
}

/// Scan a path (file or directory) for WAV files
fn discover_wavs(input: &Path, recursive: bool) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let walker = if recursive {
        WalkDir::new(input)
    } else {
        WalkDir::new(input).max_depth(1)
    };
    let mut paths: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && has_wav_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn source_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}
