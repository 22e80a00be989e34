//! Diagnostics JSON export

use crate::error::{MixdownError, Result};
use crate::types::TrackDiagnostic;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize, Deserialize)]
pub struct MixdownJson {
    /// Schema version for forward compatibility
    pub version: String,
    /// Run metadata
    pub metadata: ExportMetadata,
    /// Per-track diagnostics
    pub tracks: Vec<TrackDiagnostic>,
}

/// Export metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// mixdown version that generated this file
    pub generator_version: String,
    /// Timestamp of export
    pub exported_at: String,
    /// Number of input tracks
    pub track_count: usize,
    /// Number of tracks admitted into the mix
    pub admitted_count: usize,
}

/// Write per-track diagnostics as JSON
pub fn write_json(diagnostics: &[TrackDiagnostic], path: &Path) -> Result<()> {
    let output = MixdownJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            track_count: diagnostics.len(),
            admitted_count: diagnostics.iter().filter(|d| d.admitted).count(),
        },
        tracks: diagnostics.to_vec(),
    };

    let file = File::create(path).map_err(|e| MixdownError::output_error(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &output).map_err(|e| MixdownError::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!(
        "Wrote diagnostics for {} tracks to {}",
        diagnostics.len(),
        path.display()
    );
    Ok(())
}
