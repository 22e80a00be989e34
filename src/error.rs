//! Unified error types for mixdown
//!
//! Error strategy:
//! - Per-track analysis errors: Recoverable, the track is excluded with a
//!   diagnostic and the run continues
//! - Structural errors (empty admitted set, empty timeline, degenerate
//!   crossfade geometry, malformed stretch request): Fatal, abort the run
//!
//! No error is dropped without a diagnostic record.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for mixdown operations
#[derive(Debug, Error)]
pub enum MixdownError {
    // =========================================================================
    // Recoverable errors - exclude track, continue run
    // =========================================================================
    #[error("Analysis failed for '{source_id}': {reason}")]
    Analysis { source_id: String, reason: String },

    // =========================================================================
    // Structural errors - abort the run
    // =========================================================================
    #[error("No tracks survived the admission filter; nothing to mix")]
    EmptyInput,

    #[error("Mix assembler was given no segments")]
    EmptyTimeline,

    #[error("Invalid tempo for stretch: {original} -> {target} (both must be positive)")]
    InvalidRate { original: f64, target: f64 },

    #[error("Unsupported buffer shape: {channels} channels (expected mono or stereo)")]
    Shape { channels: usize },

    #[error("Degenerate crossfade window: {reason}")]
    CrossfadeRange { reason: String },

    #[error("Mix too short for effect overlay: {mix_frames} frames, need at least {required_frames}")]
    InsufficientLength {
        mix_frames: usize,
        required_frames: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot write output to '{path}': {reason}")]
    Output { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mixdown operations
pub type Result<T> = std::result::Result<T, MixdownError>;

impl MixdownError {
    /// Returns true if this error is recoverable (exclude track, continue run)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MixdownError::Analysis { .. })
    }

    /// Create an analysis error for a given source
    pub fn analysis(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        MixdownError::Analysis {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, describing common causes
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => format!(
                "Directory does not exist: {}",
                path.parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
            _ => err.to_string(),
        };
        MixdownError::Output { path, reason }
    }
}
