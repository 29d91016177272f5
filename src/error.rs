use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building the vignette, before the frame loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The step count divides the chisel track, so it must be positive.
    #[error("total step count must be positive")]
    ZeroSteps,

    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("chisel step size must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("scene dimensions must be non-zero, got {width}x{height}")]
    EmptyScene { width: u32, height: u32 },

    #[error("frame interval must be at least 1 ms")]
    ZeroFrameInterval,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse popup texts: {0}")]
    Texts(#[from] serde_json::Error),
}
