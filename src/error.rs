//! Error types for the prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading assets or serving a prediction.
///
/// `AssetMissing` and `AssetInvalid` are fatal for the whole application.
/// `Scaling` and `Inference` abort only the request that raised them.
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Asset bundle not found at {}", path.display())]
    AssetMissing { path: PathBuf },

    #[error("Asset bundle at {} is invalid: {reason}", path.display())]
    AssetInvalid { path: PathBuf, reason: String },

    #[error("Scaling error: {0}")]
    Scaling(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

impl PredictorError {
    /// Whether the error halts the application rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AssetMissing { .. } | Self::AssetInvalid { .. })
    }

    /// Short machine-readable kind, used for metrics and JSON bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetMissing { .. } => "asset_missing",
            Self::AssetInvalid { .. } => "asset_invalid",
            Self::Scaling(_) => "scaling_error",
            Self::Inference(_) => "inference_error",
        }
    }
}

/// Result type alias for PredictorError
pub type Result<T> = std::result::Result<T, PredictorError>;
