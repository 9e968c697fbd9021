use predictr_core::ValidationError;
use predictr_warehouse::WarehouseError;
use thiserror::Error;

use crate::artifact::ArtifactError;

const HINT_INPUT: &str = "invalid symbol or no market data";
const HINT_RETRY: &str = "try again later or contact support";

/// Failure taxonomy of the training and prediction pipeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(#[from] ValidationError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider failed or returned nothing.
    #[error("no market data for {symbol}: {reason}")]
    NoData { symbol: String, reason: String },

    #[error("insufficient data: need at least {needed} points, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// All closes are equal so min/max scaling is undefined.
    #[error("price range is degenerate (min == max == {value}); cannot scale")]
    DegenerateScale { value: f64 },

    #[error("model artifact '{path}' is missing")]
    ArtifactMissing { path: String },

    /// The artifact was written by an incompatible model version or shape.
    #[error("incompatible model artifact: {0}")]
    Compatibility(ArtifactError),

    #[error("failed to load model artifact: {0}")]
    Load(ArtifactError),

    #[error("model unavailable for {symbol}: {reason}")]
    ModelUnavailable { symbol: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] WarehouseError),
}

impl ForecastError {
    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "forecast.invalid_symbol",
            Self::InvalidRequest(_) => "forecast.invalid_request",
            Self::NoData { .. } => "forecast.no_data",
            Self::InsufficientData { .. } => "forecast.insufficient_data",
            Self::DegenerateScale { .. } => "forecast.degenerate_scale",
            Self::ArtifactMissing { .. } => "forecast.artifact_missing",
            Self::Compatibility(_) => "forecast.incompatible_model",
            Self::Load(_) => "forecast.load_failed",
            Self::ModelUnavailable { .. } => "forecast.model_unavailable",
            Self::Storage(_) => "forecast.storage",
        }
    }

    /// What a caller should tell the end user.
    pub const fn user_hint(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_)
            | Self::InvalidRequest(_)
            | Self::NoData { .. }
            | Self::InsufficientData { .. }
            | Self::DegenerateScale { .. } => HINT_INPUT,
            Self::ArtifactMissing { .. }
            | Self::Compatibility(_)
            | Self::Load(_)
            | Self::ModelUnavailable { .. }
            | Self::Storage(_) => HINT_RETRY,
        }
    }

    /// Whether the caller's arguments were rejected.
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidSymbol(_) | Self::InvalidRequest(_))
    }

    /// Whether a retrain may fix the failure.
    pub const fn is_compatibility(&self) -> bool {
        matches!(self, Self::Compatibility(_))
    }
}

impl From<ArtifactError> for ForecastError {
    fn from(error: ArtifactError) -> Self {
        if error.is_compatibility() {
            Self::Compatibility(error)
        } else {
            Self::Load(error)
        }
    }
}
