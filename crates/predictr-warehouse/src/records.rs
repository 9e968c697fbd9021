use serde::{Deserialize, Serialize};

/// Registry row describing the current model for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Upper-case ticker; primary key.
    pub symbol: String,
    /// Artifact key in the artifact store.
    pub model_path: String,
    /// RFC 3339 UTC timestamp of the training run that produced the artifact.
    pub trained_on: String,
    /// Epochs actually run (early stopping may cut training short).
    pub epochs: u32,
    /// Window length the model was trained with.
    pub time_steps: u32,
    pub scaler_min: f64,
    pub scaler_max: f64,
}

/// Outcome of a training attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Audit row appended for every training attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub run_id: String,
    pub symbol: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub epochs: u32,
    pub samples: u64,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f64>,
    /// RFC 3339 UTC timestamp.
    pub recorded_at: String,
}
