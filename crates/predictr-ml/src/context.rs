use std::sync::Arc;

use predictr_core::{PriceHistorySource, Symbol};
use predictr_warehouse::{ArtifactStore, ModelRecord, ModelStore, WarehouseError};

use crate::artifact::{self, ArtifactError, ModelArtifact};
use crate::clock::Clock;
use crate::single_flight::SymbolLocks;
use crate::ForecastError;

/// Handles shared by the trainer, predictor and sweeper.
#[derive(Clone)]
pub struct ForecastContext {
    pub source: Arc<dyn PriceHistorySource>,
    pub models: Arc<dyn ModelStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub clock: Arc<dyn Clock>,
    pub locks: SymbolLocks,
}

impl ForecastContext {
    pub fn new(
        source: Arc<dyn PriceHistorySource>,
        models: Arc<dyn ModelStore>,
        artifacts: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            models,
            artifacts,
            clock,
            locks: SymbolLocks::new(),
        }
    }

    pub(crate) fn find_record(&self, symbol: &Symbol) -> Result<Option<ModelRecord>, ForecastError> {
        Ok(self.models.find(symbol.as_str())?)
    }

    /// Read and decode the artifact a record points at.
    pub(crate) fn load_model(&self, record: &ModelRecord) -> Result<ModelArtifact, ForecastError> {
        let bytes = match self.artifacts.read(&record.model_path) {
            Ok(bytes) => bytes,
            Err(WarehouseError::NotFound(_)) => {
                return Err(ForecastError::ArtifactMissing {
                    path: record.model_path.clone(),
                })
            }
            Err(error) => return Err(error.into()),
        };

        let artifact = artifact::decode(&bytes)?;
        if artifact.symbol != record.symbol {
            return Err(ArtifactError::ShapeMismatch(format!(
                "artifact belongs to {}, not {}",
                artifact.symbol, record.symbol
            ))
            .into());
        }
        if artifact.time_steps != record.time_steps {
            return Err(ArtifactError::ShapeMismatch(format!(
                "artifact window {} does not match record window {}",
                artifact.time_steps, record.time_steps
            ))
            .into());
        }
        Ok(artifact)
    }
}

/// Key under which a symbol's artifact is stored.
pub fn artifact_key(symbol: &Symbol) -> String {
    format!("{}_lstm.json", symbol.file_stem())
}
