//! Entry points shared by every front end.
//!
//! `train` and `predict` fold failures into tagged results so callers can
//! serialize them directly; inspection calls return `Result`.

use std::sync::Arc;

use predictr_core::{ForecastPoint, PriceHistorySource, Symbol};
use predictr_warehouse::{ArtifactStore, ModelRecord, ModelStore, TrainingRun};
use serde::Serialize;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::config::{ForecastConfig, TrainingConfig};
use crate::context::ForecastContext;
use crate::predictor::{Forecast, Predictor};
use crate::sweeper::{SweepReport, Sweeper};
use crate::trainer::Trainer;
use crate::ForecastError;

/// Outcome of an explicit training request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainResult {
    Success {
        symbol: String,
        model_path: String,
        trained_epochs: u32,
        samples: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        final_loss: Option<f64>,
    },
    Failed {
        symbol: String,
        code: &'static str,
        reason: String,
    },
}

impl TrainResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Outcome of a prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Success {
        symbol: String,
        predictions: Vec<ForecastPoint>,
        /// Last predicted close.
        future_value: f64,
    },
    Error {
        symbol: String,
        code: &'static str,
        message: String,
        hint: &'static str,
    },
}

impl PredictionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn from_error(symbol: &str, error: &ForecastError) -> Self {
        Self::Error {
            symbol: symbol.trim().to_ascii_uppercase(),
            code: error.code(),
            message: error.to_string(),
            hint: error.user_hint(),
        }
    }
}

#[derive(Clone)]
pub struct ForecastService {
    ctx: ForecastContext,
    trainer: Trainer,
    predictor: Predictor,
    sweeper: Sweeper,
}

impl ForecastService {
    /// Service on the system clock with default configs.
    pub fn new(
        source: Arc<dyn PriceHistorySource>,
        models: Arc<dyn ModelStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self::with_context(
            ForecastContext::new(source, models, artifacts, Arc::new(SystemClock)),
            TrainingConfig::default(),
            ForecastConfig::default(),
        )
    }

    pub fn with_context(
        ctx: ForecastContext,
        training: TrainingConfig,
        forecast: ForecastConfig,
    ) -> Self {
        let trainer = Trainer::new(ctx.clone(), training);
        let predictor = Predictor::new(ctx.clone(), trainer.clone(), forecast);
        let sweeper = Sweeper::new(ctx.clone());
        Self {
            ctx,
            trainer,
            predictor,
            sweeper,
        }
    }

    /// Replace the clock, keeping stores and configs.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let training = self.trainer.config().clone();
        let forecast = self.predictor.config().clone();
        let ctx = ForecastContext { clock, ..self.ctx };
        Self::with_context(ctx, training, forecast)
    }

    pub async fn train(&self, symbol: &str, epochs: Option<u32>, time_steps: Option<u32>) -> TrainResult {
        let outcome = match Symbol::parse(symbol) {
            Ok(symbol) => self.trainer.train(&symbol, epochs, time_steps).await,
            Err(error) => Err(error.into()),
        };

        match outcome {
            Ok(report) => TrainResult::Success {
                symbol: report.symbol,
                model_path: report.model_path,
                trained_epochs: report.trained_epochs,
                samples: report.samples,
                final_loss: report.final_loss,
            },
            Err(error) => TrainResult::Failed {
                symbol: symbol.trim().to_ascii_uppercase(),
                code: error.code(),
                reason: error.to_string(),
            },
        }
    }

    pub async fn predict(&self, symbol: &str, days: Option<u32>) -> PredictionOutcome {
        match self.forecast(symbol, days).await {
            Ok(forecast) => {
                let future_value = forecast.future_value().unwrap_or_default();
                PredictionOutcome::Success {
                    symbol: forecast.symbol,
                    predictions: forecast.predictions,
                    future_value,
                }
            }
            Err(error) => {
                warn!(symbol, code = error.code(), error = %error, "prediction failed");
                PredictionOutcome::from_error(symbol, &error)
            }
        }
    }

    /// Typed variant of [`ForecastService::predict`].
    pub async fn forecast(&self, symbol: &str, days: Option<u32>) -> Result<Forecast, ForecastError> {
        let symbol = Symbol::parse(symbol)?;
        self.predictor.predict(&symbol, days).await
    }

    pub fn sweep(&self) -> Result<SweepReport, ForecastError> {
        self.sweeper.sweep()
    }

    pub fn models(&self) -> Result<Vec<ModelRecord>, ForecastError> {
        Ok(self.ctx.models.list()?)
    }

    /// Training attempts for `symbol`, newest first.
    pub fn history(&self, symbol: &str, limit: usize) -> Result<Vec<TrainingRun>, ForecastError> {
        let symbol = Symbol::parse(symbol)?;
        Ok(self.ctx.models.runs(symbol.as_str(), limit)?)
    }
}

#[cfg(test)]
mod tests {
    use predictr_core::InMemoryHistorySource;
    use predictr_warehouse::{InMemoryArtifactStore, InMemoryModelStore};

    use super::*;

    fn service() -> ForecastService {
        ForecastService::new(
            Arc::new(InMemoryHistorySource::new()),
            Arc::new(InMemoryModelStore::new()),
            Arc::new(InMemoryArtifactStore::new()),
        )
    }

    #[tokio::test]
    async fn invalid_symbol_becomes_tagged_error() {
        let outcome = service().predict("  ", None).await;

        let json = serde_json::to_value(&outcome).expect("json");
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "forecast.invalid_symbol");
        assert_eq!(json["hint"], "invalid symbol or no market data");
    }

    #[tokio::test]
    async fn failed_training_reports_reason() {
        let result = service().train("zzzz", Some(1), Some(3)).await;

        let json = serde_json::to_value(&result).expect("json");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["symbol"], "ZZZZ");
        assert_eq!(json["code"], "forecast.no_data");
        assert!(json["reason"].as_str().expect("reason").contains("ZZZZ"));
    }
}
