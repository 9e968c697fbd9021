//! Fits a fresh model for one symbol and registers it.
//!
//! The artifact is written before the registry row is upserted, so a record
//! never points at bytes that were not fully stored. Every attempt, failed or
//! not, is appended to the training log on a best-effort basis.

use std::time::{Duration, Instant};

use predictr_core::{HistoryRequest, Symbol};
use predictr_warehouse::{ModelRecord, RunStatus, TrainingRun};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifact::{self, ModelArtifact};
use crate::clock::rfc3339;
use crate::config::TrainingConfig;
use crate::context::{artifact_key, ForecastContext};
use crate::model::{FitOptions, FitSummary, SequenceRegressor};
use crate::normalizer::NormalizationBounds;
use crate::single_flight::SymbolGuard;
use crate::window::{build_windows, Windows};
use crate::ForecastError;

/// What a successful training run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub symbol: String,
    pub model_path: String,
    pub trained_epochs: u32,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f64>,
    pub stopped_early: bool,
}

#[derive(Clone)]
pub struct Trainer {
    ctx: ForecastContext,
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(ctx: ForecastContext, config: TrainingConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train under the symbol's lock, waiting for any run already in flight.
    pub async fn train(
        &self,
        symbol: &Symbol,
        epochs: Option<u32>,
        time_steps: Option<u32>,
    ) -> Result<TrainReport, ForecastError> {
        let guard = self.ctx.locks.lock(symbol).await;
        self.train_locked(&guard, epochs, time_steps).await
    }

    /// Train the symbol `guard` was issued for.
    pub async fn train_locked(
        &self,
        guard: &SymbolGuard,
        epochs: Option<u32>,
        time_steps: Option<u32>,
    ) -> Result<TrainReport, ForecastError> {
        let symbol = guard.symbol();
        let started = Instant::now();
        let outcome = self.run(symbol, epochs, time_steps).await;
        self.log_run(symbol, &outcome, started.elapsed());
        outcome
    }

    async fn run(
        &self,
        symbol: &Symbol,
        epochs: Option<u32>,
        time_steps: Option<u32>,
    ) -> Result<TrainReport, ForecastError> {
        let epochs = epochs.unwrap_or(self.config.epochs);
        let time_steps = time_steps.unwrap_or(self.config.time_steps);
        self.validate(epochs, time_steps)?;

        let today = self.ctx.clock.today();
        let request = HistoryRequest::new(symbol.clone(), self.config.history_start, today)
            .map_err(|e| ForecastError::InvalidRequest(e.message().to_owned()))?;
        let series = self.ctx.source.fetch(request).await.map_err(|e| {
            warn!(symbol = %symbol, source = self.ctx.source.name(), error = %e, "history fetch failed");
            ForecastError::NoData {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
        })?;
        if series.is_empty() {
            return Err(ForecastError::NoData {
                symbol: symbol.to_string(),
                reason: String::from("source returned no prices"),
            });
        }

        let closes = series.closes();
        let bounds = NormalizationBounds::fit(&closes)?;
        let windows = build_windows(&bounds.transform(&closes)?, time_steps as usize)?;
        let samples = windows.len();
        debug!(
            symbol = %symbol,
            points = closes.len(),
            from = ?series.first_date(),
            to = ?series.last_date(),
            samples,
            "fitting model"
        );

        let (model, summary) = self.fit(symbol, windows, epochs).await?;

        let model_path = artifact_key(symbol);
        let bytes = artifact::encode(&ModelArtifact {
            symbol: symbol.to_string(),
            time_steps,
            model,
        })?;
        self.ctx.artifacts.write(&model_path, &bytes)?;

        self.ctx.models.upsert(&ModelRecord {
            symbol: symbol.to_string(),
            model_path: model_path.clone(),
            trained_on: rfc3339(self.ctx.clock.now()),
            epochs: summary.epochs_run,
            time_steps,
            scaler_min: bounds.min,
            scaler_max: bounds.max,
        })?;

        info!(
            symbol = %symbol,
            epochs = summary.epochs_run,
            samples,
            stopped_early = summary.stopped_early,
            loss = summary.best_loss,
            "model trained"
        );

        Ok(TrainReport {
            symbol: symbol.to_string(),
            model_path,
            trained_epochs: summary.epochs_run,
            samples,
            final_loss: summary.best_loss,
            stopped_early: summary.stopped_early,
        })
    }

    fn validate(&self, epochs: u32, time_steps: u32) -> Result<(), ForecastError> {
        if epochs == 0 {
            return Err(ForecastError::InvalidRequest(String::from(
                "epochs must be at least 1",
            )));
        }
        if time_steps == 0 {
            return Err(ForecastError::InvalidRequest(String::from(
                "time_steps must be at least 1",
            )));
        }
        if !(0.0..1.0).contains(&self.config.dropout) {
            return Err(ForecastError::InvalidRequest(format!(
                "dropout {} must be in [0, 1)",
                self.config.dropout
            )));
        }
        if self.config.hidden_size == 0 || self.config.layers == 0 {
            return Err(ForecastError::InvalidRequest(String::from(
                "network needs at least one layer of one unit",
            )));
        }
        Ok(())
    }

    /// Gradient descent is CPU-bound; keep it off the async workers.
    async fn fit(
        &self,
        symbol: &Symbol,
        windows: Windows,
        epochs: u32,
    ) -> Result<(SequenceRegressor, FitSummary), ForecastError> {
        let config = self.config.clone();
        let options = FitOptions {
            epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            dropout: config.dropout,
            patience: config.patience,
            min_delta: config.min_delta,
        };

        tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut model = SequenceRegressor::new(config.hidden_size, config.layers, &mut rng);
            let summary = model.fit(&windows, &options, &mut rng);
            (model, summary)
        })
        .await
        .map_err(|e| ForecastError::ModelUnavailable {
            symbol: symbol.to_string(),
            reason: format!("training task failed: {e}"),
        })
    }

    fn log_run(
        &self,
        symbol: &Symbol,
        outcome: &Result<TrainReport, ForecastError>,
        elapsed: Duration,
    ) {
        let (status, reason, epochs, samples, final_loss) = match outcome {
            Ok(report) => (
                RunStatus::Success,
                None,
                report.trained_epochs,
                report.samples as u64,
                report.final_loss,
            ),
            Err(error) => {
                warn!(symbol = %symbol, code = error.code(), error = %error, "training failed");
                (RunStatus::Failed, Some(error.to_string()), 0, 0, None)
            }
        };

        let run = TrainingRun {
            run_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            status,
            reason,
            epochs,
            samples,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            final_loss,
            recorded_at: rfc3339(self.ctx.clock.now()),
        };
        if let Err(error) = self.ctx.models.record_run(&run) {
            warn!(symbol = %symbol, error = %error, "failed to record training run");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use predictr_core::domain::calendar::parse_date;
    use predictr_core::{InMemoryHistorySource, PricePoint, PriceSeries};
    use predictr_warehouse::{InMemoryArtifactStore, InMemoryModelStore, ModelStore};

    use super::*;
    use crate::clock::FixedClock;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            epochs: 2,
            time_steps: 5,
            hidden_size: 4,
            layers: 1,
            batch_size: 8,
            learning_rate: 0.01,
            history_start: parse_date("2024-01-01").expect("date"),
            ..TrainingConfig::default()
        }
    }

    fn rising_series(symbol: &Symbol, days: u32) -> PriceSeries {
        let start = parse_date("2024-01-01").expect("date");
        let points = (0..days)
            .map(|i| {
                PricePoint::new(start + time::Duration::days(i64::from(i)), 50.0 + f64::from(i))
                    .expect("point")
            })
            .collect();
        PriceSeries::new(symbol.clone(), points).expect("series")
    }

    fn trainer(source: InMemoryHistorySource) -> (Trainer, Arc<InMemoryModelStore>) {
        let models = Arc::new(InMemoryModelStore::new());
        let ctx = ForecastContext::new(
            Arc::new(source),
            models.clone(),
            Arc::new(InMemoryArtifactStore::new()),
            Arc::new(FixedClock::at_date(parse_date("2024-06-01").expect("date"))),
        );
        (Trainer::new(ctx, small_config()), models)
    }

    #[tokio::test]
    async fn registers_bounds_and_window_of_the_run() {
        let symbol = Symbol::parse("ACME").expect("symbol");
        let (trainer, models) =
            trainer(InMemoryHistorySource::new().with_series(rising_series(&symbol, 40)));

        let report = trainer.train(&symbol, None, Some(7)).await.expect("trained");

        assert_eq!(report.model_path, "ACME_lstm.json");
        assert_eq!(report.samples, 33);
        let record = models.find("ACME").expect("find").expect("record");
        assert_eq!(record.time_steps, 7);
        assert_eq!(record.scaler_min, 50.0);
        assert_eq!(record.scaler_max, 89.0);
        assert_eq!(record.epochs, report.trained_epochs);
        assert!(record.trained_on.starts_with("2024-06-01T00:00:00"));
    }

    #[tokio::test]
    async fn zero_epochs_is_rejected_before_fetching() {
        let symbol = Symbol::parse("ACME").expect("symbol");
        let source = InMemoryHistorySource::new().with_series(rising_series(&symbol, 40));
        let (trainer, models) = trainer(source);

        let error = trainer.train(&symbol, Some(0), None).await.expect_err("invalid");

        assert_eq!(error.code(), "forecast.invalid_request");
        assert!(models.find("ACME").expect("find").is_none());
    }

    #[tokio::test]
    async fn unknown_symbol_is_no_data_and_logged_as_failed() {
        let symbol = Symbol::parse("NOPE").expect("symbol");
        let (trainer, models) = trainer(InMemoryHistorySource::new());

        let error = trainer.train(&symbol, None, None).await.expect_err("no data");

        assert_eq!(error.code(), "forecast.no_data");
        let runs = models.runs("NOPE", 10).expect("runs");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
    }
}
