//! Multi-step forecasting with on-demand training.
//!
//! A missing model is trained before predicting. A model that no longer fits
//! the current artifact format is retrained once, under the same per-symbol
//! lock as explicit training, and loaded again; a second failure is final.

use predictr_core::{ForecastPoint, HistoryRequest, Symbol};
use predictr_warehouse::ModelRecord;
use serde::Serialize;
use time::{Date, Duration};
use tracing::{debug, info, warn};

use crate::artifact::ModelArtifact;
use crate::config::ForecastConfig;
use crate::context::ForecastContext;
use crate::model::SequenceRegressor;
use crate::normalizer::NormalizationBounds;
use crate::trainer::Trainer;
use crate::ForecastError;

/// Forecast for consecutive calendar days after today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub symbol: String,
    pub predictions: Vec<ForecastPoint>,
    /// `trained_on` of the model that produced the forecast.
    pub model_trained_on: String,
}

impl Forecast {
    /// Last predicted close.
    pub fn future_value(&self) -> Option<f64> {
        self.predictions.last().map(|point| point.predicted_close)
    }
}

#[derive(Clone)]
pub struct Predictor {
    ctx: ForecastContext,
    trainer: Trainer,
    config: ForecastConfig,
}

impl Predictor {
    pub fn new(ctx: ForecastContext, trainer: Trainer, config: ForecastConfig) -> Self {
        Self {
            ctx,
            trainer,
            config,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `days` closes (default from config, capped at `max_days`).
    pub async fn predict(&self, symbol: &Symbol, days: Option<u32>) -> Result<Forecast, ForecastError> {
        let days = self.resolve_days(days)?;
        let (record, artifact) = self.ready_model(symbol).await?;
        let bounds = NormalizationBounds::new(record.scaler_min, record.scaler_max)?;

        let today = self.ctx.clock.today();
        let request = HistoryRequest::trailing(symbol.clone(), today, self.config.lookback_days)
            .map_err(|e| ForecastError::InvalidRequest(e.message().to_owned()))?;
        let recent = self.ctx.source.fetch(request).await.map_err(|e| {
            warn!(symbol = %symbol, error = %e, "recent history fetch failed");
            ForecastError::NoData {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
        })?;
        if recent.is_empty() {
            return Err(ForecastError::NoData {
                symbol: symbol.to_string(),
                reason: format!("no prices in the last {} days", self.config.lookback_days),
            });
        }

        let time_steps = record.time_steps as usize;
        if recent.len() < time_steps {
            return Err(ForecastError::InsufficientData {
                needed: time_steps,
                available: recent.len(),
            });
        }

        let window = bounds.transform(&recent.tail_closes(time_steps))?;
        let scaled = roll_forward(&artifact.model, window, days as usize);
        let closes = bounds.inverse(&scaled)?;
        let predictions = forecast_dates(today, closes.len())?
            .into_iter()
            .zip(closes)
            .map(|(date, close)| ForecastPoint::rounded(date, close))
            .collect();

        debug!(symbol = %symbol, days, "forecast produced");
        Ok(Forecast {
            symbol: symbol.to_string(),
            predictions,
            model_trained_on: record.trained_on,
        })
    }

    fn resolve_days(&self, days: Option<u32>) -> Result<u32, ForecastError> {
        let days = days.unwrap_or(self.config.default_days);
        if days == 0 {
            return Err(ForecastError::InvalidRequest(String::from(
                "days must be at least 1",
            )));
        }
        Ok(days.min(self.config.max_days))
    }

    /// A loadable model for `symbol`, training or retraining as needed.
    async fn ready_model(&self, symbol: &Symbol) -> Result<(ModelRecord, ModelArtifact), ForecastError> {
        let record = match self.ctx.find_record(symbol)? {
            Some(record) => record,
            None => self.train_missing(symbol).await?,
        };

        match self.ctx.load_model(&record) {
            Ok(artifact) => Ok((record, artifact)),
            Err(error) if error.is_compatibility() => {
                warn!(symbol = %symbol, error = %error, "stored model is incompatible; retraining");
                let record = self.retrain_incompatible(symbol, &record).await?;
                let artifact = self
                    .ctx
                    .load_model(&record)
                    .map_err(|e| unavailable(symbol, &e))?;
                Ok((record, artifact))
            }
            Err(error) => Err(error),
        }
    }

    async fn train_missing(&self, symbol: &Symbol) -> Result<ModelRecord, ForecastError> {
        let guard = self.ctx.locks.lock(symbol).await;
        // Someone else may have trained while we waited.
        if let Some(record) = self.ctx.find_record(symbol)? {
            return Ok(record);
        }

        info!(symbol = %symbol, "no model registered; training on demand");
        self.trainer
            .train_locked(&guard, None, None)
            .await
            .map_err(|e| unavailable(symbol, &e))?;
        self.registered(symbol)
    }

    async fn retrain_incompatible(
        &self,
        symbol: &Symbol,
        stale: &ModelRecord,
    ) -> Result<ModelRecord, ForecastError> {
        let guard = self.ctx.locks.lock(symbol).await;
        if let Some(current) = self.ctx.find_record(symbol)? {
            if current != *stale {
                return Ok(current);
            }
        }

        // Keep the window the stale model was trained with.
        self.trainer
            .train_locked(&guard, None, Some(stale.time_steps))
            .await
            .map_err(|e| unavailable(symbol, &e))?;
        self.registered(symbol)
    }

    fn registered(&self, symbol: &Symbol) -> Result<ModelRecord, ForecastError> {
        self.ctx
            .find_record(symbol)?
            .ok_or_else(|| ForecastError::ModelUnavailable {
                symbol: symbol.to_string(),
                reason: String::from("model record missing after training"),
            })
    }
}

fn unavailable(symbol: &Symbol, cause: &ForecastError) -> ForecastError {
    ForecastError::ModelUnavailable {
        symbol: symbol.to_string(),
        reason: cause.to_string(),
    }
}

/// Self-feeding forecast: each prediction slides into the window for the next.
pub fn roll_forward(model: &SequenceRegressor, mut window: Vec<f64>, steps: usize) -> Vec<f64> {
    let mut outputs = Vec::with_capacity(steps);
    for _ in 0..steps {
        let next = model.predict_next(&window);
        outputs.push(next);
        if let Some(last) = window.len().checked_sub(1) {
            window.rotate_left(1);
            window[last] = next;
        }
    }
    outputs
}

/// `today + 1`, `today + 2`, ... for `count` days.
pub fn forecast_dates(today: Date, count: usize) -> Result<Vec<Date>, ForecastError> {
    (1..=count as i64)
        .map(|offset| {
            today.checked_add(Duration::days(offset)).ok_or_else(|| {
                ForecastError::InvalidRequest(String::from("forecast runs past the calendar"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use predictr_core::domain::calendar::{format_date, parse_date};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn dates_are_consecutive_calendar_days() {
        let dates = forecast_dates(parse_date("2026-10-30").expect("date"), 3).expect("dates");
        let rendered: Vec<String> = dates.into_iter().map(format_date).collect();
        assert_eq!(rendered, ["2026-10-31", "2026-11-01", "2026-11-02"]);
    }

    #[test]
    fn roll_forward_feeds_predictions_back_in() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = SequenceRegressor::new(3, 1, &mut rng);
        let window = vec![0.1, 0.2, 0.3, 0.4];

        let outputs = roll_forward(&model, window.clone(), 3);

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], model.predict_next(&window));
        let second_window = vec![0.2, 0.3, 0.4, outputs[0]];
        assert_eq!(outputs[1], model.predict_next(&second_window));
    }
}
