//! Training and forecasting parameters.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// Hyperparameters and data range for fitting a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Upper bound on epochs; early stopping may finish sooner.
    pub epochs: u32,
    /// Window length fed to the network.
    pub time_steps: u32,
    pub hidden_size: usize,
    pub layers: usize,
    /// Dropout rate applied after every recurrent layer while training.
    pub dropout: f64,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Epochs without a training-loss improvement before stopping.
    pub patience: u32,
    pub min_delta: f64,
    /// Seed for weight initialization, shuffling and dropout masks.
    pub seed: u64,
    /// First day of history requested from the source.
    pub history_start: Date,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            time_steps: 60,
            hidden_size: 50,
            layers: 2,
            dropout: 0.2,
            batch_size: 32,
            learning_rate: 0.001,
            patience: 5,
            min_delta: 0.0,
            seed: 42,
            history_start: default_history_start(),
        }
    }
}

fn default_history_start() -> Date {
    match Date::from_calendar_date(2020, Month::January, 1) {
        Ok(date) => date,
        Err(_) => Date::MIN,
    }
}

/// Prediction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub default_days: u32,
    /// Calendar days of recent history fetched to build the input window.
    pub lookback_days: u32,
    pub max_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_days: 5,
            lookback_days: 120,
            max_days: 365,
        }
    }
}
