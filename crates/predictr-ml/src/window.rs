//! Supervised windowing of a scaled series.

use ndarray::{Array1, Array2};

use crate::ForecastError;

/// Training pairs: row `k` of `inputs` is `series[k..k + W]`, and
/// `targets[k]` is `series[k + W]`.
#[derive(Debug, Clone)]
pub struct Windows {
    pub inputs: Array2<f64>,
    pub targets: Array1<f64>,
}

impl Windows {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Number of windows a series of `len` points yields: `max(0, len - W)`.
pub fn window_count(len: usize, time_steps: usize) -> usize {
    len.saturating_sub(time_steps)
}

pub fn build_windows(series: &[f64], time_steps: usize) -> Result<Windows, ForecastError> {
    if time_steps == 0 {
        return Err(ForecastError::InvalidRequest(String::from(
            "time_steps must be at least 1",
        )));
    }
    let count = window_count(series.len(), time_steps);
    if count == 0 {
        return Err(ForecastError::InsufficientData {
            needed: time_steps + 1,
            available: series.len(),
        });
    }

    let inputs = Array2::from_shape_fn((count, time_steps), |(k, t)| series[k + t]);
    let targets = Array1::from_shape_fn(count, |k| series[k + time_steps]);
    Ok(Windows { inputs, targets })
}
