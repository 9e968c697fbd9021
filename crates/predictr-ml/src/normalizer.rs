//! Min/max scaling of close prices into `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Scaling bounds fitted on a training series.
///
/// `min == max` can be represented (it may be read back from storage) but
/// every mapping through such bounds fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBounds {
    pub min: f64,
    pub max: f64,
}

impl NormalizationBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, ForecastError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ForecastError::InvalidRequest(format!(
                "invalid scaling bounds [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    /// Fit bounds over every value.
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let bounds = Self::new(min, max)?;
        bounds.range()?;
        Ok(bounds)
    }

    pub fn is_degenerate(&self) -> bool {
        self.max - self.min == 0.0
    }

    /// `(x - min) / (max - min)`; values outside the bounds map outside `[0, 1]`.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ForecastError> {
        let range = self.range()?;
        Ok(values.iter().map(|v| (v - self.min) / range).collect())
    }

    /// `y * (max - min) + min`.
    pub fn inverse(&self, values: &[f64]) -> Result<Vec<f64>, ForecastError> {
        let range = self.range()?;
        Ok(values.iter().map(|y| y * range + self.min).collect())
    }

    fn range(&self) -> Result<f64, ForecastError> {
        if self.is_degenerate() {
            return Err(ForecastError::DegenerateScale { value: self.min });
        }
        Ok(self.max - self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_undoes_transform() {
        let closes = [101.5, 99.25, 130.0, 87.75, 112.0];
        let bounds = NormalizationBounds::fit(&closes).expect("bounds");
        assert_eq!(bounds.min, 87.75);
        assert_eq!(bounds.max, 130.0);

        let scaled = bounds.transform(&closes).expect("transform");
        assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));

        let restored = bounds.inverse(&scaled).expect("inverse");
        for (a, b) in restored.iter().zip(closes) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn flat_series_is_degenerate() {
        let error = NormalizationBounds::fit(&[42.0; 10]).expect_err("degenerate");
        assert!(matches!(error, ForecastError::DegenerateScale { .. }));

        let stored = NormalizationBounds::new(42.0, 42.0).expect("representable");
        assert!(stored.transform(&[42.0]).is_err());
        assert!(stored.inverse(&[0.5]).is_err());
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert!(matches!(
            NormalizationBounds::fit(&[]),
            Err(ForecastError::InsufficientData { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn values_beyond_training_range_are_not_clamped() {
        let bounds = NormalizationBounds::new(100.0, 200.0).expect("bounds");
        assert_eq!(bounds.transform(&[250.0]).expect("transform"), vec![1.5]);
    }
}
