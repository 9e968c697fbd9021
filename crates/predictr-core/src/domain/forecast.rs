use serde::{Deserialize, Serialize};
use time::Date;

use super::calendar::iso_date;

/// One forecasted close, returned to callers and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub predicted_close: f64,
}

impl ForecastPoint {
    /// Build a point with the close rounded to cents.
    pub fn rounded(date: Date, predicted_close: f64) -> Self {
        Self {
            date,
            predicted_close: round_cents(predicted_close),
        }
    }
}

/// Round to 2 decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_date;

    #[test]
    fn rounds_to_two_decimals_and_serializes_iso_date() {
        let point = ForecastPoint::rounded(parse_date("2026-10-18").expect("date"), 101.23789);
        assert_eq!(point.predicted_close, 101.24);

        let json = serde_json::to_value(point).expect("json");
        assert_eq!(json["date"], "2026-10-18");
        assert_eq!(json["predicted_close"], 101.24);
    }
}
