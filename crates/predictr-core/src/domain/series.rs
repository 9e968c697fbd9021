use serde::{Deserialize, Serialize};
use time::Date;

use super::calendar::{format_date, iso_date};
use crate::{Symbol, ValidationError};

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: Date, close: f64) -> Result<Self, ValidationError> {
        if !close.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }
        if close < 0.0 {
            return Err(ValidationError::NegativeValue { field: "close" });
        }
        Ok(Self { date, close })
    }
}

/// Chronological daily closes for a symbol.
///
/// Dates are strictly increasing. Market closures are simply absent; nothing
/// is interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::UnorderedSeries {
                    previous: format_date(pair[0].date),
                    date: format_date(pair[1].date),
                });
            }
        }
        Ok(Self { symbol, points })
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.close).collect()
    }

    /// Closes of the last `count` points (fewer if the series is shorter).
    pub fn tail_closes(&self, count: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(count);
        self.points[start..].iter().map(|point| point.close).collect()
    }

    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|point| point.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|point| point.date)
    }

    /// Points with `start <= date < end`.
    pub fn between(&self, start: Date, end: Date) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|point| point.date >= start && point.date < end)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_date;

    fn point(date: &str, close: f64) -> PricePoint {
        PricePoint::new(parse_date(date).expect("date"), close).expect("point")
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = PriceSeries::new(
            symbol,
            vec![point("2024-01-03", 1.0), point("2024-01-02", 2.0)],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::UnorderedSeries { .. }));
    }

    #[test]
    fn rejects_negative_and_non_finite_closes() {
        let date = parse_date("2024-01-02").expect("date");
        assert!(PricePoint::new(date, -1.0).is_err());
        assert!(PricePoint::new(date, f64::NAN).is_err());
    }

    #[test]
    fn tail_and_between_respect_bounds() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let series = PriceSeries::new(
            symbol,
            vec![
                point("2024-01-02", 1.0),
                point("2024-01-03", 2.0),
                point("2024-01-04", 3.0),
            ],
        )
        .expect("series");

        assert_eq!(series.tail_closes(2), vec![2.0, 3.0]);
        assert_eq!(series.tail_closes(10), vec![1.0, 2.0, 3.0]);

        let slice = series.between(
            parse_date("2024-01-03").expect("date"),
            parse_date("2024-01-04").expect("date"),
        );
        assert_eq!(slice.closes(), vec![2.0]);
    }
}
