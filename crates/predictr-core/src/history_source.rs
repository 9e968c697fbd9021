//! Price-history source contract.
//!
//! A [`PriceHistorySource`] answers one question: which daily closes exist for
//! a symbol over `[start, end)`. An unknown symbol or a range with no trading
//! days is an empty [`PriceSeries`], not an error; errors are reserved for
//! transport and payload failures.
//!
//! ```rust,ignore
//! use predictr_core::{HistoryRequest, PriceHistorySource, Symbol, YahooHistorySource};
//!
//! async fn last_close(source: &YahooHistorySource) -> Option<f64> {
//!     let symbol = Symbol::parse("AAPL").ok()?;
//!     let request = HistoryRequest::trailing(symbol, today, 120).ok()?;
//!     let series = source.fetch(request).await.ok()?;
//!     series.points().last().map(|point| point.close)
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::{Date, Duration};

use crate::domain::calendar::format_date;
use crate::{PriceSeries, Symbol};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Upstream unreachable, timed out, or answered with a server error.
    Unavailable,
    /// The request itself is malformed.
    InvalidRequest,
    /// The upstream answered with a payload that could not be understood.
    Malformed,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Malformed => "source.malformed",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Daily history request over the half-open range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub start: Date,
    pub end: Date,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, start: Date, end: Date) -> Result<Self, SourceError> {
        if start >= end {
            return Err(SourceError::invalid_request(format!(
                "history range is empty: start {} is not before end {}",
                format_date(start),
                format_date(end)
            )));
        }
        Ok(Self { symbol, start, end })
    }

    /// The `days` calendar days before `end`.
    pub fn trailing(symbol: Symbol, end: Date, days: u32) -> Result<Self, SourceError> {
        let start = end
            .checked_sub(Duration::days(i64::from(days)))
            .ok_or_else(|| SourceError::invalid_request("lookback reaches before the calendar"))?;
        Self::new(symbol, start, end)
    }
}

/// Contract every price-history provider implements.
pub trait PriceHistorySource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch daily closes for the request range.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider cannot be reached within its
    /// timeout or answers with something that is not a price history.
    fn fetch<'a>(
        &'a self,
        request: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;
}
