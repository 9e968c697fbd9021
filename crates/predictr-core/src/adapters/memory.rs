use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::history_source::{HistoryRequest, PriceHistorySource, SourceError};
use crate::{PriceSeries, Symbol};

/// History source backed by series held in memory.
///
/// Used by tests and offline runs. Symbols without a stored series answer
/// with an empty series, the same way an unknown ticker does upstream.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistorySource {
    series: Arc<RwLock<HashMap<Symbol, PriceSeries>>>,
    failing: Arc<RwLock<Option<SourceError>>>,
    fetches: Arc<AtomicUsize>,
}

impl InMemoryHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn insert(&self, series: PriceSeries) {
        if let Ok(mut guard) = self.series.write() {
            guard.insert(series.symbol.clone(), series);
        }
    }

    /// Make every subsequent fetch fail with `error`.
    pub fn fail_with(&self, error: SourceError) {
        if let Ok(mut guard) = self.failing.write() {
            *guard = Some(error);
        }
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, request: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .failing
            .read()
            .map_err(|_| SourceError::unavailable("in-memory source lock poisoned"))?
            .clone()
        {
            return Err(error);
        }

        let guard = self
            .series
            .read()
            .map_err(|_| SourceError::unavailable("in-memory source lock poisoned"))?;
        Ok(match guard.get(&request.symbol) {
            Some(series) => series.between(request.start, request.end),
            None => PriceSeries::empty(request.symbol.clone()),
        })
    }
}

impl PriceHistorySource for InMemoryHistorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn fetch<'a>(
        &'a self,
        request: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
        let result = self.lookup(&request);
        Box::pin(async move { result })
    }
}
