//! Per-symbol mutual exclusion for training.

use std::sync::Arc;

use dashmap::DashMap;
use predictr_core::Symbol;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per symbol.
///
/// Explicit training, train-on-miss and retrain-on-incompatible all take the
/// same lock, so concurrent requests for one symbol share a single training
/// run while other symbols proceed in parallel.
#[derive(Debug, Clone, Default)]
pub struct SymbolLocks {
    locks: Arc<DashMap<Symbol, Arc<Mutex<()>>>>,
}

/// Proof that the holder owns a symbol's training lock.
#[derive(Debug)]
pub struct SymbolGuard {
    symbol: Symbol,
    _guard: OwnedMutexGuard<()>,
}

impl SymbolGuard {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl SymbolLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, symbol: &Symbol) -> Arc<Mutex<()>> {
        self.locks
            .entry(symbol.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for the symbol's lock.
    pub async fn lock(&self, symbol: &Symbol) -> SymbolGuard {
        let slot = self.slot(symbol);
        SymbolGuard {
            symbol: symbol.clone(),
            _guard: slot.lock_owned().await,
        }
    }

    /// Take the lock only if nobody holds it.
    pub fn try_lock(&self, symbol: &Symbol) -> Option<SymbolGuard> {
        let guard = self.slot(symbol).try_lock_owned().ok()?;
        Some(SymbolGuard {
            symbol: symbol.clone(),
            _guard: guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("symbol")
    }

    #[tokio::test]
    async fn same_symbol_is_exclusive_other_symbols_are_not() {
        let locks = SymbolLocks::new();
        let held = locks.lock(&symbol("AAPL")).await;

        assert!(locks.try_lock(&symbol("AAPL")).is_none());
        assert!(locks.try_lock(&symbol("MSFT")).is_some());

        drop(held);
        let again = locks.try_lock(&symbol("aapl")).expect("released");
        assert_eq!(again.symbol().as_str(), "AAPL");
    }
}
