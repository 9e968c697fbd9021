//! Model registry contract and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{ModelRecord, TrainingRun, WarehouseError};

/// Persistent map from symbol to its current [`ModelRecord`].
///
/// At most one record exists per symbol; `upsert` replaces. The audit log
/// methods default to no-ops so minimal fakes only implement the registry.
pub trait ModelStore: Send + Sync {
    fn upsert(&self, record: &ModelRecord) -> Result<(), WarehouseError>;

    fn find(&self, symbol: &str) -> Result<Option<ModelRecord>, WarehouseError>;

    /// Returns whether a record was removed.
    fn delete(&self, symbol: &str) -> Result<bool, WarehouseError>;

    /// All records ordered by symbol.
    fn list(&self) -> Result<Vec<ModelRecord>, WarehouseError>;

    fn record_run(&self, _run: &TrainingRun) -> Result<(), WarehouseError> {
        Ok(())
    }

    /// Most recent runs for `symbol`, newest first.
    fn runs(&self, _symbol: &str, _limit: usize) -> Result<Vec<TrainingRun>, WarehouseError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, ModelRecord>,
    runs: Vec<TrainingRun>,
}

/// Model store held in process memory.
#[derive(Default)]
pub struct InMemoryModelStore {
    state: Mutex<MemoryState>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .expect("in-memory model store mutex poisoned")
    }
}

impl ModelStore for InMemoryModelStore {
    fn upsert(&self, record: &ModelRecord) -> Result<(), WarehouseError> {
        self.state()
            .records
            .insert(record.symbol.clone(), record.clone());
        Ok(())
    }

    fn find(&self, symbol: &str) -> Result<Option<ModelRecord>, WarehouseError> {
        Ok(self.state().records.get(symbol).cloned())
    }

    fn delete(&self, symbol: &str) -> Result<bool, WarehouseError> {
        Ok(self.state().records.remove(symbol).is_some())
    }

    fn list(&self) -> Result<Vec<ModelRecord>, WarehouseError> {
        Ok(self.state().records.values().cloned().collect())
    }

    fn record_run(&self, run: &TrainingRun) -> Result<(), WarehouseError> {
        self.state().runs.push(run.clone());
        Ok(())
    }

    fn runs(&self, symbol: &str, limit: usize) -> Result<Vec<TrainingRun>, WarehouseError> {
        Ok(self
            .state()
            .runs
            .iter()
            .rev()
            .filter(|run| run.symbol == symbol)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunStatus;

    fn record(symbol: &str, epochs: u32) -> ModelRecord {
        ModelRecord {
            symbol: symbol.to_owned(),
            model_path: format!("{symbol}_lstm.json"),
            trained_on: String::from("2026-10-17T00:00:00Z"),
            epochs,
            time_steps: 60,
            scaler_min: 10.0,
            scaler_max: 20.0,
        }
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let store = InMemoryModelStore::new();
        store.upsert(&record("AAPL", 10)).expect("first");
        store.upsert(&record("AAPL", 12)).expect("second");

        let all = store.list().expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].epochs, 12);
        assert!(store.delete("AAPL").expect("delete"));
        assert!(!store.delete("AAPL").expect("delete again"));
    }

    #[test]
    fn runs_are_newest_first_and_filtered() {
        let store = InMemoryModelStore::new();
        for (index, symbol) in ["AAPL", "MSFT", "AAPL"].into_iter().enumerate() {
            store
                .record_run(&TrainingRun {
                    run_id: format!("run-{index}"),
                    symbol: symbol.to_owned(),
                    status: RunStatus::Success,
                    reason: None,
                    epochs: 5,
                    samples: 100,
                    duration_ms: 10,
                    final_loss: Some(0.01),
                    recorded_at: format!("2026-10-17T00:00:0{index}Z"),
                })
                .expect("record");
        }

        let runs = store.runs("AAPL", 10).expect("runs");
        let ids: Vec<_> = runs.iter().map(|run| run.run_id.as_str()).collect();
        assert_eq!(ids, vec!["run-2", "run-0"]);
    }
}
