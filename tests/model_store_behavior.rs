use predictr_warehouse::{
    ArtifactStore, FsArtifactStore, ModelRecord, ModelStore, RunStatus, TrainingRun, Warehouse,
    WarehouseConfig, WarehouseError,
};
use tempfile::tempdir;

fn config(temp: &tempfile::TempDir) -> WarehouseConfig {
    WarehouseConfig::from_home(temp.path().join("predictr-home"))
}

fn record(symbol: &str, epochs: u32, trained_on: &str) -> ModelRecord {
    ModelRecord {
        symbol: symbol.to_owned(),
        model_path: format!("{symbol}_lstm.json"),
        trained_on: trained_on.to_owned(),
        epochs,
        time_steps: 60,
        scaler_min: 55.0,
        scaler_max: 310.75,
    }
}

fn run(id: &str, symbol: &str, status: RunStatus, recorded_at: &str) -> TrainingRun {
    TrainingRun {
        run_id: id.to_owned(),
        symbol: symbol.to_owned(),
        status,
        reason: (status == RunStatus::Failed).then(|| String::from("no data")),
        epochs: 12,
        samples: 1_140,
        duration_ms: 4_250,
        final_loss: (status == RunStatus::Success).then_some(0.0021),
        recorded_at: recorded_at.to_owned(),
    }
}

#[test]
fn when_record_is_upserted_twice_then_only_the_latest_survives_reopen() {
    let temp = tempdir().expect("tempdir");

    // Given a record trained twice
    {
        let warehouse = Warehouse::open(config(&temp)).expect("open");
        warehouse
            .upsert(&record("AAPL", 50, "2026-10-16T08:00:00Z"))
            .expect("first upsert");
        warehouse
            .upsert(&record("AAPL", 23, "2026-10-17T08:00:00Z"))
            .expect("second upsert");
    }

    // When the warehouse is reopened
    let warehouse = Warehouse::open(config(&temp)).expect("reopen");

    // Then exactly one record remains and it is the second one
    let records = warehouse.list().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], record("AAPL", 23, "2026-10-17T08:00:00Z"));
}

#[test]
fn when_records_are_listed_then_they_are_ordered_by_symbol() {
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(config(&temp)).expect("open");

    for symbol in ["MSFT", "AAPL", "^GSPC"] {
        warehouse
            .upsert(&record(symbol, 5, "2026-10-17T08:00:00Z"))
            .expect("upsert");
    }

    let symbols: Vec<_> = warehouse
        .list()
        .expect("list")
        .into_iter()
        .map(|r| r.symbol)
        .collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "^GSPC"]);
}

#[test]
fn when_runs_are_recorded_then_history_is_newest_first_per_symbol() {
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(config(&temp)).expect("open");

    // Given runs for two symbols
    warehouse
        .record_run(&run("r1", "TSLA", RunStatus::Failed, "2026-10-15T10:00:00Z"))
        .expect("r1");
    warehouse
        .record_run(&run("r2", "TSLA", RunStatus::Success, "2026-10-16T10:00:00Z"))
        .expect("r2");
    warehouse
        .record_run(&run("r3", "AMZN", RunStatus::Success, "2026-10-17T10:00:00Z"))
        .expect("r3");

    // When history is read
    let runs = warehouse.runs("TSLA", 10).expect("runs");

    // Then only that symbol's runs appear, newest first, with all fields intact
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0], run("r2", "TSLA", RunStatus::Success, "2026-10-16T10:00:00Z"));
    assert_eq!(runs[1].reason.as_deref(), Some("no data"));
    assert_eq!(warehouse.runs("TSLA", 1).expect("limited").len(), 1);
}

#[test]
fn when_artifact_is_missing_then_read_reports_not_found() {
    let temp = tempdir().expect("tempdir");
    let store = FsArtifactStore::open(config(&temp).artifact_dir).expect("artifacts");

    assert!(!store.exists("AAPL_lstm.json").expect("exists"));
    assert!(matches!(
        store.read("AAPL_lstm.json"),
        Err(WarehouseError::NotFound(key)) if key == "AAPL_lstm.json"
    ));
}
