//! # Predictr Warehouse
//!
//! Storage layer for predictr: the per-symbol model registry, the training
//! audit log, and the artifact store holding serialized models.
//!
//! ## Overview
//!
//! - **Model registry** in DuckDB, one row per symbol, replaced on upsert
//! - **Training log** recording every training attempt
//! - **Artifact store** for serialized models on disk
//! - **Connection pooling** over a single database instance
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use predictr_warehouse::{ModelStore, Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::default())?;
//!     for record in warehouse.list()? {
//!         println!("{} trained on {}", record.symbol, record.trained_on);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `model_records` | Current model per symbol with normalization bounds |
//! | `training_log` | Training attempt audit log |
//! | `schema_migrations` | Applied migration versions |

pub mod artifacts;
pub mod duckdb;
pub mod migrations;
mod records;
mod store;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use thiserror::Error;
use tracing::debug;

pub use artifacts::{ArtifactStore, FsArtifactStore, InMemoryArtifactStore};
pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use records::{ModelRecord, RunStatus, TrainingRun};
pub use store::{InMemoryModelStore, ModelStore};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No artifact stored under the key.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Artifact key is not a flat file name.
    #[error("invalid artifact key '{0}'")]
    InvalidKey(String),

    /// A stored row holds a value outside its domain.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Locations of predictr's persistent state.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for predictr data.
    pub predictr_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Directory holding model artifacts.
    pub artifact_dir: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::from_home(resolve_predictr_home())
    }
}

impl WarehouseConfig {
    /// Standard layout under `predictr_home`.
    pub fn from_home(predictr_home: impl Into<PathBuf>) -> Self {
        let predictr_home = predictr_home.into();
        Self {
            db_path: predictr_home.join("warehouse.duckdb"),
            artifact_dir: predictr_home.join("models"),
            predictr_home,
            max_pool_size: 4,
        }
    }
}

/// DuckDB-backed [`ModelStore`].
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open (creating if needed) the database and apply migrations.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Initialize database schema.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }
}

const MODEL_COLUMNS: &str =
    "symbol, model_path, trained_on, epochs, time_steps, scaler_min, scaler_max";

const RUN_COLUMNS: &str =
    "run_id, symbol, status, reason, epochs, samples, duration_ms, final_loss, recorded_at";

impl ModelStore for Warehouse {
    fn upsert(&self, record: &ModelRecord) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let epochs = i64::from(record.epochs);
        let time_steps = i64::from(record.time_steps);
        let params: [&dyn ToSql; 7] = [
            &record.symbol,
            &record.model_path,
            &record.trained_on,
            &epochs,
            &time_steps,
            &record.scaler_min,
            &record.scaler_max,
        ];
        connection.execute(
            "INSERT OR REPLACE INTO model_records \
             (symbol, model_path, trained_on, epochs, time_steps, scaler_min, scaler_max, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        debug!(symbol = %record.symbol, epochs = record.epochs, "model record upserted");
        Ok(())
    }

    fn find(&self, symbol: &str) -> Result<Option<ModelRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let sql = format!("SELECT {MODEL_COLUMNS} FROM model_records WHERE symbol = ?");
        let params: [&dyn ToSql; 1] = [&symbol];
        let mut records = query_models(&connection, &sql, params.as_slice())?;
        Ok(records.pop())
    }

    fn delete(&self, symbol: &str) -> Result<bool, WarehouseError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 1] = [&symbol];
        let removed = connection.execute(
            "DELETE FROM model_records WHERE symbol = ?",
            params.as_slice(),
        )?;
        if removed > 0 {
            debug!(symbol, "model record deleted");
        }
        Ok(removed > 0)
    }

    fn list(&self) -> Result<Vec<ModelRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let sql = format!("SELECT {MODEL_COLUMNS} FROM model_records ORDER BY symbol");
        query_models(&connection, &sql, &[])
    }

    fn record_run(&self, run: &TrainingRun) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let status = run.status.as_str();
        let epochs = i64::from(run.epochs);
        let samples = clamp_to_i64(run.samples);
        let duration_ms = clamp_to_i64(run.duration_ms);
        let params: [&dyn ToSql; 9] = [
            &run.run_id,
            &run.symbol,
            &status,
            &run.reason,
            &epochs,
            &samples,
            &duration_ms,
            &run.final_loss,
            &run.recorded_at,
        ];
        connection.execute(
            "INSERT INTO training_log \
             (run_id, symbol, status, reason, epochs, samples, duration_ms, final_loss, recorded_at, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    fn runs(&self, symbol: &str, limit: usize) -> Result<Vec<TrainingRun>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM training_log WHERE symbol = ? \
             ORDER BY recorded_at DESC, timestamp DESC LIMIT {limit}"
        );
        let params: [&dyn ToSql; 1] = [&symbol];

        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params.as_slice())?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next()? {
            let status: String = row.get(2)?;
            let epochs: i64 = row.get(4)?;
            let samples: i64 = row.get(5)?;
            let duration_ms: i64 = row.get(6)?;
            runs.push(TrainingRun {
                run_id: row.get(0)?,
                symbol: row.get(1)?,
                status: RunStatus::parse(&status).ok_or_else(|| {
                    WarehouseError::InvalidRecord(format!("unknown run status '{status}'"))
                })?,
                reason: row.get(3)?,
                epochs: stored_u32("epochs", epochs)?,
                samples: stored_u64("samples", samples)?,
                duration_ms: stored_u64("duration_ms", duration_ms)?,
                final_loss: row.get(7)?,
                recorded_at: row.get(8)?,
            });
        }
        Ok(runs)
    }
}

fn query_models(
    connection: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<ModelRecord>, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let mut rows = statement.query(params)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let epochs: i64 = row.get(3)?;
        let time_steps: i64 = row.get(4)?;
        records.push(ModelRecord {
            symbol: row.get(0)?,
            model_path: row.get(1)?,
            trained_on: row.get(2)?,
            epochs: stored_u32("epochs", epochs)?,
            time_steps: stored_u32("time_steps", time_steps)?,
            scaler_min: row.get(5)?,
            scaler_max: row.get(6)?,
        });
    }
    Ok(records)
}

fn stored_u32(column: &str, value: i64) -> Result<u32, WarehouseError> {
    u32::try_from(value)
        .map_err(|_| WarehouseError::InvalidRecord(format!("{column} out of range: {value}")))
}

fn stored_u64(column: &str, value: i64) -> Result<u64, WarehouseError> {
    u64::try_from(value)
        .map_err(|_| WarehouseError::InvalidRecord(format!("{column} out of range: {value}")))
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Resolve the predictr home directory from environment or default.
pub fn resolve_predictr_home() -> PathBuf {
    if let Some(path) = env::var_os("PREDICTR_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".predictr");
    }

    PathBuf::from(".predictr")
}
