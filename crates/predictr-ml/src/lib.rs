//! # Predictr ML
//!
//! Model lifecycle for predictr: normalize a close-price history, fit a
//! stacked LSTM per symbol, persist it, and forecast by feeding each
//! prediction back into the input window.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`normalizer`] | Min/max bounds and scaling |
//! | [`window`] | Sliding training windows |
//! | [`model`] | LSTM layers, Adam, early stopping |
//! | [`artifact`] | Versioned JSON model files |
//! | [`trainer`] | Fit and register a model |
//! | [`predictor`] | Multi-step forecasts, training on demand |
//! | [`sweeper`] | Drop registry entries that can no longer load |
//! | [`single_flight`] | Per-symbol training lock |
//! | [`service`] | Front-end facade with tagged results |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use predictr_core::YahooHistorySource;
//! use predictr_ml::ForecastService;
//! use predictr_warehouse::{FsArtifactStore, Warehouse, WarehouseConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WarehouseConfig::default();
//! let artifacts = FsArtifactStore::open(config.artifact_dir.clone())?;
//! let service = ForecastService::new(
//!     Arc::new(YahooHistorySource::default()),
//!     Arc::new(Warehouse::open(config)?),
//!     Arc::new(artifacts),
//! );
//!
//! let outcome = service.predict("AAPL", Some(5)).await;
//! println!("{}", serde_json::to_string(&outcome)?);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod predictor;
pub mod service;
pub mod single_flight;
pub mod sweeper;
pub mod trainer;
pub mod window;

pub use artifact::{ArtifactError, ModelArtifact, FORMAT_VERSION};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ForecastConfig, TrainingConfig};
pub use context::ForecastContext;
pub use error::ForecastError;
pub use normalizer::NormalizationBounds;
pub use predictor::{Forecast, Predictor};
pub use service::{ForecastService, PredictionOutcome, TrainResult};
pub use single_flight::{SymbolGuard, SymbolLocks};
pub use sweeper::{SweepReport, Sweeper};
pub use trainer::{TrainReport, Trainer};
