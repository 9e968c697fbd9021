mod history;
mod models;
mod predict;
mod sweep;
mod train;

use std::sync::Arc;
use std::time::Duration;

use predictr_core::YahooHistorySource;
use predictr_ml::ForecastService;
use predictr_warehouse::{FsArtifactStore, Warehouse, WarehouseConfig};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// JSON payload plus whether the command reported a failure in it.
pub struct CommandOutcome {
    pub data: Value,
    pub failed: bool,
}

impl CommandOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            failed: false,
        }
    }

    pub fn failed(data: Value) -> Self {
        Self { data, failed: true }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    let service = build_service(cli)?;

    match &cli.command {
        Command::Train(args) => train::run(args, &service).await,
        Command::Predict(args) => predict::run(args, &service).await,
        Command::Sweep => sweep::run(&service),
        Command::Models => models::run(&service),
        Command::History(args) => history::run(args, &service),
    }
}

fn build_service(cli: &Cli) -> Result<ForecastService, CliError> {
    let config = match &cli.home {
        Some(home) => WarehouseConfig::from_home(home),
        None => WarehouseConfig::default(),
    };
    debug!(home = %config.predictr_home.display(), "opening warehouse");

    let artifacts = FsArtifactStore::open(config.artifact_dir.clone())?;
    let warehouse = Warehouse::open(config)?;
    let source = YahooHistorySource::default().with_timeout(Duration::from_millis(cli.timeout_ms));

    Ok(ForecastService::new(
        Arc::new(source),
        Arc::new(warehouse),
        Arc::new(artifacts),
    ))
}
