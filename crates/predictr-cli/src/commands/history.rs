use predictr_ml::ForecastService;
use predictr_warehouse::TrainingRun;
use serde::Serialize;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::CommandOutcome;

#[derive(Debug, Serialize)]
struct HistoryResponseData {
    symbol: String,
    runs: Vec<TrainingRun>,
}

pub fn run(args: &HistoryArgs, service: &ForecastService) -> Result<CommandOutcome, CliError> {
    let runs = service.history(&args.symbol, args.limit)?;
    Ok(CommandOutcome::ok(serde_json::to_value(HistoryResponseData {
        symbol: args.symbol.trim().to_ascii_uppercase(),
        runs,
    })?))
}
