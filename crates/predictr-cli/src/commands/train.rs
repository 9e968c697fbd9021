use predictr_ml::ForecastService;

use crate::cli::TrainArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &TrainArgs, service: &ForecastService) -> Result<CommandOutcome, CliError> {
    let result = service
        .train(&args.symbol, args.epochs, args.time_steps)
        .await;
    let data = serde_json::to_value(&result)?;

    Ok(if result.is_success() {
        CommandOutcome::ok(data)
    } else {
        CommandOutcome::failed(data)
    })
}
