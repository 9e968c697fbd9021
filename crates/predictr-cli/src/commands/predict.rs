use predictr_ml::ForecastService;

use crate::cli::PredictArgs;
use crate::error::CliError;

use super::CommandOutcome;

pub async fn run(args: &PredictArgs, service: &ForecastService) -> Result<CommandOutcome, CliError> {
    let outcome = service.predict(&args.symbol, args.days).await;
    let data = serde_json::to_value(&outcome)?;

    Ok(if outcome.is_success() {
        CommandOutcome::ok(data)
    } else {
        CommandOutcome::failed(data)
    })
}
