use predictr_ml::ForecastService;

use crate::error::CliError;

use super::CommandOutcome;

pub fn run(service: &ForecastService) -> Result<CommandOutcome, CliError> {
    let report = service.sweep()?;
    Ok(CommandOutcome::ok(serde_json::to_value(report)?))
}
