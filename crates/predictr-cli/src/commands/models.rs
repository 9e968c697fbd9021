use predictr_ml::ForecastService;
use predictr_warehouse::ModelRecord;
use serde::Serialize;

use crate::error::CliError;

use super::CommandOutcome;

#[derive(Debug, Serialize)]
struct ModelsResponseData {
    models: Vec<ModelRecord>,
}

pub fn run(service: &ForecastService) -> Result<CommandOutcome, CliError> {
    let models = service.models()?;
    Ok(CommandOutcome::ok(serde_json::to_value(ModelsResponseData {
        models,
    })?))
}
