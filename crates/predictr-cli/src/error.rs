use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Forecast(#[from] predictr_ml::ForecastError),

    #[error(transparent)]
    Storage(#[from] predictr_warehouse::WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Forecast(error) if error.is_input_error() => 2,
            Self::Forecast(_) => 3,
            Self::Serialization(_) => 4,
            Self::Storage(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
