//! CLI argument definitions for predictr.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `train` | Fit and register a model for a symbol |
//! | `predict` | Forecast closes, training first if needed |
//! | `sweep` | Drop models whose artifacts no longer load |
//! | `models` | List registered models |
//! | `history` | Show training attempts for a symbol |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--home` | `$PREDICTR_HOME` or `~/.predictr` | Data directory |
//! | `--timeout-ms` | `10000` | Price-history request timeout |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! predictr train AAPL --epochs 30
//! predictr predict AAPL --days 10 --pretty
//! RUST_LOG=predictr_ml=info predictr sweep
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Per-symbol LSTM price forecasting.
#[derive(Debug, Parser)]
#[command(
    name = "predictr",
    author,
    version,
    about = "Per-symbol LSTM close-price forecasting",
    long_about = "predictr trains one LSTM per ticker on its daily close history, stores \
the model locally, and forecasts the next days by feeding each prediction back \
into the model.\n\
\n\
Output is JSON on stdout; logs go to stderr and are controlled by RUST_LOG."
)]
pub struct Cli {
    /// Data directory holding the model registry and artifacts.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Price-history request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train (or retrain) the model for a symbol.
    ///
    /// # Examples
    ///
    ///   predictr train AAPL
    ///   predictr train MSFT --epochs 20 --time-steps 30
    Train(TrainArgs),

    /// Forecast the next days' closes.
    ///
    /// Trains a model first when none is registered.
    ///
    /// # Examples
    ///
    ///   predictr predict AAPL
    ///   predictr predict AAPL --days 10
    Predict(PredictArgs),

    /// Remove registered models whose artifacts are missing or outdated.
    Sweep,

    /// List registered models.
    Models,

    /// Show recent training attempts for a symbol.
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Market symbol (e.g., AAPL).
    pub symbol: String,

    /// Maximum epochs; early stopping may finish sooner (default: 50).
    #[arg(long)]
    pub epochs: Option<u32>,

    /// Input window length in trading days (default: 60).
    #[arg(long)]
    pub time_steps: Option<u32>,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Market symbol (e.g., AAPL).
    pub symbol: String,

    /// Number of calendar days to forecast, 1 to 365 (default: 5).
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Market symbol (e.g., AAPL).
    pub symbol: String,

    /// Maximum number of attempts to show.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_days_and_global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from([
            "predictr",
            "predict",
            "AAPL",
            "--days",
            "10",
            "--pretty",
            "--timeout-ms",
            "2500",
        ]);

        assert!(cli.pretty);
        assert_eq!(cli.timeout_ms, 2_500);
        match cli.command {
            Command::Predict(args) => {
                assert_eq!(args.symbol, "AAPL");
                assert_eq!(args.days, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
