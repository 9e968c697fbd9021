//! # Sequence Model
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`LstmLayer`] | One recurrent layer, forward and BPTT |
//! | [`SequenceRegressor`] | Stacked LSTMs plus a dense head |
//! | [`EarlyStopping`] | Patience on the epoch training loss |
//!
//! Adam and dropout are internal to [`SequenceRegressor::fit`].

mod adam;
mod early_stopping;
mod lstm;
mod regressor;

pub use early_stopping::{EarlyStopping, EpochVerdict};
pub use lstm::LstmLayer;
pub use regressor::{DenseHead, FitOptions, FitSummary, SequenceRegressor};
