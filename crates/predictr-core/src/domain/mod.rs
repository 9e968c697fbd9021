//! # Domain Models
//!
//! Canonical domain types for predictr.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`PricePoint`] | One daily close |
//! | [`PriceSeries`] | Chronological closes for a symbol |
//! | [`ForecastPoint`] | One forecasted close |
//!
//! All types validate their invariants at construction time:
//!
//! ```rust
//! use predictr_core::{PricePoint, ValidationError};
//! use predictr_core::domain::calendar::parse_date;
//!
//! let date = parse_date("2024-01-02").unwrap();
//! assert!(PricePoint::new(date, 101.5).is_ok());
//! assert!(matches!(
//!     PricePoint::new(date, -1.0),
//!     Err(ValidationError::NegativeValue { .. })
//! ));
//! ```

pub mod calendar;
mod forecast;
mod series;
mod symbol;

pub use forecast::{round_cents, ForecastPoint};
pub use series::{PricePoint, PriceSeries};
pub use symbol::Symbol;
