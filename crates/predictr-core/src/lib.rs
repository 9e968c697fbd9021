//! # Predictr Core
//!
//! Domain types and price-history sources for the predictr forecasting service.
//!
//! ## Overview
//!
//! - **Canonical domain models** for symbols, daily closes, and forecast points
//! - **History source trait** for provider adapters
//! - **HTTP client abstraction** so adapters can be tested without a network
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | History sources (Yahoo chart API, in-memory) |
//! | [`domain`] | Domain models (Symbol, PriceSeries, ForecastPoint) |
//! | [`error`] | Validation errors |
//! | [`history_source`] | History source trait and request/error types |
//! | [`http_client`] | HTTP client abstraction |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ predictr-ml         │
//! └─────────┬───────────┘
//!           │
//!           ▼
//! ┌─────────────────────┐     ┌──────────────────┐
//! │ PriceHistorySource  │────▶│ HttpClient       │
//! │ (Yahoo / memory)    │     │ (reqwest)        │
//! └─────────┬───────────┘     └──────────────────┘
//!           │
//!           ▼
//! ┌─────────────────────┐
//! │ PriceSeries         │
//! └─────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use predictr_core::{SourceError, SourceErrorKind};
//!
//! fn retryable(error: &SourceError) -> bool {
//!     matches!(error.kind(), SourceErrorKind::Unavailable)
//! }
//!
//! assert!(retryable(&SourceError::unavailable("timeout")));
//! assert!(!retryable(&SourceError::malformed("not json")));
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod history_source;
pub mod http_client;

// Adapter implementations
pub use adapters::{InMemoryHistorySource, YahooHistorySource};

// Domain models
pub use domain::{round_cents, ForecastPoint, PricePoint, PriceSeries, Symbol};

// Error types
pub use error::ValidationError;

// History source contract
pub use history_source::{HistoryRequest, PriceHistorySource, SourceError, SourceErrorKind};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
