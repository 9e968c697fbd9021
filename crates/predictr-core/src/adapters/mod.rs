//! Price-history source implementations.

mod memory;
mod yahoo;

pub use memory::InMemoryHistorySource;
pub use yahoo::YahooHistorySource;
