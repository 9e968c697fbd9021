use thiserror::Error;

/// Construction-time validation failures for domain types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("symbol is {len} characters long; at most {max} are allowed")]
    SymbolTooLong { len: usize, max: usize },

    #[error("symbol must start with a letter, a digit or '^', found '{ch}'")]
    SymbolInvalidStart { ch: char },

    #[error("symbol contains invalid character '{ch}' at position {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("{field} must be a finite number")]
    NonFiniteValue { field: &'static str },

    #[error("{field} must not be negative")]
    NegativeValue { field: &'static str },

    #[error("price series dates must be strictly increasing; {date} follows {previous}")]
    UnorderedSeries { previous: String, date: String },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
}
