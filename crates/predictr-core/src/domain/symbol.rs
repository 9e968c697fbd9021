use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Upper-cased market ticker used as the model store key.
///
/// Accepts plain equities (`AAPL`), share classes (`BRK.B`, `BF-B`),
/// exchange-suffixed listings (`0700.HK`), index tickers (`^GSPC`) and
/// currency pairs (`EURUSD=X`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let Some(first) = normalized.chars().next() else {
            return Err(ValidationError::EmptySymbol);
        };

        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if !(first.is_ascii_alphanumeric() || first == '^') {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }

        if let Some((index, ch)) = normalized
            .char_indices()
            .skip(1)
            .find(|(_, ch)| !is_symbol_char(*ch))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe stem derived from the symbol (`^GSPC` -> `_5EGSPC`).
    ///
    /// Reserved characters become `_` plus their hex code. `_` never occurs
    /// in a symbol, so distinct symbols always get distinct stems.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len() + 4);
        for ch in self.0.chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
                stem.push(ch);
            } else {
                stem.push_str(&format!("_{:02X}", u32::from(ch)));
            }
        }
        stem
    }
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '=' | '^')
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" tsla ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "TSLA");
    }

    #[test]
    fn accepts_index_and_currency_tickers() {
        assert_eq!(Symbol::parse("^gspc").expect("index").as_str(), "^GSPC");
        assert_eq!(
            Symbol::parse("eurusd=x").expect("fx pair").as_str(),
            "EURUSD=X"
        );
    }

    #[test]
    fn accepts_tickers_starting_with_a_digit() {
        for ticker in ["0700.HK", "005930.KS", "7203.T", "3mindia.ns"] {
            let parsed = Symbol::parse(ticker).expect("numeric ticker should parse");
            assert_eq!(parsed.as_str(), ticker.to_ascii_uppercase());
        }
    }

    #[test]
    fn rejects_invalid_start_and_chars() {
        assert!(matches!(
            Symbol::parse("=X"),
            Err(ValidationError::SymbolInvalidStart { ch: '=' })
        ));
        assert!(matches!(
            Symbol::parse(".HK"),
            Err(ValidationError::SymbolInvalidStart { ch: '.' })
        ));
        assert!(matches!(
            Symbol::parse("AA PL"),
            Err(ValidationError::SymbolInvalidChar { ch: ' ', index: 2 })
        ));
        assert!(matches!(Symbol::parse("   "), Err(ValidationError::EmptySymbol)));
    }

    #[test]
    fn file_stem_escapes_reserved_characters() {
        let symbol = Symbol::parse("^GSPC").expect("index");
        assert_eq!(symbol.file_stem(), "_5EGSPC");
        let pair = Symbol::parse("EURUSD=X").expect("fx pair");
        assert_eq!(pair.file_stem(), "EURUSD_3DX");
        let class = Symbol::parse("BRK.B").expect("share class");
        assert_eq!(class.file_stem(), "BRK.B");
    }

    #[test]
    fn distinct_symbols_never_share_a_file_stem() {
        let caret = Symbol::parse("A^B").expect("symbol");
        let equals = Symbol::parse("A=B").expect("symbol");
        assert_ne!(caret.file_stem(), equals.file_stem());
    }
}
