use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Ticker symbol identifying one equity's time series.
///
/// Symbols are stored upper-cased. Besides alphanumerics, the characters
/// `.`, `-`, `_` and `&` are accepted (e.g. "BAJAJ-AUTO", "M&M").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a ticker string.
    ///
    /// # Arguments
    /// * `ticker` - The ticker (e.g., "TCS", "infy"); surrounding whitespace is trimmed
    ///
    /// # Errors
    /// Returns an error if the ticker is empty or contains invalid characters.
    pub fn new(ticker: impl AsRef<str>) -> Result<Self, SymbolError> {
        let ticker = ticker.as_ref().trim();
        Self::validate(ticker)?;
        Ok(Symbol(ticker.to_uppercase()))
    }

    /// Derives a symbol from a file path's stem, e.g. `data/tcs.csv` -> "TCS".
    pub fn from_path(path: &Path) -> Result<Self, SymbolError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or(SymbolError::Empty)?;
        Self::new(stem)
    }

    fn validate(ticker: &str) -> Result<(), SymbolError> {
        if ticker.is_empty() {
            return Err(SymbolError::Empty);
        }

        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '&'))
        {
            return Err(SymbolError::InvalidCharacters);
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when creating or validating symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The symbol is empty
    Empty,
    /// The symbol contains invalid characters
    InvalidCharacters,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::Empty => write!(f, "Symbol cannot be empty"),
            SymbolError::InvalidCharacters => write!(f, "Symbol contains invalid characters"),
        }
    }
}

impl std::error::Error for SymbolError {}
