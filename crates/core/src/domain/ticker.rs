use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerError {
    #[error("ticker must be non-empty")]
    Empty,

    #[error("invalid ticker {0:?}: expected 1-5 ASCII letters")]
    Invalid(String),
}

/// Uppercase 1-5 letter stock symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let t = raw.trim();
        let t = t.strip_prefix('$').unwrap_or(t).trim();
        if t.is_empty() {
            return Err(TickerError::Empty);
        }
        if t.len() > 5 || !t.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TickerError::Invalid(raw.to_string()));
        }
        Ok(Self(t.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

impl std::str::FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_dollar_prefix() {
        assert_eq!(Ticker::parse("aapl").unwrap().as_str(), "AAPL");
        assert_eq!(Ticker::parse(" $nvda ").unwrap().as_str(), "NVDA");
        assert_eq!(Ticker::parse("V").unwrap().as_str(), "V");
    }

    #[test]
    fn rejects_bad_symbols() {
        assert_eq!(Ticker::parse("  "), Err(TickerError::Empty));
        assert!(matches!(Ticker::parse("GOOGLE"), Err(TickerError::Invalid(_))));
        assert!(matches!(Ticker::parse("BRK.B"), Err(TickerError::Invalid(_))));
        assert!(matches!(Ticker::parse("123"), Err(TickerError::Invalid(_))));
    }

    #[test]
    fn deserializes_through_validation() {
        let t: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(t.as_str(), "MSFT");
        assert!(serde_json::from_str::<Ticker>("\"TOOLONG\"").is_err());
    }
}
