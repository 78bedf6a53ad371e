//! Ticker symbols as the upstream accepts them.
//!
//! Listings outside the US carry an exchange suffix (`TSCO.LON`,
//! `SHOP.TRT`) and several Asian exchanges use numeric codes
//! (`600104.SHH`, `000002.SHZ`), so a symbol may start with a digit.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_LEN: usize = 20;

/// Uppercased ticker, safe to use in a request and in a cache key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

fn is_separator(ch: char) -> bool {
    ch == '.' || ch == '-'
}

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();
        let len = ticker.chars().count();
        match len {
            0 => return Err(ValidationError::EmptySymbol),
            len if len > MAX_LEN => {
                return Err(ValidationError::SymbolTooLong { len, max: MAX_LEN })
            }
            _ => {}
        }

        if let Some((index, ch)) = ticker
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_alphanumeric() && !is_separator(*ch))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        let edges = [ticker.chars().next(), ticker.chars().last()];
        if let Some(ch) = edges.into_iter().flatten().find(|ch| is_separator(*ch)) {
            return Err(ValidationError::SymbolDanglingSeparator { ch });
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
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
    fn trims_and_uppercases() {
        assert_eq!(Symbol::parse(" aapl ").expect("parse").as_str(), "AAPL");
    }

    #[test]
    fn accepts_numeric_exchange_codes() {
        let shanghai = Symbol::parse("600104.shh").expect("parse");
        assert_eq!(shanghai.as_str(), "600104.SHH");
        assert_eq!(shanghai.to_string(), "600104.SHH");
        assert!(Symbol::parse("000002.SHZ").is_ok());
    }

    #[test]
    fn accepts_share_classes() {
        assert_eq!(Symbol::parse("brk.b").expect("parse").as_str(), "BRK.B");
        assert_eq!(Symbol::parse("rds-a").expect("parse").as_str(), "RDS-A");
        assert_eq!("tsco.lon".parse::<Symbol>().expect("parse").as_str(), "TSCO.LON");
    }

    #[test]
    fn rejects_characters_outside_the_ticker_set() {
        assert_eq!(
            Symbol::parse("AAPL$"),
            Err(ValidationError::SymbolInvalidChar { ch: '$', index: 4 })
        );
        assert_eq!(
            Symbol::parse("A&B"),
            Err(ValidationError::SymbolInvalidChar { ch: '&', index: 1 })
        );
    }

    #[test]
    fn rejects_separator_at_either_end() {
        assert_eq!(
            Symbol::parse(".LON"),
            Err(ValidationError::SymbolDanglingSeparator { ch: '.' })
        );
        assert_eq!(
            Symbol::parse("BRK-"),
            Err(ValidationError::SymbolDanglingSeparator { ch: '-' })
        );
    }

    #[test]
    fn rejects_blank_and_overlong_input() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert_eq!(
            Symbol::parse("ABCDEFGHIJKLMNOPQRSTU"),
            Err(ValidationError::SymbolTooLong { len: 21, max: 20 })
        );
    }
}
