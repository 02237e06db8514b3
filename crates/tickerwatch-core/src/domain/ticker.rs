use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const MAX_TICKER_LEN: usize = 10;

/// Validated, uppercase ticker symbol matching `^[A-Z.\-]{1,10}$`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Trim, uppercase and validate raw user input.
    ///
    /// Pure: no I/O, and idempotent on its own output.
    pub fn normalize(raw: &str) -> Result<Self, ValidationError> {
        // Full Unicode case mapping: `ſ` and `ı` uppercase to `S` and `I`.
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let len = normalized.chars().count();
        let valid_chars = normalized
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch == '.' || ch == '-');
        if len > MAX_TICKER_LEN || !valid_chars {
            return Err(ValidationError::InvalidFormat { value: normalized });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TickerSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for TickerSymbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl TryFrom<&str> for TickerSymbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<TickerSymbol> for String {
    fn from(value: TickerSymbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        let parsed = TickerSymbol::normalize("  tsla ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "TSLA");
    }

    #[test]
    fn accepts_dots_and_dashes() {
        assert_eq!(
            TickerSymbol::normalize("brk.b").expect("valid").as_str(),
            "BRK.B"
        );
        assert_eq!(
            TickerSymbol::normalize("rds-a").expect("valid").as_str(),
            "RDS-A"
        );
    }

    #[test]
    fn rejects_blank_input_as_empty() {
        assert_eq!(
            TickerSymbol::normalize("   ").expect_err("must fail"),
            ValidationError::EmptyInput
        );
    }

    #[test]
    fn rejects_digits_and_symbols() {
        for raw in ["AAPL1", "AA$L", "A B", "äpl"] {
            let err = TickerSymbol::normalize(raw).expect_err("must fail");
            assert!(
                matches!(err, ValidationError::InvalidFormat { .. }),
                "{raw} should be rejected as invalid format"
            );
        }
    }

    #[test]
    fn letters_that_uppercase_into_the_alphabet_are_accepted() {
        assert_eq!(TickerSymbol::normalize("ſpy").expect("valid").as_str(), "SPY");
        assert_eq!(TickerSymbol::normalize("ıbm").expect("valid").as_str(), "IBM");
        assert!(TickerSymbol::normalize("çsco").is_err());
    }

    #[test]
    fn enforces_length_bound() {
        assert!(TickerSymbol::normalize("ABCDEFGHIJ").is_ok());
        let err = TickerSymbol::normalize("ABCDEFGHIJK").expect_err("too long");
        assert_eq!(
            err,
            ValidationError::InvalidFormat {
                value: String::from("ABCDEFGHIJK")
            }
        );
    }

    #[test]
    fn deserializes_through_validation() {
        let parsed: TickerSymbol = serde_json::from_str("\"msft\"").expect("valid json");
        assert_eq!(parsed.as_str(), "MSFT");
        assert!(serde_json::from_str::<TickerSymbol>("\"\"").is_err());
    }
}
