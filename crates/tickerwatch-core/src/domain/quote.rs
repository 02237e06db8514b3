use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::TickerSymbol;

const BULLISH_AT: f64 = 0.35;
const SOMEWHAT_BULLISH_AT: f64 = 0.15;
const SOMEWHAT_BEARISH_AT: f64 = -0.15;
const BEARISH_AT: f64 = -0.35;

/// Display classification of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Bullish,
    SomewhatBullish,
    Neutral,
    SomewhatBearish,
    Bearish,
    Unknown,
}

impl SentimentLabel {
    /// Classify a raw score by fixed thresholds.
    ///
    /// | Score | Label |
    /// |-------|-------|
    /// | `>= 0.35` | `Bullish` |
    /// | `[0.15, 0.35)` | `SomewhatBullish` |
    /// | `(-0.15, 0.15)` | `Neutral` |
    /// | `(-0.35, -0.15]` | `SomewhatBearish` |
    /// | `<= -0.35` | `Bearish` |
    /// | absent | `Unknown` |
    pub fn classify(score: Option<f64>) -> Self {
        let Some(score) = sanitize_score(score) else {
            return Self::Unknown;
        };

        if score >= BULLISH_AT {
            Self::Bullish
        } else if score >= SOMEWHAT_BULLISH_AT {
            Self::SomewhatBullish
        } else if score > SOMEWHAT_BEARISH_AT {
            Self::Neutral
        } else if score > BEARISH_AT {
            Self::SomewhatBearish
        } else {
            Self::Bearish
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::SomewhatBullish => "Somewhat-Bullish",
            Self::Neutral => "Neutral",
            Self::SomewhatBearish => "Somewhat-Bearish",
            Self::Bearish => "Bearish",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for SentimentLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-finite scores count as absent; finite ones are clamped into `[-1, 1]`.
pub fn sanitize_score(score: Option<f64>) -> Option<f64> {
    score
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(-1.0, 1.0))
}

/// Display-ready price and sentiment for one watched ticker.
///
/// Recomputed on every refresh and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub ticker: TickerSymbol,
    pub price: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: SentimentLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Quote {
    pub fn new(ticker: TickerSymbol, price: Option<f64>, sentiment_score: Option<f64>) -> Self {
        let sentiment_score = sanitize_score(sentiment_score);
        Self {
            ticker,
            price: price.filter(|value| value.is_finite()),
            sentiment_score,
            sentiment_label: SentimentLabel::classify(sentiment_score),
            error: None,
        }
    }

    /// A quote carrying only an in-band error.
    pub fn failed(ticker: TickerSymbol, error: impl Into<String>) -> Self {
        Self {
            ticker,
            price: None,
            sentiment_score: None,
            sentiment_label: SentimentLabel::Unknown,
            error: Some(error.into()),
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reference_scores() {
        assert_eq!(SentimentLabel::classify(Some(0.4)), SentimentLabel::Bullish);
        assert_eq!(
            SentimentLabel::classify(Some(0.2)),
            SentimentLabel::SomewhatBullish
        );
        assert_eq!(SentimentLabel::classify(Some(0.0)), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::classify(Some(-0.5)), SentimentLabel::Bearish);
        assert_eq!(SentimentLabel::classify(None), SentimentLabel::Unknown);
    }

    #[test]
    fn threshold_boundaries_follow_half_open_ranges() {
        assert_eq!(SentimentLabel::classify(Some(0.35)), SentimentLabel::Bullish);
        assert_eq!(
            SentimentLabel::classify(Some(0.15)),
            SentimentLabel::SomewhatBullish
        );
        assert_eq!(
            SentimentLabel::classify(Some(0.149)),
            SentimentLabel::Neutral
        );
        assert_eq!(
            SentimentLabel::classify(Some(-0.149)),
            SentimentLabel::Neutral
        );
        assert_eq!(
            SentimentLabel::classify(Some(-0.15)),
            SentimentLabel::SomewhatBearish
        );
        assert_eq!(
            SentimentLabel::classify(Some(-0.349)),
            SentimentLabel::SomewhatBearish
        );
        assert_eq!(SentimentLabel::classify(Some(-0.35)), SentimentLabel::Bearish);
    }

    #[test]
    fn non_finite_scores_are_unknown_and_out_of_range_scores_clamp() {
        assert_eq!(
            SentimentLabel::classify(Some(f64::NAN)),
            SentimentLabel::Unknown
        );
        assert_eq!(sanitize_score(Some(3.0)), Some(1.0));
        assert_eq!(sanitize_score(Some(-7.5)), Some(-1.0));
    }

    #[test]
    fn failed_quote_has_no_market_fields() {
        let ticker = TickerSymbol::normalize("AAPL").expect("valid");
        let quote = Quote::failed(ticker, "quotes unavailable");
        assert!(quote.is_failed());
        assert_eq!(quote.price, None);
        assert_eq!(quote.sentiment_score, None);
        assert_eq!(quote.sentiment_label, SentimentLabel::Unknown);
    }
}
