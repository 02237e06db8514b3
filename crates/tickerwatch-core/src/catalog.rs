//! Read-only catalog of available stocks and their sentiment history.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::remote::{HttpWatchlistClient, RemoteFuture};
use crate::{SentimentLabel, TickerSymbol, ValidationError};

/// One listing in the "available stocks" catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CatalogEntry {
    /// Name for display, falling back to the ticker.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.ticker)
    }
}

/// Time window for history lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl HistoryRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
            Self::All => "all",
        }
    }
}

impl Display for HistoryRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidHistoryRange(pub String);

impl Display for InvalidHistoryRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid range '{}', expected one of 24h, 7d, 30d, 90d, 1y, all",
            self.0
        )
    }
}

impl std::error::Error for InvalidHistoryRange {}

impl FromStr for HistoryRange {
    type Err = InvalidHistoryRange;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            "1y" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(InvalidHistoryRange(value.to_owned())),
        }
    }
}

/// One aggregated history bucket for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ticker: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "avg_sentiment")]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

impl HistoryPoint {
    pub fn sentiment_label(&self) -> SentimentLabel {
        SentimentLabel::classify(self.sentiment_score)
    }
}

#[derive(Debug, Deserialize)]
struct StocksPayload {
    #[serde(default)]
    stocks: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    history: Vec<HistoryPoint>,
}

/// Lookup of available stocks and per-ticker history.
pub trait CatalogSource: Send + Sync {
    fn list_stocks(&self) -> RemoteFuture<'_, Vec<CatalogEntry>>;

    fn stock_history<'a>(
        &'a self,
        ticker: &'a TickerSymbol,
        range: HistoryRange,
    ) -> RemoteFuture<'a, Vec<HistoryPoint>>;
}

impl CatalogSource for HttpWatchlistClient {
    fn list_stocks(&self) -> RemoteFuture<'_, Vec<CatalogEntry>> {
        Box::pin(async move {
            let payload: StocksPayload = self.get_json(self.url("/stocks")).await?;
            Ok(payload.stocks)
        })
    }

    fn stock_history<'a>(
        &'a self,
        ticker: &'a TickerSymbol,
        range: HistoryRange,
    ) -> RemoteFuture<'a, Vec<HistoryPoint>> {
        Box::pin(async move {
            let url = format!(
                "{}?ticker={}&range={}",
                self.url("/stock-history"),
                urlencoding::encode(ticker.as_str()),
                range.as_str()
            );
            let payload: HistoryPayload = self.get_json(url).await?;
            Ok(payload.history)
        })
    }
}

/// Parse a catalog entry's ticker, if it is a valid watchlist symbol.
pub fn entry_ticker(entry: &CatalogEntry) -> Result<TickerSymbol, ValidationError> {
    TickerSymbol::normalize(&entry.ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_range() {
        for (raw, expected) in [
            ("24h", HistoryRange::Day),
            ("7D", HistoryRange::Week),
            ("30d", HistoryRange::Month),
            ("90d", HistoryRange::Quarter),
            ("1y", HistoryRange::Year),
            ("all", HistoryRange::All),
        ] {
            assert_eq!(raw.parse::<HistoryRange>(), Ok(expected));
            assert_eq!(expected.to_string(), raw.to_ascii_lowercase());
        }
        assert!("2w".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn history_point_reads_backend_field_names() {
        let point: HistoryPoint = serde_json::from_str(
            r#"{"ticker":"AAPL","price":190.5,"avg_sentiment":-0.4,"recorded_at":"2024-11-01T10:00:00"}"#,
        )
        .expect("parses");
        assert_eq!(point.sentiment_score, Some(-0.4));
        assert_eq!(point.sentiment_label(), SentimentLabel::Bearish);
    }

    #[test]
    fn catalog_entry_display_name_falls_back_to_ticker() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id":3,"ticker":"NVDA"}"#).expect("parses");
        assert_eq!(entry.display_name(), "NVDA");
        assert!(entry_ticker(&entry).is_ok());
    }
}
