//! Batch quote refresh with per-ticker degradation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::remote::{QuoteRecord, WatchlistBackend};
use crate::{Quote, TickerSymbol};

pub const MISSING_QUOTE_ERROR: &str = "no quote returned for ticker";

/// Turns raw backend quote records into display-ready [`Quote`]s.
#[derive(Clone)]
pub struct QuoteAggregator {
    backend: Arc<dyn WatchlistBackend>,
}

impl QuoteAggregator {
    pub fn new(backend: Arc<dyn WatchlistBackend>) -> Self {
        Self { backend }
    }

    /// Fetch and classify quotes for `tickers`, returned in request order.
    ///
    /// Never fails: if the batch call fails every ticker gets a quote with
    /// `error` set, and tickers the backend skipped get one as well.
    pub async fn refresh(&self, tickers: &[TickerSymbol]) -> Vec<Quote> {
        if tickers.is_empty() {
            return Vec::new();
        }

        match self.backend.fetch_quotes(tickers).await {
            Ok(records) => assemble(tickers, records),
            Err(error) => {
                tracing::warn!(count = tickers.len(), %error, "quote refresh failed");
                let message = error.to_string();
                tickers
                    .iter()
                    .map(|ticker| Quote::failed(ticker.clone(), message.clone()))
                    .collect()
            }
        }
    }
}

fn assemble(requested: &[TickerSymbol], records: Vec<QuoteRecord>) -> Vec<Quote> {
    let mut by_ticker: HashMap<TickerSymbol, QuoteRecord> = HashMap::with_capacity(records.len());
    for record in records {
        match TickerSymbol::normalize(&record.ticker) {
            // First record wins if the backend repeats a ticker.
            Ok(ticker) => {
                by_ticker.entry(ticker).or_insert(record);
            }
            Err(error) => {
                tracing::debug!(ticker = %record.ticker, %error, "dropping quote with invalid ticker");
            }
        }
    }

    requested
        .iter()
        .map(|ticker| match by_ticker.remove(ticker) {
            Some(record) => {
                Quote::new(ticker.clone(), record.price, record.sentiment_score).with_error(record.error)
            }
            None => Quote::failed(ticker.clone(), MISSING_QUOTE_ERROR),
        })
        .collect()
}
