use serde::Serialize;
use tickerwatch_core::{Quote, RefreshOutcome, TickerSymbol};

use crate::error::CliError;

use super::{CommandResult, Session};

/// A quote with its label spelled for display.
#[derive(Debug, Serialize)]
struct QuoteRow {
    ticker: TickerSymbol,
    price: Option<f64>,
    sentiment_score: Option<f64>,
    sentiment: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Quote> for QuoteRow {
    fn from(quote: Quote) -> Self {
        Self {
            sentiment: quote.sentiment_label.as_str(),
            ticker: quote.ticker,
            price: quote.price,
            sentiment_score: quote.sentiment_score,
            error: quote.error,
        }
    }
}

#[derive(Debug, Serialize)]
struct QuotesData {
    refreshed_at: Option<String>,
    quotes: Vec<QuoteRow>,
}

pub async fn run(session: &Session) -> Result<CommandResult, CliError> {
    let mut result_warnings = Vec::new();
    if let RefreshOutcome::Stale { issued_at, current } = session.engine.refresh_quotes().await {
        result_warnings.push(format!(
            "quote refresh for version {issued_at} superseded by version {current}"
        ));
    }

    let board = session.engine.quotes().await;
    let failed = board.quotes.iter().filter(|quote| quote.is_failed()).count();
    if failed > 0 {
        result_warnings.push(format!("{failed} of {} quotes carry errors", board.quotes.len()));
    }

    let data = QuotesData {
        refreshed_at: board.refreshed_at,
        quotes: board.quotes.into_iter().map(QuoteRow::from).collect(),
    };
    Ok(CommandResult::ok("quotes", serde_json::to_value(data)?).with_warnings(result_warnings))
}
