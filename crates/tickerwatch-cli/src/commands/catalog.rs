use serde::Serialize;
use tickerwatch_core::{
    CatalogView, ChartSelector, HistoryPoint, HistoryRange, TickerSymbol, ValidationError,
};

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::{CommandResult, Session};

#[derive(Debug, Serialize)]
struct HistoryRow {
    price: Option<f64>,
    sentiment_score: Option<f64>,
    sentiment: &'static str,
    recorded_at: Option<String>,
}

impl From<HistoryPoint> for HistoryRow {
    fn from(point: HistoryPoint) -> Self {
        Self {
            sentiment: point.sentiment_label().as_str(),
            price: point.price,
            sentiment_score: point.sentiment_score,
            recorded_at: point.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct HistoryData {
    ticker: TickerSymbol,
    range: HistoryRange,
    points: Vec<HistoryRow>,
}

pub async fn list(session: &Session) -> Result<CommandResult, CliError> {
    let view = CatalogView::load(
        session.client.as_ref(),
        &session.engine.notifier(),
        &session.engine.snapshot(),
    )
    .await?;

    let data = serde_json::json!({ "stocks": view.rows() });
    Ok(CommandResult::ok("catalog", data))
}

pub async fn history(args: &HistoryArgs, session: &Session) -> Result<CommandResult, CliError> {
    let ticker = TickerSymbol::normalize(&args.ticker)?;

    let chart = ChartSelector::attach(&session.engine.notifier(), &session.engine.snapshot());
    if !chart.select(&ticker) {
        return Err(ValidationError::NotInWatchlist {
            ticker: ticker.to_string(),
        }
        .into());
    }

    let points = chart.history(session.client.as_ref(), args.range).await?;
    let data = HistoryData {
        ticker,
        range: args.range,
        points: points.into_iter().map(HistoryRow::from).collect(),
    };
    Ok(CommandResult::ok("history", serde_json::to_value(data)?))
}
