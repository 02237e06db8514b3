use serde::Serialize;
use tickerwatch_core::{InitSource, QuoteBoard, SyncOutcome, TickerSymbol};

use crate::cli::TickersArgs;
use crate::error::CliError;

use super::{CommandResult, Session};

#[derive(Debug, Serialize)]
struct WatchlistData {
    source: InitSource,
    version: u64,
    tickers: Vec<TickerSymbol>,
    quotes: QuoteBoard,
}

#[derive(Debug, Serialize)]
struct MutationEntry {
    input: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct MutationData {
    results: Vec<MutationEntry>,
    tickers: Vec<TickerSymbol>,
    quotes: QuoteBoard,
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Remove,
}

pub async fn list(session: &Session) -> Result<CommandResult, CliError> {
    let data = WatchlistData {
        source: session.init.source,
        version: session.engine.version(),
        tickers: session.engine.tickers(),
        quotes: session.engine.quotes().await,
    };
    Ok(CommandResult::ok("list", serde_json::to_value(data)?))
}

pub async fn add(args: &TickersArgs, session: &Session) -> Result<CommandResult, CliError> {
    apply("add", Mutation::Add, &args.tickers, session).await
}

pub async fn remove(args: &TickersArgs, session: &Session) -> Result<CommandResult, CliError> {
    apply("remove", Mutation::Remove, &args.tickers, session).await
}

pub async fn clear(session: &Session) -> Result<CommandResult, CliError> {
    let confirmation = session.engine.request_clear().await;
    let cleared = session.engine.clear_all(&confirmation).await?;
    let data = serde_json::json!({
        "cleared": cleared,
        "tickers": session.engine.tickers(),
    });
    Ok(CommandResult::ok("clear", data))
}

async fn apply(
    command: &'static str,
    mutation: Mutation,
    inputs: &[String],
    session: &Session,
) -> Result<CommandResult, CliError> {
    let mut results = Vec::with_capacity(inputs.len());
    let mut warnings = Vec::new();
    let mut rejected = 0;

    for input in inputs {
        let outcome = match mutation {
            Mutation::Add => session.engine.add(input).await,
            Mutation::Remove => session.engine.remove(input).await,
        };
        match &outcome {
            SyncOutcome::Confirmed => {}
            SyncOutcome::LocalOnly { reason } => {
                warnings.push(format!("'{input}' saved locally only: {reason}"));
            }
            SyncOutcome::Rejected(_) => rejected += 1,
        }
        results.push(MutationEntry {
            input: input.clone(),
            outcome: outcome.as_str(),
            detail: outcome.detail(),
        });
    }

    if rejected < inputs.len() {
        session.engine.refresh_quotes().await;
    }

    let data = MutationData {
        results,
        tickers: session.engine.tickers(),
        quotes: session.engine.quotes().await,
    };
    Ok(CommandResult::ok(command, serde_json::to_value(data)?)
        .with_warnings(warnings)
        .with_rejected(rejected))
}
