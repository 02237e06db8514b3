//! CLI argument definitions for tickerwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | Show the watchlist and its latest quotes |
//! | `add` | Add one or more tickers |
//! | `remove` | Remove one or more tickers |
//! | `clear` | Remove every ticker (requires `--yes`) |
//! | `quotes` | Refresh and show quotes |
//! | `catalog` | List available stocks with watched flags |
//! | `history` | Sentiment history for a watched ticker |
//! | `notify` | Ask the backend to send a test notification |
//! | `pull` | Run the backend's market data pull-down now |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--user` | `1` | Watchlist owner (`TICKERWATCH_USER`) |
//! | `--api-base` | env / `http://localhost:3000` | Backend base URL |
//! | `--cache-dir` | env / `.tickerwatch` | Local cache directory |
//! | `--timeout-ms` | env / `3000` | Per-request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! tickerwatch add tsla nvda --pretty
//! tickerwatch remove MSFT
//! tickerwatch history AAPL --range 7d
//! tickerwatch clear --yes
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tickerwatch_core::{HistoryRange, DEFAULT_NOTIFY_MESSAGE};

/// Keep a small stock watchlist in sync with the backend and show the
/// market sentiment for each ticker.
#[derive(Debug, Parser)]
#[command(
    name = "tickerwatch",
    author,
    version,
    about = "Stock watchlist sync and sentiment CLI"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Identity of the watchlist owner.
    #[arg(long, global = true, env = "TICKERWATCH_USER", default_value = "1")]
    pub user: String,

    /// Backend base URL. Overrides `TICKERWATCH_API_BASE`.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory holding the local watchlist cache. Overrides
    /// `TICKERWATCH_CACHE_DIR`.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Request timeout in milliseconds. Overrides `TICKERWATCH_TIMEOUT_MS`.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current watchlist and its latest quotes.
    List,

    /// Add one or more tickers.
    ///
    /// Input is trimmed and uppercased. Each ticker reports its own
    /// outcome: confirmed, local_only, or rejected.
    ///
    /// # Examples
    ///
    ///   tickerwatch add tsla
    ///   tickerwatch add AAPL MSFT BRK.B
    Add(TickersArgs),

    /// Remove one or more tickers.
    Remove(TickersArgs),

    /// Remove every ticker from the watchlist.
    Clear(ClearArgs),

    /// Refresh quotes and sentiment for every watched ticker.
    Quotes,

    /// List the available stocks, flagging the watched ones.
    Catalog,

    /// Sentiment history for a watched ticker.
    History(HistoryArgs),

    /// Ask the backend to email every subscriber a test notification.
    Notify(NotifyArgs),

    /// Run the backend's price and news pull-down job now.
    Pull,
}

/// Arguments for `add` and `remove`.
#[derive(Debug, Args)]
pub struct TickersArgs {
    /// One or more ticker symbols (e.g., AAPL, msft, BRK.B).
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}

/// Arguments for the `clear` command.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Confirm that the whole watchlist should be removed.
    #[arg(long, default_value_t = false)]
    pub yes: bool,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Watched ticker to chart.
    pub ticker: String,

    /// Time window: 24h, 7d, 30d, 90d, 1y or all.
    #[arg(long, default_value_t = HistoryRange::Day)]
    pub range: HistoryRange,
}

/// Arguments for the `notify` command.
#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Message forwarded to the notification job.
    #[arg(long, default_value = DEFAULT_NOTIFY_MESSAGE)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tickerwatch",
            "add",
            "tsla",
            "nvda",
            "--pretty",
            "--user",
            "42",
        ])
        .expect("parses");

        assert!(cli.pretty);
        assert_eq!(cli.user, "42");
        match cli.command {
            Command::Add(args) => assert_eq!(args.tickers, vec!["tsla", "nvda"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_range_defaults_to_a_day() {
        let cli = Cli::try_parse_from(["tickerwatch", "history", "AAPL"]).expect("parses");
        match cli.command {
            Command::History(args) => assert_eq!(args.range, HistoryRange::Day),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["tickerwatch", "history", "AAPL", "--range", "90d"])
            .expect("parses");
        match cli.command {
            Command::History(args) => assert_eq!(args.range, HistoryRange::Quarter),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_range_is_an_argument_error() {
        let result = Cli::try_parse_from(["tickerwatch", "history", "AAPL", "--range", "2w"]);
        assert!(result.is_err());
    }

    #[test]
    fn notify_message_has_a_default() {
        let cli = Cli::try_parse_from(["tickerwatch", "notify"]).expect("parses");
        match cli.command {
            Command::Notify(args) => assert_eq!(args.message, DEFAULT_NOTIFY_MESSAGE),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn add_requires_at_least_one_ticker() {
        assert!(Cli::try_parse_from(["tickerwatch", "add"]).is_err());
    }
}
