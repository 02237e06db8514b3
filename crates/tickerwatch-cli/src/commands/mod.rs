mod catalog;
mod jobs;
mod quotes;
mod watchlist;

use std::sync::Arc;

use serde_json::Value;
use tickerwatch_core::{
    FileCacheStore, HttpWatchlistClient, InitReport, InitSource, UserId, WatchlistBackend,
    WatchlistConfig, WatchlistSyncEngine,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub command: &'static str,
    pub data: Value,
    pub warnings: Vec<String>,
    /// Number of requested mutations that were refused.
    pub rejected: usize,
}

impl CommandResult {
    pub fn ok(command: &'static str, data: Value) -> Self {
        Self {
            command,
            data,
            warnings: Vec::new(),
            rejected: 0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }
}

/// One initialized engine plus the client it talks through.
pub struct Session {
    pub engine: WatchlistSyncEngine,
    pub client: Arc<HttpWatchlistClient>,
    pub init: InitReport,
}

impl Session {
    async fn open(config: &WatchlistConfig, user: UserId) -> Self {
        let client = Arc::new(HttpWatchlistClient::from_config(config));
        // Commands refresh explicitly once they are done mutating.
        let engine = WatchlistSyncEngine::builder(
            Arc::clone(&client) as Arc<dyn WatchlistBackend>,
            Arc::new(FileCacheStore::in_dir(&config.cache_dir)),
        )
        .max_entries(config.max_entries)
        .auto_refresh(false)
        .build();

        let init = engine.initialize(user).await;
        Self {
            engine,
            client,
            init,
        }
    }

    fn fallback_warning(&self) -> Option<String> {
        match (self.init.source, &self.init.remote_error) {
            (InitSource::LocalCache, Some(error)) => Some(format!(
                "backend unavailable, using cached watchlist: {error}"
            )),
            _ => None,
        }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    if let Command::Clear(args) = &cli.command {
        if !args.yes {
            return Err(CliError::Command(String::from(
                "refusing to clear the watchlist without --yes",
            )));
        }
    }

    let config = config_from(cli);

    // Job triggers do not touch the watchlist, so they skip initialization.
    match &cli.command {
        Command::Notify(args) => {
            jobs::notify(args, &HttpWatchlistClient::from_config(&config)).await
        }
        Command::Pull => jobs::pull(&HttpWatchlistClient::from_config(&config)).await,
        command => with_session(command, &config, UserId::new(cli.user.clone())).await,
    }
}

async fn with_session(
    command: &Command,
    config: &WatchlistConfig,
    user: UserId,
) -> Result<CommandResult, CliError> {
    let session = Session::open(config, user).await;

    let result = match command {
        Command::List => watchlist::list(&session).await?,
        Command::Add(args) => watchlist::add(args, &session).await?,
        Command::Remove(args) => watchlist::remove(args, &session).await?,
        Command::Clear(_) => watchlist::clear(&session).await?,
        Command::Quotes => quotes::run(&session).await?,
        Command::Catalog => catalog::list(&session).await?,
        Command::History(args) => catalog::history(args, &session).await?,
        Command::Notify(args) => jobs::notify(args, session.client.as_ref()).await?,
        Command::Pull => jobs::pull(session.client.as_ref()).await?,
    };

    // Remote removals from `clear` run in the background.
    session.engine.settle().await;

    Ok(match session.fallback_warning() {
        Some(warning) => result.with_warning(warning),
        None => result,
    })
}

fn config_from(cli: &Cli) -> WatchlistConfig {
    let mut config = WatchlistConfig::from_env();
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base_url(api_base.clone());
    }
    if let Some(cache_dir) = &cli.cache_dir {
        config = config.with_cache_dir(cache_dir.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    config
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tickerwatch_core::{LocalCacheStore, TickerSymbol};

    use super::*;

    #[test]
    fn flags_override_environment_config() {
        let cli = Cli::parse_from([
            "tickerwatch",
            "list",
            "--api-base",
            "https://api.example.test/",
            "--cache-dir",
            "/tmp/tw",
            "--timeout-ms",
            "8000",
        ]);

        let config = config_from(&cli);

        assert_eq!(config.api_base_url, "https://api.example.test");
        assert_eq!(config.cache_dir, std::path::PathBuf::from("/tmp/tw"));
        assert_eq!(config.timeout_ms, 8000);
    }

    #[tokio::test]
    async fn clear_without_confirmation_is_refused_before_any_io() {
        let cli = Cli::parse_from(["tickerwatch", "clear", "--api-base", "http://127.0.0.1:9"]);

        let error = run(&cli).await.err().expect("refused");

        assert!(matches!(error, CliError::Command(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back_to_cached_watchlist() {
        let dir = tempfile::tempdir().expect("tempdir");
        FileCacheStore::in_dir(dir.path())
            .save(&[TickerSymbol::normalize("AAPL").expect("valid")]);
        let cache_dir = dir.path().to_string_lossy().to_string();
        let cli = Cli::parse_from([
            "tickerwatch",
            "list",
            "--api-base",
            "http://127.0.0.1:9",
            "--cache-dir",
            cache_dir.as_str(),
            "--timeout-ms",
            "500",
        ]);

        let result = run(&cli).await.expect("list works offline");

        assert_eq!(result.data["source"], "local_cache");
        assert_eq!(result.data["tickers"], serde_json::json!(["AAPL"]));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.rejected, 0);
    }
}
