//! # Tickerwatch Core
//!
//! Watchlist synchronization and sentiment presentation for a small set of
//! ticker symbols.
//!
//! ## Overview
//!
//! - **Ticker validation**: trim, uppercase, `^[A-Z.\-]{1,10}$`
//! - **Local cache**: durable mirror of the confirmed watchlist
//! - **Remote client**: the authoritative backend's membership and quote API
//! - **Quote aggregation**: batch quotes with per-ticker errors and sentiment labels
//! - **Change notification**: process-wide `watchlist-changed` broadcast
//! - **Sync engine**: optimistic mutations, fallback on remote failure,
//!   stale-refresh protection
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Available-stocks listing and per-ticker history |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Ticker, watchlist state, quote and sentiment types |
//! | [`engine`] | The orchestrating [`WatchlistSyncEngine`] |
//! | [`error`] | Validation, remote and storage errors |
//! | [`http_client`] | Transport abstraction over reqwest |
//! | [`local_cache`] | File and in-memory cache stores |
//! | [`notifier`] | Publish/subscribe channel for watchlist changes |
//! | [`quotes`] | Quote refresh and classification |
//! | [`remote`] | Backend client |
//! | [`triggers`] | On-demand notification and pull-down jobs |
//! | [`views`] | Catalog and chart consumers of change events |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickerwatch_core::{SyncOutcome, UserId, WatchlistConfig, WatchlistSyncEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = WatchlistSyncEngine::from_config(&WatchlistConfig::from_env());
//!     engine.initialize(UserId::new("1")).await;
//!
//!     match engine.add("tsla").await {
//!         SyncOutcome::Confirmed => println!("saved"),
//!         SyncOutcome::LocalOnly { reason } => println!("saved locally: {reason}"),
//!         SyncOutcome::Rejected(error) => println!("rejected: {error}"),
//!     }
//! }
//! ```
//!
//! ## Error Handling
//!
//! Only validation errors reach callers, as [`SyncOutcome::Rejected`].
//! Remote failures degrade a mutation to [`SyncOutcome::LocalOnly`] or a
//! quote to an in-band `error`; storage failures are logged and the session
//! continues in memory.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod http_client;
pub mod local_cache;
pub mod notifier;
pub mod quotes;
pub mod remote;
pub mod triggers;
pub mod views;

pub use catalog::{CatalogEntry, CatalogSource, HistoryPoint, HistoryRange};
pub use config::WatchlistConfig;
pub use domain::{
    Quote, SanitizedWatchlist, SentimentLabel, TickerSymbol, WatchlistState, MAX_WATCHLIST_SIZE,
};
pub use engine::{
    ClearConfirmation, InitReport, InitSource, QuoteBoard, RefreshOutcome, SyncEngineBuilder,
    SyncOutcome, WatchlistSnapshot, WatchlistSyncEngine,
};
pub use error::{RemoteError, StorageError, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use local_cache::{FileCacheStore, LocalCacheStore, MemoryCacheStore};
pub use notifier::{ChangeNotifier, HandlerError, Subscription, WatchlistChanged};
pub use quotes::QuoteAggregator;
pub use remote::{HttpWatchlistClient, QuoteRecord, UserId, WatchlistBackend};
pub use triggers::{PipelineTrigger, DEFAULT_NOTIFY_MESSAGE};
pub use views::{CatalogView, ChartSelector};
