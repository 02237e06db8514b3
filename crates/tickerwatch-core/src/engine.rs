//! Watchlist synchronization engine.
//!
//! The engine owns the one authoritative [`WatchlistState`]. The local cache
//! and the remote backend are projections of it:
//!
//! ```text
//!  add/remove ──▶ validate ──▶ mutate + cache.save ──▶ remote call ──▶ refresh quotes ──▶ publish
//!                  │ (locked)                    (unlocked, best effort)  (background)
//!                  └─▶ Rejected
//! ```
//!
//! Mutations are optimistic: a failed remote call is logged and the local
//! change is kept (`LocalOnly`), never rolled back. Local and remote can
//! therefore drift apart until the next `initialize` against a reachable
//! backend, which takes the remote list as authoritative again.
//!
//! Every entry point that changes state runs under a single async mutex, so
//! capacity and duplicate checks cannot interleave. Remote calls are awaited
//! after that lock is released, but each one first takes a membership guard
//! while the state lock is still held. Membership calls (including the
//! removals spawned by a clear) therefore reach the backend in commit order.
//! Each committed change bumps a version counter; a quote refresh that
//! finishes after a newer change is discarded.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::WatchlistConfig;
use crate::local_cache::{FileCacheStore, LocalCacheStore};
use crate::notifier::{ChangeNotifier, WatchlistChanged};
use crate::quotes::QuoteAggregator;
use crate::remote::{HttpWatchlistClient, UserId, WatchlistBackend};
use crate::{
    Quote, RemoteError, TickerSymbol, ValidationError, WatchlistState, MAX_WATCHLIST_SIZE,
};

/// Result of an add or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Applied locally and accepted by the backend.
    Confirmed,
    /// Applied locally; the backend call failed or no backend session exists.
    LocalOnly { reason: String },
    /// Refused before any state change.
    Rejected(ValidationError),
}

impl SyncOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::LocalOnly { .. } => "local_only",
            Self::Rejected(_) => "rejected",
        }
    }

    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Confirmed => None,
            Self::LocalOnly { reason } => Some(reason.clone()),
            Self::Rejected(error) => Some(error.to_string()),
        }
    }
}

/// Where `initialize` took its state from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSource {
    Remote,
    LocalCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub source: InitSource,
    pub tickers: Vec<TickerSymbol>,
    /// Why the remote was not used, when it was not.
    pub remote_error: Option<RemoteError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { version: u64, quotes: usize },
    /// A mutation committed while the refresh was in flight.
    Stale { issued_at: u64, current: u64 },
}

/// Copy-on-read view of the committed watchlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistSnapshot {
    pub version: u64,
    #[serde(flatten)]
    pub state: WatchlistState,
}

impl WatchlistSnapshot {
    pub fn tickers(&self) -> &[TickerSymbol] {
        self.state.tickers()
    }
}

/// Latest applied quotes, ordered like the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBoard {
    /// State version the quotes were fetched for.
    pub version: u64,
    /// RFC3339 time of the last applied refresh.
    pub refreshed_at: Option<String>,
    pub quotes: Vec<Quote>,
}

/// Single-use token proving the caller confirmed a clear-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearConfirmation {
    token: Uuid,
    version: u64,
}

impl ClearConfirmation {
    pub fn token(&self) -> Uuid {
        self.token
    }
}

#[derive(Debug)]
struct EngineState {
    watchlist: WatchlistState,
    version: u64,
    quotes: BTreeMap<TickerSymbol, Quote>,
    quotes_version: u64,
    refreshed_at: Option<String>,
    user: Option<UserId>,
    pending_clear: Option<ClearConfirmation>,
}

struct EngineInner {
    backend: Arc<dyn WatchlistBackend>,
    cache: Arc<dyn LocalCacheStore>,
    aggregator: QuoteAggregator,
    notifier: Arc<ChangeNotifier>,
    auto_refresh: bool,
    state: Mutex<EngineState>,
    /// Held across each remote membership call; taken under `state`.
    membership: Arc<Mutex<()>>,
    snapshot: RwLock<Arc<WatchlistSnapshot>>,
    background: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Builder for [`WatchlistSyncEngine`].
pub struct SyncEngineBuilder {
    backend: Arc<dyn WatchlistBackend>,
    cache: Arc<dyn LocalCacheStore>,
    notifier: Option<Arc<ChangeNotifier>>,
    max_entries: usize,
    auto_refresh: bool,
}

impl SyncEngineBuilder {
    /// Defaults to the process-wide notifier when not set.
    pub fn notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Whether mutations spawn a background quote refresh.
    pub fn auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    pub fn build(self) -> WatchlistSyncEngine {
        let watchlist = WatchlistState::new(self.max_entries);
        let snapshot = Arc::new(WatchlistSnapshot {
            version: 0,
            state: watchlist.clone(),
        });

        WatchlistSyncEngine {
            inner: Arc::new(EngineInner {
                aggregator: QuoteAggregator::new(Arc::clone(&self.backend)),
                backend: self.backend,
                cache: self.cache,
                notifier: self.notifier.unwrap_or_else(ChangeNotifier::global),
                auto_refresh: self.auto_refresh,
                state: Mutex::new(EngineState {
                    watchlist,
                    version: 0,
                    quotes: BTreeMap::new(),
                    quotes_version: 0,
                    refreshed_at: None,
                    user: None,
                    pending_clear: None,
                }),
                membership: Arc::new(Mutex::new(())),
                snapshot: RwLock::new(snapshot),
                background: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }
}

/// Orchestrates validation, persistence, remote sync, quotes and change
/// notification for one user's watchlist. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WatchlistSyncEngine {
    inner: Arc<EngineInner>,
}

impl WatchlistSyncEngine {
    pub fn builder(
        backend: Arc<dyn WatchlistBackend>,
        cache: Arc<dyn LocalCacheStore>,
    ) -> SyncEngineBuilder {
        SyncEngineBuilder {
            backend,
            cache,
            notifier: None,
            max_entries: MAX_WATCHLIST_SIZE,
            auto_refresh: true,
        }
    }

    /// HTTP backend, file cache under `config.cache_dir`, global notifier.
    pub fn from_config(config: &WatchlistConfig) -> Self {
        Self::builder(
            Arc::new(HttpWatchlistClient::from_config(config)),
            Arc::new(FileCacheStore::in_dir(&config.cache_dir)),
        )
        .max_entries(config.max_entries)
        .build()
    }

    pub fn notifier(&self) -> Arc<ChangeNotifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Lock-free read of the last committed state.
    pub fn snapshot(&self) -> Arc<WatchlistSnapshot> {
        self.inner
            .snapshot
            .read()
            .expect("snapshot lock is not poisoned")
            .clone()
    }

    pub fn tickers(&self) -> Vec<TickerSymbol> {
        self.snapshot().tickers().to_vec()
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    pub async fn user(&self) -> Option<UserId> {
        self.inner.state.lock().await.user.clone()
    }

    /// Load the watchlist: remote when reachable, else the local cache, else
    /// empty. Then refresh quotes for the result.
    pub async fn initialize(&self, user: UserId) -> InitReport {
        let fetched = {
            let _order = self.inner.membership.lock().await;
            self.inner.backend.fetch_tickers(&user).await
        };
        let (source, raw, remote_error) = match fetched {
            Ok(tickers) => (InitSource::Remote, tickers, None),
            Err(error) => {
                tracing::warn!(user = %user, %error, "remote watchlist unavailable; falling back to local cache");
                let cached = self
                    .inner
                    .cache
                    .load()
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>();
                (InitSource::LocalCache, cached, Some(error))
            }
        };

        let tickers = {
            let mut state = self.inner.state.lock().await;
            let sanitized = WatchlistState::sanitize(raw, state.watchlist.limit());
            if !sanitized.is_clean() {
                tracing::warn!(
                    invalid = ?sanitized.invalid,
                    duplicates = sanitized.duplicates,
                    overflow = sanitized.overflow,
                    "dropped entries while loading watchlist"
                );
            }
            state.user = Some(user);
            state.watchlist = sanitized.state;
            state.quotes.clear();
            self.commit(&mut state);
            state.watchlist.tickers().to_vec()
        };

        tracing::info!(source = ?source, count = tickers.len(), "watchlist initialized");
        self.announce();
        self.refresh_quotes().await;

        InitReport {
            source,
            tickers,
            remote_error,
        }
    }

    pub async fn add(&self, raw: &str) -> SyncOutcome {
        let ticker = match TickerSymbol::normalize(raw) {
            Ok(ticker) => ticker,
            Err(error) => return SyncOutcome::Rejected(error),
        };

        let (user, order) = {
            let mut state = self.inner.state.lock().await;
            if let Err(error) = state.watchlist.insert(ticker.clone()) {
                tracing::debug!(%ticker, %error, "add rejected");
                return SyncOutcome::Rejected(error);
            }
            self.commit(&mut state);
            (state.user.clone(), self.membership_turn().await)
        };

        let outcome = match user {
            Some(user) => match self.inner.backend.add_ticker(&user, &ticker).await {
                Ok(()) => SyncOutcome::Confirmed,
                Err(error) => {
                    tracing::warn!(%ticker, %error, "remote add failed; keeping local change");
                    SyncOutcome::LocalOnly {
                        reason: error.to_string(),
                    }
                }
            },
            None => no_session(),
        };
        drop(order);

        self.after_mutation();
        outcome
    }

    pub async fn remove(&self, raw: &str) -> SyncOutcome {
        let ticker = match TickerSymbol::normalize(raw) {
            Ok(ticker) => ticker,
            Err(error) => return SyncOutcome::Rejected(error),
        };

        let (user, order) = {
            let mut state = self.inner.state.lock().await;
            if let Err(error) = state.watchlist.remove(&ticker) {
                tracing::debug!(%ticker, %error, "remove rejected");
                return SyncOutcome::Rejected(error);
            }
            state.quotes.remove(&ticker);
            self.commit(&mut state);
            (state.user.clone(), self.membership_turn().await)
        };

        let outcome = match user {
            Some(user) => match self.inner.backend.remove_ticker(&user, &ticker).await {
                Ok(()) => SyncOutcome::Confirmed,
                Err(error) => {
                    tracing::warn!(%ticker, %error, "remote remove failed; keeping local change");
                    SyncOutcome::LocalOnly {
                        reason: error.to_string(),
                    }
                }
            },
            None => no_session(),
        };
        drop(order);

        self.after_mutation();
        outcome
    }

    /// Issue the token a later [`clear_all`](Self::clear_all) must present.
    /// Any committed change invalidates it.
    pub async fn request_clear(&self) -> ClearConfirmation {
        let mut state = self.inner.state.lock().await;
        let confirmation = ClearConfirmation {
            token: Uuid::new_v4(),
            version: state.version,
        };
        state.pending_clear = Some(confirmation.clone());
        confirmation
    }

    /// Empty the watchlist. Remote removals run in the background and their
    /// failures are only logged; later membership calls wait for them.
    /// Returns how many tickers were cleared.
    pub async fn clear_all(&self, confirmation: &ClearConfirmation) -> Result<usize, ValidationError> {
        let (removed, user) = {
            let mut state = self.inner.state.lock().await;
            let confirmed = state
                .pending_clear
                .as_ref()
                .is_some_and(|pending| pending == confirmation && pending.version == state.version);
            if !confirmed {
                return Err(ValidationError::ConfirmationMismatch);
            }

            let removed = state.watchlist.take_all();
            state.quotes.clear();
            state.refreshed_at = None;
            self.commit(&mut state);
            let user = match state.user.clone() {
                Some(user) if !removed.is_empty() => Some((user, self.membership_turn().await)),
                _ => None,
            };
            (removed, user)
        };

        let count = removed.len();
        if let Some((user, order)) = user {
            let backend = Arc::clone(&self.inner.backend);
            self.spawn_background(async move {
                for ticker in removed {
                    if let Err(error) = backend.remove_ticker(&user, &ticker).await {
                        tracing::warn!(%ticker, %error, "remote remove during clear failed");
                    }
                }
                drop(order);
            });
        }

        tracing::info!(count, "watchlist cleared");
        self.announce();
        Ok(count)
    }

    /// Refresh quotes for the current tickers. Results are applied only if no
    /// mutation committed in the meantime. Never fails.
    pub async fn refresh_quotes(&self) -> RefreshOutcome {
        let (tickers, issued_at) = {
            let state = self.inner.state.lock().await;
            (state.watchlist.tickers().to_vec(), state.version)
        };

        let quotes = self.inner.aggregator.refresh(&tickers).await;

        let mut state = self.inner.state.lock().await;
        if state.version != issued_at {
            tracing::debug!(issued_at, current = state.version, "discarding stale quote refresh");
            return RefreshOutcome::Stale {
                issued_at,
                current: state.version,
            };
        }

        let count = quotes.len();
        state.quotes = quotes
            .into_iter()
            .map(|quote| (quote.ticker.clone(), quote))
            .collect();
        state.quotes_version = issued_at;
        state.refreshed_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();

        RefreshOutcome::Applied {
            version: issued_at,
            quotes: count,
        }
    }

    pub async fn quotes(&self) -> QuoteBoard {
        let state = self.inner.state.lock().await;
        let quotes = state
            .watchlist
            .tickers()
            .iter()
            .filter_map(|ticker| state.quotes.get(ticker).cloned())
            .collect();

        QuoteBoard {
            version: state.quotes_version,
            refreshed_at: state.refreshed_at.clone(),
            quotes,
        }
    }

    /// Wait for spawned background work (quote refreshes, clear-all
    /// removals). Short-lived processes call this before exiting.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(
                &mut *self
                    .inner
                    .background
                    .lock()
                    .expect("background lock is not poisoned"),
            );
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(error) = handle.await {
                    tracing::warn!(%error, "background sync task failed");
                }
            }
        }
    }

    /// Bump the version, write through to the cache, publish the snapshot.
    fn commit(&self, state: &mut EngineState) {
        state.version += 1;
        state.pending_clear = None;
        self.inner.cache.save(state.watchlist.tickers());

        let snapshot = Arc::new(WatchlistSnapshot {
            version: state.version,
            state: state.watchlist.clone(),
        });
        *self
            .inner
            .snapshot
            .write()
            .expect("snapshot lock is not poisoned") = snapshot;
    }

    /// Must be awaited while the state lock is held so turns follow commits.
    async fn membership_turn(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.inner.membership).lock_owned().await
    }

    fn after_mutation(&self) {
        if self.inner.auto_refresh {
            let engine = self.clone();
            self.spawn_background(async move {
                engine.refresh_quotes().await;
            });
        }
        self.announce();
    }

    fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut background = self
            .inner
            .background
            .lock()
            .expect("background lock is not poisoned");
        background.retain(|pending| !pending.is_finished());
        background.push(handle);
    }

    fn announce(&self) {
        let snapshot = self.snapshot();
        self.inner.notifier.publish(&WatchlistChanged::new(
            snapshot.version,
            snapshot.tickers().to_vec(),
        ));
    }
}

fn no_session() -> SyncOutcome {
    SyncOutcome::LocalOnly {
        reason: String::from("no user session; remote unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(SyncOutcome::Confirmed.as_str(), "confirmed");
        assert_eq!(no_session().as_str(), "local_only");
        let rejected = SyncOutcome::Rejected(ValidationError::EmptyInput);
        assert!(!rejected.is_applied());
        assert_eq!(rejected.detail().as_deref(), Some("ticker cannot be empty"));
    }

    #[tokio::test]
    async fn from_config_starts_empty_before_initialize() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = WatchlistConfig::default().with_cache_dir(dir.path());

        let engine = WatchlistSyncEngine::from_config(&config);

        assert_eq!(engine.version(), 0);
        assert!(engine.tickers().is_empty());
        assert!(engine.user().await.is_none());
        assert!(engine.quotes().await.refreshed_at.is_none());
    }

    #[test]
    fn snapshot_serializes_flat() {
        let mut state = WatchlistState::default();
        state
            .insert(TickerSymbol::normalize("AAPL").expect("valid"))
            .expect("insert");
        let snapshot = WatchlistSnapshot { version: 4, state };
        let json = serde_json::to_value(&snapshot).expect("serializes");
        assert_eq!(json, serde_json::json!({ "version": 4, "tickers": ["AAPL"] }));
    }
}
