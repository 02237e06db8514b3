use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::SeenVersion;
use crate::catalog::{entry_ticker, CatalogEntry, CatalogSource};
use crate::engine::WatchlistSnapshot;
use crate::notifier::{ChangeNotifier, HandlerError, Subscription, WatchlistChanged};
use crate::{RemoteError, TickerSymbol};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub watched: bool,
}

#[derive(Debug, Default)]
struct CatalogState {
    entries: Vec<CatalogEntry>,
    watched: BTreeSet<TickerSymbol>,
    seen: SeenVersion,
}

impl CatalogState {
    fn apply(&mut self, event: &WatchlistChanged) {
        if self.seen.accept(event) {
            self.watched = event.tickers.iter().cloned().collect();
        }
    }
}

/// The "available stocks" listing with per-entry watched flags.
pub struct CatalogView {
    state: Arc<Mutex<CatalogState>>,
    _subscription: Subscription,
}

impl CatalogView {
    pub fn attach(
        notifier: &Arc<ChangeNotifier>,
        entries: Vec<CatalogEntry>,
        snapshot: &WatchlistSnapshot,
    ) -> Self {
        let mut initial = CatalogState {
            entries,
            ..CatalogState::default()
        };
        initial.apply(&WatchlistChanged::new(
            snapshot.version,
            snapshot.tickers().to_vec(),
        ));

        let state = Arc::new(Mutex::new(initial));
        let handler_state = Arc::clone(&state);
        let subscription = notifier.subscribe(move |event| {
            let mut guard = handler_state
                .lock()
                .map_err(|_| HandlerError::new("catalog view state poisoned"))?;
            guard.apply(event);
            Ok(())
        });

        Self {
            state,
            _subscription: subscription,
        }
    }

    /// Fetch the listing, then attach.
    pub async fn load(
        source: &dyn CatalogSource,
        notifier: &Arc<ChangeNotifier>,
        snapshot: &WatchlistSnapshot,
    ) -> Result<Self, RemoteError> {
        let entries = source.list_stocks().await?;
        Ok(Self::attach(notifier, entries, snapshot))
    }

    pub fn rows(&self) -> Vec<CatalogRow> {
        let state = self.state.lock().expect("catalog view lock is not poisoned");
        state
            .entries
            .iter()
            .map(|entry| CatalogRow {
                entry: entry.clone(),
                watched: entry_ticker(entry)
                    .map(|ticker| state.watched.contains(&ticker))
                    .unwrap_or(false),
            })
            .collect()
    }

    /// Whether the entry's add button should be enabled.
    pub fn can_add(&self, raw: &str) -> bool {
        let Ok(ticker) = TickerSymbol::normalize(raw) else {
            return false;
        };
        let state = self.state.lock().expect("catalog view lock is not poisoned");
        !state.watched.contains(&ticker)
    }
}
