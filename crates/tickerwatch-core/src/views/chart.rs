use std::sync::{Arc, Mutex};

use super::SeenVersion;
use crate::catalog::{CatalogSource, HistoryPoint, HistoryRange};
use crate::engine::WatchlistSnapshot;
use crate::notifier::{ChangeNotifier, HandlerError, Subscription, WatchlistChanged};
use crate::{RemoteError, TickerSymbol};

#[derive(Debug, Default)]
struct ChartState {
    options: Vec<TickerSymbol>,
    selected: Option<TickerSymbol>,
    seen: SeenVersion,
}

impl ChartState {
    fn apply(&mut self, event: &WatchlistChanged) {
        if !self.seen.accept(event) {
            return;
        }
        self.options = event.tickers.clone();
        let still_watched = self
            .selected
            .as_ref()
            .is_some_and(|selected| self.options.contains(selected));
        if !still_watched {
            self.selected = self.options.first().cloned();
        }
    }
}

/// Ticker picker for the sentiment chart. Its options always mirror the
/// latest watchlist event, and a removed selection falls back to the first
/// remaining ticker.
pub struct ChartSelector {
    state: Arc<Mutex<ChartState>>,
    _subscription: Subscription,
}

impl ChartSelector {
    pub fn attach(notifier: &Arc<ChangeNotifier>, snapshot: &WatchlistSnapshot) -> Self {
        let mut initial = ChartState::default();
        initial.apply(&WatchlistChanged::new(
            snapshot.version,
            snapshot.tickers().to_vec(),
        ));

        let state = Arc::new(Mutex::new(initial));
        let handler_state = Arc::clone(&state);
        let subscription = notifier.subscribe(move |event| {
            handler_state
                .lock()
                .map_err(|_| HandlerError::new("chart selector state poisoned"))?
                .apply(event);
            Ok(())
        });

        Self {
            state,
            _subscription: subscription,
        }
    }

    pub fn options(&self) -> Vec<TickerSymbol> {
        self.lock().options.clone()
    }

    pub fn selected(&self) -> Option<TickerSymbol> {
        self.lock().selected.clone()
    }

    /// Select a watched ticker. Returns `false` and keeps the current
    /// selection if `ticker` is not an option.
    pub fn select(&self, ticker: &TickerSymbol) -> bool {
        let mut state = self.lock();
        if state.options.contains(ticker) {
            state.selected = Some(ticker.clone());
            true
        } else {
            false
        }
    }

    /// History for the current selection; empty when nothing is selected.
    pub async fn history(
        &self,
        source: &dyn CatalogSource,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, RemoteError> {
        match self.selected() {
            Some(ticker) => source.stock_history(&ticker, range).await,
            None => Ok(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChartState> {
        self.state.lock().expect("chart selector lock is not poisoned")
    }
}
