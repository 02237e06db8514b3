use serde::Serialize;

use crate::{TickerSymbol, ValidationError};

/// Default and maximum number of tickers a watchlist may hold.
pub const MAX_WATCHLIST_SIZE: usize = 50;

/// Ordered, de-duplicated, size-bounded set of tickers.
///
/// Entries are kept sorted by code point after every mutation, so two states
/// holding the same tickers always compare (and serialize) identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistState {
    tickers: Vec<TickerSymbol>,
    #[serde(skip)]
    limit: usize,
}

impl Default for WatchlistState {
    fn default() -> Self {
        Self::new(MAX_WATCHLIST_SIZE)
    }
}

/// Result of rebuilding a watchlist from an untrusted source (remote or cache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedWatchlist {
    pub state: WatchlistState,
    /// Raw entries that failed ticker validation.
    pub invalid: Vec<String>,
    pub duplicates: usize,
    /// Valid entries dropped because the limit was reached.
    pub overflow: usize,
}

impl SanitizedWatchlist {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.duplicates == 0 && self.overflow == 0
    }
}

impl WatchlistState {
    pub fn new(limit: usize) -> Self {
        Self {
            tickers: Vec::new(),
            limit: limit.min(MAX_WATCHLIST_SIZE),
        }
    }

    /// Rebuild a state from raw strings, dropping whatever would violate an
    /// invariant. Kept entries are the lexicographically smallest ones.
    pub fn sanitize<I, S>(raw: I, limit: usize) -> SanitizedWatchlist
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invalid = Vec::new();
        let mut valid = Vec::new();
        for entry in raw {
            match TickerSymbol::normalize(entry.as_ref()) {
                Ok(ticker) => valid.push(ticker),
                Err(_) => invalid.push(entry.as_ref().to_owned()),
            }
        }

        valid.sort();
        let before_dedup = valid.len();
        valid.dedup();
        let duplicates = before_dedup - valid.len();

        let mut state = Self::new(limit);
        let overflow = valid.len().saturating_sub(state.limit);
        valid.truncate(state.limit);
        state.tickers = valid;

        SanitizedWatchlist {
            state,
            invalid,
            duplicates,
            overflow,
        }
    }

    pub fn tickers(&self) -> &[TickerSymbol] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_full(&self) -> bool {
        self.tickers.len() >= self.limit
    }

    pub fn contains(&self, ticker: &TickerSymbol) -> bool {
        self.tickers.binary_search(ticker).is_ok()
    }

    /// Insert keeping sort order. Duplicates are checked before capacity.
    pub fn insert(&mut self, ticker: TickerSymbol) -> Result<(), ValidationError> {
        match self.tickers.binary_search(&ticker) {
            Ok(_) => Err(ValidationError::Duplicate {
                ticker: ticker.into(),
            }),
            Err(_) if self.is_full() => Err(ValidationError::LimitReached { max: self.limit }),
            Err(position) => {
                self.tickers.insert(position, ticker);
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, ticker: &TickerSymbol) -> Result<(), ValidationError> {
        match self.tickers.binary_search(ticker) {
            Ok(position) => {
                self.tickers.remove(position);
                Ok(())
            }
            Err(_) => Err(ValidationError::NotInWatchlist {
                ticker: ticker.as_str().to_owned(),
            }),
        }
    }

    /// Empty the state, returning the tickers it held.
    pub fn take_all(&mut self) -> Vec<TickerSymbol> {
        std::mem::take(&mut self.tickers)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.tickers.iter().map(|t| t.as_str().to_owned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(raw: &str) -> TickerSymbol {
        TickerSymbol::normalize(raw).expect("valid ticker")
    }

    #[test]
    fn insert_keeps_code_point_order() {
        let mut state = WatchlistState::default();
        for raw in ["MSFT", "AAPL", "BRK.B", "BRK-A"] {
            state.insert(ticker(raw)).expect("insert");
        }
        assert_eq!(state.to_strings(), vec!["AAPL", "BRK-A", "BRK.B", "MSFT"]);
    }

    #[test]
    fn duplicate_insert_leaves_state_untouched() {
        let mut state = WatchlistState::default();
        state.insert(ticker("AAPL")).expect("insert");
        let before = state.clone();

        let err = state.insert(ticker("aapl")).expect_err("duplicate");
        assert_eq!(
            err,
            ValidationError::Duplicate {
                ticker: String::from("AAPL")
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn full_state_rejects_new_ticker_but_reports_duplicates_first() {
        let mut state = WatchlistState::new(2);
        state.insert(ticker("AAPL")).expect("insert");
        state.insert(ticker("MSFT")).expect("insert");

        assert_eq!(
            state.insert(ticker("TSLA")).expect_err("full"),
            ValidationError::LimitReached { max: 2 }
        );
        assert!(matches!(
            state.insert(ticker("MSFT")),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn limit_is_never_above_the_global_maximum() {
        assert_eq!(WatchlistState::new(500).limit(), MAX_WATCHLIST_SIZE);
    }

    #[test]
    fn sanitize_drops_invalid_duplicate_and_overflow_entries() {
        let report = WatchlistState::sanitize(["msft", "AAPL", "bad$", "MSFT", "TSLA"], 2);
        assert_eq!(report.state.to_strings(), vec!["AAPL", "MSFT"]);
        assert_eq!(report.invalid, vec![String::from("bad$")]);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.overflow, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn take_all_empties_the_state() {
        let mut state = WatchlistState::default();
        state.insert(ticker("NVDA")).expect("insert");
        let taken = state.take_all();
        assert_eq!(taken, vec![ticker("NVDA")]);
        assert!(state.is_empty());
    }
}
