//! # Domain Models
//!
//! Canonical domain types for tickerwatch.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TickerSymbol`] | Validated, uppercase ticker |
//! | [`WatchlistState`] | Sorted, unique, bounded ticker set |
//! | [`Quote`] | Price and sentiment for one ticker |
//! | [`SentimentLabel`] | Display classification of a sentiment score |
//!
//! All types enforce their invariants at construction time, so an invalid
//! ticker or an over-full watchlist cannot be represented.

mod quote;
mod ticker;
mod watchlist;

pub use quote::{sanitize_score, Quote, SentimentLabel};
pub use ticker::{TickerSymbol, MAX_TICKER_LEN};
pub use watchlist::{SanitizedWatchlist, WatchlistState, MAX_WATCHLIST_SIZE};
