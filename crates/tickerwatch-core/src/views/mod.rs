//! Independently rendered consumers of the watchlist.
//!
//! Neither view holds a reference to the sync engine. Each one seeds itself
//! from a snapshot and then follows `watchlist-changed` events, discarding
//! any event older than the last one it applied.

mod catalog;
mod chart;

pub use catalog::{CatalogRow, CatalogView};
pub use chart::ChartSelector;

use crate::notifier::WatchlistChanged;

/// Version gate shared by the views.
#[derive(Debug, Default, Clone, Copy)]
struct SeenVersion(Option<u64>);

impl SeenVersion {
    fn accept(&mut self, event: &WatchlistChanged) -> bool {
        match self.0 {
            Some(seen) if event.version < seen => false,
            _ => {
                self.0 = Some(event.version);
                true
            }
        }
    }
}
