//! Process-wide "watchlist changed" broadcast.
//!
//! Views that render independently (chart selector, catalog) subscribe here
//! instead of sharing an owner with the sync engine. Delivery is synchronous,
//! in registration order, and isolated per handler: an `Err` or a panic in
//! one handler is logged and the remaining handlers still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use serde::Serialize;
use thiserror::Error;

use crate::TickerSymbol;

/// Fixed topic carried by every event on this channel.
pub const WATCHLIST_CHANGED: &str = "watchlist-changed";

/// Payload published after every committed watchlist change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistChanged {
    /// Engine state version; consumers can ignore events older than one
    /// they already applied.
    pub version: u64,
    pub tickers: Vec<TickerSymbol>,
}

impl WatchlistChanged {
    pub fn new(version: u64, tickers: Vec<TickerSymbol>) -> Self {
        Self { version, tickers }
    }

    pub const fn topic(&self) -> &'static str {
        WATCHLIST_CHANGED
    }
}

/// Failure reported by a subscriber. Logged, never propagated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type Handler = Arc<dyn Fn(&WatchlistChanged) -> Result<(), HandlerError> + Send + Sync>;

/// Counts from a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The single channel shared by the whole process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ChangeNotifier>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(ChangeNotifier::new))
    }

    /// Register `handler`; it stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(self: &Arc<Self>, handler: F) -> Subscription
    where
        F: Fn(&WatchlistChanged) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("notifier lock is not poisoned")
            .push((id, Arc::new(handler)));

        Subscription {
            id,
            notifier: Arc::downgrade(self),
        }
    }

    pub fn publish(&self, event: &WatchlistChanged) -> DeliveryReport {
        // Snapshot so handlers may (un)subscribe re-entrantly.
        let handlers: Vec<(u64, Handler)> = self
            .handlers
            .lock()
            .expect("notifier lock is not poisoned")
            .clone();

        let mut report = DeliveryReport::default();
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(error)) => {
                    report.failed += 1;
                    tracing::warn!(subscriber = id, topic = event.topic(), %error, "subscriber failed");
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::error!(subscriber = id, topic = event.topic(), "subscriber panicked");
                }
            }
        }

        tracing::debug!(
            topic = event.topic(),
            version = event.version,
            delivered = report.delivered,
            failed = report.failed,
            "published watchlist change"
        );
        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .lock()
            .expect("notifier lock is not poisoned")
            .len()
    }

    fn remove(&self, id: u64) {
        self.handlers
            .lock()
            .expect("notifier lock is not poisoned")
            .retain(|(handler_id, _)| *handler_id != id);
    }
}

/// Registration handle; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes its handler"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    notifier: Weak<ChangeNotifier>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn event(version: u64) -> WatchlistChanged {
        WatchlistChanged::new(version, vec![TickerSymbol::normalize("AAPL").expect("valid")])
    }

    #[test]
    fn delivers_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = (0..3)
            .map(|index| {
                let seen = Arc::clone(&seen);
                notifier.subscribe(move |_| {
                    seen.lock().expect("lock").push(index);
                    Ok(())
                })
            })
            .collect();

        let report = notifier.publish(&event(1));
        assert_eq!(report.delivered, 3);
        assert_eq!(*seen.lock().expect("lock"), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn failing_and_panicking_handlers_do_not_block_others() {
        let notifier = ChangeNotifier::new();
        let reached = Arc::new(Mutex::new(false));

        let _err = notifier.subscribe(|_| Err(HandlerError::new("render failed")));
        let _panic = notifier.subscribe(|_| panic!("boom"));
        let flag = Arc::clone(&reached);
        let _ok = notifier.subscribe(move |_| {
            *flag.lock().expect("lock") = true;
            Ok(())
        });

        let report = notifier.publish(&event(2));
        assert_eq!(report, DeliveryReport { delivered: 1, failed: 2 });
        assert!(*reached.lock().expect("lock"));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let notifier = ChangeNotifier::new();
        let sub = notifier.subscribe(|_| Ok(()));
        assert_eq!(notifier.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
        assert_eq!(notifier.publish(&event(3)), DeliveryReport::default());
    }

    #[test]
    fn event_carries_fixed_topic() {
        assert_eq!(event(1).topic(), "watchlist-changed");
    }

    #[test]
    fn global_channel_is_shared() {
        assert!(Arc::ptr_eq(&ChangeNotifier::global(), &ChangeNotifier::global()));
    }
}
