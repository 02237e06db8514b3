//! Durable local mirror of the confirmed watchlist.
//!
//! The cache is a projection of the engine's in-memory state, never an
//! independent owner. Both operations are infallible from the caller's point
//! of view: read failures yield an empty list and write failures are logged
//! and dropped, because the in-memory state stays authoritative for the
//! session.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{StorageError, TickerSymbol};

/// Key under which the watchlist is persisted.
pub const CACHE_KEY: &str = "watchlist:v1";

/// Durable key-value persistence of the watchlist.
pub trait LocalCacheStore: Send + Sync {
    /// Never fails outward; absent or corrupt data loads as an empty list.
    fn load(&self) -> Vec<TickerSymbol>;

    /// Best-effort; failures are swallowed after logging.
    fn save(&self, tickers: &[TickerSymbol]);
}

fn encode(tickers: &[TickerSymbol]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(tickers)?)
}

fn decode(raw: &str) -> Result<Vec<TickerSymbol>, StorageError> {
    let entries: Vec<String> = serde_json::from_str(raw)?;
    let mut tickers = Vec::with_capacity(entries.len());
    for entry in entries {
        match TickerSymbol::normalize(&entry) {
            Ok(ticker) => tickers.push(ticker),
            Err(error) => {
                tracing::warn!(entry = %entry, %error, "skipping invalid cached ticker");
            }
        }
    }
    Ok(tickers)
}

/// JSON file cache. The file name is derived from [`CACHE_KEY`].
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `watchlist_v1.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let file_name = format!("{}.json", CACHE_KEY.replace(':', "_"));
        Self::new(dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Option<Vec<TickerSymbol>>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn try_save(&self, tickers: &[TickerSymbol]) -> Result<(), StorageError> {
        let body = encode(tickers)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a half-written cache.
        let staging = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl LocalCacheStore for FileCacheStore {
    fn load(&self) -> Vec<TickerSymbol> {
        match self.try_load() {
            Ok(Some(tickers)) => tickers,
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "watchlist cache unreadable; using empty list");
                Vec::new()
            }
        }
    }

    fn save(&self, tickers: &[TickerSymbol]) {
        if let Err(error) = self.try_save(tickers) {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist watchlist cache");
        }
    }
}

/// In-process cache holding the raw JSON string, like a browser's local
/// storage slot. Useful for tests and embedding without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    raw: Mutex<Option<String>>,
    read_only: bool,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with an arbitrary (possibly corrupt) value.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            read_only: false,
        }
    }

    pub fn with_tickers(tickers: &[&str]) -> Self {
        let raw = serde_json::to_string(tickers).unwrap_or_else(|_| String::from("[]"));
        Self::with_raw(raw)
    }

    /// Simulates an exhausted storage quota: every save fails.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .expect("memory cache lock is not poisoned")
            .clone()
    }
}

impl LocalCacheStore for MemoryCacheStore {
    fn load(&self) -> Vec<TickerSymbol> {
        let Some(raw) = self.raw() else {
            return Vec::new();
        };
        decode(&raw).unwrap_or_else(|error| {
            tracing::warn!(%error, "watchlist cache corrupt; using empty list");
            Vec::new()
        })
    }

    fn save(&self, tickers: &[TickerSymbol]) {
        if self.read_only {
            tracing::warn!("watchlist cache is read-only; keeping state in memory only");
            return;
        }
        match encode(tickers) {
            Ok(body) => {
                *self.raw.lock().expect("memory cache lock is not poisoned") = Some(body);
            }
            Err(error) => tracing::warn!(%error, "failed to encode watchlist cache"),
        }
    }
}
