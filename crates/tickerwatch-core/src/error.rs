use thiserror::Error;

/// User-input failures. Always reported synchronously to the immediate caller
/// and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyInput,
    #[error("ticker '{value}' has invalid characters or length (expected 1-10 of A-Z, '.', '-')")]
    InvalidFormat { value: String },
    #[error("ticker '{ticker}' is already in the watchlist")]
    Duplicate { ticker: String },
    #[error("watchlist limit of {max} tickers reached")]
    LimitReached { max: usize },
    #[error("ticker '{ticker}' is not in the watchlist")]
    NotInWatchlist { ticker: String },
    #[error("clear-all confirmation is missing, stale, or already used")]
    ConfirmationMismatch,
}

/// Failures talking to the authoritative backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("backend returned status {status}")]
    Backend { status: u16 },
    #[error("malformed backend response: {message}")]
    Decode { message: String },
}

impl RemoteError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Local persistence failures. Absorbed inside the cache store; only logged.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
