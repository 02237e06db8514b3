//! Client for the authoritative watchlist backend.
//!
//! # Endpoints
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | [`WatchlistBackend::fetch_tickers`] | `GET /watchlist?user_id=…` | `{ tickers: [..] }` |
//! | [`WatchlistBackend::add_ticker`] | `POST /watchlist` `{ user_id, ticker }` | status only |
//! | [`WatchlistBackend::remove_ticker`] | `DELETE /watchlist` `{ user_id, ticker }` | status only |
//! | [`WatchlistBackend::fetch_quotes`] | `GET /quotes?tickers=A,B` | `{ quotes: [..] }` |
//!
//! Every failure is surfaced as a typed [`RemoteError`]. No retries happen
//! here; fallback policy belongs to the sync engine.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::WatchlistConfig;
use crate::http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::{RemoteError, TickerSymbol};

pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Caller-supplied identity of the watchlist owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw quote record as returned by the backend, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ticker: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    /// Backend-provided label. Informational only; labels are re-derived.
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WatchlistPayload {
    #[serde(default)]
    tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuotesPayload {
    #[serde(default)]
    quotes: Vec<QuoteRecord>,
}

#[derive(Debug, Serialize)]
struct MembershipBody<'a> {
    user_id: &'a str,
    ticker: &'a str,
}

/// Membership and quote operations against the authoritative store.
pub trait WatchlistBackend: Send + Sync {
    /// Raw ticker strings; the caller re-validates them.
    fn fetch_tickers<'a>(&'a self, user: &'a UserId) -> RemoteFuture<'a, Vec<String>>;

    /// Idempotent: adding a present ticker succeeds.
    fn add_ticker<'a>(&'a self, user: &'a UserId, ticker: &'a TickerSymbol) -> RemoteFuture<'a, ()>;

    /// Idempotent: removing an absent ticker succeeds.
    fn remove_ticker<'a>(
        &'a self,
        user: &'a UserId,
        ticker: &'a TickerSymbol,
    ) -> RemoteFuture<'a, ()>;

    /// One batched call; an empty batch returns immediately without I/O.
    fn fetch_quotes<'a>(&'a self, tickers: &'a [TickerSymbol]) -> RemoteFuture<'a, Vec<QuoteRecord>>;
}

/// HTTP implementation of [`WatchlistBackend`].
#[derive(Clone)]
pub struct HttpWatchlistClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth: HttpAuth,
    timeout_ms: u64,
}

impl HttpWatchlistClient {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth: HttpAuth::None,
            timeout_ms: crate::http_client::DEFAULT_TIMEOUT_MS,
        }
    }

    /// Production client using reqwest and the configured base URL.
    pub fn from_config(config: &WatchlistConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config.api_base_url.clone())
            .with_auth(config.auth.clone())
            .with_timeout_ms(config.timeout_ms)
    }

    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        let method = request.method;
        let url = request.url.clone();
        let request = request
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(transport_error)?;

        tracing::debug!(method = method.as_str(), %url, status = response.status, "backend call finished");
        Ok(response)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, RemoteError> {
        let response = self.send(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(RemoteError::Backend {
                status: response.status,
            });
        }
        serde_json::from_str(&response.body).map_err(|e| RemoteError::decode(e.to_string()))
    }

    fn membership_body(user: &UserId, ticker: &TickerSymbol) -> Result<String, RemoteError> {
        serde_json::to_string(&MembershipBody {
            user_id: user.as_str(),
            ticker: ticker.as_str(),
        })
        .map_err(|e| RemoteError::decode(e.to_string()))
    }
}

fn transport_error(error: HttpError) -> RemoteError {
    if error.timed_out() {
        RemoteError::network(format!("timed out: {}", error.message()))
    } else {
        RemoteError::network(error.message())
    }
}

impl WatchlistBackend for HttpWatchlistClient {
    fn fetch_tickers<'a>(&'a self, user: &'a UserId) -> RemoteFuture<'a, Vec<String>> {
        Box::pin(async move {
            let url = format!(
                "{}?user_id={}",
                self.url("/watchlist"),
                urlencoding::encode(user.as_str())
            );
            let payload: WatchlistPayload = self.get_json(url).await?;
            Ok(payload.tickers)
        })
    }

    fn add_ticker<'a>(&'a self, user: &'a UserId, ticker: &'a TickerSymbol) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let body = Self::membership_body(user, ticker)?;
            let response = self
                .send(HttpRequest::post(self.url("/watchlist")).with_json_body(body))
                .await?;
            if response.is_success() {
                Ok(())
            } else {
                Err(RemoteError::Backend {
                    status: response.status,
                })
            }
        })
    }

    fn remove_ticker<'a>(
        &'a self,
        user: &'a UserId,
        ticker: &'a TickerSymbol,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let body = Self::membership_body(user, ticker)?;
            let response = self
                .send(HttpRequest::delete(self.url("/watchlist")).with_json_body(body))
                .await?;
            if response.is_success() {
                Ok(())
            } else {
                Err(RemoteError::Backend {
                    status: response.status,
                })
            }
        })
    }

    fn fetch_quotes<'a>(&'a self, tickers: &'a [TickerSymbol]) -> RemoteFuture<'a, Vec<QuoteRecord>> {
        Box::pin(async move {
            if tickers.is_empty() {
                return Ok(Vec::new());
            }

            let joined = tickers
                .iter()
                .map(TickerSymbol::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let url = format!("{}?tickers={}", self.url("/quotes"), urlencoding::encode(&joined));
            let payload: QuotesPayload = self.get_json(url).await?;
            Ok(payload.quotes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_body_matches_wire_contract() {
        let user = UserId::new("42");
        let ticker = TickerSymbol::normalize("aapl").expect("valid");
        let body = HttpWatchlistClient::membership_body(&user, &ticker).expect("encodes");
        assert_eq!(body, r#"{"user_id":"42","ticker":"AAPL"}"#);
    }

    #[test]
    fn quote_record_tolerates_missing_optional_fields() {
        let record: QuoteRecord =
            serde_json::from_str(r#"{"ticker":"AAPL","sentiment_score":0.21}"#).expect("parses");
        assert_eq!(record.price, None);
        assert_eq!(record.sentiment_score, Some(0.21));
        assert_eq!(record.error, None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpWatchlistClient::from_config(
            &WatchlistConfig::default().with_api_base_url("https://api.example.test/"),
        );
        assert_eq!(client.url("/quotes"), "https://api.example.test/quotes");
    }
}
