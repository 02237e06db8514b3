//! Manual triggers for the backend's scheduled jobs.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`PipelineTrigger::send_test_notification`] | `POST /notify` `{ message }` |
//! | [`PipelineTrigger::pull_market_data`] | `GET /pulldown` |
//!
//! Both jobs answer with JSON whose shape the backend owns, so the payload is
//! handed back untyped.

use serde::Serialize;
use serde_json::Value;

use crate::http_client::HttpRequest;
use crate::remote::{HttpWatchlistClient, RemoteFuture};
use crate::RemoteError;

pub const DEFAULT_NOTIFY_MESSAGE: &str = "Hello from tickerwatch!";

#[derive(Debug, Serialize)]
struct NotifyBody<'a> {
    message: &'a str,
}

pub trait PipelineTrigger: Send + Sync {
    /// Ask the backend to email every subscriber a test notification.
    fn send_test_notification<'a>(&'a self, message: &'a str) -> RemoteFuture<'a, Value>;

    /// Run the price and news pull-down job now instead of on schedule.
    fn pull_market_data(&self) -> RemoteFuture<'_, Value>;
}

impl PipelineTrigger for HttpWatchlistClient {
    fn send_test_notification<'a>(&'a self, message: &'a str) -> RemoteFuture<'a, Value> {
        Box::pin(async move {
            let body = serde_json::to_string(&NotifyBody { message })
                .map_err(|e| RemoteError::decode(e.to_string()))?;
            let response = self
                .send(HttpRequest::post(self.url("/notify")).with_json_body(body))
                .await?;
            job_payload(response.status, &response.body)
        })
    }

    fn pull_market_data(&self) -> RemoteFuture<'_, Value> {
        Box::pin(async move {
            let response = self.send(HttpRequest::get(self.url("/pulldown"))).await?;
            job_payload(response.status, &response.body)
        })
    }
}

/// An empty success body is `null`; anything else must be JSON.
fn job_payload(status: u16, body: &str) -> Result<Value, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::Backend { status });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| RemoteError::decode(e.to_string()))
}
