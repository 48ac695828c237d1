//! Mock transport for testing
//!
//! Returns scripted responses without touching the network and records
//! every request so tests can count calls per URL.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{FetchOptions, Transport, TransportResponse};
use crate::error::FetchError;

/// One scripted reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: Result<TransportResponse, String>,
    delay: Duration,
}

impl MockResponse {
    /// 200 with a JSON body
    pub fn json(value: Value) -> Self {
        Self::status(200, value.to_string())
    }

    /// Arbitrary status and raw body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(TransportResponse::new(status, body)),
            delay: Duration::ZERO,
        }
    }

    /// Transport-level failure (connection refused, timeout...)
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
            delay: Duration::ZERO,
        }
    }

    /// Simulated latency before the reply is delivered
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub url: String,
    pub options: FetchOptions,
}

/// Transport that answers from per-URL queues, then per-URL defaults
#[derive(Default)]
pub struct MockTransport {
    /// One-shot replies, consumed FIFO
    queued: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    /// Reply used when the queue for a URL is empty
    defaults: Mutex<HashMap<String, MockResponse>>,
    /// Track all requests made (for assertions)
    calls: Mutex<Vec<MockCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `url` with `response` (unless something is queued)
    pub fn respond(&self, url: impl Into<String>, response: MockResponse) -> &Self {
        self.defaults.lock().insert(url.into(), response);
        self
    }

    /// Answer the next request to `url` with `response`
    pub fn queue(&self, url: impl Into<String>, response: MockResponse) -> &Self {
        self.queued
            .lock()
            .entry(url.into())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.url == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn next_response(&self, url: &str) -> MockResponse {
        if let Some(response) = self.queued.lock().get_mut(url).and_then(VecDeque::pop_front) {
            return response;
        }
        self.defaults
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| MockResponse::status(404, format!("no mock for {url}")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<TransportResponse, FetchError> {
        // Recorded before the simulated latency so concurrent callers are visible
        self.calls.lock().push(MockCall {
            url: url.to_string(),
            options: options.clone(),
        });
        let response = self.next_response(url);

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        response.outcome.map_err(|reason| FetchError::Network {
            url: url.to_string(),
            status: None,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn queued_then_default() {
        let mock = MockTransport::new();
        mock.respond("u", MockResponse::json(json!({"n": 0})))
            .queue("u", MockResponse::json(json!({"n": 1})));

        let opts = FetchOptions::default();
        let first = mock.send("u", &opts).await.unwrap();
        let second = mock.send("u", &opts).await.unwrap();

        assert_eq!(first.body, r#"{"n":1}"#);
        assert_eq!(second.body, r#"{"n":0}"#);
        assert_eq!(mock.call_count("u"), 2);
    }

    #[tokio::test]
    async fn unknown_url_is_404() {
        let mock = MockTransport::new();
        let resp = mock.send("nope", &FetchOptions::default()).await.unwrap();
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn failure_is_network_error() {
        let mock = MockTransport::new();
        mock.respond("u", MockResponse::failure("connection refused"));
        let err = mock.send("u", &FetchOptions::default()).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Network {
                url: "u".into(),
                status: None,
                reason: "connection refused".into(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_uses_tokio_time() {
        let mock = MockTransport::new();
        mock.respond(
            "u",
            MockResponse::json(json!(1)).with_delay(Duration::from_secs(5)),
        );
        let started = tokio::time::Instant::now();
        mock.send("u", &FetchOptions::default()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn records_options() {
        let mock = MockTransport::new();
        let opts = FetchOptions::default().with_header("X-Key", "1");
        let _ = mock.send("u", &opts).await;
        mock.clear_calls();
        assert_eq!(mock.total_calls(), 0);

        let _ = mock.send("u", &opts).await;
        assert_eq!(mock.calls()[0].options, opts);
    }
}
