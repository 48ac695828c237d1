//! # Fetch Layer
//!
//! Everything between a widget and the network.
//!
//! ## Overview
//!
//! - [`Transport`] - trait for issuing one HTTP request
//! - [`HttpTransport`] - production transport on a shared `reqwest::Client`
//! - [`MockTransport`] - scripted transport for tests and demos
//! - [`FetchCache`] - response cache + request coalescer; the only entry
//!   point widgets use (`fetch_shared`)
//!
//! ## Cache keys
//!
//! A plain GET is keyed by its URL verbatim (`http://a` and `http://a/` are
//! different keys). Requests with a non-default method, headers or body get
//! the options appended to the key, so they never share a cache slot with
//! the plain GET of the same URL.

mod cache;
mod http;
mod mock;

pub use cache::{CacheStats, FetchCache, PROVIDER_LIMIT_MARKERS};
pub use http::HttpTransport;
pub use mock::{MockCall, MockResponse, MockTransport};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

// ============================================================================
// REQUEST OPTIONS
// ============================================================================

/// Optional request parameters (method, headers, body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default = "default_method")]
    pub method: String,
    /// Sorted so the cache key is stable
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: default_method(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

impl FetchOptions {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// GET without headers or body
    pub fn is_plain_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET") && self.headers.is_empty() && self.body.is_none()
    }

    /// Dedup/cache key for a request to `url` with these options
    pub fn cache_key(&self, url: &str) -> String {
        if self.is_plain_get() {
            return url.to_string();
        }
        let mut key = format!("{url}\u{1f}{}", self.method.to_ascii_uppercase());
        for (name, value) in &self.headers {
            key.push('\u{1f}');
            key.push_str(&name.to_ascii_lowercase());
            key.push(':');
            key.push_str(value);
        }
        if let Some(body) = &self.body {
            key.push('\u{1e}');
            key.push_str(body);
        }
        key
    }
}

// ============================================================================
// TRANSPORT TRAIT (ASYNC)
// ============================================================================

/// Raw answer from a transport: status code + body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issue one HTTP request.
///
/// Transports only report transport-level failures (as
/// [`FetchError::Network`]); status checks and JSON decoding belong to the
/// cache. Timeouts and retries are transport configuration.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the transport name (e.g., "http", "mock")
    fn name(&self) -> &str;

    async fn send(&self, url: &str, options: &FetchOptions)
        -> Result<TransportResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_get_is_keyed_by_url_verbatim() {
        let opts = FetchOptions::default();
        assert_eq!(opts.cache_key("http://a"), "http://a");
        assert_ne!(opts.cache_key("http://a"), opts.cache_key("http://a/"));
    }

    #[test]
    fn lowercase_get_is_still_plain() {
        let opts = FetchOptions::default().with_method("get");
        assert!(opts.is_plain_get());
        assert_eq!(opts.cache_key("http://a"), "http://a");
    }

    #[test]
    fn options_change_the_key() {
        let plain = FetchOptions::default().cache_key("http://a");
        let post = FetchOptions::default()
            .with_method("POST")
            .with_body("{}")
            .cache_key("http://a");
        let with_header = FetchOptions::default()
            .with_header("X-Api-Key", "k1")
            .cache_key("http://a");
        let other_header = FetchOptions::default()
            .with_header("X-Api-Key", "k2")
            .cache_key("http://a");

        assert_ne!(plain, post);
        assert_ne!(plain, with_header);
        assert_ne!(with_header, other_header);
        assert!(post.starts_with("http://a"));
    }

    #[test]
    fn header_name_case_does_not_change_key() {
        let a = FetchOptions::default().with_header("Accept", "json");
        let b = FetchOptions::default().with_header("accept", "json");
        assert_eq!(a.cache_key("u"), b.cache_key("u"));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: FetchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, FetchOptions::default());
    }

    #[test]
    fn success_range() {
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }
}
