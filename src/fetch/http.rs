//! HTTP transport on a shared reqwest client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::{FetchOptions, Transport, TransportResponse};
use crate::config::HttpConfig;
use crate::error::{FetchError, FinboardError};
use crate::util::constants::REDIRECT_LIMIT;

/// Production transport (connection pooling via one `reqwest::Client`)
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, FinboardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FinboardError::HttpClient {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<TransportResponse, FetchError> {
        let network = |reason: String| FetchError::Network {
            url: url.to_string(),
            status: None,
            reason,
        };

        let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| network(format!("invalid HTTP method '{}'", options.method)))?;

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| network(format!("HTTP request failed: {e}")))?;
        let status = response.status().as_u16();
        debug!(status, "response received");

        let body = response
            .text()
            .await
            .map_err(|e| network(format!("Failed to read response: {e}")))?;

        Ok(TransportResponse { status, body })
    }
}
