//! Response cache + single-flight request coalescer
//!
//! `fetch_shared` guarantees:
//! - at most one network request in flight per cache key
//! - a successful payload younger than the freshness window is served
//!   without touching the network
//! - every caller gets its own copy of the payload
//! - failures never evict or replace a cached snapshot
//!
//! The request itself runs on a spawned task, so a caller that stops
//! waiting does not cancel it for the others.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{FetchOptions, Transport, TransportResponse};
use crate::config::FinboardConfig;
use crate::error::{FetchError, FinboardError};
use crate::event_log::{EventKind, EventLog};
use crate::fetch::HttpTransport;
use crate::util::constants::FRESHNESS_WINDOW;

/// Top-level members a provider uses to report "no data" with HTTP 200,
/// checked in this order.
pub const PROVIDER_LIMIT_MARKERS: [&str; 3] = ["Note", "Information", "Error Message"];

type Settled = Result<Value, FetchError>;
type PendingFetch = Shared<BoxFuture<'static, Settled>>;

/// Last successful payload for a key
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Value,
    captured_at: Instant,
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
}

struct CacheInner {
    transport: Arc<dyn Transport>,
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, PendingFetch>,
    freshness_window: Duration,
    event_log: EventLog,
}

/// What a caller does after the decision step
enum Plan {
    Fresh(Value),
    Join(PendingFetch),
    Issue {
        pending: PendingFetch,
        settle: oneshot::Sender<Settled>,
    },
}

/// Shared response cache. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct FetchCache {
    inner: Arc<CacheInner>,
}

impl FetchCache {
    /// Cache with the default freshness window and a private event log
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_settings(transport, FRESHNESS_WINDOW, EventLog::new())
    }

    pub fn with_settings(
        transport: Arc<dyn Transport>,
        freshness_window: Duration,
        event_log: EventLog,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                transport,
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                freshness_window,
                event_log,
            }),
        }
    }

    /// Production cache: HTTP transport + configured freshness window
    pub fn from_config(config: &FinboardConfig, event_log: EventLog) -> Result<Self, FinboardError> {
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::with_settings(
            Arc::new(transport),
            config.freshness_window(),
            event_log,
        ))
    }

    pub fn freshness_window(&self) -> Duration {
        self.inner.freshness_window
    }

    pub fn event_log(&self) -> &EventLog {
        &self.inner.event_log
    }

    pub fn transport_name(&self) -> &str {
        self.inner.transport.name()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entries.len(),
            in_flight: self.inner.in_flight.len(),
        }
    }

    /// Drop all cached snapshots. Requests in flight are unaffected.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Plain GET through the cache
    pub async fn get(&self, url: &str) -> Result<Value, FetchError> {
        self.fetch_shared(url, &FetchOptions::default()).await
    }

    /// Return the JSON payload for `url`, coalescing concurrent callers and
    /// serving fresh snapshots from memory.
    #[instrument(name = "fetch_shared", skip_all, fields(url = %url))]
    pub async fn fetch_shared(&self, url: &str, options: &FetchOptions) -> Result<Value, FetchError> {
        let key: Arc<str> = Arc::from(options.cache_key(url));
        self.inner
            .event_log
            .emit(EventKind::FetchRequested { key: Arc::clone(&key) });

        match self.plan(&key, url) {
            Plan::Fresh(snapshot) => Ok(snapshot),
            Plan::Join(pending) => pending.await,
            Plan::Issue { pending, settle } => {
                self.spawn_request(key, url.to_string(), options.clone(), settle);
                pending.await
            }
        }
    }

    /// Decide under the in-flight entry lock: join, serve fresh, or register
    /// a new request. Nothing in here awaits.
    fn plan(&self, key: &Arc<str>, url: &str) -> Plan {
        match self.inner.in_flight.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                debug!("joining request in flight");
                self.inner
                    .event_log
                    .emit(EventKind::Coalesced { key: Arc::clone(key) });
                Plan::Join(occupied.get().clone())
            }
            Entry::Vacant(vacant) => {
                if let Some((snapshot, age)) = self.inner.fresh_snapshot(key) {
                    debug!(age_ms = age.as_millis() as u64, "cache hit");
                    self.inner.event_log.emit(EventKind::CacheHit {
                        key: Arc::clone(key),
                        age_ms: age.as_millis() as u64,
                    });
                    return Plan::Fresh(snapshot);
                }

                let (settle, settled) = oneshot::channel::<Settled>();
                let url = url.to_string();
                let pending = settled
                    .map(move |received| {
                        received.unwrap_or_else(|_| Err(FetchError::Abandoned { url }))
                    })
                    .boxed()
                    .shared();
                vacant.insert(pending.clone());
                Plan::Issue { pending, settle }
            }
        }
    }

    fn spawn_request(
        &self,
        key: Arc<str>,
        url: String,
        options: FetchOptions,
        settle: oneshot::Sender<Settled>,
    ) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let guard = InFlightGuard {
                inner: Arc::clone(&inner),
                key: Arc::clone(&key),
            };
            let result = inner.execute(&key, &url, &options).await;
            // In-flight entry goes before anyone is woken
            drop(guard);
            let _ = settle.send(result);
        });
    }
}

impl CacheInner {
    fn fresh_snapshot(&self, key: &str) -> Option<(Value, Duration)> {
        let entry = self.entries.get(key)?;
        let age = entry.captured_at.elapsed();
        (age < self.freshness_window).then(|| (entry.snapshot.clone(), age))
    }

    #[instrument(name = "request", skip_all, fields(key = %key))]
    async fn execute(&self, key: &Arc<str>, url: &str, options: &FetchOptions) -> Settled {
        let started = Instant::now();
        let method = options.method.to_ascii_uppercase();
        info!(%method, transport = self.transport.name(), "issuing request");
        self.event_log.emit(EventKind::NetworkCall {
            key: Arc::clone(key),
            url: url.to_string(),
            method,
        });

        let outcome = self
            .transport
            .send(url, options)
            .await
            .and_then(|response| decode(url, response));
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        snapshot: payload.clone(),
                        captured_at: Instant::now(),
                    },
                );
                debug!(duration_ms, "cached snapshot");
                self.event_log.emit(EventKind::FetchSucceeded {
                    key: Arc::clone(key),
                    duration_ms,
                });
                Ok(payload)
            }
            Err(err) => {
                warn!(error = %err, duration_ms, "request failed, cache left untouched");
                self.event_log.emit(EventKind::FetchFailed {
                    key: Arc::clone(key),
                    error: err.to_string(),
                    duration_ms,
                });
                Err(err)
            }
        }
    }
}

/// Removes the in-flight entry even if the request task panics
struct InFlightGuard {
    inner: Arc<CacheInner>,
    key: Arc<str>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(self.key.as_ref());
    }
}

/// Status check, JSON decode, provider-limit check
fn decode(url: &str, response: TransportResponse) -> Settled {
    if !response.is_success() {
        return Err(FetchError::Network {
            url: url.to_string(),
            status: Some(response.status),
            reason: format!("HTTP {}", response.status),
        });
    }

    let payload: Value = serde_json::from_str(&response.body).map_err(|e| FetchError::Parse {
        url: url.to_string(),
        details: e.to_string(),
    })?;

    if let Some((marker, message)) = provider_limit(&payload) {
        return Err(FetchError::ProviderLimit {
            url: url.to_string(),
            marker: marker.to_string(),
            message,
        });
    }

    Ok(payload)
}

/// First truthy limit marker at the top level, with its message
fn provider_limit(payload: &Value) -> Option<(&'static str, String)> {
    let object = payload.as_object()?;
    PROVIDER_LIMIT_MARKERS.iter().find_map(|&marker| {
        let value = object.get(marker).filter(|v| is_truthy(v))?;
        let message = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some((marker, message))
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
