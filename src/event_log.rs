//! Event log for fetch and polling activity (v0.1)
//!
//! Bounded audit trail of what the cache and pollers decided.
//! - Event: envelope with id + timestamp + kind
//! - EventKind: fetch-level and poll-level variants
//! - EventLog: thread-safe, cheaply clonable handle; oldest events drop first

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::constants::MAX_EVENTS;

/// Single entry in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since the log was created (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All possible event types (2 levels)
///
/// Uses Arc<str> for key/id fields to enable zero-cost cloning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // FETCH LEVEL (keyed by cache key)
    // ═══════════════════════════════════════════
    FetchRequested {
        key: Arc<str>,
    },
    /// Served from a snapshot younger than the freshness window
    CacheHit {
        key: Arc<str>,
        age_ms: u64,
    },
    /// Joined a request already in flight
    Coalesced {
        key: Arc<str>,
    },
    NetworkCall {
        key: Arc<str>,
        url: String,
        method: String,
    },
    FetchSucceeded {
        key: Arc<str>,
        duration_ms: u64,
    },
    FetchFailed {
        key: Arc<str>,
        error: String,
        duration_ms: u64,
    },

    // ═══════════════════════════════════════════
    // POLL LEVEL (keyed by widget id)
    // ═══════════════════════════════════════════
    PollStarted {
        widget_id: Arc<str>,
        interval_ms: u64,
        seeded: bool,
    },
    PollTick {
        widget_id: Arc<str>,
        ok: bool,
    },
    PollStopped {
        widget_id: Arc<str>,
    },
}

impl EventKind {
    /// Extract the cache key if the event is fetch-related
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::FetchRequested { key }
            | Self::CacheHit { key, .. }
            | Self::Coalesced { key }
            | Self::NetworkCall { key, .. }
            | Self::FetchSucceeded { key, .. }
            | Self::FetchFailed { key, .. } => Some(key),
            Self::PollStarted { .. } | Self::PollTick { .. } | Self::PollStopped { .. } => None,
        }
    }

    /// Extract the widget id if the event is poll-related
    pub fn widget_id(&self) -> Option<&str> {
        match self {
            Self::PollStarted { widget_id, .. }
            | Self::PollTick { widget_id, .. }
            | Self::PollStopped { widget_id } => Some(widget_id),
            _ => None,
        }
    }

    pub fn is_network_call(&self) -> bool {
        matches!(self, Self::NetworkCall { .. })
    }
}

/// Thread-safe ring of the most recent events
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Event>>>,
    capacity: usize,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_EVENTS)
    }

    /// Log keeping at most `capacity` events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        let mut events = self.events.write();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
        id
    }

    /// Get retained events, oldest first (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().iter().cloned().collect()
    }

    /// Events for one cache key
    pub fn filter_key(&self, key: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.key() == Some(key))
            .collect()
    }

    /// Events for one widget's poller
    pub fn filter_widget(&self, widget_id: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.widget_id() == Some(widget_id))
            .collect()
    }

    /// Number of network requests actually issued for a key
    pub fn network_calls(&self, key: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind.is_network_call() && e.kind.key() == Some(key))
            .count()
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}
