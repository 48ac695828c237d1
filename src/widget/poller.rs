//! Interval polling for one widget
//!
//! Each widget gets a timer task that calls `fetch_shared` for its endpoint
//! and publishes the result on a watch channel. All pollers go through the
//! same `FetchCache`, so widgets sharing an endpoint share requests.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::event_log::{EventKind, EventLog};
use crate::fetch::FetchCache;
use crate::store::WidgetConfig;
use crate::util::constants::POLL_INTERVAL;

/// What a widget currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetState {
    /// Last good payload (kept across failures)
    pub data: Option<Value>,
    pub loading: bool,
    /// Error from the most recent attempt, cleared on success
    pub error: Option<FetchError>,
    pub last_success: Option<SystemTime>,
}

/// Spawns pollers that share one cache
#[derive(Clone)]
pub struct WidgetPoller {
    cache: FetchCache,
    interval: Duration,
}

impl WidgetPoller {
    pub fn new(cache: FetchCache) -> Self {
        Self::with_interval(cache, POLL_INTERVAL)
    }

    pub fn with_interval(cache: FetchCache, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Start polling `widget.api_endpoint`.
    ///
    /// A widget with `cachedData` shows it immediately and waits one interval
    /// before its first request; otherwise the first request goes out at once.
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, widget: &WidgetConfig) -> PollHandle {
        let widget_id: Arc<str> = Arc::from(widget.id.as_str());
        let seeded = widget.cached_data.is_some();
        let initial = WidgetState {
            data: widget.cached_data.clone(),
            loading: !seeded,
            ..Default::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let refresh = Arc::new(Notify::new());

        let event_log = self.cache.event_log().clone();
        event_log.emit(EventKind::PollStarted {
            widget_id: Arc::clone(&widget_id),
            interval_ms: self.interval.as_millis() as u64,
            seeded,
        });

        let worker = PollWorker {
            cache: self.cache.clone(),
            url: widget.api_endpoint.clone(),
            widget_id: Arc::clone(&widget_id),
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(self.interval, seeded, Arc::clone(&refresh)));

        PollHandle {
            widget_id,
            state: state_rx,
            refresh,
            task,
            event_log,
        }
    }
}

struct PollWorker {
    cache: FetchCache,
    url: String,
    widget_id: Arc<str>,
    state: watch::Sender<WidgetState>,
}

impl PollWorker {
    async fn run(self, period: Duration, seeded: bool, refresh: Arc<Notify>) {
        let start = if seeded {
            Instant::now() + period
        } else {
            Instant::now()
        };
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = refresh.notified() => debug!(widget_id = %self.widget_id, "manual refresh"),
            }
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        self.state.send_modify(|s| s.loading = true);

        let result = self.cache.get(&self.url).await;
        let ok = result.is_ok();

        self.state.send_modify(|s| {
            s.loading = false;
            match result {
                Ok(payload) => {
                    s.data = Some(payload);
                    s.error = None;
                    s.last_success = Some(SystemTime::now());
                }
                Err(err) => {
                    warn!(widget_id = %self.widget_id, error = %err, "poll failed, keeping last data");
                    s.error = Some(err);
                }
            }
        });

        self.cache.event_log().emit(EventKind::PollTick {
            widget_id: Arc::clone(&self.widget_id),
            ok,
        });
    }
}

/// Owner of a running poller. Dropping it stops the timer; a request
/// already issued still completes into the shared cache.
pub struct PollHandle {
    widget_id: Arc<str>,
    state: watch::Receiver<WidgetState>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
    event_log: EventLog,
}

impl PollHandle {
    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> WidgetState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every future state change
    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.state.clone()
    }

    /// Poll now (retry), without waiting for the next tick
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.event_log.emit(EventKind::PollStopped {
            widget_id: Arc::clone(&self.widget_id),
        });
    }
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("widget_id", &self.widget_id)
            .field("running", &self.is_running())
            .finish()
    }
}
