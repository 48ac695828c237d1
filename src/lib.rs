//! Finboard - personal API dashboard core
//!
//! Shared response cache with request coalescing, path resolution over
//! arbitrary JSON, and the widget views built on top of them.

pub mod config;
pub mod error;
pub mod event_log;
pub mod fetch;
pub mod format;
pub mod path;
pub mod store;
pub mod util;
pub mod widget;

pub use config::FinboardConfig;
pub use error::{FetchError, FinboardError, FixSuggestion};
pub use event_log::{Event, EventKind, EventLog};
pub use fetch::{FetchCache, FetchOptions, HttpTransport, MockTransport, Transport};
pub use format::{format_value, DataFormat};
pub use path::{
    discover_lists, enumerate_list_candidates, flatten, infer_columns, materialize_rows,
    resolve_path, DisplayKind, Path,
};
pub use store::{CardField, WidgetConfig, WidgetDraft, WidgetKind, WidgetStore};
pub use widget::{render, PollHandle, WidgetPoller, WidgetState, WidgetView};
