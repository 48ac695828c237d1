//! Store Module - widget configuration (v0.1)
//!
//! Ordered list of configured widgets, persisted as a JSON array.
//!
//! Key types:
//! - `WidgetStore`: load/save, add/update/remove/reorder, export/import
//! - `WidgetConfig`: one persisted widget (camelCase on disk)
//! - `WidgetDraft`: input for add/update

mod dashboard;
mod widget;

// Re-export all public types
pub use dashboard::{parse_import, WidgetStore};
pub use widget::{validate_endpoint, CardField, WidgetConfig, WidgetDraft, WidgetKind};
