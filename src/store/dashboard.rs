//! WidgetStore - ordered widget list persisted as a JSON array
//!
//! Every mutation is saved immediately (temp file + rename). The on-disk
//! shape is the same array `export` writes and `import` reads.

use std::collections::HashSet;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::widget::{WidgetConfig, WidgetDraft};
use crate::error::{FinboardError, Result};

/// Structural schema for imported widget arrays, compiled once
static IMPORT_SCHEMA: Lazy<std::result::Result<JSONSchema, String>> = Lazy::new(|| {
    let schema = json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["id", "title", "apiEndpoint"],
            "properties": {
                "id": { "type": "string", "minLength": 1 },
                "title": { "type": "string" },
                "apiEndpoint": { "type": "string" },
                "type": { "enum": ["card", "table", "chart"] },
                "dataKey": { "type": ["string", "null"] },
                "columns": { "type": "array", "items": { "type": "string" } },
                "cardFields": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["path"],
                        "properties": {
                            "path": { "type": "string" },
                            "label": { "type": "string" }
                        }
                    }
                },
                "dataFormat": { "enum": ["raw", "currency", "percentage", "number"] },
                "label": { "type": "string" }
            }
        }
    });
    JSONSchema::compile(&schema).map_err(|e| e.to_string())
});

/// Persistent, ordered widget configuration
#[derive(Debug)]
pub struct WidgetStore {
    path: PathBuf,
    widgets: Vec<WidgetConfig>,
}

impl WidgetStore {
    /// Load the store at `path` (missing file = empty store)
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let widgets = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = widgets.len(), "widget store opened");
        Ok(Self { path, widgets })
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn widgets(&self) -> &[WidgetConfig] {
        &self.widgets
    }

    pub fn get(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Append a widget, returning its new id
    pub fn add(&mut self, draft: WidgetDraft) -> Result<String> {
        let widget = draft.into_config(self.next_id());
        widget.validate()?;
        let id = widget.id.clone();
        let mut next = self.widgets.clone();
        next.push(widget);
        self.commit(next)?;
        info!(%id, "widget added");
        Ok(id)
    }

    /// Replace a widget's settings, keeping its id and position.
    /// `cachedData` is kept unless the draft carries new data.
    pub fn update(&mut self, id: &str, draft: WidgetDraft) -> Result<()> {
        let index = self.index_of(id)?;
        let previous = self.widgets[index].cached_data.clone();
        let mut widget = draft.into_config(id.to_string());
        if widget.cached_data.is_none() {
            widget.cached_data = previous;
        }
        widget.validate()?;
        let mut next = self.widgets.clone();
        next[index] = widget;
        self.commit(next)?;
        info!(%id, "widget updated");
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<WidgetConfig> {
        let index = self.index_of(id)?;
        let mut next = self.widgets.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(%id, "widget removed");
        Ok(removed)
    }

    /// Move `active_id` to the position currently held by `over_id`
    pub fn reorder(&mut self, active_id: &str, over_id: &str) -> Result<()> {
        let from = self.index_of(active_id)?;
        let to = self.index_of(over_id)?;
        if from == to {
            return Ok(());
        }
        let mut next = self.widgets.clone();
        let widget = next.remove(from);
        next.insert(to, widget);
        self.commit(next)?;
        debug!(active_id, over_id, from, to, "widgets reordered");
        Ok(())
    }

    /// Write the widget list as a pretty JSON array
    pub fn export(&self, path: &FsPath) -> Result<usize> {
        write_atomic(path, &serde_json::to_string_pretty(&self.widgets)?)?;
        info!(path = %path.display(), count = self.widgets.len(), "widgets exported");
        Ok(self.widgets.len())
    }

    /// Replace the widget list with the array in `path`.
    ///
    /// All-or-nothing: any structural or semantic problem rejects the whole
    /// file and leaves the store untouched.
    pub fn import(&mut self, path: &FsPath) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let widgets = parse_import(&content)?;
        let count = widgets.len();
        self.commit(widgets)?;
        info!(path = %path.display(), count, "widgets imported");
        Ok(count)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.widgets
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| FinboardError::WidgetNotFound { id: id.to_string() })
    }

    /// Millisecond timestamp, bumped until unused
    fn next_id(&self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        loop {
            let candidate = millis.to_string();
            if self.get(&candidate).is_none() {
                return candidate;
            }
            millis += 1;
        }
    }

    /// Persist `next`, then adopt it; a failed write keeps the current list
    fn commit(&mut self, next: Vec<WidgetConfig>) -> Result<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(&next)?)?;
        self.widgets = next;
        Ok(())
    }
}

fn reject(reason: impl Into<String>) -> FinboardError {
    FinboardError::ImportRejected {
        reason: reason.into(),
    }
}

/// Parse + validate an exported widget array
pub fn parse_import(content: &str) -> Result<Vec<WidgetConfig>> {
    let document: Value =
        serde_json::from_str(content).map_err(|e| reject(format!("not valid JSON: {e}")))?;

    let schema = IMPORT_SCHEMA
        .as_ref()
        .map_err(|e| reject(format!("import schema failed to compile: {e}")))?;
    if let Err(errors) = schema.validate(&document) {
        let details: Vec<String> = errors
            .map(|e| {
                let at = e.instance_path.to_string();
                if at.is_empty() {
                    e.to_string()
                } else {
                    format!("{at}: {e}")
                }
            })
            .collect();
        return Err(reject(details.join("; ")));
    }

    let widgets: Vec<WidgetConfig> =
        serde_json::from_value(document).map_err(|e| reject(e.to_string()))?;

    let mut seen = HashSet::new();
    for (index, widget) in widgets.iter().enumerate() {
        widget
            .validate()
            .map_err(|e| reject(format!("widget #{index}: {e}")))?;
        if !seen.insert(widget.id.as_str()) {
            return Err(reject(format!("duplicate widget id '{}'", widget.id)));
        }
    }
    Ok(widgets)
}

fn write_atomic(path: &FsPath, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
