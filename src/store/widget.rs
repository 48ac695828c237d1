//! Widget records as persisted in `finboard-storage.json`
//!
//! Field names are camelCase on disk and paths use the `-->` wire format,
//! so files written by earlier dashboards load unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{FinboardError, Result};
use crate::format::DataFormat;
use crate::path::Path;

/// How a widget presents its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    #[default]
    Card,
    Table,
    Chart,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Card => "card",
            Self::Table => "table",
            Self::Chart => "chart",
        })
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "table" => Ok(Self::Table),
            "chart" => Ok(Self::Chart),
            other => Err(format!("unknown widget type '{other}' (card, table, chart)")),
        }
    }
}

/// One labelled value on a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
    pub path: Path,
    #[serde(default)]
    pub label: String,
}

impl CardField {
    pub fn new(path: impl Into<Path>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }

    /// Label, falling back to the last path segment
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.path.last().unwrap_or("Value")
        } else {
            &self.label
        }
    }
}

/// A configured widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub id: String,
    pub title: String,
    pub api_endpoint: String,
    #[serde(rename = "type", default)]
    pub kind: WidgetKind,
    /// Location of the list (tables, charts) or of the single value (legacy cards)
    #[serde(default)]
    pub data_key: Option<Path>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub card_fields: Vec<CardField>,
    #[serde(default)]
    pub data_format: DataFormat,
    /// Payload captured when the widget was created; first render only
    #[serde(default)]
    pub cached_data: Option<Value>,
    /// Legacy single-value card label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WidgetConfig {
    /// Card fields, including the legacy `dataKey` + `label` form
    pub fn effective_card_fields(&self) -> Vec<CardField> {
        if !self.card_fields.is_empty() {
            return self.card_fields.clone();
        }
        match &self.data_key {
            Some(path) if self.kind == WidgetKind::Card => vec![CardField::new(
                path.clone(),
                self.label.clone().unwrap_or_else(|| "Value".to_string()),
            )],
            _ => Vec::new(),
        }
    }

    /// List location for tables and charts (the document root when unset)
    pub fn list_path(&self) -> Path {
        self.data_key.clone().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(FinboardError::InvalidWidget {
                reason: "id must not be empty".into(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(FinboardError::InvalidWidget {
                reason: format!("widget '{}' has an empty title", self.id),
            });
        }
        validate_endpoint(&self.api_endpoint)?;
        Ok(())
    }
}

/// Everything needed to create or edit a widget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetDraft {
    pub title: String,
    pub api_endpoint: String,
    pub kind: WidgetKind,
    pub data_key: Option<Path>,
    pub columns: Vec<String>,
    pub card_fields: Vec<CardField>,
    pub data_format: DataFormat,
    /// Preview payload; becomes `cachedData`
    pub initial_data: Option<Value>,
}

impl WidgetDraft {
    pub fn new(title: impl Into<String>, api_endpoint: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            api_endpoint: api_endpoint.into(),
            ..Default::default()
        }
    }

    pub fn into_config(self, id: String) -> WidgetConfig {
        WidgetConfig {
            id,
            title: self.title,
            api_endpoint: self.api_endpoint,
            kind: self.kind,
            data_key: self.data_key,
            columns: self.columns,
            card_fields: self.card_fields,
            data_format: self.data_format,
            cached_data: self.initial_data,
            label: None,
        }
    }
}

impl From<&WidgetConfig> for WidgetDraft {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            title: config.title.clone(),
            api_endpoint: config.api_endpoint.clone(),
            kind: config.kind,
            data_key: config.data_key.clone(),
            columns: config.columns.clone(),
            card_fields: config.effective_card_fields(),
            data_format: config.data_format,
            initial_data: config.cached_data.clone(),
        }
    }
}

/// Absolute http(s) URL
pub fn validate_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| FinboardError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FinboardError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
