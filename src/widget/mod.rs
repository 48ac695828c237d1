//! # Widgets
//!
//! Rendering-free views over a payload plus the polling loop that keeps a
//! widget's payload current.
//!
//! - [`render`] - payload + config -> [`WidgetView`]
//! - [`TableView`] / [`TablePage`] - rows, search, pagination
//! - [`ChartView`] - labels + numeric series
//! - [`WidgetPoller`] / [`PollHandle`] - interval refresh through the shared cache

mod chart;
mod poller;
mod table;

pub use chart::{ChartSeries, ChartView};
pub use poller::{PollHandle, WidgetPoller, WidgetState};
pub use table::{TablePage, TableRow, TableView};

use serde::Serialize;
use serde_json::Value;

use crate::format::{format_value, PLACEHOLDER};
use crate::path::resolve_path;
use crate::store::{WidgetConfig, WidgetKind};

pub const NO_FIELDS_MESSAGE: &str = "No fields selected";

/// One `label: value` line on a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub lines: Vec<CardLine>,
}

impl CardView {
    pub fn build(widget: &WidgetConfig, data: Option<&Value>) -> Self {
        let lines = widget
            .effective_card_fields()
            .iter()
            .map(|field| {
                let value = match data {
                    Some(root) => format_value(resolve_path(root, &field.path), widget.data_format),
                    None => PLACEHOLDER.to_string(),
                };
                CardLine {
                    label: field.display_label().to_string(),
                    value,
                }
            })
            .collect();
        Self { lines }
    }

    /// Empty-state text, if any
    pub fn message(&self) -> Option<&'static str> {
        self.lines.is_empty().then_some(NO_FIELDS_MESSAGE)
    }
}

/// What a widget shows for a payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WidgetView {
    Card(CardView),
    Table(TableView),
    Chart(ChartView),
}

/// Shape `data` for `widget`. `None` data renders empty views.
pub fn render(widget: &WidgetConfig, data: Option<&Value>) -> WidgetView {
    match widget.kind {
        WidgetKind::Card => WidgetView::Card(CardView::build(widget, data)),
        WidgetKind::Table => WidgetView::Table(match data {
            Some(root) => TableView::build(
                root,
                &widget.list_path(),
                &widget.columns,
                widget.data_format,
            ),
            None => TableView::empty(&widget.columns),
        }),
        WidgetKind::Chart => WidgetView::Chart(match data {
            Some(root) => ChartView::build(root, &widget.list_path(), &widget.columns),
            None => ChartView::default(),
        }),
    }
}
