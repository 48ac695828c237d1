//! Chart view: the first rows of a list, oldest first, as numeric series

use serde::Serialize;
use serde_json::Value;

use crate::format::coerce_number;
use crate::path::{is_numeric, materialize_rows, Path};
use crate::util::constants::CHART_POINT_LIMIT;

pub const NO_CHART_DATA_MESSAGE: &str = "No graph data available.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// `None` marks a gap (missing or non-numeric cell)
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartView {
    /// X axis labels
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartView {
    pub fn build(root: &Value, path: &Path, columns: &[String]) -> Self {
        // Providers list time series newest first
        let mut rows = materialize_rows(root, path, CHART_POINT_LIMIT);
        rows.reverse();

        let labels = rows
            .iter()
            .map(|row| row.key_name.clone().unwrap_or_else(|| row.index.to_string()))
            .collect();

        let series = columns
            .iter()
            .map(|col| ChartSeries {
                name: col.clone(),
                points: rows
                    .iter()
                    .map(|row| row.field(col).filter(|v| is_numeric(v)).and_then(coerce_number))
                    .collect(),
            })
            .collect();

        Self { labels, series }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn message(&self) -> Option<&'static str> {
        self.is_empty().then_some(NO_CHART_DATA_MESSAGE)
    }
}
