//! List shaping over heterogeneous responses
//!
//! Two shapes present as a list to tables and charts:
//! - an array
//! - an object of records: every member is a non-empty object or array,
//!   e.g. a time series keyed by date
//!
//! Everything else is not a list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::resolve::{resolve_path, Path};
use crate::util::constants::COLUMN_SAMPLE_SIZE;

/// Synthetic field carrying the source key of an object-of-records row
pub const KEY_NAME: &str = "key_name";

/// Which renderer the columns are inferred for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Table,
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListShape {
    Array,
    Records,
    NotList,
}

/// Classify a location
pub fn list_shape(value: &Value) -> ListShape {
    match value {
        Value::Array(_) => ListShape::Array,
        Value::Object(map) if !map.is_empty() && map.values().all(is_non_empty_container) => {
            ListShape::Records
        }
        _ => ListShape::NotList,
    }
}

fn is_non_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Items of a list location: array elements or record values
pub fn list_items(value: &Value) -> Vec<&Value> {
    match (list_shape(value), value) {
        (ListShape::Array, Value::Array(items)) => items.iter().collect(),
        (ListShape::Records, Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}

/// Result of probing one location
#[derive(Debug, Clone, PartialEq)]
pub struct ListCandidate<'a> {
    pub is_list: bool,
    pub shape: ListShape,
    pub items: Vec<&'a Value>,
}

/// Probe `path` inside `root`; a missing location is simply not a list
pub fn enumerate_list_candidates<'a>(root: &'a Value, path: &Path) -> ListCandidate<'a> {
    let Some(location) = resolve_path(root, path) else {
        return ListCandidate {
            is_list: false,
            shape: ListShape::NotList,
            items: Vec::new(),
        };
    };
    let shape = list_shape(location);
    ListCandidate {
        is_list: shape != ListShape::NotList,
        shape,
        items: list_items(location),
    }
}

/// Column names from the first sampled object items, first-seen order.
///
/// Charts keep only keys with at least one numeric (or numeric string) value.
pub fn infer_columns(list: &Value, kind: DisplayKind) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for item in list_items(list).into_iter().take(COLUMN_SAMPLE_SIZE) {
        let Value::Object(fields) = item else {
            continue;
        };
        for (key, value) in fields {
            if kind == DisplayKind::Chart && !is_numeric(value) {
                continue;
            }
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Plottable: a JSON number, or a string whose whole trimmed text is a finite number
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
        }
        _ => false,
    }
}

/// One uniform table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Position in the source list
    pub index: usize,
    /// Source key for object-of-records rows, absent for array rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Array item as-is, or `{key_name, ...record}` for records
    pub value: Value,
}

impl Row {
    pub fn field(&self, column: &str) -> Option<&Value> {
        match &self.value {
            Value::Object(map) => map.get(column),
            _ => None,
        }
    }
}

/// Rows at `path`, up to `limit`, in source order
pub fn materialize_rows(root: &Value, path: &Path, limit: usize) -> Vec<Row> {
    let Some(location) = resolve_path(root, path) else {
        return Vec::new();
    };
    match (list_shape(location), location) {
        (ListShape::Array, Value::Array(items)) => items
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, item)| Row {
                index,
                key_name: None,
                value: item.clone(),
            })
            .collect(),
        (ListShape::Records, Value::Object(map)) => map
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, (key, record))| Row {
                index,
                key_name: Some(key.clone()),
                value: merge_record(key, record),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `{key_name: key, ...record}`; a record's own `key_name` wins
fn merge_record(key: &str, record: &Value) -> Value {
    let mut merged = Map::new();
    merged.insert(KEY_NAME.to_string(), Value::String(key.to_string()));
    match record {
        Value::Object(fields) => {
            for (field, value) in fields {
                merged.insert(field.clone(), value.clone());
            }
        }
        Value::Array(items) => {
            for (idx, value) in items.iter().enumerate() {
                merged.insert(idx.to_string(), value.clone());
            }
        }
        _ => {}
    }
    Value::Object(merged)
}

/// A list found while scanning a whole response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredList {
    pub path: Path,
    pub shape: ListShape,
    pub len: usize,
    pub columns: Vec<String>,
}

/// Every list-like location in `root` with its inferred columns.
///
/// Objects are always descended into; array items are not.
pub fn discover_lists(root: &Value, kind: DisplayKind) -> Vec<DiscoveredList> {
    let mut out = Vec::new();
    discover(root, Path::root(), kind, &mut out);
    out
}

fn discover(value: &Value, path: Path, kind: DisplayKind, out: &mut Vec<DiscoveredList>) {
    let shape = list_shape(value);
    if shape != ListShape::NotList {
        out.push(DiscoveredList {
            path: path.clone(),
            shape,
            len: list_items(value).len(),
            columns: infer_columns(value, kind),
        });
    }
    if let Value::Object(map) = value {
        for (key, child) in map {
            if matches!(child, Value::Object(_) | Value::Array(_)) {
                discover(child, path.child(key.as_str()), kind, out);
            }
        }
    }
}
