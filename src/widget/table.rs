//! Table view: uniform rows, case-insensitive search, fixed-size pages

use serde::Serialize;
use serde_json::Value;

use crate::format::{format_value, raw_text, DataFormat};
use crate::path::{list_shape, materialize_rows, resolve_path, ListShape, Path};
use crate::util::constants::{TABLE_PAGE_SIZE, TABLE_ROW_LIMIT};

pub const NO_DATA_MESSAGE: &str = "No Data Found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Position in the source list
    pub index: usize,
    /// `key_name` for record rows, the index otherwise
    pub key: String,
    /// Formatted cells, one per column
    pub cells: Vec<String>,
    #[serde(skip)]
    haystack: Haystack,
}

/// Lowercased raw text searched by `TableView::search`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Haystack {
    key_name: Option<String>,
    columns: Vec<String>,
}

impl TableRow {
    fn matches(&self, needle: &str) -> bool {
        self.haystack
            .key_name
            .as_deref()
            .is_some_and(|k| k.contains(needle))
            || self.haystack.columns.iter().any(|c| c.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// One page of (possibly filtered) rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub rows: Vec<TableRow>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    /// Total rows after filtering
    pub matched: usize,
    /// Empty-state text when `rows` is empty
    pub message: Option<String>,
}

impl TableView {
    pub fn empty(columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Arrays are shown in full; records are capped at `TABLE_ROW_LIMIT`
    pub fn build(root: &Value, path: &Path, columns: &[String], format: DataFormat) -> Self {
        let limit = match resolve_path(root, path).map(list_shape) {
            Some(ListShape::Array) => usize::MAX,
            _ => TABLE_ROW_LIMIT,
        };
        let rows = materialize_rows(root, path, limit)
            .into_iter()
            .map(|row| {
                let key = match row.key_name.as_deref() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => row.index.to_string(),
                };
                let cells = columns
                    .iter()
                    .map(|col| format_value(row.field(col), format))
                    .collect();
                let haystack = Haystack {
                    key_name: row.key_name.as_deref().map(str::to_lowercase),
                    columns: columns
                        .iter()
                        .map(|col| row.field(col).map(raw_text).unwrap_or_default().to_lowercase())
                        .collect(),
                };
                TableRow {
                    index: row.index,
                    key,
                    cells,
                    haystack,
                }
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Rows whose key or any configured column contains `term` (case-insensitive)
    pub fn search(&self, term: &str) -> Vec<&TableRow> {
        if term.is_empty() {
            return self.rows.iter().collect();
        }
        let needle = term.to_lowercase();
        self.rows.iter().filter(|row| row.matches(&needle)).collect()
    }

    /// Page `page` (1-based, clamped) of the rows matching `term`
    pub fn page(&self, term: &str, page: usize) -> TablePage {
        let matched = self.search(term);
        let total_pages = matched.len().div_ceil(TABLE_PAGE_SIZE);
        let page = page.clamp(1, total_pages.max(1));

        let rows: Vec<TableRow> = matched
            .iter()
            .skip((page - 1) * TABLE_PAGE_SIZE)
            .take(TABLE_PAGE_SIZE)
            .map(|row| (*row).clone())
            .collect();

        let message = if self.rows.is_empty() {
            Some(NO_DATA_MESSAGE.to_string())
        } else if rows.is_empty() {
            Some(format!("No results for \"{term}\""))
        } else {
            None
        };

        TablePage {
            rows,
            page,
            total_pages,
            matched: matched.len(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prices() -> Value {
        let mut series = serde_json::Map::new();
        for day in 1..=25 {
            series.insert(
                format!("2024-01-{day:02}"),
                json!({"open": format!("{}.5", 100 + day), "volume": day * 1000}),
            );
        }
        json!({"Meta": {"symbol": "IBM"}, "Series": series})
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_keyed_rows_with_formatted_cells() {
        let view = TableView::build(
            &prices(),
            &Path::parse("Series"),
            &cols(&["open", "missing"]),
            DataFormat::Currency,
        );
        assert_eq!(view.rows.len(), 25);
        assert_eq!(view.rows[0].key, "2024-01-01");
        assert_eq!(view.rows[0].cells, vec!["$101.50", "--"]);
    }

    #[test]
    fn array_rows_are_keyed_by_index() {
        let data = json!([{"p": 1}, {"p": 2}]);
        let view = TableView::build(&data, &Path::root(), &cols(&["p"]), DataFormat::Raw);
        assert_eq!(view.rows[1].key, "1");
        assert_eq!(view.rows[1].cells, vec!["2"]);
    }

    #[test]
    fn row_limit_applies_to_records_only() {
        let mut records = serde_json::Map::new();
        for i in 0..150 {
            records.insert(format!("k{i:03}"), json!({"i": i}));
        }
        let view = TableView::build(&Value::Object(records), &Path::root(), &cols(&["i"]), DataFormat::Raw);
        assert_eq!(view.rows.len(), TABLE_ROW_LIMIT);
    }

    #[test]
    fn long_arrays_page_to_the_end() {
        let items: Vec<Value> = (1..=150).map(|i| json!({"i": i})).collect();
        let view = TableView::build(&json!(items), &Path::root(), &cols(&["i"]), DataFormat::Raw);
        assert_eq!(view.rows.len(), 150);

        let last = view.page("", 15);
        assert_eq!((last.page, last.total_pages), (15, 15));
        assert_eq!(last.rows.last().map(|r| r.cells.clone()), Some(vec!["150".to_string()]));
        assert_eq!(view.search("149").len(), 1);
    }

    #[test]
    fn pagination() {
        let view = TableView::build(&prices(), &Path::parse("Series"), &cols(&["open"]), DataFormat::Raw);

        let first = view.page("", 1);
        assert_eq!((first.page, first.total_pages, first.rows.len()), (1, 3, 10));
        let last = view.page("", 3);
        assert_eq!(last.rows.len(), 5);
        assert_eq!(last.rows[0].key, "2024-01-21");
        assert_eq!(view.page("", 99).page, 3);
        assert_eq!(view.page("", 0).page, 1);
    }

    #[test]
    fn search_matches_key_and_columns_case_insensitively() {
        let data = json!([{"name": "Apple"}, {"name": "Banana"}, {"name": "apricot"}]);
        let view = TableView::build(&data, &Path::root(), &cols(&["name"]), DataFormat::Raw);
        assert_eq!(view.search("AP").len(), 2);

        let keyed = TableView::build(&prices(), &Path::parse("Series"), &cols(&["open"]), DataFormat::Raw);
        assert_eq!(keyed.search("01-2").len(), 6);
        assert_eq!(keyed.search("125.5").len(), 1);
    }

    #[test]
    fn empty_state_messages() {
        let empty = TableView::build(&json!({"x": 1}), &Path::parse("missing"), &cols(&["a"]), DataFormat::Raw);
        assert_eq!(empty.page("", 1).message.as_deref(), Some(NO_DATA_MESSAGE));
        assert_eq!(empty.page("", 1).total_pages, 0);

        let view = TableView::build(&json!([{"a": "x"}]), &Path::root(), &cols(&["a"]), DataFormat::Raw);
        assert_eq!(
            view.page("zzz", 1).message.as_deref(),
            Some("No results for \"zzz\"")
        );
        assert_eq!(view.page("", 1).message, None);
    }
}
