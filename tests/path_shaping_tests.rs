//! Path resolution and list shaping over realistic provider payloads

use finboard::format::{format_value, DataFormat};
use finboard::path::{
    discover_lists, enumerate_list_candidates, flatten, flatten_to_strings, infer_columns,
    materialize_rows, resolve_path, resolve_str, DisplayKind, ListShape, Path,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn daily_series() -> Value {
    json!({
        "Meta Data": {
            "1. Information": "Daily Prices",
            "2. Symbol": "IBM"
        },
        "Time Series (Daily)": {
            "2024-01-03": {"1. open": "161.00", "4. close": "160.10", "5. volume": "4086"},
            "2024-01-02": {"1. open": "162.83", "4. close": "158.60", "5. volume": "5100"}
        }
    })
}

// =============================================================================
// RESOLVE
// =============================================================================

#[test]
fn resolves_nested_keys_and_indices() {
    let data = json!({"data": {"items": [{"sym": "A"}, {"sym": "B"}]}});
    assert_eq!(resolve_str(&data, "data-->items-->1-->sym"), Some(&json!("B")));
    assert_eq!(resolve_str(&data, "data-->items-->2"), None);
    assert_eq!(resolve_str(&data, "data-->items-->0-->sym-->x"), None);
    assert_eq!(resolve_str(&data, ""), Some(&data));
}

#[test]
fn keys_with_spaces_and_punctuation_resolve() {
    let data = daily_series();
    assert_eq!(
        resolve_str(&data, "Time Series (Daily)-->2024-01-02-->4. close"),
        Some(&json!("158.60"))
    );
}

#[test]
fn null_leaf_resolves_but_formats_as_placeholder() {
    let data = json!({"a": null});
    let found = resolve_str(&data, "a");
    assert_eq!(found, Some(&Value::Null));
    assert_eq!(format_value(found, DataFormat::Currency), "--");
}

// =============================================================================
// LISTS
// =============================================================================

#[test]
fn records_scenario_materializes_with_key_name() {
    let root = json!({"prices": {
        "2024-01-01": {"open": 10, "close": 12},
        "2024-01-02": {"open": 12, "close": 9}
    }});
    let rows = materialize_rows(&root, &Path::parse("prices"), 100);
    let values: Vec<&Value> = rows.iter().map(|r| &r.value).collect();
    assert_eq!(
        values,
        vec![
            &json!({"key_name": "2024-01-01", "open": 10, "close": 12}),
            &json!({"key_name": "2024-01-02", "open": 12, "close": 9}),
        ]
    );
}

#[test]
fn array_and_records_present_identically() {
    let records = json!({"a": {"p": 1}, "b": {"p": 2}});
    let array = json!([{"p": 1}, {"p": 2}]);

    let from_records = enumerate_list_candidates(&records, &Path::root());
    let from_array = enumerate_list_candidates(&array, &Path::root());
    assert!(from_records.is_list && from_array.is_list);
    assert_eq!(from_records.items, from_array.items);
    assert_eq!(from_records.shape, ListShape::Records);
    assert_eq!(from_array.shape, ListShape::Array);
}

#[test]
fn scalars_and_mixed_objects_are_not_lists() {
    let data = json!({"n": 1, "mixed": {"a": {"x": 1}, "b": 2}, "empty": {}});
    for raw in ["n", "mixed", "empty", "missing"] {
        let candidate = enumerate_list_candidates(&data, &Path::parse(raw));
        assert!(!candidate.is_list, "{raw} should not be a list");
        assert!(candidate.items.is_empty());
    }
}

#[test]
fn chart_columns_keep_numeric_strings_only() {
    let data = json!([
        {"date": "2024-01-01", "close": "12.5", "volume": 100, "note": "ok"},
        {"date": "2024-01-02", "close": "13.0", "volume": 120, "extra": "1e3"}
    ]);
    assert_eq!(
        infer_columns(&data, DisplayKind::Table),
        vec!["date", "close", "volume", "note", "extra"]
    );
    assert_eq!(
        infer_columns(&data, DisplayKind::Chart),
        vec!["close", "volume", "extra"]
    );
}

#[test]
fn only_first_ten_items_are_sampled() {
    let mut items: Vec<Value> = (0..10).map(|i| json!({"a": i})).collect();
    items.push(json!({"late": 1}));
    assert_eq!(infer_columns(&json!(items), DisplayKind::Table), vec!["a"]);
}

#[test]
fn discovers_time_series_in_provider_payload() {
    let lists = discover_lists(&daily_series(), DisplayKind::Chart);
    let series = lists
        .iter()
        .find(|l| l.path == Path::parse("Time Series (Daily)"))
        .expect("time series discovered");
    assert_eq!(series.shape, ListShape::Records);
    assert_eq!(series.len, 2);
    assert_eq!(series.columns, vec!["1. open", "4. close", "5. volume"]);
}

#[test]
fn row_limit_truncates_records_in_key_order() {
    let rows = materialize_rows(&daily_series(), &Path::parse("Time Series (Daily)"), 1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key_name.as_deref(), Some("2024-01-03"));
}

// =============================================================================
// FLATTEN
// =============================================================================

#[test]
fn flatten_lists_every_scalar_leaf() {
    let data = json!({"a": {"b": [1, {"c": true}], "d": null}, "e": {}});
    let leaves: Vec<(String, Value)> = flatten_to_strings(&data)
        .into_iter()
        .map(|(p, v)| (p, v.clone()))
        .collect();
    assert_eq!(
        leaves,
        vec![
            ("a-->b-->0".to_string(), json!(1)),
            ("a-->b-->1-->c".to_string(), json!(true)),
            ("a-->d".to_string(), Value::Null),
        ]
    );
}

fn json_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z ]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-z0-9_]{1,8}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn flatten_then_resolve_round_trips(root in json_tree()) {
        for (path, leaf) in flatten(&root) {
            let reparsed = Path::parse(&path.to_string());
            prop_assert_eq!(resolve_path(&root, &reparsed), Some(leaf));
        }
    }

    #[test]
    fn flatten_yields_only_scalars(root in json_tree()) {
        for (_, leaf) in flatten(&root) {
            prop_assert!(!leaf.is_object() && !leaf.is_array());
        }
    }
}
