//! Flattening JSON into path → scalar pairs
//!
//! Drives the selectable-field tree: every scalar leaf is listed with the
//! full path that `resolve_path` accepts back.

use serde_json::Value;

use super::resolve::Path;

/// Every reachable scalar leaf, in document order.
///
/// Empty objects and arrays contribute nothing. A scalar root yields a
/// single entry at the root path. Keys containing `-->` cannot round-trip.
pub fn flatten(root: &Value) -> Vec<(Path, &Value)> {
    let mut out = Vec::new();
    if is_container(root) {
        walk(root, &Path::root(), &mut out);
    } else {
        out.push((Path::root(), root));
    }
    out
}

/// Same as [`flatten`] with paths rendered in the `-->` wire format
pub fn flatten_to_strings(root: &Value) -> Vec<(String, &Value)> {
    flatten(root)
        .into_iter()
        .map(|(path, value)| (path.to_string(), value))
        .collect()
}

fn walk<'a>(value: &'a Value, prefix: &Path, out: &mut Vec<(Path, &'a Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(child, prefix.child(key.as_str()), out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit(child, prefix.child(idx.to_string()), out);
            }
        }
        _ => {}
    }
}

fn visit<'a>(child: &'a Value, path: Path, out: &mut Vec<(Path, &'a Value)>) {
    if is_container(child) {
        walk(child, &path, out);
    } else {
        out.push((path, child));
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
