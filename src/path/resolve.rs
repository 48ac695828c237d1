//! Path addressing into arbitrary JSON (v0.1)
//!
//! A path is an ordered list of literal segments joined by `-->`:
//! - `"Global Quote-->05. price"` → ["Global Quote", "05. price"]
//! - `"data-->0-->close"` → ["data", "0", "close"] (array index as text)
//! - `""` → root
//!
//! The `-->` form is the persisted wire format for `dataKey` and
//! `cardFields[].path`, so it must stay byte-compatible.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Reserved separator between path segments
pub const PATH_DELIMITER: &str = "-->";

/// Location inside a JSON value tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The empty path, addressing the value itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the `-->` wire format. Never fails: every string is a path.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::root();
        }
        Self {
            segments: raw.split(PATH_DELIMITER).map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Extend by one segment (object key or stringified array index)
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    /// Final segment, used as the default label of a picked field
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(PATH_DELIMITER))
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Walk `root` segment by segment.
///
/// Returns `None` (the not-found sentinel) as soon as a key is missing, an
/// index is out of range or not canonical, or a scalar would be indexed.
/// A JSON `null` that exists at the location is found, not missing.
pub fn resolve_path<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
}

/// Parse and resolve in one step
pub fn resolve_str<'a>(root: &'a Value, raw_path: &str) -> Option<&'a Value> {
    resolve_path(root, &Path::parse(raw_path))
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => array_index(segment).and_then(|idx| items.get(idx)),
        _ => None,
    }
}

/// Canonical decimal index only: "0", "17". Rejects "", "+1", "01", "1.0".
fn array_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && !(segment.len() > 1 && segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_splits_on_delimiter() {
        let path = Path::parse("Global Quote-->05. price");
        assert_eq!(path.segments(), &["Global Quote", "05. price"]);
        assert_eq!(path.last(), Some("05. price"));
    }

    #[test]
    fn empty_string_is_root() {
        let path = Path::parse("");
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn single_dash_and_arrow_are_not_delimiters() {
        let path = Path::parse("a->b-c");
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn display_round_trips() {
        let raw = "data-->0-->close";
        assert_eq!(Path::parse(raw).to_string(), raw);
    }

    #[test]
    fn child_appends_segment() {
        let path = Path::root().child("prices").child("2024-01-01");
        assert_eq!(path.to_string(), "prices-->2024-01-01");
    }

    #[test]
    fn serde_uses_wire_format() {
        let path = Path::from_segments(["a", "b"]);
        let encoded = serde_json::to_value(&path).unwrap();
        assert_eq!(encoded, json!("a-->b"));
        let decoded: Path = serde_json::from_value(json!("x-->1")).unwrap();
        assert_eq!(decoded.segments(), &["x", "1"]);
    }

    #[test]
    fn resolve_root_returns_value_itself() {
        let value = json!({"a": 1});
        assert_eq!(resolve_path(&value, &Path::root()), Some(&value));
    }

    #[test]
    fn resolve_nested_object() {
        let value = json!({"Global Quote": {"05. price": "189.2"}});
        assert_eq!(
            resolve_str(&value, "Global Quote-->05. price"),
            Some(&json!("189.2"))
        );
    }

    #[test]
    fn resolve_array_index() {
        let value = json!({"data": [{"close": 1}, {"close": 2}]});
        assert_eq!(resolve_str(&value, "data-->1-->close"), Some(&json!(2)));
    }

    #[test]
    fn resolve_misses_are_none() {
        let value = json!({"data": [1, 2], "name": "x"});
        assert_eq!(resolve_str(&value, "missing"), None);
        assert_eq!(resolve_str(&value, "data-->5"), None);
        assert_eq!(resolve_str(&value, "data-->01"), None);
        assert_eq!(resolve_str(&value, "data-->-1"), None);
        assert_eq!(resolve_str(&value, "name-->0"), None);
    }

    #[test]
    fn numeric_segment_is_a_key_on_objects() {
        let value = json!({"0": "zero"});
        assert_eq!(resolve_str(&value, "0"), Some(&json!("zero")));
    }

    #[test]
    fn null_leaf_is_found() {
        let value = json!({"a": null});
        assert_eq!(resolve_str(&value, "a"), Some(&Value::Null));
        assert_eq!(resolve_str(&value, "a-->b"), None);
    }
}
