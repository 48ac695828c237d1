//! Path Module - addressing and shaping of response data (v0.1)
//!
//! Pure functions over decoded JSON, shared by the field picker and the
//! widget renderers:
//! - `resolve`: `Path` (`-->` wire format) and `resolve_path`
//! - `shape`: list detection, column inference, row materialization
//! - `flatten`: path → scalar listing of a whole response

mod flatten;
mod resolve;
mod shape;

pub use flatten::{flatten, flatten_to_strings};
pub use resolve::{resolve_path, resolve_str, Path, PATH_DELIMITER};
pub use shape::{
    discover_lists, enumerate_list_candidates, infer_columns, is_numeric, list_items, list_shape,
    materialize_rows, DiscoveredList, DisplayKind, ListCandidate, ListShape, Row, KEY_NAME,
};
