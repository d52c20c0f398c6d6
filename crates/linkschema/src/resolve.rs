//! # Dotted-Path Resolution
//!
//! Looks up values inside a serialized object graph by a dotted path such as
//! `"author.id"`. Every source object handed to a schema is first turned into
//! a [`serde_json::Value`], so the graph is made of mappings, sequences and
//! scalars.
//!
//! ## Lookup Order
//!
//! Each segment is tried against a short, fixed chain of accessors:
//!
//! 1. **Mapping**: the segment is a key (struct fields land here too).
//! 2. **Sequence**: the segment parses as a `usize` index.
//!
//! Anything else (scalars, null, out-of-range indexes) is a miss.
//!
//! ## Null vs Missing
//!
//! The two outcomes are deliberately different:
//!
//! - A segment that resolves to `null` stops resolution right there and the
//!   whole lookup is [`Resolved::Null`], no matter how many segments remain.
//!   This models an optional relationship with no target and is not an error.
//! - A segment that cannot be found yields [`Resolved::Missing`], which callers
//!   usually report as a programming error.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Outcome of resolving a dotted path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// The path resolved to a non-null value.
    Found(&'a Value),
    /// Some segment along the path was `null`.
    Null,
    /// Some segment along the path does not exist.
    Missing,
}

impl<'a> Resolved<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }

    /// The resolved value, with `Null` mapped to JSON null and `Missing` to `None`.
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Null => Some(&NULL),
            Resolved::Missing => None,
        }
    }
}

/// Resolve `path` against `obj`.
///
/// ```
/// use linkschema::resolve::{resolve, Resolved};
/// use serde_json::json;
///
/// let book = json!({"id": 42, "author": {"id": 123}});
/// assert_eq!(resolve(&book, "author.id"), Resolved::Found(&json!(123)));
/// assert_eq!(resolve(&book, "author.name"), Resolved::Missing);
///
/// let orphan = json!({"id": 7, "author": null});
/// assert_eq!(resolve(&orphan, "author.id"), Resolved::Null);
/// ```
pub fn resolve<'a>(obj: &'a Value, path: &str) -> Resolved<'a> {
    let mut current = obj;
    for segment in path.split('.') {
        match get_one(current, segment) {
            None => return Resolved::Missing,
            Some(Value::Null) => return Resolved::Null,
            Some(value) => current = value,
        }
    }
    Resolved::Found(current)
}

/// Resolve `path`, returning `default` when any segment is missing.
///
/// A `null` anywhere along the path yields JSON null rather than `default`.
pub fn get_value<'a>(obj: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    resolve(obj, path).value().unwrap_or(default)
}

/// Look up a single segment: mapping key first, then sequence index.
pub fn get_one<'a>(obj: &'a Value, segment: &str) -> Option<&'a Value> {
    by_key(obj, segment).or_else(|| by_index(obj, segment))
}

fn by_key<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.as_object().and_then(|map| map.get(key))
}

fn by_index<'a>(obj: &'a Value, segment: &str) -> Option<&'a Value> {
    let items = obj.as_array()?;
    let index = segment.parse::<usize>().ok()?;
    items.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book() -> Value {
        json!({
            "id": 42,
            "title": "Legend of Bagger Vance",
            "author": {"id": 123, "name": "Fred Douglass"},
            "tags": ["golf", "fiction"],
        })
    }

    #[test]
    fn test_single_segment_reads_mapping_key() {
        let book = book();
        assert_eq!(resolve(&book, "id"), Resolved::Found(&json!(42)));
    }

    #[test]
    fn test_dotted_path_matches_manual_chaining() {
        let book = book();
        let manual = &book["author"]["id"];
        assert_eq!(resolve(&book, "author.id"), Resolved::Found(manual));
    }

    #[test]
    fn test_numeric_segment_indexes_sequences() {
        let book = book();
        assert_eq!(resolve(&book, "tags.1"), Resolved::Found(&json!("fiction")));
        assert_eq!(resolve(&book, "tags.5"), Resolved::Missing);
        assert_eq!(resolve(&book, "tags.first"), Resolved::Missing);
    }

    #[test]
    fn test_numeric_key_prefers_mapping_over_index() {
        let obj = json!({"0": "key"});
        assert_eq!(resolve(&obj, "0"), Resolved::Found(&json!("key")));
    }

    #[test]
    fn test_missing_attribute_is_missing() {
        let book = book();
        assert!(resolve(&book, "publisher").is_missing());
        assert!(resolve(&book, "author.publisher.name").is_missing());
    }

    #[test]
    fn test_scalar_has_no_members() {
        let book = book();
        assert!(resolve(&book, "id.value").is_missing());
    }

    #[test]
    fn test_null_intermediate_short_circuits() {
        let book = json!({"id": 42, "author": null});
        assert!(resolve(&book, "author.id").is_null());
        assert!(resolve(&book, "author.id.whatever.else").is_null());
    }

    #[test]
    fn test_null_leaf_is_null() {
        let book = json!({"author": null});
        assert!(resolve(&book, "author").is_null());
    }

    #[test]
    fn test_null_root_is_missing() {
        assert!(resolve(&Value::Null, "id").is_missing());
    }

    #[test]
    fn test_get_value_uses_default_only_for_missing() {
        let book = json!({"author": null, "id": 1});
        let default = json!("fallback");
        assert_eq!(get_value(&book, "id", &default), &json!(1));
        assert_eq!(get_value(&book, "nope", &default), &default);
        assert_eq!(get_value(&book, "author.id", &default), &Value::Null);
    }
}
