//! Multi-source aggregation over cache entries.
//!
//! # Responsibility
//! - Read one raw entity kind from a prioritized list of cache keys.
//! - Accept bare arrays and `{data:[...]}` wrappers alike.
//! - Deduplicate by pre-normalization identity, keeping first-seen order.
//!
//! # Invariants
//! - Reading never writes; a missing or corrupt source contributes nothing.
//! - Earlier sources win: a record present under two keys is taken from the
//!   first key that lists it.

use crate::cache::{CacheKey, CacheStore};
use crate::identity::canonical_id;
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

/// Fields under which list endpoints and legacy cache entries wrap arrays.
const LIST_WRAPPER_FIELDS: &[&str] = &["data", "items", "results"];

/// Returns the array carried by `value`, unwrapping list envelopes.
pub fn unwrap_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => LIST_WRAPPER_FIELDS.iter().find_map(|field| match map.get(*field) {
            Some(Value::Array(items)) => Some(items.as_slice()),
            _ => None,
        }),
        _ => None,
    }
}

/// Like [`unwrap_list`], but reads a non-list payload as an empty list.
pub fn list_or_empty(value: &Value) -> Vec<Value> {
    unwrap_list(value).map(<[Value]>::to_vec).unwrap_or_default()
}

/// Keeps the first item per key, preserving order.
pub fn dedup_by_id<T, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for item in items {
        if seen.insert(key(&item).to_string()) {
            unique.push(item);
        }
    }
    unique
}

/// Deduplicates raw records across already-loaded sources.
pub fn merge_sources<'a>(sources: impl IntoIterator<Item = &'a [Value]>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for source in sources {
        for record in source {
            if seen.insert(canonical_id(record)) {
                merged.push(record.clone());
            }
        }
    }
    merged
}

/// Reads `keys` in priority order and returns the deduplicated raw records.
pub fn aggregate_from_cache(store: &dyn CacheStore, keys: &[CacheKey]) -> Vec<Value> {
    let loaded: Vec<(String, Value)> = keys
        .iter()
        .filter_map(|key| store.get(key).map(|value| (key.render(), value)))
        .collect();

    let lists = loaded.iter().filter_map(|(rendered, value)| {
        let list = unwrap_list(value);
        if list.is_none() {
            debug!(
                "event=cache_aggregate module=aggregate status=degraded key={} error_code=not_a_list",
                rendered
            );
        }
        list
    });
    let merged = merge_sources(lists);

    debug!(
        "event=cache_aggregate module=aggregate status=ok sources={} loaded={} records={}",
        keys.len(),
        loaded.len(),
        merged.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::{aggregate_from_cache, dedup_by_id, merge_sources, unwrap_list};
    use crate::cache::{CacheKey, CacheStore, MemoryCacheStore};
    use serde_json::{json, Value};

    #[test]
    fn unwrap_list_accepts_bare_and_wrapped_arrays() {
        assert_eq!(unwrap_list(&json!([1, 2])).map(<[Value]>::len), Some(2));
        assert_eq!(unwrap_list(&json!({"data": [1]})).map(<[Value]>::len), Some(1));
        assert!(unwrap_list(&json!({"data": {"nested": []}})).is_none());
        assert!(unwrap_list(&json!("text")).is_none());
    }

    #[test]
    fn merge_keeps_first_occurrence_in_source_order() {
        let first = vec![json!({"_id": "s1", "name": "A"}), json!({"id": "s2"})];
        let second = vec![json!({"id": "s1", "name": "B"}), json!("s3"), json!({"_id": "s2"})];
        let merged = merge_sources([first.as_slice(), second.as_slice()]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0]["name"], "A");
        assert_eq!(merged[2], json!("s3"));
    }

    #[test]
    fn id_less_duplicates_collapse_by_structure() {
        let source = vec![json!({"name": "x"}), json!({"name": "x"}), json!({"name": "y"})];
        assert_eq!(merge_sources([source.as_slice()]).len(), 2);
    }

    #[test]
    fn aggregate_reads_keys_in_priority_order_and_skips_bad_sources() {
        let store = MemoryCacheStore::new();
        let roster = CacheKey::CampusRoster("north".to_string());
        let students = CacheKey::CampusStudents("north".to_string());
        store
            .set(&roster, &json!({"data": [{"_id": "s2"}, {"_id": "s1"}]}))
            .unwrap();
        store
            .set(&students, &json!([{"_id": "s1"}, {"_id": "s3"}]))
            .unwrap();
        store
            .write_text(&CacheKey::StudentIndex.render(), "index", "garbage")
            .unwrap();
        store.set(&CacheKey::CampusList, &json!({"not": "a list"})).unwrap();

        let merged = aggregate_from_cache(
            &store,
            &[roster, students, CacheKey::StudentIndex, CacheKey::CampusList],
        );
        let ids: Vec<&str> = merged.iter().map(|v| v["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["s2", "s1", "s3"]);
    }

    #[test]
    fn dedup_by_id_is_order_preserving() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let unique = dedup_by_id(items, |item| item.0);
        assert_eq!(unique, vec![("a", 1), ("b", 2)]);
    }
}
