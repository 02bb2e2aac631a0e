//! Nested-mapping helpers for positional value lines.

use std::collections::BTreeMap;

use serde_json::map::Entry;
use serde_json::{Map, Value};

/// Renders a value as a nesting key.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Converts a positional line into a right-nested single-path mapping.
///
/// The last element is the leaf value, every preceding element becomes a
/// nesting key, outermost first: `[1,2,3,4]` becomes `{"1":{"2":{"3":4}}}`.
/// A single-element line collapses to the bare value.
pub fn list_to_nested(items: &[Value]) -> Value {
    match items {
        [] => Value::Null,
        [leaf] => leaf.clone(),
        [head, rest @ ..] => {
            let mut map = Map::new();
            map.insert(key_text(head), list_to_nested(rest));
            Value::Object(map)
        }
    }
}

/// Deep-merges a sequence of nested mappings into one.
///
/// Collision policy: when both sides are objects the merge recurses,
/// otherwise the later entry overwrites. Inputs are consumed; the result is
/// a fresh value.
pub fn merge_nested(items: Vec<Value>) -> Value {
    let mut merged = Value::Object(Map::new());
    for item in items {
        deep_merge(&mut merged, item);
    }
    merged
}

fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(entries)) => {
            for (key, value) in entries {
                match existing.entry(key) {
                    Entry::Occupied(mut slot) => deep_merge(slot.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

/// Flattens a nested mapping into dotted-key leaf entries.
///
/// Arrays and scalars are leaves; objects contribute one dotted segment per
/// key. The result is the row shape stored in the result table.
pub fn flatten_value(value: &Value) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    flatten_into(value, None, &mut flat);
    flat
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}.{key}"),
                    None => key.clone(),
                };
                flatten_into(child, Some(&path), out);
            }
        }
        leaf => {
            out.insert(prefix.unwrap_or_default().to_string(), leaf.clone());
        }
    }
}
