//! Recursive merge of settings values
//!
//! Merge semantics:
//! - Mapping into mapping: merge by key (recursive)
//! - Anything else: the incoming value replaces the existing one

use serde_json::Value;

/// Merge `new` into `old`, returning the combined value.
///
/// Keys only present in `old` survive, keys only present in `new` are
/// added, and keys present in both are merged recursively. When the two
/// values are not both mappings, `new` wins outright: a scalar never
/// merges key-by-key with a mapping, and sequences are not concatenated.
pub fn merge(old: Value, new: Value) -> Value {
    match (old, new) {
        (Value::Object(mut merged), Value::Object(incoming)) => {
            for (key, new_value) in incoming {
                let value = match merged.remove(&key) {
                    Some(old_value) => merge(old_value, new_value),
                    None => new_value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }

        (_, replacement) => replacement,
    }
}
