//! Layering of context sources
//!
//! A context file is the base layer; values given on the command line are
//! laid over it:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (overlay wins entirely)
//! - Scalars: overlay wins
//! - Null: "not given", the base value stays

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (base, Value::Null) => base,

        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    continue;
                }
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays are not concatenated: a list given on the command line
        // replaces the file's list
        (_, overlay) => overlay,
    }
}
