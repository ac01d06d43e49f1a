//! Read-only traversal of loosely-typed documents (`status`, `spec` and friends).
//!
//! Every accessor walks object levels one key at a time. A missing key or a node of the
//! wrong shape anywhere on the path yields the accessor's empty value instead of an
//! error, so one malformed field never spoils extraction of its siblings.

use serde_json::{Map, Value};

/// Follow `keys` through nested objects and return the node at the last key.
fn descend<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in keys {
        match cur {
            Value::Object(map) => cur = map.get(*key)?,
            _ => return None,
        }
    }
    Some(cur)
}

/// String at `keys`, or `""` when any step is absent or the leaf is not a string.
///
/// Missing and empty are indistinguishable to the caller.
pub fn nested_str(root: &Value, keys: &[&str]) -> String {
    descend(root, keys).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Object found at the final key, if every step resolves to an object.
pub fn nested_map<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    descend(root, keys).and_then(Value::as_object)
}

/// Array found at the final key.
pub fn nested_slice<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a [Value]> {
    descend(root, keys).and_then(Value::as_array).map(Vec::as_slice)
}

/// Integer at `keys`; `0` when absent or not an integer.
pub fn nested_i64(root: &Value, keys: &[&str]) -> i64 {
    descend(root, keys).and_then(Value::as_i64).unwrap_or(0)
}

/// Boolean at `keys`; `false` when absent or not a boolean.
pub fn nested_bool(root: &Value, keys: &[&str]) -> bool {
    descend(root, keys).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_string() {
        let doc = json!({"status": {"phase": "Running"}});
        assert_eq!(nested_str(&doc, &["status", "phase"]), "Running");
    }

    #[test]
    fn broken_paths_yield_empty_string() {
        let doc = json!({
            "status": {"phase": 3, "list": ["a"], "nested": {"deep": null}},
            "spec": "not-a-map"
        });
        assert_eq!(nested_str(&doc, &["status", "missing"]), "");
        assert_eq!(nested_str(&doc, &["spec", "image", "tag"]), "");
        assert_eq!(nested_str(&doc, &["status", "list", "0"]), "");
        assert_eq!(nested_str(&doc, &["status", "phase"]), "");
        assert_eq!(nested_str(&doc, &["status", "nested", "deep", "x"]), "");
        assert_eq!(nested_str(&json!(null), &["status"]), "");
        assert_eq!(nested_str(&json!([1, 2]), &["status"]), "");
    }

    #[test]
    fn malformed_sibling_does_not_block_well_formed_one() {
        let doc = json!({"status": {"conditions": "garbage", "gatewayEndpoint": "ws://gw:18789"}});
        assert!(nested_slice(&doc, &["status", "conditions"]).is_none());
        assert_eq!(nested_str(&doc, &["status", "gatewayEndpoint"]), "ws://gw:18789");
    }

    #[test]
    fn map_lookup_requires_object_at_final_key() {
        let doc = json!({"status": {"managedResources": {"service": "svc"}, "phase": "Running"}});
        let managed = nested_map(&doc, &["status", "managedResources"]).expect("map");
        assert_eq!(managed.get("service").and_then(Value::as_str), Some("svc"));
        assert!(nested_map(&doc, &["status", "phase"]).is_none());
        assert!(nested_map(&doc, &["status", "absent"]).is_none());
        assert!(nested_map(&doc, &[]).is_some());
    }

    #[test]
    fn scalar_helpers_default_on_wrong_type() {
        let doc = json!({"restartCount": "7", "ready": "yes", "n": 4, "ok": true});
        assert_eq!(nested_i64(&doc, &["restartCount"]), 0);
        assert!(!nested_bool(&doc, &["ready"]));
        assert_eq!(nested_i64(&doc, &["n"]), 4);
        assert!(nested_bool(&doc, &["ok"]));
    }

    #[test]
    fn traversal_leaves_input_untouched() {
        let doc = json!({"a": {"b": "c"}});
        let before = doc.clone();
        let _ = nested_str(&doc, &["a", "b", "c"]);
        let _ = nested_map(&doc, &["a"]);
        assert_eq!(doc, before);
    }
}
