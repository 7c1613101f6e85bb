//! Generic JSON flattening.
//!
//! Converts a nested document into the set of slash-joined paths to its leaf
//! values. Objects recurse; everything else (null, bool, number, string,
//! array) is a leaf. `{"location": {"lat": 1.0}}` flattens to
//! `{"/location/lat"}`.

use std::collections::BTreeSet;

use serde_json::Value;

/// Flatten a document into the set of paths to its leaf values.
///
/// A non-object root produces the empty set; there is no path to name.
pub fn flatten(doc: &Value) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    if let Value::Object(map) = doc {
        walk(map, "", &mut paths);
    }
    paths
}

fn walk(map: &serde_json::Map<String, Value>, prefix: &str, out: &mut BTreeSet<String>) {
    for (key, value) in map {
        let path = format!("{}/{}", prefix, key);
        match value {
            Value::Object(inner) => walk(inner, &path, out),
            _ => {
                out.insert(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(doc: serde_json::Value) -> BTreeSet<String> {
        flatten(&doc)
    }

    #[test]
    fn flat_document() {
        let got = paths(json!({"api": "0.13", "space": "S1"}));
        let want: BTreeSet<String> = ["/api", "/space"].iter().map(|s| s.to_string()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn nested_objects_recurse() {
        let got = paths(json!({
            "api": "0.13",
            "location": {"lat": 1.0, "lon": 2.0},
        }));
        let want: BTreeSet<String> = ["/api", "/location/lat", "/location/lon"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn arrays_and_null_are_leaves() {
        let got = paths(json!({
            "contact": {"phones": ["+41 00"], "email": null},
        }));
        let want: BTreeSet<String> = ["/contact/phones", "/contact/email"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn flattening_is_idempotent_on_the_path_set() {
        let doc = json!({"a": {"b": 1, "c": {"d": true}}, "e": "x"});
        assert_eq!(paths(doc.clone()), paths(doc));
    }

    #[test]
    fn non_object_root_is_empty() {
        assert!(paths(json!([1, 2, 3])).is_empty());
        assert!(paths(json!("scalar")).is_empty());
    }
}
