//! SHA-256 hashing helpers.
//!
//! Structured values are hashed over their compact JSON text with object
//! keys in JavaScript property order: array-index keys (`"0"`, `"17"`)
//! first in ascending numeric order, then every other key in insertion
//! order. So `{"b":1,"a":2}` and `{"a":2,"b":1}` hash differently, while
//! `{"b":1,"1":2}` serializes as `{"1":2,"b":1}`.

use serde_json::{Map, Value};

use crate::types::ContentHash;

/// Hashes raw bytes.
pub fn hash(data: &[u8]) -> ContentHash {
    ContentHash::of(data)
}

/// Hashes the UTF-8 encoding of `text`.
pub fn hash_str(text: &str) -> ContentHash {
    ContentHash::of(text.as_bytes())
}

/// Compact JSON text of `value`, the input to every structured hash.
pub fn serialize(value: &Value) -> String {
    if has_index_keys(value) {
        with_index_keys_first(value).to_string()
    } else {
        value.to_string()
    }
}

/// Parses `key` as an array index: a canonical decimal below `u32::MAX`.
fn array_index(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    (n != u32::MAX && n.to_string() == key).then_some(n)
}

fn has_index_keys(value: &Value) -> bool {
    match value {
        Value::Object(m) => m
            .iter()
            .any(|(k, v)| array_index(k).is_some() || has_index_keys(v)),
        Value::Array(items) => items.iter().any(has_index_keys),
        _ => false,
    }
}

fn with_index_keys_first(value: &Value) -> Value {
    match value {
        Value::Object(m) => {
            let mut indexed: Vec<(u32, &String, &Value)> = Vec::new();
            let mut named: Vec<(&String, &Value)> = Vec::new();
            for (k, v) in m {
                match array_index(k) {
                    Some(n) => indexed.push((n, k, v)),
                    None => named.push((k, v)),
                }
            }
            indexed.sort_by_key(|(n, _, _)| *n);

            let mut out = Map::with_capacity(m.len());
            for (_, k, v) in indexed {
                out.insert(k.clone(), with_index_keys_first(v));
            }
            for (k, v) in named {
                out.insert(k.clone(), with_index_keys_first(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(with_index_keys_first).collect()),
        other => other.clone(),
    }
}

/// `hash(serialize(value))`.
pub fn hash_json(value: &Value) -> ContentHash {
    hash_str(&serialize(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_and_bytes_hash_identically() {
        assert_eq!(hash_str("abc"), hash(b"abc"));
        assert_eq!(
            hash_str("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn serialize_is_compact_and_keeps_key_order() {
        let v = json!({ "title": "T", "description": "D", "inventor": null });
        assert_eq!(
            serialize(&v),
            r#"{"title":"T","description":"D","inventor":null}"#
        );
    }

    #[test]
    fn json_strings_hash_with_their_quotes() {
        // A bare string field is serialized as `"a"`, not `a`.
        assert_eq!(hash_json(&json!("a")), hash_str("\"a\""));
        assert_ne!(hash_json(&json!("a")), hash_str("a"));
    }

    #[test]
    fn index_keys_come_first_in_numeric_order() {
        let v = json!({ "b": 1, "10": 2, "a": { "z": 0, "2": 0 }, "1": 3, "01": 4 });
        assert_eq!(
            serialize(&v),
            r#"{"1":3,"10":2,"b":1,"a":{"2":0,"z":0},"01":4}"#
        );
        assert_eq!(serialize(&json!([{ "x": 1, "0": 2 }])), r#"[{"0":2,"x":1}]"#);
    }

    #[test]
    fn array_index_rejects_non_canonical_keys() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("4294967294"), Some(4_294_967_294));
        assert_eq!(array_index("4294967295"), None);
        assert_eq!(array_index("007"), None);
        assert_eq!(array_index("+1"), None);
        assert_eq!(array_index("-1"), None);
    }

    #[test]
    fn key_order_changes_the_hash() {
        let a = json!({ "x": 1, "y": 2 });
        let b = json!({ "y": 2, "x": 1 });
        assert_ne!(hash_json(&a), hash_json(&b));
    }
}
