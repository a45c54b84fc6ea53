//! Canonical serialization for entity comparison and fingerprints.
//!
//! Two graph entities are considered equal when their canonical bytes are
//! equal. Because node and edge types default every absent field during
//! deserialization, sparse and explicit inputs that mean the same thing
//! produce the same bytes.
//!
//! Hashed types must keep their collections in `BTreeMap`s; struct fields
//! already serialize in declaration order.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Only used with crate types whose maps have string keys, for which
/// serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Whether two values serialize to identical canonical bytes.
pub fn canonical_eq<T: Serialize>(a: &T, b: &T) -> bool {
    to_canonical_bytes(a) == to_canonical_bytes(b)
}

/// xxh64 of the canonical bytes (seed 0).
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// [`canonical_hash`] as 16 lowercase hex digits.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Node, NodeContent, Position};

    #[test]
    fn test_determinism() {
        let node = Node::new("a", NodeContent::topic("Rust"), Position::new(10.0, 20.0));

        assert_eq!(canonical_hash(&node), canonical_hash(&node.clone()));
        assert_eq!(canonical_hash_hex(&node).len(), 16);
    }

    #[test]
    fn test_canonical_eq_detects_property_change() {
        let a = Node::new("a", NodeContent::topic("Rust"), Position::new(10.0, 20.0));
        let mut b = a.clone();
        assert!(canonical_eq(&a, &b));

        b.content = NodeContent::Topic {
            label: "Rust".into(),
            color: Some("#ff0000".into()),
        };
        assert!(!canonical_eq(&a, &b));
    }
}
