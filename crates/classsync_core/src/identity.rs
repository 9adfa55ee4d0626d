//! Canonical identity derivation.
//!
//! # Responsibility
//! - Reduce any raw record or primitive to one string id.
//!
//! # Invariants
//! - Deterministic and side-effect free.
//! - Idempotent: the canonical id of a canonical id string is itself.
//! - Id-less values get a structural digest, so equal values share an id.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Id fields probed on objects, highest priority first.
pub const ID_FIELDS: &[&str] = &["_id", "id"];

/// Fields probed on nested id objects such as `{"$oid": "..."}`.
const NESTED_ID_FIELDS: &[&str] = &["$oid", "_id", "id"];

/// Prefix marking ids synthesized from a structural digest.
pub const DIGEST_ID_PREFIX: &str = "h:";

/// Returns the explicit id carried by `value`, if any.
///
/// Objects are probed through [`ID_FIELDS`]; strings and numbers are their own
/// id. Blank strings and nulls never count as an id.
pub fn explicit_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ID_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(scalar_id)),
        other => scalar_id(other),
    }
}

/// Returns the canonical id of `value`, falling back to a structural digest.
pub fn canonical_id(value: &Value) -> String {
    explicit_id(value).unwrap_or_else(|| structural_digest(value))
}

/// Digest of the canonical JSON text of `value`.
///
/// `serde_json` keeps object keys sorted, so key order in the source payload
/// does not change the digest.
pub fn structural_digest(value: &Value) -> String {
    let text = value.to_string();
    let digest = Sha256::digest(text.as_bytes());
    let mut id = String::with_capacity(DIGEST_ID_PREFIX.len() + 16);
    id.push_str(DIGEST_ID_PREFIX);
    for byte in digest.iter().take(8) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(map) => NESTED_ID_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(scalar_id)),
        Value::Null | Value::Array(_) => None,
    }
}
