//! Decoding of raw `result` values into typed outcomes.
//!
//! Responses whose shape is not fixed go through [`decode_ordered`]: each
//! candidate shape is tried in order, the first match wins, and when none
//! matches the error names every shape that was attempted.

use bcos_core::quantity::{decode_bytes, decode_u128, decode_u64};
use bcos_core::SyncProgress;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RpcError, RpcResult};
use crate::types::subscription_key;

/// One candidate shape of a polymorphic response.
pub struct Shape<T> {
    pub name: &'static str,
    pub parse: fn(&Value) -> Option<T>,
}

impl<T> Shape<T> {
    pub const fn new(name: &'static str, parse: fn(&Value) -> Option<T>) -> Self {
        Self { name, parse }
    }
}

pub fn decode_ordered<T>(raw: &Value, shapes: &[Shape<T>]) -> RpcResult<T> {
    shapes
        .iter()
        .find_map(|shape| (shape.parse)(raw))
        .ok_or_else(|| RpcError::Decode {
            shapes: shapes.iter().map(|s| s.name).collect::<Vec<_>>().join(", "),
            raw: truncate(raw.to_string()),
        })
}

fn truncate(mut s: String) -> String {
    const MAX: usize = 256;
    if s.len() > MAX {
        let mut cut = MAX;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

// ── Sync status ──────────────────────────────────────────────────────────────

fn not_syncing(raw: &Value) -> Option<Option<SyncProgress>> {
    match raw {
        Value::Bool(false) => Some(None),
        _ => None,
    }
}

fn progress_object(raw: &Value) -> Option<Option<SyncProgress>> {
    if !raw.is_object() {
        return None;
    }
    serde_json::from_value(raw.clone()).ok().map(Some)
}

const SYNC_SHAPES: &[Shape<Option<SyncProgress>>] = &[
    Shape::new("false", not_syncing),
    Shape::new("sync progress object", progress_object),
];

/// `eth_syncing`: `false` when idle, a progress object while syncing.
pub fn sync_status(raw: &Value) -> RpcResult<Option<SyncProgress>> {
    decode_ordered(raw, SYNC_SHAPES)
}

// ── Quantities ───────────────────────────────────────────────────────────────

fn hex_u64(raw: &Value) -> Option<u64> {
    raw.as_str().and_then(|s| decode_u64(s).ok())
}

fn hex_u128(raw: &Value) -> Option<u128> {
    raw.as_str().and_then(|s| decode_u128(s).ok())
}

fn number_u64(raw: &Value) -> Option<u64> {
    raw.as_u64()
}

fn number_u128(raw: &Value) -> Option<u128> {
    raw.as_u64().map(u128::from)
}

const U64_SHAPES: &[Shape<u64>] = &[
    Shape::new("hex quantity string", hex_u64),
    Shape::new("JSON number", number_u64),
];

const U128_SHAPES: &[Shape<u128>] = &[
    Shape::new("hex quantity string", hex_u128),
    Shape::new("JSON number", number_u128),
];

pub fn quantity(raw: &Value) -> RpcResult<u64> {
    decode_ordered(raw, U64_SHAPES)
}

pub fn big_quantity(raw: &Value) -> RpcResult<u128> {
    decode_ordered(raw, U128_SHAPES)
}

pub fn quantity_list(raw: &Value) -> RpcResult<Vec<u64>> {
    match raw {
        Value::Array(items) => items.iter().map(quantity).collect(),
        other => Err(RpcError::protocol("expected an array of quantities", other)),
    }
}

// ── Plain values ─────────────────────────────────────────────────────────────

pub fn bytes(raw: &Value) -> RpcResult<Vec<u8>> {
    match raw {
        Value::String(s) => Ok(decode_bytes(s)?),
        Value::Null => Ok(Vec::new()),
        other => Err(RpcError::protocol("expected a hex byte string", other)),
    }
}

/// Deserialize a result whose shape is fixed. A mismatch is a protocol error.
pub fn value<T: DeserializeOwned>(raw: Value, what: &'static str) -> RpcResult<T> {
    serde_json::from_value(raw).map_err(|e| RpcError::protocol(what, e))
}

/// Deserialize the result of a lookup. `null` means the entity does not
/// exist and becomes [`RpcError::NotFound`].
pub fn lookup<T: DeserializeOwned>(raw: Value, what: &'static str) -> RpcResult<T> {
    if raw.is_null() {
        return Err(RpcError::NotFound(what));
    }
    value(raw, what)
}

/// Subscription id returned by `eth_subscribe`.
pub fn subscription_id(raw: Value) -> RpcResult<String> {
    subscription_key(&raw)
        .ok_or_else(|| RpcError::protocol("expected a subscription id", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcos_core::BlockHeader;
    use serde_json::json;

    #[test]
    fn false_means_not_syncing() {
        assert_eq!(sync_status(&json!(false)).unwrap(), None);
    }

    #[test]
    fn progress_object_maps_fields() {
        let p = sync_status(&json!({
            "startingBlock": "0x0",
            "currentBlock": "0x10",
            "highestBlock": "0x20",
            "pulledStates": "0x3",
            "knownStates": "0x4"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(p.starting_block, 0);
        assert_eq!(p.current_block, 16);
        assert_eq!(p.highest_block, 32);
        assert_eq!(p.pulled_states, 3);
        assert_eq!(p.known_states, 4);
    }

    #[test]
    fn other_shapes_name_every_attempt() {
        for raw in [json!(true), json!("syncing"), json!({"currentBlock": 1}), json!(null)] {
            match sync_status(&raw) {
                Err(RpcError::Decode { shapes, .. }) => {
                    assert_eq!(shapes, "false, sync progress object")
                }
                other => panic!("{raw} decoded to {other:?}"),
            }
        }
    }

    #[test]
    fn quantities_accept_hex_or_number() {
        assert_eq!(quantity(&json!("0x1f")).unwrap(), 31);
        assert_eq!(quantity(&json!(31)).unwrap(), 31);
        assert!(matches!(quantity(&json!("31")), Err(RpcError::Decode { .. })));
        assert_eq!(big_quantity(&json!("0xde0b6b3a7640000")).unwrap(), 10u128.pow(18));
        assert_eq!(quantity_list(&json!([1, "0x2"])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn null_lookup_is_not_found() {
        let err = lookup::<BlockHeader>(Value::Null, "block header").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "block header not found");
    }

    #[test]
    fn malformed_lookup_is_protocol_error() {
        let err = lookup::<BlockHeader>(json!({"number": []}), "block header").unwrap_err();
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[test]
    fn bytes_null_is_empty() {
        assert_eq!(bytes(&Value::Null).unwrap(), Vec::<u8>::new());
        assert_eq!(bytes(&json!("0x6060")).unwrap(), vec![0x60, 0x60]);
    }
}
