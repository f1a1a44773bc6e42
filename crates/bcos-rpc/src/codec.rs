//! Wire encoding of call arguments.
//!
//! Every positional parameter list sent to the node is built here, so the
//! ordering rules live in one place: group-scoped methods put the group id
//! first, subscriptions put the topic first.

use bcos_core::quantity::{encode_bytes, encode_u128, encode_u64};
use bcos_core::{BlockReference, CallMessage, FilterQuery, GroupId};
use serde_json::{json, Map, Value};

use crate::error::{RpcError, RpcResult};

/// Encode an optional block reference; `None` is the `"latest"` tag.
pub fn block_ref(block: Option<&BlockReference>) -> Value {
    match block {
        None => Value::from("latest"),
        Some(BlockReference::Number(n)) => Value::from(encode_u64(*n)),
        Some(BlockReference::Hash(h)) => Value::from(h.to_hex()),
        Some(tag) => Value::from(tag.tag().unwrap_or("latest")),
    }
}

pub fn quantity(n: u64) -> Value {
    Value::from(encode_u64(n))
}

pub fn bytes(data: &[u8]) -> Value {
    Value::from(encode_bytes(data))
}

/// Encode a call message. Unset or zero optional fields are left out.
pub fn call_arg(msg: &CallMessage) -> Value {
    let mut arg = Map::new();
    arg.insert("from".into(), Value::from(msg.from.to_hex()));
    arg.insert("to".into(), Value::from(msg.to.to_hex()));
    if !msg.data.is_empty() {
        arg.insert("data".into(), bytes(&msg.data));
    }
    if let Some(value) = msg.value.filter(|v| *v != 0) {
        arg.insert("value".into(), Value::from(encode_u128(value)));
    }
    if msg.gas != 0 {
        arg.insert("gas".into(), quantity(msg.gas));
    }
    if let Some(price) = msg.gas_price.filter(|p| *p != 0) {
        arg.insert("gasPrice".into(), Value::from(encode_u128(price)));
    }
    Value::Object(arg)
}

fn range_bound(bound: Option<&BlockReference>, name: &str) -> RpcResult<()> {
    match bound {
        Some(BlockReference::Hash(_)) => Err(RpcError::Validation(format!(
            "{name} must be a block number or tag, not a hash (use block_hash instead)"
        ))),
        _ => Ok(()),
    }
}

/// Encode a log filter.
///
/// With a block hash only `blockHash` is emitted; setting either range bound
/// as well is rejected. Otherwise `fromBlock` defaults to `0x0` and `toBlock`
/// to `"latest"`.
pub fn filter_arg(q: &FilterQuery) -> RpcResult<Value> {
    let topics: Vec<Value> = q
        .topics
        .iter()
        .map(|alternatives| match alternatives.as_slice() {
            [] => Value::Null,
            hashes => Value::Array(hashes.iter().map(|h| Value::from(h.to_hex())).collect()),
        })
        .collect();

    let mut arg = Map::new();
    arg.insert(
        "address".into(),
        Value::Array(q.addresses.iter().map(|a| Value::from(a.to_hex())).collect()),
    );
    arg.insert("topics".into(), Value::Array(topics));

    match &q.block_hash {
        Some(hash) => {
            if q.has_range() {
                return Err(RpcError::Validation(
                    "cannot specify both block_hash and from_block/to_block".into(),
                ));
            }
            arg.insert("blockHash".into(), Value::from(hash.to_hex()));
        }
        None => {
            range_bound(q.from_block.as_ref(), "from_block")?;
            range_bound(q.to_block.as_ref(), "to_block")?;
            let from = match &q.from_block {
                None => Value::from("0x0"),
                Some(b) => block_ref(Some(b)),
            };
            arg.insert("fromBlock".into(), from);
            arg.insert("toBlock".into(), block_ref(q.to_block.as_ref()));
        }
    }
    Ok(Value::Object(arg))
}

/// Parameters of a group-scoped method: the group id, then `rest` in order.
pub fn group_params(group: GroupId, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
    std::iter::once(json!(group.get())).chain(rest).collect()
}

/// Parameters of `eth_subscribe`: the topic, then `rest` in order.
pub fn subscribe_params(topic: &str, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
    std::iter::once(Value::from(topic)).chain(rest).collect()
}
