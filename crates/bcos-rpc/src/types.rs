//! JSON-RPC 2.0 envelopes exchanged with the node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RpcError, RpcResult};
use crate::methods;

/// Outgoing request.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Response to one request. An absent `result` and `"result": null` are the
/// same thing here.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Correlation id. Numeric strings are accepted as some gateways
    /// stringify ids.
    pub fn id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn into_result(self) -> RpcResult<Value> {
        match self.error {
            Some(e) => Err(RpcError::Remote {
                code: e.code,
                message: e.message,
                data: e.data,
            }),
            None => Ok(self.result),
        }
    }
}

/// `params` of an `eth_subscription` notification.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionNotification {
    pub subscription: Value,
    #[serde(default)]
    pub result: Value,
}

impl SubscriptionNotification {
    pub fn subscription_id(&self) -> Option<String> {
        subscription_key(&self.subscription)
    }
}

/// Normalise a subscription id to the string key the subscription table uses.
pub fn subscription_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An inbound message on a persistent connection.
#[derive(Debug)]
pub enum Incoming {
    Response(RpcResponse),
    Notification(SubscriptionNotification),
    Unrecognized(Value),
}

impl Incoming {
    pub fn classify(value: Value) -> Self {
        if let Some(method) = value.get("method") {
            if method.as_str() != Some(methods::SUBSCRIPTION_NOTIFICATION) {
                return Incoming::Unrecognized(value);
            }
            let params = value.get("params").cloned().unwrap_or(Value::Null);
            return match serde_json::from_value(params) {
                Ok(n) => Incoming::Notification(n),
                Err(_) => Incoming::Unrecognized(value),
            };
        }

        // A missing `result` is the same as `null`, so any id-carrying
        // frame without a method is a response. Null ids only come with
        // errors the node could not attribute to a request.
        let is_response = match value.get("id") {
            Some(Value::Number(_) | Value::String(_)) => true,
            Some(Value::Null) => value.get("error").is_some(),
            _ => false,
        };
        if is_response {
            return match serde_json::from_value(value.clone()) {
                Ok(r) => Incoming::Response(r),
                Err(_) => Incoming::Unrecognized(value),
            };
        }

        Incoming::Unrecognized(value)
    }
}

/// Result object of the group-scoped `call` method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutput {
    #[serde(default)]
    pub current_block_number: Option<String>,
    #[serde(default)]
    pub output: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope_shape() {
        let params = vec![json!(1), json!("0xabc")];
        let req = RpcRequest::new(7, "getCode", &params);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "getCode", "params": [1, "0xabc"]})
        );
    }

    #[test]
    fn null_and_missing_result_are_equivalent() {
        let a: RpcResponse = serde_json::from_value(json!({"id": 1, "result": null})).unwrap();
        let b: RpcResponse = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(1));
        assert_eq!(a.into_result().unwrap(), Value::Null);
        assert_eq!(b.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn reply_without_result_is_a_response() {
        match Incoming::classify(json!({"jsonrpc": "2.0", "id": 9})) {
            Incoming::Response(r) => {
                assert_eq!(r.id(), Some(9));
                assert_eq!(r.into_result().unwrap(), Value::Null);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_object_becomes_remote_error() {
        let r: RpcResponse = serde_json::from_value(
            json!({"id": 3, "error": {"code": -32602, "message": "invalid params"}}),
        )
        .unwrap();
        match r.into_result() {
            Err(RpcError::Remote { code, message, .. }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "invalid params");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_distinguishes_frames() {
        let note = json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {"subscription": "0x9", "result": {"number": "0x1"}}
        });
        match Incoming::classify(note) {
            Incoming::Notification(n) => assert_eq!(n.subscription_id().as_deref(), Some("0x9")),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            Incoming::classify(json!({"jsonrpc": "2.0", "id": 4, "result": "0x1"})),
            Incoming::Response(_)
        ));
        assert!(matches!(
            Incoming::classify(json!({"hello": "world"})),
            Incoming::Unrecognized(_)
        ));
        assert!(matches!(
            Incoming::classify(json!({"jsonrpc": "2.0", "id": 5, "method": "getPeers"})),
            Incoming::Unrecognized(_)
        ));
    }
}
