//! Transports carry JSON-RPC requests to the node.
//!
//! [`WsTransport`] keeps one persistent connection and multiplexes calls and
//! subscriptions over it. [`HttpTransport`] does one POST per call and has
//! no subscriptions.

mod http;
mod ws;

pub use http::HttpTransport;
pub use ws::WsTransport;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::RpcResult;

/// A subscription as handed out by a transport: the id the node assigned and
/// the queue its payloads arrive on.
#[derive(Debug)]
pub struct RawSubscription {
    pub id: String,
    pub notifications: mpsc::Receiver<Value>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its result.
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value>;

    /// Open a subscription on `eth_subscribe` with `params` (topic first).
    async fn subscribe(&self, params: Vec<Value>) -> RpcResult<RawSubscription>;

    /// Cancel a subscription on the node and close its local stream.
    async fn unsubscribe(&self, id: &str) -> RpcResult<()>;

    /// Tear the transport down. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}
