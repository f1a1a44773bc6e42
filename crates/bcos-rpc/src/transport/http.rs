use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{RawSubscription, Transport};
use crate::error::{RpcError, RpcResult};
use crate::types::{RpcRequest, RpcResponse};

/// JSON-RPC over HTTP: one POST per call, no subscriptions.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpTransport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        if self.is_closed() {
            return Err(RpcError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, url = %self.url, "request");

        let resp = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(id, method, &params))
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("posting to {}: {e}", self.url)))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RpcError::Transport(format!("reading response: {e}")))?;
        let reply: RpcResponse = serde_json::from_slice(&body).map_err(|e| {
            if status.is_success() {
                RpcError::protocol("parsing response", e)
            } else {
                RpcError::Transport(format!("HTTP {status}"))
            }
        })?;

        match reply.id() {
            Some(echoed) if echoed == id => reply.into_result(),
            // Errors raised before the node parsed our id echo it as null.
            None if reply.id.is_null() && reply.error.is_some() => reply.into_result(),
            _ => Err(RpcError::Protocol(format!(
                "response id {} does not match request id {id}",
                reply.id
            ))),
        }
    }

    async fn subscribe(&self, _params: Vec<Value>) -> RpcResult<RawSubscription> {
        Err(RpcError::Unsupported("subscriptions"))
    }

    async fn unsubscribe(&self, _id: &str) -> RpcResult<()> {
        Err(RpcError::Unsupported("subscriptions"))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
