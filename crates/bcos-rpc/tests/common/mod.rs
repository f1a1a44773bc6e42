//! A scripted node on the far side of a channel-backed transport.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bcos_rpc::bcos_core::GroupId;
use bcos_rpc::{RpcClient, Transport, WsTransport};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

const WAIT: Duration = Duration::from_secs(5);

pub struct ScriptedNode {
    requests: mpsc::Receiver<String>,
    frames: mpsc::Sender<String>,
}

impl ScriptedNode {
    /// Next request the client wrote, parsed.
    pub async fn next_request(&mut self) -> Value {
        let frame = tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("client hung up");
        serde_json::from_str(&frame).expect("request is JSON")
    }

    /// Asserts that the client has not written anything.
    pub fn assert_idle(&mut self) {
        match self.requests.try_recv() {
            Err(TryRecvError::Empty) => {}
            other => panic!("unexpected outgoing frame: {other:?}"),
        }
    }

    /// `None` once the client has released its outgoing channel.
    pub async fn request_or_hangup(&mut self) -> Option<Value> {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for the client")
            .map(|frame| serde_json::from_str(&frame).expect("request is JSON"))
    }

    pub async fn send(&self, frame: Value) {
        self.frames
            .send(frame.to_string())
            .await
            .expect("client reader is gone");
    }

    pub async fn send_text(&self, text: &str) {
        self.frames
            .send(text.to_string())
            .await
            .expect("client reader is gone");
    }

    pub async fn reply(&self, id: &Value, result: Value) {
        self.send(json!({"jsonrpc": "2.0", "id": id, "result": result}))
            .await;
    }

    pub async fn reply_error(&self, id: &Value, code: i64, message: &str) {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .await;
    }

    pub async fn notify(&self, subscription: &str, result: Value) {
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {"subscription": subscription, "result": result}
        }))
        .await;
    }

    /// Simulate the node dropping the connection.
    pub fn hang_up(self) {}
}

/// A transport wired to a scripted node, and a client for `group` over it.
pub fn connect(group: u32, buffer: usize) -> (Arc<WsTransport>, RpcClient, ScriptedNode) {
    let (out_tx, out_rx) = mpsc::channel(64);
    let (in_tx, in_rx) = mpsc::channel(64);
    let transport = Arc::new(WsTransport::from_channels(out_tx, in_rx, buffer));
    let client = RpcClient::new(
        Arc::clone(&transport) as Arc<dyn Transport>,
        GroupId(group),
    );
    let node = ScriptedNode {
        requests: out_rx,
        frames: in_tx,
    };
    (transport, client, node)
}

pub fn header(number: u64) -> Value {
    json!({
        "number": format!("{number:#x}"),
        "hash": format!("0x{:064x}", number),
        "parentHash": format!("0x{:064x}", number.saturating_sub(1)),
        "timestamp": "0x17a3e5c1f00"
    })
}
