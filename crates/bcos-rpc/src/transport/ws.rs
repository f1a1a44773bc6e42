//! Persistent-connection transport.
//!
//! One reader task owns every inbound frame: responses are matched to their
//! waiter by id through the pending table, notifications are routed through
//! the [`SubscriptionManager`]. Outbound frames go through a channel to a
//! writer task, so callers never touch the socket directly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{RawSubscription, Transport};
use crate::decode;
use crate::error::{RpcError, RpcResult};
use crate::methods;
use crate::subscription::{Delivery, SubscriptionManager};
use crate::types::{Incoming, RpcRequest, RpcResponse, SubscriptionNotification};

const OUTGOING_BUFFER: usize = 256;
const INCOMING_BUFFER: usize = 256;

enum Pending {
    Call(oneshot::Sender<RpcResult<Value>>),
    /// Carries the subscription's sink so the reader can register it before
    /// it processes any notification that follows the reply.
    Subscribe {
        sink: mpsc::Sender<Value>,
        reply: oneshot::Sender<RpcResult<String>>,
    },
}

impl Pending {
    fn fail(self, err: RpcError) {
        match self {
            Pending::Call(reply) => {
                let _ = reply.send(Err(err));
            }
            Pending::Subscribe { reply, .. } => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

/// Removes its pending entry when the waiting call is dropped or finishes.
struct PendingGuard<'a> {
    pending: &'a DashMap<u64, Pending>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

struct Inner {
    next_id: AtomicU64,
    pending: DashMap<u64, Pending>,
    subscriptions: SubscriptionManager,
    /// Taken on close; dropping it lets the writer flush and exit.
    outgoing: Mutex<Option<mpsc::Sender<String>>>,
    closed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    subscription_buffer: usize,
}

impl Inner {
    fn register(&self, entry: Pending) -> RpcResult<(u64, PendingGuard<'_>)> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RpcError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(id, entry);
        let guard = PendingGuard {
            pending: &self.pending,
            id,
        };
        // A close that ran between the check and the insert has already
        // drained the table; the guard removes our entry.
        if self.closed.load(Ordering::SeqCst) {
            return Err(RpcError::Closed);
        }
        Ok((id, guard))
    }

    fn sender(&self) -> RpcResult<mpsc::Sender<String>> {
        self.outgoing.lock().clone().ok_or(RpcError::Closed)
    }

    async fn send(&self, frame: String) -> RpcResult<()> {
        self.sender()?
            .send(frame)
            .await
            .map_err(|_| RpcError::Closed)
    }

    /// Fire-and-forget `eth_unsubscribe`, used from the reader where waiting
    /// on the reply would deadlock. The reply is discarded as unknown.
    fn cancel_remote(&self, subscription: &str) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params = [Value::from(subscription)];
        let Ok(frame) = encode(id, methods::UNSUBSCRIBE, &params) else {
            return;
        };
        if let Ok(tx) = self.sender() {
            if tx.try_send(frame).is_err() {
                debug!(subscription, "could not queue unsubscribe");
            }
        }
    }

    async fn dispatch(&self, value: Value) {
        match Incoming::classify(value) {
            Incoming::Response(resp) => self.complete(resp),
            Incoming::Notification(note) => self.route(note).await,
            Incoming::Unrecognized(frame) => {
                debug!(%frame, "ignoring unrecognized frame");
            }
        }
    }

    fn complete(&self, resp: RpcResponse) {
        let Some(id) = resp.id() else {
            warn!(id = %resp.id, "response without a usable id");
            return;
        };
        let Some((_, waiter)) = self.pending.remove(&id) else {
            debug!(id, "discarding response for unknown or cancelled request");
            return;
        };
        match waiter {
            Pending::Call(reply) => {
                let _ = reply.send(resp.into_result());
            }
            Pending::Subscribe { sink, reply } => {
                let sub_id = match resp.into_result().and_then(decode::subscription_id) {
                    Ok(sub_id) => sub_id,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return;
                    }
                };
                if !self.subscriptions.register(sub_id.clone(), sink) {
                    let _ = reply.send(Err(RpcError::Closed));
                    return;
                }
                if reply.send(Ok(sub_id.clone())).is_err() {
                    debug!(subscription = %sub_id, "subscriber went away before confirmation");
                    self.subscriptions.remove(&sub_id);
                    self.cancel_remote(&sub_id);
                }
            }
        }
    }

    async fn route(&self, note: SubscriptionNotification) {
        let Some(id) = note.subscription_id() else {
            warn!(subscription = %note.subscription, "notification with a malformed subscription id");
            return;
        };
        match self.subscriptions.deliver(&id, note.result).await {
            Delivery::Delivered => {}
            Delivery::UnknownSubscription => {
                debug!(subscription = %id, "notification for unknown subscription discarded");
            }
            Delivery::ConsumerGone => {
                debug!(subscription = %id, "subscription stream dropped; cancelling");
                self.cancel_remote(&id);
            }
        }
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.outgoing.lock().take();

        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        let failed = ids
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .map(|(_, waiter)| waiter.fail(RpcError::Closed))
            .count();
        let streams = self.subscriptions.close_all();

        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        info!(failed, streams, "transport closed");
    }
}

fn encode(id: u64, method: &str, params: &[Value]) -> RpcResult<String> {
    serde_json::to_string(&RpcRequest::new(id, method, params))
        .map_err(|e| RpcError::protocol("encoding request", e))
}

async fn read_loop(inner: Arc<Inner>, mut incoming: mpsc::Receiver<String>) {
    while let Some(frame) = incoming.recv().await {
        match serde_json::from_str::<Value>(&frame) {
            Ok(Value::Array(batch)) => {
                for value in batch {
                    inner.dispatch(value).await;
                }
            }
            Ok(value) => inner.dispatch(value).await,
            Err(e) => warn!(error = %e, "discarding malformed frame"),
        }
    }
    debug!("inbound stream ended");
    inner.shutdown();
}

/// JSON-RPC over a persistent, full-duplex connection.
///
/// Dropping the transport closes it.
pub struct WsTransport {
    inner: Arc<Inner>,
}

impl WsTransport {
    /// Open a WebSocket connection to `url`.
    pub async fn connect(url: &str, subscription_buffer: usize) -> RpcResult<Self> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RpcError::Transport(format!("connecting to {url}: {e}")))?;
        info!(url, "websocket connected");

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTGOING_BUFFER);
        let (in_tx, in_rx) = mpsc::channel::<String>(INCOMING_BUFFER);

        // The writer is not aborted on close: it drains what was queued, then
        // sends a close frame once the outgoing channel is dropped.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    warn!(error = %e, "websocket write failed");
                    return;
                }
            }
            let _ = sink.close().await;
        });

        let pump = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "discarding non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "node closed the connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "websocket read failed");
                        break;
                    }
                };
                if in_tx.send(text).await.is_err() {
                    break;
                }
            }
        });

        let transport = Self::from_channels(out_tx, in_rx, subscription_buffer);
        transport.inner.tasks.lock().push(pump);
        Ok(transport)
    }

    /// Build the transport over plain frame channels: requests are written
    /// to `outgoing`, responses and notifications are read from `incoming`.
    /// The end of `incoming` closes the transport.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_channels(
        outgoing: mpsc::Sender<String>,
        incoming: mpsc::Receiver<String>,
        subscription_buffer: usize,
    ) -> Self {
        let inner = Arc::new(Inner {
            next_id: AtomicU64::new(1),
            pending: DashMap::new(),
            subscriptions: SubscriptionManager::new(),
            outgoing: Mutex::new(Some(outgoing)),
            closed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            subscription_buffer: subscription_buffer.max(1),
        });
        let reader = tokio::spawn(read_loop(Arc::clone(&inner), incoming));
        inner.tasks.lock().push(reader);
        Self { inner }
    }

    /// Requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.subscriptions.len()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let (reply, response) = oneshot::channel();
        let (id, _guard) = self.inner.register(Pending::Call(reply))?;
        debug!(id, method, "request");
        self.inner.send(encode(id, method, &params)?).await?;
        response.await.map_err(|_| RpcError::Closed)?
    }

    async fn subscribe(&self, params: Vec<Value>) -> RpcResult<RawSubscription> {
        let (sink, notifications) = mpsc::channel(self.inner.subscription_buffer);
        let (reply, confirmation) = oneshot::channel();
        let (id, _guard) = self.inner.register(Pending::Subscribe { sink, reply })?;
        debug!(id, topic = ?params.first(), "subscribe");
        self.inner
            .send(encode(id, methods::SUBSCRIBE, &params)?)
            .await?;
        let sub_id = confirmation.await.map_err(|_| RpcError::Closed)??;
        Ok(RawSubscription {
            id: sub_id,
            notifications,
        })
    }

    async fn unsubscribe(&self, id: &str) -> RpcResult<()> {
        if !self.inner.subscriptions.remove(id) {
            debug!(subscription = id, "unsubscribing an id with no local stream");
        }
        let acknowledged = self
            .call(methods::UNSUBSCRIBE, vec![Value::from(id)])
            .await?;
        if acknowledged == Value::Bool(false) {
            debug!(subscription = id, "node did not know the subscription");
        }
        Ok(())
    }

    fn close(&self) {
        self.inner.shutdown();
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("pending", &self.inner.pending.len())
            .field("subscriptions", &self.inner.subscriptions.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
