//! Subscription routing.
//!
//! [`SubscriptionManager`] maps subscription ids to bounded delivery queues.
//! The table sits behind a single lock so register, deliver and remove never
//! interleave inconsistently; the lock is never held across an await.
//!
//! Backpressure: each subscription has a bounded queue and delivery waits
//! for space when it is full. Nothing is dropped and per-subscription order
//! is preserved, at the cost of stalling the connection's reader while a
//! consumer lags.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{RpcError, RpcResult};
use crate::transport::{RawSubscription, Transport};

/// Outcome of routing one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    UnknownSubscription,
    /// The consumer dropped its stream; the entry has been removed.
    ConsumerGone,
}

#[derive(Default)]
struct Table {
    streams: HashMap<String, mpsc::Sender<Value>>,
    closed: bool,
}

#[derive(Default)]
pub struct SubscriptionManager {
    table: Mutex<Table>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delivery queue. After [`close_all`](Self::close_all) the
    /// sink is dropped straight away, which ends its stream.
    pub fn register(&self, id: String, sink: mpsc::Sender<Value>) -> bool {
        let mut table = self.table.lock();
        if table.closed {
            return false;
        }
        if table.streams.insert(id.clone(), sink).is_some() {
            warn!(subscription = %id, "subscription id reused; previous stream closed");
        }
        true
    }

    /// Route one notification, waiting for queue space if needed.
    pub async fn deliver(&self, id: &str, payload: Value) -> Delivery {
        let sink = self.table.lock().streams.get(id).cloned();
        let Some(sink) = sink else {
            return Delivery::UnknownSubscription;
        };
        match sink.send(payload).await {
            Ok(()) => Delivery::Delivered,
            // Whoever removes the entry owns the remote cancel.
            Err(_) if self.remove(id) => Delivery::ConsumerGone,
            Err(_) => Delivery::UnknownSubscription,
        }
    }

    /// Drop the mapping, closing the stream. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.table.lock().streams.remove(id).is_some()
    }

    /// Close every stream and refuse later registrations. Returns how many
    /// streams were closed; a second call closes none.
    pub fn close_all(&self) -> usize {
        let drained = {
            let mut table = self.table.lock();
            table.closed = true;
            std::mem::take(&mut table.streams)
        };
        drained.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.lock().streams.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.table.lock().streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live, typed notification stream.
///
/// Yields `None` once the subscription is cancelled or the connection is
/// closed. A payload that does not decode as `T` is yielded as an error
/// and the stream continues.
pub struct Subscription<T> {
    id: String,
    notifications: mpsc::Receiver<Value>,
    transport: Arc<dyn Transport>,
    request_timeout: Option<Duration>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    /// `request_timeout` bounds [`unsubscribe`](Self::unsubscribe).
    pub fn new(
        raw: RawSubscription,
        transport: Arc<dyn Transport>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            id: raw.id,
            notifications: raw.notifications,
            transport,
            request_timeout,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn next(&mut self) -> Option<RpcResult<T>> {
        let payload = self.notifications.recv().await?;
        Some(decode_payload(payload))
    }

    /// Cancel on the node and close the local stream.
    pub async fn unsubscribe(self) -> RpcResult<()> {
        let Subscription {
            id,
            notifications,
            transport,
            request_timeout,
            ..
        } = self;
        // The reader may be parked on this full queue; it must be released
        // before it can read the unsubscribe reply.
        drop(notifications);

        let cancel = transport.unsubscribe(&id);
        match request_timeout {
            Some(limit) => tokio::time::timeout(limit, cancel)
                .await
                .map_err(|_| RpcError::Timeout(limit))?,
            None => cancel.await,
        }
    }
}

fn decode_payload<T: DeserializeOwned>(payload: Value) -> RpcResult<T> {
    serde_json::from_value(payload).map_err(|e| RpcError::protocol("notification payload", e))
}

impl<T: DeserializeOwned> Stream for Subscription<T> {
    type Item = RpcResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut()
            .notifications
            .poll_recv(cx)
            .map(|item| item.map(decode_payload))
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
