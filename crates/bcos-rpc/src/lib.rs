//! bcos-rpc
//!
//! Typed JSON-RPC client for FISCO BCOS nodes.
//!
//! Layers, leaves first:
//!   transport    : WebSocket (calls + subscriptions) or HTTP (calls only)
//!   codec        : positional parameter encoding, group id first
//!   decode       : typed decoding, ordered attempts for polymorphic results
//!   subscription : id → bounded queue routing for `eth_subscription`
//!   client       : [`RpcClient`], one method per remote operation

pub mod client;
pub mod codec;
pub mod config;
pub mod decode;
pub mod error;
pub mod methods;
pub mod subscription;
pub mod transport;
pub mod types;

pub use client::RpcClient;
pub use config::{ClientConfig, EndpointKind};
pub use error::{RpcError, RpcResult};
pub use subscription::{Subscription, SubscriptionManager};
pub use transport::{HttpTransport, RawSubscription, Transport, WsTransport};

pub use bcos_core;
