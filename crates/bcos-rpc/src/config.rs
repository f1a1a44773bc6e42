use std::path::Path;
use std::time::Duration;

use bcos_core::GroupId;
use serde::{Deserialize, Serialize};

use crate::error::{RpcError, RpcResult};

/// Which transport an endpoint selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    WebSocket,
    Http,
}

/// Client connection settings.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `ws://`/`wss://` for a persistent connection, `http://`/`https://` for
    /// one request per call.
    pub endpoint: String,
    pub group_id: GroupId,
    /// Client-side deadline per call; 0 disables it.
    pub request_timeout_ms: u64,
    /// Capacity of each subscription's notification queue.
    pub subscription_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".into(),
            group_id: GroupId::default(),
            request_timeout_ms: 30_000,
            subscription_buffer: 128,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. The result is validated.
    pub fn load(path: impl AsRef<Path>) -> RpcResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RpcError::Config(format!("reading {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| RpcError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RpcResult<()> {
        self.endpoint_kind()?;
        if self.subscription_buffer == 0 {
            return Err(RpcError::Validation(
                "subscription_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn endpoint_kind(&self) -> RpcResult<EndpointKind> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(RpcError::Validation("endpoint is empty".into()));
        }
        let scheme = endpoint
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase());
        match scheme.as_deref() {
            Some("ws" | "wss") => Ok(EndpointKind::WebSocket),
            Some("http" | "https") => Ok(EndpointKind::Http),
            _ => Err(RpcError::Validation(format!(
                "unsupported endpoint {endpoint:?}; expected ws://, wss://, http:// or https://"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}
