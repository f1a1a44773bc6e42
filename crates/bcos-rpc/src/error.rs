use std::time::Duration;

use bcos_core::{CoreError, ReceiptStatus};
use serde_json::Value;
use thiserror::Error;

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, Clone, Error)]
pub enum RpcError {
    // ── Transport ────────────────────────────────────────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    Closed,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),

    // ── Node replies ─────────────────────────────────────────────────────────
    #[error("node returned error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("contract call failed: {status}")]
    CallFailed { status: ReceiptStatus, output: Vec<u8> },

    #[error("{0} not found")]
    NotFound(&'static str),

    // ── Local checks ─────────────────────────────────────────────────────────
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("response matched none of [{shapes}]: {raw}")]
    Decode { shapes: String, raw: String },

    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),
}

impl RpcError {
    /// Connection-level failures. Whether to retry is the caller's decision.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::Transport(_) | RpcError::Closed | RpcError::Timeout(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::NotFound(_))
    }

    pub(crate) fn protocol(context: &str, err: impl std::fmt::Display) -> Self {
        RpcError::Protocol(format!("{context}: {err}"))
    }
}

impl From<CoreError> for RpcError {
    fn from(e: CoreError) -> Self {
        RpcError::Protocol(e.to_string())
    }
}
