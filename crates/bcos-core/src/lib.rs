//! bcos-core
//!
//! Domain types shared by the bcos client crates: addresses and hashes,
//! group and block references, call/filter inputs, the chain objects a node
//! returns (headers, receipts, logs, sync progress) and receipt status codes.
//!
//! Nothing in here performs I/O.

pub mod chain;
pub mod error;
pub mod quantity;
pub mod query;
pub mod status;
pub mod types;

pub use chain::{BlockHeader, Log, Receipt, SyncProgress, TotalTransactionCount};
pub use error::CoreError;
pub use query::{CallMessage, FilterQuery};
pub use status::ReceiptStatus;
pub use types::*;
