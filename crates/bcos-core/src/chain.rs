use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quantity::{bytes_hex, opt_u64_hex, u64_hex};
use crate::status::ReceiptStatus;
use crate::types::{Address, BlockNumber, H256};

/// Progress of a node catching up with the network head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    #[serde(with = "u64_hex")]
    pub starting_block: BlockNumber,
    #[serde(with = "u64_hex")]
    pub current_block: BlockNumber,
    #[serde(with = "u64_hex")]
    pub highest_block: BlockNumber,
    #[serde(with = "u64_hex")]
    pub pulled_states: u64,
    #[serde(with = "u64_hex")]
    pub known_states: u64,
}

impl SyncProgress {
    /// Blocks still to import.
    pub fn remaining(&self) -> u64 {
        self.highest_block.saturating_sub(self.current_block)
    }
}

/// Block header as returned by the block lookup and `newHeads` methods.
/// Fields a given node version leaves out decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde(with = "u64_hex")]
    pub number: BlockNumber,
    #[serde(default)]
    pub hash: Option<H256>,
    #[serde(default)]
    pub parent_hash: H256,
    #[serde(default)]
    pub state_root: H256,
    #[serde(default)]
    pub transactions_root: H256,
    #[serde(default)]
    pub receipts_root: H256,
    #[serde(default)]
    pub db_hash: Option<H256>,
    #[serde(default, with = "opt_u64_hex")]
    pub sealer: Option<u64>,
    #[serde(default)]
    pub sealer_list: Vec<String>,
    #[serde(default, with = "u64_hex")]
    pub gas_limit: u64,
    #[serde(default, with = "u64_hex")]
    pub gas_used: u64,
    /// Milliseconds since the Unix epoch.
    #[serde(default, with = "u64_hex")]
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.timestamp).ok()?;
        DateTime::<Utc>::from_timestamp_millis(millis)
    }
}

/// An event log emitted by a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<H256>,
    #[serde(default, with = "bytes_hex")]
    pub data: Vec<u8>,
    #[serde(default, with = "opt_u64_hex")]
    pub block_number: Option<BlockNumber>,
    #[serde(default)]
    pub block_hash: Option<H256>,
    #[serde(default)]
    pub transaction_hash: Option<H256>,
    #[serde(default, with = "opt_u64_hex")]
    pub transaction_index: Option<u64>,
    #[serde(default, with = "opt_u64_hex")]
    pub log_index: Option<u64>,
    #[serde(default)]
    pub removed: bool,
}

/// Transaction receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: H256,
    #[serde(default, with = "u64_hex")]
    pub transaction_index: u64,
    #[serde(default)]
    pub block_hash: H256,
    #[serde(with = "u64_hex")]
    pub block_number: BlockNumber,
    #[serde(default, with = "u64_hex")]
    pub gas_used: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default, with = "bytes_hex")]
    pub input: Vec<u8>,
    #[serde(default, with = "bytes_hex")]
    pub output: Vec<u8>,
    #[serde(default)]
    pub logs: Vec<Log>,
    /// Raw status code, e.g. `"0x0"`.
    pub status: String,
}

impl Receipt {
    pub fn status(&self) -> ReceiptStatus {
        ReceiptStatus::from_code(&self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status() == ReceiptStatus::Success
    }

    /// The deployed contract, if this receipt belongs to a deployment.
    /// Nodes report the zero address for ordinary calls.
    pub fn deployed_contract(&self) -> Option<Address> {
        self.contract_address.filter(|a| *a != Address::default())
    }
}

/// Result of `getTotalTransactionCount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalTransactionCount {
    #[serde(with = "u64_hex")]
    pub tx_sum: u64,
    #[serde(with = "u64_hex")]
    pub block_number: BlockNumber,
    #[serde(default, with = "u64_hex")]
    pub failed_tx_sum: u64,
}
