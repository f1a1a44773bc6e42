//! The typed client.
//!
//! Each operation encodes its arguments through [`crate::codec`], issues
//! exactly one transport call and decodes the result through
//! [`crate::decode`]. Argument errors are raised before anything is sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bcos_core::quantity::decode_bytes;
use bcos_core::{
    Address, BlockHeader, BlockReference, CallMessage, FilterQuery, GroupId, Log, Receipt,
    ReceiptStatus, SyncProgress, TotalTransactionCount, H256,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::codec;
use crate::config::{ClientConfig, EndpointKind};
use crate::decode;
use crate::error::{RpcError, RpcResult};
use crate::methods;
use crate::subscription::Subscription;
use crate::transport::{HttpTransport, Transport, WsTransport};
use crate::types::CallOutput;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC client bound to one group.
///
/// The group id is fixed at construction. [`with_group`](Self::with_group)
/// returns a second client for another group over the same connection.
/// Clones share the transport, so [`close`](Self::close) affects all of them.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    group: GroupId,
    request_timeout: Option<Duration>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>, group: GroupId) -> Self {
        Self {
            transport,
            group,
            request_timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Connect using `config`; the endpoint scheme picks the transport.
    pub async fn dial(config: &ClientConfig) -> RpcResult<Self> {
        config.validate()?;
        let transport: Arc<dyn Transport> = match config.endpoint_kind()? {
            EndpointKind::WebSocket => {
                let connect = WsTransport::connect(&config.endpoint, config.subscription_buffer);
                let ws = match config.request_timeout() {
                    Some(limit) => tokio::time::timeout(limit, connect)
                        .await
                        .map_err(|_| RpcError::Timeout(limit))??,
                    None => connect.await?,
                };
                Arc::new(ws)
            }
            EndpointKind::Http => Arc::new(HttpTransport::new(&config.endpoint)),
        };
        Ok(Self::new(transport, config.group_id).with_timeout(config.request_timeout()))
    }

    /// Per-call deadline; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn group_id(&self) -> GroupId {
        self.group
    }

    /// A client for `group` sharing this client's transport and timeout.
    pub fn with_group(&self, group: GroupId) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            group,
            request_timeout: self.request_timeout,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn close(&self) {
        self.transport.close();
    }

    /// Issue an arbitrary method; the raw `result` is returned undecoded.
    pub async fn call_raw(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.request(method, params).await
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.with_deadline(self.transport.call(method, params)).await
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = RpcResult<T>>) -> RpcResult<T> {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RpcError::Timeout(limit))?,
            None => fut.await,
        }
    }

    async fn group_request(&self, method: &str, rest: Vec<Value>) -> RpcResult<Value> {
        self.request(method, codec::group_params(self.group, rest))
            .await
    }

    async fn subscribe<T: DeserializeOwned>(
        &self,
        topic: &str,
        rest: Vec<Value>,
    ) -> RpcResult<Subscription<T>> {
        let raw = self
            .with_deadline(self.transport.subscribe(codec::subscribe_params(topic, rest)))
            .await?;
        debug!(subscription = %raw.id, topic, "subscribed");
        Ok(Subscription::new(
            raw,
            Arc::clone(&self.transport),
            self.request_timeout,
        ))
    }

    // ── Chain ────────────────────────────────────────────────────────────────

    pub async fn chain_id(&self) -> RpcResult<u128> {
        let raw = self.request(methods::CHAIN_ID, vec![]).await?;
        decode::big_quantity(&raw)
    }

    /// Network id from `net_version`, which the node reports as a decimal
    /// string.
    pub async fn network_id(&self) -> RpcResult<u64> {
        let raw = self.request(methods::NET_VERSION, vec![]).await?;
        let version: String = decode::value(raw, "net_version result")?;
        version
            .parse()
            .map_err(|e| RpcError::protocol(&format!("invalid net_version result {version:?}"), e))
    }

    pub async fn header_by_hash(&self, hash: H256) -> RpcResult<BlockHeader> {
        let raw = self
            .request(methods::BLOCK_BY_HASH, vec![Value::from(hash.to_hex()), Value::Bool(false)])
            .await?;
        decode::lookup(raw, "block header")
    }

    /// Header of a block by number or tag; `None` is the latest block.
    pub async fn header_by_number(&self, block: Option<BlockReference>) -> RpcResult<BlockHeader> {
        if let Some(BlockReference::Hash(_)) = block {
            return Err(RpcError::Validation(
                "header_by_number takes a number or tag; use header_by_hash".into(),
            ));
        }
        let raw = self
            .request(
                methods::BLOCK_BY_NUMBER,
                vec![codec::block_ref(block.as_ref()), Value::Bool(false)],
            )
            .await?;
        decode::lookup(raw, "block header")
    }

    /// Number of transactions in the block with `block_hash`.
    pub async fn transaction_count(&self, block_hash: H256) -> RpcResult<u64> {
        let raw = self
            .request(methods::BLOCK_TX_COUNT_BY_HASH, vec![Value::from(block_hash.to_hex())])
            .await?;
        decode::quantity(&raw)
    }

    pub async fn pending_transaction_count(&self) -> RpcResult<u64> {
        let raw = self
            .request(methods::BLOCK_TX_COUNT_BY_NUMBER, vec![Value::from("pending")])
            .await?;
        decode::quantity(&raw)
    }

    pub async fn transaction_receipt(&self, tx_hash: H256) -> RpcResult<Receipt> {
        let raw = self
            .request(methods::TRANSACTION_RECEIPT, vec![Value::from(tx_hash.to_hex())])
            .await?;
        decode::lookup(raw, "transaction receipt")
    }

    /// `None` when the node is not syncing.
    pub async fn sync_progress(&self) -> RpcResult<Option<SyncProgress>> {
        let raw = self.request(methods::SYNCING, vec![]).await?;
        decode::sync_status(&raw)
    }

    pub async fn subscribe_new_head(&self) -> RpcResult<Subscription<BlockHeader>> {
        self.subscribe(methods::TOPIC_NEW_HEADS, vec![]).await
    }

    // ── Account state ────────────────────────────────────────────────────────

    pub async fn balance_at(
        &self,
        account: Address,
        block: Option<BlockReference>,
    ) -> RpcResult<u128> {
        let raw = self
            .request(
                methods::BALANCE,
                vec![Value::from(account.to_hex()), codec::block_ref(block.as_ref())],
            )
            .await?;
        decode::big_quantity(&raw)
    }

    pub async fn pending_balance_at(&self, account: Address) -> RpcResult<u128> {
        self.balance_at(account, Some(BlockReference::Pending))
            .await
    }

    pub async fn storage_at(
        &self,
        account: Address,
        key: H256,
        block: Option<BlockReference>,
    ) -> RpcResult<Vec<u8>> {
        let raw = self
            .request(
                methods::STORAGE_AT,
                vec![
                    Value::from(account.to_hex()),
                    Value::from(key.to_hex()),
                    codec::block_ref(block.as_ref()),
                ],
            )
            .await?;
        decode::bytes(&raw)
    }

    pub async fn pending_storage_at(&self, account: Address, key: H256) -> RpcResult<Vec<u8>> {
        self.storage_at(account, key, Some(BlockReference::Pending))
            .await
    }

    pub async fn nonce_at(&self, account: Address, block: Option<BlockReference>) -> RpcResult<u64> {
        let raw = self
            .request(
                methods::NONCE,
                vec![Value::from(account.to_hex()), codec::block_ref(block.as_ref())],
            )
            .await?;
        decode::quantity(&raw)
    }

    /// The nonce to use for the account's next transaction.
    pub async fn pending_nonce_at(&self, account: Address) -> RpcResult<u64> {
        self.nonce_at(account, Some(BlockReference::Pending)).await
    }

    /// Contract code at `account`. An account without code is
    /// [`RpcError::NotFound`]; use [`code`](Self::code) to accept it.
    ///
    /// The node serves code from its latest state only.
    pub async fn code_at(&self, account: Address) -> RpcResult<Vec<u8>> {
        let code = self.code(account).await?;
        if code.is_empty() {
            return Err(RpcError::NotFound("contract code"));
        }
        Ok(code)
    }

    pub async fn pending_code_at(&self, account: Address) -> RpcResult<Vec<u8>> {
        self.code_at(account).await
    }

    // ── Logs ─────────────────────────────────────────────────────────────────

    pub async fn filter_logs(&self, query: &FilterQuery) -> RpcResult<Vec<Log>> {
        let arg = codec::filter_arg(query)?;
        let raw = self.request(methods::LOGS, vec![arg]).await?;
        if raw.is_null() {
            return Ok(Vec::new());
        }
        decode::value(raw, "log list")
    }

    pub async fn subscribe_filter_logs(&self, query: &FilterQuery) -> RpcResult<Subscription<Log>> {
        let arg = codec::filter_arg(query)?;
        self.subscribe(methods::TOPIC_LOGS, vec![arg]).await
    }

    // ── Execution ────────────────────────────────────────────────────────────

    /// Run `msg` on the node without committing it and return its output.
    /// A non-zero execution status is [`RpcError::CallFailed`].
    pub async fn call_contract(&self, msg: &CallMessage) -> RpcResult<Vec<u8>> {
        let raw = self
            .group_request(methods::CALL, vec![codec::call_arg(msg)])
            .await?;
        let out: CallOutput = decode::lookup(raw, "call result")?;
        let output = decode_bytes(&out.output)?;
        match ReceiptStatus::from_code(&out.status) {
            ReceiptStatus::Success => Ok(output),
            status => Err(RpcError::CallFailed { status, output }),
        }
    }

    /// The node executes calls against its latest state only.
    pub async fn pending_call_contract(&self, msg: &CallMessage) -> RpcResult<Vec<u8>> {
        self.call_contract(msg).await
    }

    pub async fn suggest_gas_price(&self) -> RpcResult<u128> {
        let raw = self.request(methods::GAS_PRICE, vec![]).await?;
        decode::big_quantity(&raw)
    }

    pub async fn estimate_gas(&self, msg: &CallMessage) -> RpcResult<u64> {
        let raw = self
            .request(methods::ESTIMATE_GAS, vec![codec::call_arg(msg)])
            .await?;
        decode::quantity(&raw)
    }

    /// Submit an already signed, encoded transaction. Returns its hash.
    pub async fn send_raw_transaction(&self, signed: &[u8]) -> RpcResult<H256> {
        if signed.is_empty() {
            return Err(RpcError::Validation("signed transaction is empty".into()));
        }
        let raw = self
            .group_request(methods::SEND_RAW_TRANSACTION, vec![codec::bytes(signed)])
            .await?;
        decode::value(raw, "transaction hash")
    }

    // ── Node ─────────────────────────────────────────────────────────────────

    pub async fn client_version(&self) -> RpcResult<Value> {
        self.request(methods::CLIENT_VERSION, vec![]).await
    }

    /// Groups this node belongs to.
    pub async fn group_list(&self) -> RpcResult<Vec<GroupId>> {
        let raw = self.request(methods::GROUP_LIST, vec![]).await?;
        decode::quantity_list(&raw)?
            .into_iter()
            .map(|id| {
                u32::try_from(id)
                    .map(GroupId)
                    .map_err(|_| RpcError::Protocol(format!("group id {id} out of range")))
            })
            .collect()
    }

    // ── Group-scoped ─────────────────────────────────────────────────────────

    pub async fn block_number(&self) -> RpcResult<u64> {
        let raw = self.group_request(methods::BLOCK_NUMBER, vec![]).await?;
        decode::quantity(&raw)
    }

    pub async fn pbft_view(&self) -> RpcResult<u64> {
        let raw = self.group_request(methods::PBFT_VIEW, vec![]).await?;
        decode::quantity(&raw)
    }

    pub async fn sealer_list(&self) -> RpcResult<Vec<String>> {
        let raw = self.group_request(methods::SEALER_LIST, vec![]).await?;
        decode::value(raw, "sealer list")
    }

    pub async fn observer_list(&self) -> RpcResult<Vec<String>> {
        let raw = self.group_request(methods::OBSERVER_LIST, vec![]).await?;
        decode::value(raw, "observer list")
    }

    pub async fn node_id_list(&self) -> RpcResult<Vec<String>> {
        let raw = self.group_request(methods::NODE_ID_LIST, vec![]).await?;
        decode::value(raw, "node id list")
    }

    pub async fn group_peers(&self) -> RpcResult<Vec<String>> {
        let raw = self.group_request(methods::GROUP_PEERS, vec![]).await?;
        decode::value(raw, "group peer list")
    }

    pub async fn consensus_status(&self) -> RpcResult<Value> {
        self.group_request(methods::CONSENSUS_STATUS, vec![]).await
    }

    pub async fn sync_status(&self) -> RpcResult<Value> {
        self.group_request(methods::SYNC_STATUS, vec![]).await
    }

    pub async fn peers(&self) -> RpcResult<Value> {
        self.group_request(methods::PEERS, vec![]).await
    }

    pub async fn block_by_hash(&self, hash: H256, include_transactions: bool) -> RpcResult<Value> {
        let raw = self
            .group_request(
                methods::GROUP_BLOCK_BY_HASH,
                vec![Value::from(hash.to_hex()), Value::Bool(include_transactions)],
            )
            .await?;
        decode::lookup(raw, "block")
    }

    pub async fn block_by_number(&self, number: u64, include_transactions: bool) -> RpcResult<Value> {
        let raw = self
            .group_request(
                methods::GROUP_BLOCK_BY_NUMBER,
                vec![codec::quantity(number), Value::Bool(include_transactions)],
            )
            .await?;
        decode::lookup(raw, "block")
    }

    pub async fn block_hash_by_number(&self, number: u64) -> RpcResult<H256> {
        let raw = self
            .group_request(methods::BLOCK_HASH_BY_NUMBER, vec![codec::quantity(number)])
            .await?;
        decode::lookup(raw, "block hash")
    }

    pub async fn transaction_by_hash(&self, hash: H256) -> RpcResult<Value> {
        let raw = self
            .group_request(methods::TRANSACTION_BY_HASH, vec![Value::from(hash.to_hex())])
            .await?;
        decode::lookup(raw, "transaction")
    }

    pub async fn transaction_by_block_hash_and_index(
        &self,
        block_hash: H256,
        index: u64,
    ) -> RpcResult<Value> {
        let raw = self
            .group_request(
                methods::TRANSACTION_BY_BLOCK_HASH_AND_INDEX,
                vec![Value::from(block_hash.to_hex()), codec::quantity(index)],
            )
            .await?;
        decode::lookup(raw, "transaction")
    }

    pub async fn transaction_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> RpcResult<Value> {
        let raw = self
            .group_request(
                methods::TRANSACTION_BY_BLOCK_NUMBER_AND_INDEX,
                vec![codec::quantity(number), codec::quantity(index)],
            )
            .await?;
        decode::lookup(raw, "transaction")
    }

    /// Receipt through the group-scoped method.
    pub async fn group_transaction_receipt(&self, tx_hash: H256) -> RpcResult<Receipt> {
        let raw = self
            .group_request(methods::GROUP_TRANSACTION_RECEIPT, vec![Value::from(tx_hash.to_hex())])
            .await?;
        decode::lookup(raw, "transaction receipt")
    }

    pub async fn pending_transactions(&self) -> RpcResult<Vec<Value>> {
        let raw = self
            .group_request(methods::PENDING_TRANSACTIONS, vec![])
            .await?;
        if raw.is_null() {
            return Ok(Vec::new());
        }
        decode::value(raw, "pending transaction list")
    }

    pub async fn pending_tx_size(&self) -> RpcResult<u64> {
        let raw = self.group_request(methods::PENDING_TX_SIZE, vec![]).await?;
        decode::quantity(&raw)
    }

    /// Contract code at `account`; empty when there is none.
    pub async fn code(&self, account: Address) -> RpcResult<Vec<u8>> {
        let raw = self
            .group_request(methods::CODE, vec![Value::from(account.to_hex())])
            .await?;
        decode::bytes(&raw)
    }

    pub async fn total_transaction_count(&self) -> RpcResult<TotalTransactionCount> {
        let raw = self
            .group_request(methods::TOTAL_TRANSACTION_COUNT, vec![])
            .await?;
        decode::value(raw, "total transaction count")
    }

    /// A system configuration value such as `tx_count_limit`.
    pub async fn system_config_by_key(&self, key: &str) -> RpcResult<String> {
        if key.is_empty() {
            return Err(RpcError::Validation("system config key is empty".into()));
        }
        let raw = self
            .group_request(methods::SYSTEM_CONFIG_BY_KEY, vec![Value::from(key)])
            .await?;
        decode::lookup(raw, "system config value")
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("group", &self.group)
            .field("request_timeout", &self.request_timeout)
            .field("closed", &self.transport.is_closed())
            .finish()
    }
}
