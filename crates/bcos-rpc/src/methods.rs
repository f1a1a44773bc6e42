//! Remote method names.
//!
//! These names, together with the positional parameter order built in
//! [`crate::codec`], are the compatibility surface with the node. Methods in
//! the group-scoped section take the group id as their first parameter.

// ── Ethereum-compatible namespace ────────────────────────────────────────────
pub const CHAIN_ID: &str = "eth_chainId";
pub const NET_VERSION: &str = "net_version";
pub const BLOCK_BY_HASH: &str = "eth_getBlockByHash";
pub const BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const BLOCK_TX_COUNT_BY_HASH: &str = "eth_getBlockTransactionCountByHash";
pub const BLOCK_TX_COUNT_BY_NUMBER: &str = "eth_getBlockTransactionCountByNumber";
pub const TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
pub const SYNCING: &str = "eth_syncing";
pub const BALANCE: &str = "eth_getBalance";
pub const STORAGE_AT: &str = "eth_getStorageAt";
pub const NONCE: &str = "eth_getTransactionCount";
pub const LOGS: &str = "eth_getLogs";
pub const GAS_PRICE: &str = "eth_gasPrice";
pub const ESTIMATE_GAS: &str = "eth_estimateGas";

// ── Subscriptions ────────────────────────────────────────────────────────────
pub const SUBSCRIBE: &str = "eth_subscribe";
pub const UNSUBSCRIBE: &str = "eth_unsubscribe";
pub const SUBSCRIPTION_NOTIFICATION: &str = "eth_subscription";
pub const TOPIC_NEW_HEADS: &str = "newHeads";
pub const TOPIC_LOGS: &str = "logs";

// ── Node-wide ────────────────────────────────────────────────────────────────
pub const CLIENT_VERSION: &str = "getClientVersion";
pub const GROUP_LIST: &str = "getGroupList";

// ── Group-scoped ─────────────────────────────────────────────────────────────
pub const CALL: &str = "call";
pub const SEND_RAW_TRANSACTION: &str = "sendRawTransaction";
pub const BLOCK_NUMBER: &str = "getBlockNumber";
pub const PBFT_VIEW: &str = "getPbftView";
pub const SEALER_LIST: &str = "getSealerList";
pub const OBSERVER_LIST: &str = "getObserverList";
pub const CONSENSUS_STATUS: &str = "getConsensusStatus";
pub const SYNC_STATUS: &str = "getSyncStatus";
pub const PEERS: &str = "getPeers";
pub const GROUP_PEERS: &str = "getGroupPeers";
pub const NODE_ID_LIST: &str = "getNodeIDList";
pub const GROUP_BLOCK_BY_HASH: &str = "getBlockByHash";
pub const GROUP_BLOCK_BY_NUMBER: &str = "getBlockByNumber";
pub const BLOCK_HASH_BY_NUMBER: &str = "getBlockHashByNumber";
pub const TRANSACTION_BY_HASH: &str = "getTransactionByHash";
pub const TRANSACTION_BY_BLOCK_HASH_AND_INDEX: &str = "getTransactionByBlockHashAndIndex";
pub const TRANSACTION_BY_BLOCK_NUMBER_AND_INDEX: &str = "getTransactionByBlockNumberAndIndex";
pub const GROUP_TRANSACTION_RECEIPT: &str = "getTransactionReceipt";
pub const PENDING_TRANSACTIONS: &str = "getPendingTransactions";
pub const PENDING_TX_SIZE: &str = "getPendingTxSize";
pub const CODE: &str = "getCode";
pub const TOTAL_TRANSACTION_COUNT: &str = "getTotalTransactionCount";
pub const SYSTEM_CONFIG_BY_KEY: &str = "getSystemConfigByKey";
