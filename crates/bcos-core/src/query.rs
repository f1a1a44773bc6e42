use crate::types::{Address, BlockReference, H256};

/// A message call executed by the node without being committed on-chain.
///
/// `data`, `value`, `gas` and `gas_price` are optional on the wire: an empty
/// payload, `None` value/price and zero gas are left out of the encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: Option<u128>,
    pub gas: u64,
    pub gas_price: Option<u128>,
}

impl CallMessage {
    pub fn new(from: Address, to: Address) -> Self {
        Self {
            from,
            to,
            data: Vec::new(),
            value: None,
            gas: 0,
            gas_price: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }
}

/// Event log selection.
///
/// Selects by `block_hash` or by the `from_block..=to_block` range, never
/// both; the argument encoder rejects a query that sets a hash together with
/// either range bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub addresses: Vec<Address>,
    /// Positional topic constraints. An empty inner list matches any topic in
    /// that position.
    pub topics: Vec<Vec<H256>>,
    pub block_hash: Option<H256>,
    pub from_block: Option<BlockReference>,
    pub to_block: Option<BlockReference>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn topic(mut self, alternatives: Vec<H256>) -> Self {
        self.topics.push(alternatives);
        self
    }

    pub fn at_block_hash(mut self, hash: H256) -> Self {
        self.block_hash = Some(hash);
        self
    }

    pub fn from_block(mut self, block: impl Into<BlockReference>) -> Self {
        self.from_block = Some(block.into());
        self
    }

    pub fn to_block(mut self, block: impl Into<BlockReference>) -> Self {
        self.to_block = Some(block.into());
        self
    }

    pub fn has_range(&self) -> bool {
        self.from_block.is_some() || self.to_block.is_some()
    }
}
