use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::quantity;

/// Block height.
pub type BlockNumber = u64;

// ── GroupId ──────────────────────────────────────────────────────────────────

/// Logical partition of a multi-group node. Every group-scoped remote method
/// takes it as its first positional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ── Fixed-width hex identifiers ──────────────────────────────────────────────

macro_rules! fixed_hex {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_bytes(b: [u8; $len]) -> Self {
                Self(b)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                quantity::encode_bytes(&self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, CoreError> {
                quantity::decode_fixed::<$len>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                Self::from_hex(&s).map_err(de::Error::custom)
            }
        }
    };
}

fixed_hex!(
    /// 20-byte account or contract address.
    Address,
    20
);

fixed_hex!(
    /// 32-byte hash (block hash, transaction hash, storage key, log topic).
    H256,
    32
);

// ── BlockReference ───────────────────────────────────────────────────────────

/// Selects a block either by symbolic tag or by exact number/hash.
///
/// APIs take `Option<BlockReference>`; `None` means the latest block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReference {
    Latest,
    Pending,
    Number(BlockNumber),
    Hash(H256),
}

impl BlockReference {
    /// Wire tag for the symbolic variants.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            BlockReference::Latest => Some("latest"),
            BlockReference::Pending => Some("pending"),
            BlockReference::Number(_) | BlockReference::Hash(_) => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        self.tag().is_some()
    }
}

impl From<BlockNumber> for BlockReference {
    fn from(n: BlockNumber) -> Self {
        BlockReference::Number(n)
    }
}

impl From<H256> for BlockReference {
    fn from(h: H256) -> Self {
        BlockReference::Hash(h)
    }
}

impl FromStr for BlockReference {
    type Err = CoreError;

    /// Accepts `latest`, `pending`, a decimal number, a `0x` quantity or a
    /// 32-byte `0x` hash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(BlockReference::Latest),
            "pending" => Ok(BlockReference::Pending),
            _ if s.len() == 2 + H256::LEN * 2 && (s.starts_with("0x") || s.starts_with("0X")) => {
                H256::from_hex(s).map(BlockReference::Hash)
            }
            _ if s.starts_with("0x") || s.starts_with("0X") => {
                quantity::decode_u64(s).map(BlockReference::Number)
            }
            _ => s
                .parse::<u64>()
                .map(BlockReference::Number)
                .map_err(|_| CoreError::InvalidHex(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_round_trip() {
        let s = "0x27c1b5d9fe3ab035c2e9db7199d4beb139e12292";
        let addr: Address = s.parse().unwrap();
        assert_eq!(addr.to_string(), s);
        assert_eq!(serde_json::to_value(addr).unwrap(), serde_json::json!(s));
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert_eq!(
            Address::from_hex("0x1234"),
            Err(CoreError::InvalidLength { expected: 20, got: 2 })
        );
    }

    #[test]
    fn block_reference_parsing() {
        assert_eq!("latest".parse::<BlockReference>().unwrap(), BlockReference::Latest);
        assert_eq!("pending".parse::<BlockReference>().unwrap(), BlockReference::Pending);
        assert_eq!("0x10".parse::<BlockReference>().unwrap(), BlockReference::Number(16));
        assert_eq!("42".parse::<BlockReference>().unwrap(), BlockReference::Number(42));

        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            hash.parse::<BlockReference>().unwrap(),
            BlockReference::Hash(H256([0xab; 32]))
        );
        assert!("tomorrow".parse::<BlockReference>().is_err());
    }

    #[test]
    fn block_hash_accepts_upper_case_prefix() {
        let hash = format!("0X{}", "CD".repeat(32));
        assert_eq!(
            hash.parse::<BlockReference>().unwrap(),
            BlockReference::Hash(H256([0xcd; 32]))
        );
    }

    #[test]
    fn symbolic_and_exact_are_disjoint() {
        assert!(BlockReference::Latest.is_symbolic());
        assert!(!BlockReference::Number(7).is_symbolic());
        assert_eq!(BlockReference::Hash(H256::default()).tag(), None);
    }

    #[test]
    fn group_id_serializes_as_number() {
        assert_eq!(serde_json::to_value(GroupId(3)).unwrap(), serde_json::json!(3));
        assert_eq!(GroupId::default().get(), 1);
    }
}
