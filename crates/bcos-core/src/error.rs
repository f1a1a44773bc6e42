use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("missing 0x prefix: {0:?}")]
    MissingPrefix(String),

    #[error("empty hex quantity")]
    EmptyQuantity,

    #[error("hex quantity overflows {bits} bits: {value:?}")]
    Overflow { bits: u32, value: String },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}
