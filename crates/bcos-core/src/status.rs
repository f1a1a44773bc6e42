//! Transaction receipt status codes reported by the node.

use std::fmt;

/// Decoded `status` field of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReceiptStatus {
    Success,
    Unknown,
    BadRlp,
    InvalidFormat,
    OutOfGasIntrinsic,
    InvalidSignature,
    InvalidNonce,
    NotEnoughCash,
    OutOfGasBase,
    BlockGasLimitReached,
    BadInstruction,
    BadJumpDestination,
    OutOfGas,
    OutOfStack,
    StackUnderflow,
    NonceCheckFail,
    BlockLimitCheckFail,
    FilterCheckFail,
    NoDeployPermission,
    NoCallPermission,
    NoTxPermission,
    PrecompiledError,
    RevertInstruction,
    InvalidZeroSignatureFormat,
    AddressAlreadyUsed,
    PermissionDenied,
    CallAddressError,
    /// A code this client does not know, kept verbatim.
    Other(String),
}

const TABLE: &[(&str, ReceiptStatus, &str)] = &[
    ("0x0", ReceiptStatus::Success, "success"),
    ("0x1", ReceiptStatus::Unknown, "unknown"),
    ("0x2", ReceiptStatus::BadRlp, "bad RLP"),
    ("0x3", ReceiptStatus::InvalidFormat, "invalid format"),
    ("0x4", ReceiptStatus::OutOfGasIntrinsic, "out of gas intrinsic"),
    ("0x5", ReceiptStatus::InvalidSignature, "invalid signature"),
    ("0x6", ReceiptStatus::InvalidNonce, "invalid nonce"),
    ("0x7", ReceiptStatus::NotEnoughCash, "not enough cash"),
    ("0x8", ReceiptStatus::OutOfGasBase, "out of gas base"),
    ("0x9", ReceiptStatus::BlockGasLimitReached, "block gas limit reached"),
    ("0xa", ReceiptStatus::BadInstruction, "bad instruction"),
    ("0xb", ReceiptStatus::BadJumpDestination, "bad jump destination"),
    ("0xc", ReceiptStatus::OutOfGas, "out of gas"),
    ("0xd", ReceiptStatus::OutOfStack, "out of stack"),
    ("0xe", ReceiptStatus::StackUnderflow, "stack underflow"),
    ("0xf", ReceiptStatus::NonceCheckFail, "nonce check fail"),
    ("0x10", ReceiptStatus::BlockLimitCheckFail, "block limit check fail"),
    ("0x11", ReceiptStatus::FilterCheckFail, "filter check fail"),
    ("0x12", ReceiptStatus::NoDeployPermission, "no deploy permission"),
    ("0x13", ReceiptStatus::NoCallPermission, "no call permission"),
    ("0x14", ReceiptStatus::NoTxPermission, "no tx permission"),
    ("0x15", ReceiptStatus::PrecompiledError, "precompiled error"),
    ("0x16", ReceiptStatus::RevertInstruction, "revert instruction"),
    ("0x17", ReceiptStatus::InvalidZeroSignatureFormat, "invalid zero signature format"),
    ("0x18", ReceiptStatus::AddressAlreadyUsed, "address already used"),
    ("0x19", ReceiptStatus::PermissionDenied, "permission denied"),
    ("0x1a", ReceiptStatus::CallAddressError, "call address error"),
];

impl ReceiptStatus {
    /// Codes are matched case-insensitively (`"0xA"` == `"0xa"`).
    pub fn from_code(code: &str) -> Self {
        let lower = code.to_ascii_lowercase();
        TABLE
            .iter()
            .find(|(c, _, _)| *c == lower)
            .map(|(_, status, _)| status.clone())
            .unwrap_or_else(|| ReceiptStatus::Other(code.to_string()))
    }

    pub fn code(&self) -> &str {
        match self {
            ReceiptStatus::Other(code) => code.as_str(),
            known => TABLE
                .iter()
                .find(|(_, s, _)| s == known)
                .map(|(c, _, _)| *c)
                .unwrap_or("unknown"),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ReceiptStatus::Other(code) => code.as_str(),
            known => TABLE
                .iter()
                .find(|(_, s, _)| s == known)
                .map(|(_, _, m)| *m)
                .unwrap_or("unknown"),
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_messages() {
        assert_eq!(ReceiptStatus::from_code("0x0"), ReceiptStatus::Success);
        assert_eq!(ReceiptStatus::from_code("0x1A"), ReceiptStatus::CallAddressError);
        assert_eq!(ReceiptStatus::PermissionDenied.message(), "permission denied");
        assert_eq!(ReceiptStatus::NoTxPermission.code(), "0x14");
    }

    #[test]
    fn unknown_codes_render_verbatim() {
        let s = ReceiptStatus::from_code("0x7f");
        assert_eq!(s, ReceiptStatus::Other("0x7f".into()));
        assert_eq!(s.to_string(), "0x7f");
    }
}
