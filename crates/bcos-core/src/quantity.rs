//! Hex quantity and byte-string encoding used on the wire.
//!
//! Quantities are `0x`-prefixed, lowercase, minimal digits (`0` is `"0x0"`).
//! Byte strings are `0x`-prefixed, two digits per byte (empty is `"0x"`).
//!
//! The `*_hex` submodules plug into `#[serde(with = ..)]`. Their
//! deserializers also accept plain JSON numbers, which some node versions
//! return for small counters.

use std::num::IntErrorKind;

use crate::error::CoreError;

pub fn encode_u64(n: u64) -> String {
    format!("{n:#x}")
}

pub fn encode_u128(n: u128) -> String {
    format!("{n:#x}")
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn quantity_digits(s: &str) -> Result<&str, CoreError> {
    let digits = strip_prefix(s).ok_or_else(|| CoreError::MissingPrefix(s.to_string()))?;
    if digits.is_empty() {
        return Err(CoreError::EmptyQuantity);
    }
    Ok(digits)
}

fn map_int_error(e: std::num::ParseIntError, bits: u32, s: &str) -> CoreError {
    match e.kind() {
        IntErrorKind::PosOverflow => CoreError::Overflow { bits, value: s.to_string() },
        _ => CoreError::InvalidHex(s.to_string()),
    }
}

pub fn decode_u64(s: &str) -> Result<u64, CoreError> {
    let digits = quantity_digits(s)?;
    u64::from_str_radix(digits, 16).map_err(|e| map_int_error(e, 64, s))
}

pub fn decode_u128(s: &str) -> Result<u128, CoreError> {
    let digits = quantity_digits(s)?;
    u128::from_str_radix(digits, 16).map_err(|e| map_int_error(e, 128, s))
}

/// Decode a byte string. The `0x` prefix is optional and an odd digit count
/// is treated as having an implicit leading zero.
pub fn decode_bytes(s: &str) -> Result<Vec<u8>, CoreError> {
    let digits = strip_prefix(s).unwrap_or(s);
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    decoded.map_err(|e| CoreError::InvalidHex(format!("{s:?}: {e}")))
}

/// Decode exactly `N` bytes, used by fixed-width addresses and hashes.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let digits = strip_prefix(s).unwrap_or(s);
    if digits.len() != N * 2 {
        return Err(CoreError::InvalidLength { expected: N, got: digits.len() / 2 });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| CoreError::InvalidHex(format!("{s:?}: {e}")))?;
    Ok(out)
}

struct QuantityVisitor<T>(std::marker::PhantomData<T>);

macro_rules! quantity_serde {
    ($module:ident, $opt_module:ident, $ty:ty, $encode:path, $decode:path) => {
        pub mod $module {
            use serde::{de, Deserializer, Serializer};

            use super::QuantityVisitor;

            impl<'de> de::Visitor<'de> for QuantityVisitor<$ty> {
                type Value = $ty;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("a 0x-prefixed hex quantity or an unsigned integer")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<$ty, E> {
                    $decode(v).map_err(E::custom)
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<$ty, E> {
                    <$ty>::try_from(v).map_err(E::custom)
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<$ty, E> {
                    <$ty>::try_from(v).map_err(E::custom)
                }
            }

            pub fn serialize<S: Serializer>(v: &$ty, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&$encode(*v))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<$ty, D::Error> {
                d.deserialize_any(QuantityVisitor::<$ty>(std::marker::PhantomData))
            }
        }

        pub mod $opt_module {
            use serde::{Deserialize, Deserializer, Serializer};

            struct Wrapped($ty);

            impl<'de> Deserialize<'de> for Wrapped {
                fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                    super::$module::deserialize(d).map(Wrapped)
                }
            }

            pub fn serialize<S: Serializer>(v: &Option<$ty>, s: S) -> Result<S::Ok, S::Error> {
                match v {
                    Some(v) => super::$module::serialize(v, s),
                    None => s.serialize_none(),
                }
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<$ty>, D::Error> {
                Ok(Option::<Wrapped>::deserialize(d)?.map(|w| w.0))
            }
        }
    };
}

quantity_serde!(u64_hex, opt_u64_hex, u64, super::encode_u64, super::decode_u64);
quantity_serde!(u128_hex, opt_u128_hex, u128, super::encode_u128, super::decode_u128);

pub mod bytes_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::encode_bytes(v))
    }

    /// `null` decodes as an empty byte string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) => super::decode_bytes(&s).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_use_minimal_digits() {
        assert_eq!(encode_u64(0), "0x0");
        assert_eq!(encode_u64(255), "0xff");
        assert_eq!(encode_u128(1 << 100), "0x10000000000000000000000000");
    }

    #[test]
    fn block_numbers_survive_hex_form() {
        for n in [0u64, 1, 15, 16, 1_000_000, u64::MAX] {
            assert_eq!(decode_u64(&encode_u64(n)).unwrap(), n);
        }
    }

    #[test]
    fn quantity_requires_prefix_and_digits() {
        assert_eq!(decode_u64("10"), Err(CoreError::MissingPrefix("10".into())));
        assert_eq!(decode_u64("0x"), Err(CoreError::EmptyQuantity));
        assert!(matches!(decode_u64("0xzz"), Err(CoreError::InvalidHex(_))));
        assert!(matches!(
            decode_u64("0x1ffffffffffffffff"),
            Err(CoreError::Overflow { bits: 64, .. })
        ));
    }

    #[test]
    fn bytes_tolerate_odd_length_and_missing_prefix() {
        assert_eq!(decode_bytes("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_bytes("0xabc").unwrap(), vec![0x0a, 0xbc]);
        assert_eq!(decode_bytes("beef").unwrap(), vec![0xbe, 0xef]);
        assert_eq!(encode_bytes(&[0xde, 0xad]), "0xdead");
    }

    #[test]
    fn serde_accepts_hex_strings_and_numbers() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(with = "u64_hex")]
            a: u64,
            #[serde(with = "u64_hex")]
            b: u64,
            #[serde(default, with = "opt_u64_hex")]
            c: Option<u64>,
        }
        let row: Row = serde_json::from_str(r#"{"a":"0x1a","b":7,"c":null}"#).unwrap();
        assert_eq!((row.a, row.b, row.c), (26, 7, None));
    }
}
