//! Numeric value model for trie-encoded range querying.
//!
//! Numeric values are mapped into an order-preserving unsigned "sortable"
//! domain ([`sortable`]), serialized as prefix-coded byte terms ([`prefix`]),
//! and range queries over them are decomposed into trie prefix ranges
//! ([`split`]).

pub mod prefix;
pub mod sortable;
pub mod split;

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrievalError};

/// Supported numeric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericType {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl NumericType {
    /// Width of the sortable representation in bits (32 or 64).
    pub fn value_bits(&self) -> u32 {
        match self {
            NumericType::I32 | NumericType::F32 => 32,
            NumericType::I64 | NumericType::F64 => 64,
        }
    }

    /// Whether this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, NumericType::F32 | NumericType::F64)
    }

    /// The default trie precision step for this type: 8 bits for 32-bit
    /// types, 16 bits for 64-bit types.
    pub fn default_precision_step(&self) -> PrecisionStep {
        match self.value_bits() {
            32 => PrecisionStep::Bits(8),
            _ => PrecisionStep::Bits(16),
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericType::I32 => "i32",
            NumericType::I64 => "i64",
            NumericType::F32 => "f32",
            NumericType::F64 => "f64",
        };
        write!(f, "{name}")
    }
}

/// A numeric field value.
///
/// Equality and hashing follow the sortable encoding of the value rather
/// than IEEE comparison: `+0.0` and `-0.0` are distinct, and all NaNs of a
/// width are equal to each other (they share one canonical sortable value).
/// This is what makes range bounds usable as hash-map keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum NumericValue {
    /// 32-bit signed integer value
    I32(i32),
    /// 64-bit signed integer value
    I64(i64),
    /// 32-bit floating point value
    F32(f32),
    /// 64-bit floating point value
    F64(f64),
}

impl NumericValue {
    /// The numeric type of this value.
    pub fn numeric_type(&self) -> NumericType {
        match self {
            NumericValue::I32(_) => NumericType::I32,
            NumericValue::I64(_) => NumericType::I64,
            NumericValue::F32(_) => NumericType::F32,
            NumericValue::F64(_) => NumericType::F64,
        }
    }

    /// Convert to the order-preserving sortable domain.
    ///
    /// Values of 32-bit types occupy the low 32 bits of the returned `u64`.
    pub fn to_sortable(&self) -> u64 {
        match *self {
            NumericValue::I32(v) => sortable::i32_to_sortable(v) as u64,
            NumericValue::I64(v) => sortable::i64_to_sortable(v),
            NumericValue::F32(v) => sortable::f32_to_sortable(v) as u64,
            NumericValue::F64(v) => sortable::f64_to_sortable(v),
        }
    }

    /// Reconstruct a value of the given type from its sortable form.
    ///
    /// The exact inverse of [`NumericValue::to_sortable`] for every non-NaN
    /// value; any NaN comes back as the canonical quiet NaN.
    pub fn from_sortable(numeric_type: NumericType, sortable: u64) -> NumericValue {
        match numeric_type {
            NumericType::I32 => NumericValue::I32(sortable::sortable_to_i32(sortable as u32)),
            NumericType::I64 => NumericValue::I64(sortable::sortable_to_i64(sortable)),
            NumericType::F32 => NumericValue::F32(sortable::sortable_to_f32(sortable as u32)),
            NumericType::F64 => NumericValue::F64(sortable::sortable_to_f64(sortable)),
        }
    }
}

impl PartialEq for NumericValue {
    fn eq(&self, other: &Self) -> bool {
        self.numeric_type() == other.numeric_type() && self.to_sortable() == other.to_sortable()
    }
}

impl Eq for NumericValue {}

impl Hash for NumericValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numeric_type().hash(state);
        self.to_sortable().hash(state);
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::I32(v) => write!(f, "{v}"),
            NumericValue::I64(v) => write!(f, "{v}"),
            NumericValue::F32(v) => write!(f, "{v}"),
            NumericValue::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Trie precision step: how many low bits each trie level strips.
///
/// `Unlimited` disables the trie entirely; queries degenerate to a plain
/// lexicographic scan over full-precision terms and indexing produces only
/// the shift-0 term per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecisionStep {
    /// Strip this many bits per trie level (1..=64).
    Bits(u32),
    /// Full precision only, no trie levels.
    Unlimited,
}

impl PrecisionStep {
    /// Validate the step; `Bits(0)` and steps above 64 are rejected.
    pub fn validate(&self) -> Result<()> {
        match *self {
            PrecisionStep::Bits(0) => Err(TrievalError::invalid_range(
                "precision step must be at least 1",
            )),
            PrecisionStep::Bits(n) if n > 64 => Err(TrievalError::invalid_range(format!(
                "precision step {n} exceeds the maximum value width of 64",
            ))),
            _ => Ok(()),
        }
    }

    /// Resolve the effective step for a value width. `Unlimited` resolves to
    /// the full width, which makes the first trie level the last.
    pub fn effective_bits(&self, value_bits: u32) -> u32 {
        match *self {
            PrecisionStep::Bits(n) => n,
            PrecisionStep::Unlimited => value_bits,
        }
    }

    /// Whether this step disables the trie.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, PrecisionStep::Unlimited)
    }
}

impl fmt::Display for PrecisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionStep::Bits(n) => write!(f, "{n}"),
            PrecisionStep::Unlimited => write!(f, "unlimited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of(value: &NumericValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_value_bits() {
        assert_eq!(NumericType::I32.value_bits(), 32);
        assert_eq!(NumericType::F32.value_bits(), 32);
        assert_eq!(NumericType::I64.value_bits(), 64);
        assert_eq!(NumericType::F64.value_bits(), 64);
    }

    #[test]
    fn test_default_precision_steps() {
        assert_eq!(NumericType::I32.default_precision_step(), PrecisionStep::Bits(8));
        assert_eq!(NumericType::F32.default_precision_step(), PrecisionStep::Bits(8));
        assert_eq!(NumericType::I64.default_precision_step(), PrecisionStep::Bits(16));
        assert_eq!(NumericType::F64.default_precision_step(), PrecisionStep::Bits(16));
    }

    #[test]
    fn test_precision_step_validation() {
        assert!(PrecisionStep::Bits(0).validate().is_err());
        assert!(PrecisionStep::Bits(1).validate().is_ok());
        assert!(PrecisionStep::Bits(64).validate().is_ok());
        assert!(PrecisionStep::Bits(65).validate().is_err());
        assert!(PrecisionStep::Unlimited.validate().is_ok());
    }

    #[test]
    fn test_effective_bits() {
        assert_eq!(PrecisionStep::Bits(4).effective_bits(32), 4);
        assert_eq!(PrecisionStep::Unlimited.effective_bits(32), 32);
        assert_eq!(PrecisionStep::Unlimited.effective_bits(64), 64);
    }

    #[test]
    fn test_value_equality_follows_sortable_encoding() {
        assert_eq!(NumericValue::I32(42), NumericValue::I32(42));
        assert_ne!(NumericValue::I32(42), NumericValue::I64(42));

        // Signed zeroes are distinct values.
        assert_ne!(NumericValue::F32(0.0), NumericValue::F32(-0.0));

        // All NaNs of a width collapse onto the canonical NaN.
        let plain_nan = NumericValue::F32(f32::NAN);
        let payload_nan = NumericValue::F32(f32::from_bits(0x7FC0_1234));
        assert_eq!(plain_nan, payload_nan);
        assert_eq!(hash_of(&plain_nan), hash_of(&payload_nan));

        assert_ne!(NumericValue::F32(f32::NAN), NumericValue::F64(f64::NAN));
    }

    #[test]
    fn test_value_sortable_round_trip() {
        let values = [
            NumericValue::I32(i32::MIN),
            NumericValue::I32(-1),
            NumericValue::I32(0),
            NumericValue::I32(i32::MAX),
            NumericValue::I64(i64::MIN),
            NumericValue::I64(123_456_789_012),
            NumericValue::F32(-0.0),
            NumericValue::F32(3.5),
            NumericValue::F64(f64::NEG_INFINITY),
            NumericValue::F64(2.25),
        ];
        for value in values {
            let back = NumericValue::from_sortable(value.numeric_type(), value.to_sortable());
            assert_eq!(value, back);
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let step: PrecisionStep =
            serde_json::from_str(&serde_json::to_string(&PrecisionStep::Bits(4)).unwrap()).unwrap();
        assert_eq!(step, PrecisionStep::Bits(4));

        let unlimited: PrecisionStep =
            serde_json::from_str(&serde_json::to_string(&PrecisionStep::Unlimited).unwrap())
                .unwrap();
        assert_eq!(unlimited, PrecisionStep::Unlimited);

        let ty: NumericType =
            serde_json::from_str(&serde_json::to_string(&NumericType::F64).unwrap()).unwrap();
        assert_eq!(ty, NumericType::F64);
    }
}
