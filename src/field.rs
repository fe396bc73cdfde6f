//! Numeric field configuration and per-value trie term generation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrievalError};
use crate::numeric::prefix::PrefixCodec;
use crate::numeric::{NumericType, NumericValue, PrecisionStep};

/// Configuration of an indexed numeric field: its type and the trie
/// precision step its terms are generated with.
///
/// Queries against a field must use the same precision step the field was
/// indexed with; a different step would look for trie levels the index
/// never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericField {
    numeric_type: NumericType,
    precision_step: PrecisionStep,
}

impl NumericField {
    /// Create a field of the given type with its default precision step.
    pub fn new(numeric_type: NumericType) -> Self {
        NumericField {
            numeric_type,
            precision_step: numeric_type.default_precision_step(),
        }
    }

    /// Create a new i32 numeric field.
    pub fn i32() -> Self {
        Self::new(NumericType::I32)
    }

    /// Create a new i64 numeric field.
    pub fn i64() -> Self {
        Self::new(NumericType::I64)
    }

    /// Create a new f32 numeric field.
    pub fn f32() -> Self {
        Self::new(NumericType::F32)
    }

    /// Create a new f64 numeric field.
    pub fn f64() -> Self {
        Self::new(NumericType::F64)
    }

    /// Set the precision step.
    pub fn with_precision_step(mut self, step: PrecisionStep) -> Result<Self> {
        step.validate()?;
        self.precision_step = step;
        Ok(self)
    }

    /// The field's numeric type.
    pub fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    /// The field's precision step.
    pub fn precision_step(&self) -> PrecisionStep {
        self.precision_step
    }

    /// The prefix-term codec for this field.
    pub fn codec(&self) -> Result<PrefixCodec> {
        PrefixCodec::new(self.numeric_type, self.precision_step)
    }

    /// Generate the indexed terms for one value: its prefix-coded term at
    /// every shift level of the precision step, full precision first.
    pub fn index_terms(&self, value: NumericValue) -> Result<Vec<Vec<u8>>> {
        if value.numeric_type() != self.numeric_type {
            return Err(TrievalError::index(format!(
                "field expects {} values, got {}",
                self.numeric_type,
                value.numeric_type()
            )));
        }
        let codec = self.codec()?;
        let sortable = value.to_sortable();
        codec
            .shifts()
            .map(|shift| codec.encode(sortable, shift))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_precision_steps() {
        assert_eq!(NumericField::i32().precision_step(), PrecisionStep::Bits(8));
        assert_eq!(NumericField::f32().precision_step(), PrecisionStep::Bits(8));
        assert_eq!(NumericField::i64().precision_step(), PrecisionStep::Bits(16));
        assert_eq!(NumericField::f64().precision_step(), PrecisionStep::Bits(16));
    }

    #[test]
    fn test_invalid_precision_step_rejected() {
        assert!(NumericField::i32().with_precision_step(PrecisionStep::Bits(0)).is_err());
    }

    #[test]
    fn test_index_terms_cover_all_levels() {
        let field = NumericField::i32();
        let terms = field.index_terms(NumericValue::I32(1000)).unwrap();
        assert_eq!(terms.len(), 4); // shifts 0, 8, 16, 24

        let codec = field.codec().unwrap();
        let sortable = NumericValue::I32(1000).to_sortable();
        for (i, term) in terms.iter().enumerate() {
            let shift = (i as u32) * 8;
            let (decoded, decoded_shift) = codec.decode(term).unwrap();
            assert_eq!(decoded_shift, shift);
            assert_eq!(decoded, sortable >> shift << shift);
        }
    }

    #[test]
    fn test_unlimited_produces_single_term() {
        let field = NumericField::i64()
            .with_precision_step(PrecisionStep::Unlimited)
            .unwrap();
        let terms = field.index_terms(NumericValue::I64(-42)).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0][0], 0);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let field = NumericField::i32();
        assert!(field.index_terms(NumericValue::I64(7)).is_err());
        assert!(field.index_terms(NumericValue::F32(7.0)).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let field = NumericField::f64()
            .with_precision_step(PrecisionStep::Bits(4))
            .unwrap();
        let json = serde_json::to_string(&field).unwrap();
        let back: NumericField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
