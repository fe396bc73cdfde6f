//! Prefix-coded byte terms for sortable numeric values.
//!
//! An encoded term is one leading shift byte (how many low bits were
//! stripped) followed by the remaining high bits of the sortable value,
//! big-endian, packed into `ceil((width - shift) / 8)` bytes. Terms with the
//! same shift compare lexicographically exactly as their masked sortable
//! values; across shifts the leading byte groups a dictionary level-major,
//! full-precision terms first. That layout is what the trie decomposition
//! in [`super::split`] and the range enumerator count on.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TrievalError};
use crate::numeric::{NumericType, PrecisionStep};

/// Longest encoded term for a 32-bit value: shift byte plus four value bytes.
pub const MAX_TERM_LEN_32: usize = 5;

/// Longest encoded term for a 64-bit value: shift byte plus eight value bytes.
pub const MAX_TERM_LEN_64: usize = 9;

/// Prefix-term codec for one field: value width plus trie precision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixCodec {
    value_bits: u32,
    step: PrecisionStep,
}

impl PrefixCodec {
    /// Create a codec for the given numeric type and precision step.
    pub fn new(numeric_type: NumericType, step: PrecisionStep) -> Result<Self> {
        step.validate()?;
        Ok(PrefixCodec {
            value_bits: numeric_type.value_bits(),
            step,
        })
    }

    /// Width of the sortable values this codec encodes, in bits.
    pub fn value_bits(&self) -> u32 {
        self.value_bits
    }

    /// The configured precision step.
    pub fn step(&self) -> PrecisionStep {
        self.step
    }

    /// The shift levels this codec indexes, lowest (full precision) first.
    ///
    /// `Unlimited` yields only shift 0.
    pub fn shifts(&self) -> impl Iterator<Item = u32> {
        let step = self.step.effective_bits(self.value_bits);
        (0..self.value_bits).step_by(step as usize)
    }

    /// Encode a sortable value at the given shift level.
    ///
    /// The low `shift` bits are stripped; the leading byte records the
    /// shift. Fails when the shift exceeds the value width, is not a level
    /// of the configured precision step, or the value does not fit the
    /// width.
    pub fn encode(&self, sortable: u64, shift: u32) -> Result<Vec<u8>> {
        if shift > self.value_bits {
            return Err(TrievalError::encoding(format!(
                "shift {shift} exceeds value width {}",
                self.value_bits
            )));
        }
        match self.step {
            PrecisionStep::Bits(n) if shift % n != 0 => {
                return Err(TrievalError::encoding(format!(
                    "shift {shift} is not a multiple of precision step {n}"
                )));
            }
            PrecisionStep::Unlimited if shift != 0 => {
                return Err(TrievalError::encoding(
                    "unlimited precision step admits only shift 0",
                ));
            }
            _ => {}
        }
        if self.value_bits < 64 && sortable >> self.value_bits != 0 {
            return Err(TrievalError::encoding(format!(
                "sortable value {sortable:#x} does not fit in {} bits",
                self.value_bits
            )));
        }

        let value_byte_count = ((self.value_bits - shift).div_ceil(8)) as usize;
        let mut term = vec![0u8; 1 + value_byte_count];
        term[0] = shift as u8;
        if value_byte_count > 0 {
            BigEndian::write_uint(&mut term[1..], sortable >> shift, value_byte_count);
        }
        Ok(term)
    }

    /// Decode an encoded term back to `(sortable, shift)`.
    ///
    /// The returned sortable value has its low `shift` bits clear. Exact
    /// inverse of [`PrefixCodec::encode`] up to that masking. Fails on an
    /// empty term, a shift byte beyond the value width, or a length that
    /// disagrees with the declared shift. The precision step is not
    /// consulted; any well-formed term of this width decodes.
    pub fn decode(&self, term: &[u8]) -> Result<(u64, u32)> {
        let Some((&shift_byte, value_bytes)) = term.split_first() else {
            return Err(TrievalError::decoding("empty prefix-coded term"));
        };
        let shift = shift_byte as u32;
        if shift > self.value_bits {
            return Err(TrievalError::decoding(format!(
                "shift byte {shift} exceeds value width {}",
                self.value_bits
            )));
        }
        let value_byte_count = ((self.value_bits - shift).div_ceil(8)) as usize;
        if value_bytes.len() != value_byte_count {
            return Err(TrievalError::decoding(format!(
                "term has {} value bytes, shift {shift} requires {value_byte_count}",
                value_bytes.len()
            )));
        }
        if value_byte_count == 0 {
            return Ok((0, shift));
        }
        Ok((BigEndian::read_uint(value_bytes, value_byte_count) << shift, shift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::sortable::i32_to_sortable;

    fn codec_i32(step: PrecisionStep) -> PrefixCodec {
        PrefixCodec::new(NumericType::I32, step).unwrap()
    }

    #[test]
    fn test_known_encodings() {
        let codec = codec_i32(PrecisionStep::Bits(4));
        let zero = i32_to_sortable(0) as u64; // 0x8000_0000

        assert_eq!(codec.encode(zero, 0).unwrap(), vec![0x00, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(codec.encode(zero, 4).unwrap(), vec![0x04, 0x08, 0x00, 0x00, 0x00]);
        assert_eq!(codec.encode(zero, 28).unwrap(), vec![0x1C, 0x08]);

        let codec64 = PrefixCodec::new(NumericType::I64, PrecisionStep::Bits(16)).unwrap();
        assert_eq!(
            codec64.encode(0x8000_0000_0000_0000, 48).unwrap(),
            vec![0x30, 0x80, 0x00]
        );
    }

    #[test]
    fn test_term_lengths() {
        let codec = codec_i32(PrecisionStep::Bits(8));
        assert_eq!(codec.encode(0, 0).unwrap().len(), MAX_TERM_LEN_32);
        assert_eq!(codec.encode(0, 8).unwrap().len(), 4);
        assert_eq!(codec.encode(0, 24).unwrap().len(), 2);

        let codec64 = PrefixCodec::new(NumericType::F64, PrecisionStep::Bits(8)).unwrap();
        assert_eq!(codec64.encode(0, 0).unwrap().len(), MAX_TERM_LEN_64);
    }

    #[test]
    fn test_round_trip_masks_low_bits() {
        let codec = codec_i32(PrecisionStep::Bits(8));
        let sortable = i32_to_sortable(1000) as u64; // 0x8000_03E8

        let (decoded, shift) = codec.decode(&codec.encode(sortable, 0).unwrap()).unwrap();
        assert_eq!((decoded, shift), (sortable, 0));

        let (decoded, shift) = codec.decode(&codec.encode(sortable, 8).unwrap()).unwrap();
        assert_eq!((decoded, shift), (0x8000_0300, 8));

        let (decoded, shift) = codec.decode(&codec.encode(sortable, 24).unwrap()).unwrap();
        assert_eq!((decoded, shift), (0x8000_0000, 24));
    }

    #[test]
    fn test_same_shift_terms_sort_as_sortable_values() {
        let codec = codec_i32(PrecisionStep::Bits(4));
        let mut previous: Option<Vec<u8>> = None;
        for value in [i32::MIN, -5000, -1, 0, 1, 5000, i32::MAX] {
            let term = codec.encode(i32_to_sortable(value) as u64, 4).unwrap();
            if let Some(prev) = previous {
                assert!(prev <= term, "terms out of order at {value}");
            }
            previous = Some(term);
        }
    }

    #[test]
    fn test_levels_group_after_full_precision() {
        let codec = codec_i32(PrecisionStep::Bits(4));
        let low_level = codec.encode(u32::MAX as u64, 0).unwrap();
        let high_level = codec.encode(0, 4).unwrap();
        // The shift byte dominates the comparison, so every shift-0 term
        // precedes every shift-4 term regardless of value.
        assert!(low_level < high_level);
    }

    #[test]
    fn test_shift_levels() {
        let codec = codec_i32(PrecisionStep::Bits(8));
        assert_eq!(codec.shifts().collect::<Vec<_>>(), vec![0, 8, 16, 24]);

        let uneven = codec_i32(PrecisionStep::Bits(12));
        assert_eq!(uneven.shifts().collect::<Vec<_>>(), vec![0, 12, 24]);

        let unlimited = codec_i32(PrecisionStep::Unlimited);
        assert_eq!(unlimited.shifts().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_encode_errors() {
        let codec = codec_i32(PrecisionStep::Bits(8));
        assert!(codec.encode(0, 33).is_err());
        assert!(codec.encode(0, 7).is_err());
        assert!(codec.encode(1u64 << 32, 0).is_err());

        let unlimited = codec_i32(PrecisionStep::Unlimited);
        assert!(unlimited.encode(0, 8).is_err());
        assert!(unlimited.encode(0, 0).is_ok());
    }

    #[test]
    fn test_decode_errors() {
        let codec = codec_i32(PrecisionStep::Bits(8));
        assert!(codec.decode(&[]).is_err());
        assert!(codec.decode(&[40, 0x01]).is_err());
        assert!(codec.decode(&[0x00, 0x80, 0x00]).is_err());
        assert!(codec.decode(&[0x08, 0x80, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(PrefixCodec::new(NumericType::I32, PrecisionStep::Bits(0)).is_err());
    }
}
