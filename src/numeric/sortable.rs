//! Order-preserving sortable encodings for numeric values.
//!
//! Every supported numeric type is mapped onto an unsigned integer of the
//! same width such that numeric order becomes unsigned integer order:
//! `a < b` exactly when `to_sortable(a) < to_sortable(b)`. Unsigned order is
//! also the lexicographic order of big-endian bytes, which is what lets
//! range queries run against a sorted term dictionary.
//!
//! Integers flip their sign bit, so `i32::MIN` maps to `0` and `i32::MAX`
//! to `u32::MAX`. Floats use the sign-fold transform: negative values
//! (sign bit set, including `-0.0`) invert all bits, non-negative values
//! flip only the sign bit. This orders negatives below positives, `-0.0`
//! immediately below `+0.0`, and the infinities at the finite extremes.
//!
//! NaNs are canonicalized to the quiet-NaN bit pattern before the
//! transform, so every NaN shares one sortable value just above `+inf`.
//! No order among NaN payloads is defined; a degenerate NaN-to-NaN range
//! therefore matches all NaN values of the width.

/// Bit pattern every 32-bit NaN canonicalizes to.
pub const CANONICAL_NAN_BITS_32: u32 = 0x7FC0_0000;

/// Bit pattern every 64-bit NaN canonicalizes to.
pub const CANONICAL_NAN_BITS_64: u64 = 0x7FF8_0000_0000_0000;

const SIGN_BIT_32: u32 = 0x8000_0000;
const SIGN_BIT_64: u64 = 0x8000_0000_0000_0000;

/// Convert an i32 to its sortable form by flipping the sign bit.
#[inline]
pub fn i32_to_sortable(value: i32) -> u32 {
    (value as u32) ^ SIGN_BIT_32
}

/// Exact inverse of [`i32_to_sortable`].
#[inline]
pub fn sortable_to_i32(sortable: u32) -> i32 {
    (sortable ^ SIGN_BIT_32) as i32
}

/// Convert an i64 to its sortable form by flipping the sign bit.
#[inline]
pub fn i64_to_sortable(value: i64) -> u64 {
    (value as u64) ^ SIGN_BIT_64
}

/// Exact inverse of [`i64_to_sortable`].
#[inline]
pub fn sortable_to_i64(sortable: u64) -> i64 {
    (sortable ^ SIGN_BIT_64) as i64
}

/// Convert an f32 to its sortable form.
///
/// NaN inputs are canonicalized first; every other value round-trips
/// bit-for-bit through [`sortable_to_f32`].
#[inline]
pub fn f32_to_sortable(value: f32) -> u32 {
    let bits = if value.is_nan() {
        CANONICAL_NAN_BITS_32
    } else {
        value.to_bits()
    };
    if bits & SIGN_BIT_32 != 0 { !bits } else { bits ^ SIGN_BIT_32 }
}

/// Exact inverse of [`f32_to_sortable`].
#[inline]
pub fn sortable_to_f32(sortable: u32) -> f32 {
    if sortable & SIGN_BIT_32 != 0 {
        f32::from_bits(sortable ^ SIGN_BIT_32)
    } else {
        f32::from_bits(!sortable)
    }
}

/// Convert an f64 to its sortable form.
///
/// NaN inputs are canonicalized first; every other value round-trips
/// bit-for-bit through [`sortable_to_f64`].
#[inline]
pub fn f64_to_sortable(value: f64) -> u64 {
    let bits = if value.is_nan() {
        CANONICAL_NAN_BITS_64
    } else {
        value.to_bits()
    };
    if bits & SIGN_BIT_64 != 0 { !bits } else { bits ^ SIGN_BIT_64 }
}

/// Exact inverse of [`f64_to_sortable`].
#[inline]
pub fn sortable_to_f64(sortable: u64) -> f64 {
    if sortable & SIGN_BIT_64 != 0 {
        f64::from_bits(sortable ^ SIGN_BIT_64)
    } else {
        f64::from_bits(!sortable)
    }
}
