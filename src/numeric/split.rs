//! Trie decomposition of sortable ranges into prefix ranges.
//!
//! `[min, max]` over the sortable domain is split into a small set of
//! disjoint, adjacent bucket runs: the incomplete boundary buckets of each
//! trie level are emitted at that level and the aligned interior is promoted
//! to the next coarser level, until the interior is empty or the level
//! leaves the value width. At most two runs per level plus one final
//! interior run are ever produced, so the output size depends only on the
//! value width and precision step, never on how wide the range is.
//!
//! Emission order is strictly increasing in encoded-term byte order
//! (level-major), which the range enumerator relies on to drive a single
//! forward pass over a sorted term dictionary.

use crate::error::Result;
use crate::numeric::PrecisionStep;
use crate::numeric::prefix::PrefixCodec;

/// A run of adjacent trie buckets at one shift level.
///
/// `min` has the low `shift` bits clear and `max` has them set, so the run
/// covers every sortable value in `[min, max]`. A run of one bucket
/// (`min >> shift == max >> shift`) is a single trie prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixRange {
    /// Trie level: number of low bits below the bucket prefixes.
    pub shift: u32,
    /// Lowest sortable value covered.
    pub min: u64,
    /// Highest sortable value covered.
    pub max: u64,
}

impl PrefixRange {
    /// Encode the run's bounds as prefix-coded terms at its shift level.
    ///
    /// Both terms carry the same shift byte, so every dictionary term
    /// between them (inclusive) belongs to this run.
    pub fn encoded_bounds(&self, codec: &PrefixCodec) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((
            codec.encode(self.min, self.shift)?,
            codec.encode(self.max, self.shift)?,
        ))
    }
}

/// Decompose the inclusive sortable range `[min, max]` for the given value
/// width, invoking `visit` for each prefix run in encoded-term order.
///
/// An inverted input (`min > max`) visits nothing: the empty range is a
/// valid decomposition, not an error. Inclusivity adjustments and the
/// native-to-sortable conversion are the caller's business; this function
/// is pure arithmetic.
pub fn visit_ranges(
    value_bits: u32,
    step: PrecisionStep,
    mut min: u64,
    mut max: u64,
    mut visit: impl FnMut(PrefixRange),
) {
    if min > max {
        return;
    }
    debug_assert!(value_bits == 32 || value_bits == 64);
    debug_assert!(value_bits == 64 || (min >> value_bits == 0 && max >> value_bits == 0));

    let step = step.effective_bits(value_bits);
    debug_assert!(step >= 1);

    let mut shift = 0u32;
    loop {
        // The next level would leave the value width: whatever interior is
        // left becomes the final run at this level.
        if shift + step >= value_bits {
            visit(PrefixRange {
                shift,
                min,
                max: max | low_bits(shift),
            });
            return;
        }

        let diff = 1u64 << (shift + step);
        let level_mask = ((1u64 << step) - 1) << shift;
        // A partial bucket at the lower end means the lowest aligned bucket
        // of the next level starts above min; symmetrically for the upper
        // end.
        let has_lower = (min & level_mask) != 0;
        let has_upper = (max & level_mask) != level_mask;
        let next_min = if has_lower { min.wrapping_add(diff) } else { min } & !level_mask;
        let next_max = if has_upper { max.wrapping_sub(diff) } else { max } & !level_mask;
        let lower_wrapped = next_min < min;
        let upper_wrapped = next_max > max;

        // The aligned interior is empty or fell off the domain: emit what is
        // left of the range here and stop.
        if next_min > next_max || lower_wrapped || upper_wrapped {
            visit(PrefixRange {
                shift,
                min,
                max: max | low_bits(shift),
            });
            return;
        }

        if has_lower {
            visit(PrefixRange {
                shift,
                min,
                max: (min | level_mask) | low_bits(shift),
            });
        }
        if has_upper {
            visit(PrefixRange {
                shift,
                min: max & !level_mask,
                max: max | low_bits(shift),
            });
        }

        min = next_min;
        max = next_max;
        shift += step;
    }
}

/// Collect the decomposition of `[min, max]` into a vector, in emission
/// order. See [`visit_ranges`].
pub fn split_range(value_bits: u32, step: PrecisionStep, min: u64, max: u64) -> Vec<PrefixRange> {
    let mut ranges = Vec::new();
    visit_ranges(value_bits, step, min, max, |range| ranges.push(range));
    ranges
}

#[inline]
fn low_bits(shift: u32) -> u64 {
    // shift < value_bits <= 64 at every call site.
    (1u64 << shift) - 1
}
