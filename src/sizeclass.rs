//! Size-class index: `size -> bin` mapping for the free-list registry.
//!
//! Bin `i` covers `[2^(i+MIN_POW), 2^(i+1+MIN_POW))`. The mapping is built on
//! `usize::leading_zeros`, which compiles to a single `lzcnt`/`bsr`
//! instruction on every target tier `std` supports, so `bin_of` is O(1) as
//! the spec requires rather than a loop over candidate powers.

use crate::config::{MIN_POW, NUM_BINS};

/// Map a block size to the free-list bin that should hold it.
///
/// Resolves the open question in the spec's source material by computing
/// `bin_of(size) = floor(log2(size)) - MIN_POW`, clamped to `0` below the
/// smallest class and to `NUM_BINS - 1` above the largest: every block
/// placed in `bins[bin]` satisfies `size >= 2^(bin + MIN_POW)`, and the
/// mapping is monotonically non-decreasing in `size`.
pub(crate) fn bin_of(size: usize) -> usize {
  debug_assert!(size > 0, "size-class lookup on a zero-sized block");
  let floor = 1usize << MIN_POW;
  if size < floor {
    return 0;
  }
  let shifted = size >> MIN_POW;
  let bin = (usize::BITS - 1 - shifted.leading_zeros()) as usize;
  bin.min(NUM_BINS - 1)
}
