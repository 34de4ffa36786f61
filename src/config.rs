//! Compile-time tunables for the heap layout.
//!
//! Every constant named in the allocator's external interface lives here so
//! that changing the size-class geometry or the alignment unit touches a
//! single module. `static_assertions::const_assert!` turns an inconsistent
//! choice of constants into a compile failure instead of a corrupted heap.

use static_assertions::const_assert;
use std::mem;

use crate::align::align_up;
use crate::block::BlockHeader;

/// Minimum alignment of every payload pointer returned to the caller.
///
/// The spec permits anything `>= 8`; 8 is the recommended default on 64-bit
/// hosts and matches `libc::sbrk`'s natural word granularity.
pub const ALIGNMENT: usize = 8;

/// `log2` of the smallest size class's lower bound.
///
/// Chosen so that `2^MIN_POW` bytes are always enough to hold a free block's
/// header, footer, and both free-list links (see [`MIN_BLOCK_SIZE`]).
pub const MIN_POW: u32 = 5;

/// `log2` of one past the largest size class's upper bound.
pub const MAX_POW: u32 = 29;

/// Number of size-class bins, derived from the pow-of-two span.
pub const NUM_BINS: usize = (MAX_POW - MIN_POW) as usize;

/// Size, in bytes, of the boundary-tag header (and identically-shaped footer).
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Size, in bytes, of the two free-list link pointers overlaid on a free
/// block's payload.
pub const LINKS_SIZE: usize = mem::size_of::<usize>() * 2;

/// Smallest legal block size: header + links + footer, aligned up.
///
/// Every live block satisfies `size >= MIN_BLOCK_SIZE` (spec invariant I8),
/// which in turn guarantees a free block always has room for its links.
pub const MIN_BLOCK_SIZE: usize = align_up_const(HEADER_SIZE + LINKS_SIZE + HEADER_SIZE);

/// Threshold below which [`crate::engine::Allocator`]'s `shrink` declines to
/// split off a remainder block: a remainder smaller than this could not hold
/// its own header/footer/links.
pub const SHRINK_MIN_SIZE: usize = MIN_BLOCK_SIZE;

/// Largest request `allocate`/`reallocate` will ever round up to and attempt
/// to satisfy; beyond this the requested size is not representable by any
/// bin and the call fails as if the heap were exhausted.
pub const MAX_BLOCK_SIZE: usize = 1usize << MAX_POW;

/// Byte width the heap bottom is rounded up to at `init`, matching a typical
/// host cache-line size so the first block never straddles one.
pub const CACHE_LINE_SIZE: usize = 64;

/// Round `n` up to the next multiple of [`ALIGNMENT`].
pub const fn align_up_const(n: usize) -> usize {
  align_up(n, ALIGNMENT)
}

const_assert!(ALIGNMENT.is_power_of_two());
const_assert!(ALIGNMENT >= 8);
const_assert!(MAX_POW > MIN_POW);
const_assert!(NUM_BINS > 0);
const_assert!(MIN_BLOCK_SIZE <= (1usize << MIN_POW));
const_assert!(CACHE_LINE_SIZE.is_power_of_two());
