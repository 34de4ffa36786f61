//! Heap Region Manager: the thinnest possible wrapper around the one-way
//! break-pointer primitive. Mirrors the teacher crate's direct use of
//! `libc::sbrk` rather than introducing a simulated memory-layer shim, which
//! the spec calls out as a collaborator and not part of the allocator's core.

use libc::{c_void, intptr_t, sbrk};

use crate::config::{ALIGNMENT, CACHE_LINE_SIZE};
use crate::error::AllocError;
use crate::align::align_up;

/// Owns `heap_lo`/`heap_hi` and the one primitive the rest of the allocator
/// is allowed to touch the outside world through: `grow`. Never inspects
/// block contents; the engine and free-list registry own that structure.
pub(crate) struct HeapRegion {
  anchor: *mut u8,
  hi: *mut u8,
}

fn sbrk_failed(raw: *mut c_void) -> bool {
  raw as usize == usize::MAX
}

impl HeapRegion {
  /// Record the current program break, cache-line-align it, and treat that
  /// as both bounds of an empty heap.
  ///
  /// The anchor is derived from the pointer the padding `sbrk` call actually
  /// returns, not from the unaligned snapshot read a moment earlier — the
  /// break is real, process-wide state, and trusting a stale local read
  /// instead of `sbrk`'s own return value is exactly what lets two
  /// independently initialized regions believe they own the same bytes.
  pub(crate) fn init() -> Result<Self, AllocError> {
    let raw = unsafe { sbrk(0) };
    if sbrk_failed(raw) {
      return Err(AllocError::HeapExhausted);
    }
    let unaligned = raw as usize;
    let target = align_up(unaligned, CACHE_LINE_SIZE);
    let pad = target - unaligned;
    let anchor = if pad > 0 {
      let bumped = unsafe { sbrk(pad as intptr_t) };
      if sbrk_failed(bumped) {
        return Err(AllocError::HeapExhausted);
      }
      (bumped as usize + pad) as *mut u8
    } else {
      raw as *mut u8
    };
    tracing::debug!(?anchor, "heap region initialized");
    Ok(HeapRegion { anchor, hi: anchor })
  }

  pub(crate) fn low(&self) -> *mut u8 {
    self.anchor
  }

  pub(crate) fn high(&self) -> *mut u8 {
    self.hi
  }

  pub(crate) fn contains(&self, p: *mut u8) -> bool {
    self.anchor <= p && p < self.hi
  }

  /// Extend the heap upward by `n` (alignment-aligned) bytes, returning the
  /// address the break used to sit at — the start of the new region.
  ///
  /// The new block's address is `sbrk`'s own return value, the way the
  /// teacher's `bump.rs::allocate` takes `raw_address = sbrk(size)` as truth
  /// — not the internally tracked `self.hi`, which can desync from the real,
  /// process-wide break whenever more than one `HeapRegion` is alive.
  pub(crate) fn grow(&mut self, n: usize) -> Result<*mut u8, AllocError> {
    debug_assert_eq!(n % ALIGNMENT, 0, "grow request must be alignment-aligned");
    let raw = unsafe { sbrk(n as intptr_t) };
    if sbrk_failed(raw) {
      tracing::debug!(bytes = n, "heap exhausted");
      return Err(AllocError::HeapExhausted);
    }
    let old_hi = raw as *mut u8;
    self.hi = unsafe { old_hi.add(n) };
    tracing::trace!(bytes = n, old_hi = ?old_hi, new_hi = ?self.hi, "heap grown");
    Ok(old_hi)
  }

  /// Collapse the heap back to the anchor recorded at `init`, returning the
  /// break to that point via a negative `sbrk`. Does not run block
  /// destructors; the caller re-initializes bin heads afterward.
  pub(crate) fn reset(&mut self) {
    let used = self.hi as usize - self.anchor as usize;
    if used > 0 {
      let decrement = -(used as intptr_t);
      unsafe { sbrk(decrement) };
    }
    tracing::debug!("heap region reset");
    self.hi = self.anchor;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fresh_region_is_empty_and_aligned() {
    let heap = HeapRegion::init().expect("sbrk available in test environment");
    assert_eq!(heap.low(), heap.high());
    assert_eq!(heap.low() as usize % CACHE_LINE_SIZE, 0);
  }

  #[test]
  fn grow_advances_high_and_reports_the_old_top() {
    let mut heap = HeapRegion::init().unwrap();
    let lo = heap.low();
    let old_top = heap.grow(256).unwrap();
    assert_eq!(old_top, lo);
    assert_eq!(heap.high() as usize, lo as usize + 256);
    assert!(heap.contains(lo));
    assert!(!heap.contains(heap.high()));
    heap.reset();
  }

  #[test]
  fn reset_collapses_back_to_the_anchor() {
    let mut heap = HeapRegion::init().unwrap();
    let anchor = heap.low();
    heap.grow(4096).unwrap();
    heap.reset();
    assert_eq!(heap.low(), anchor);
    assert_eq!(heap.high(), anchor);
  }
}
