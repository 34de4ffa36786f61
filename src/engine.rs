//! Allocator Engine: `allocate`, `free`, `reallocate` on top of the heap
//! region, block layout, size-class index, and free-list registry.
//!
//! `Allocator` bundles `heap_lo`/`heap_hi`, the bin array, and the
//! last-block anchor into a single value threaded through every call,
//! per the spec's design note on avoiding process-wide globals — this is
//! also what lets the test suite run several independent heaps in one
//! process. A raw pointer field makes the type `!Sync` automatically, which
//! is the compile-time enforcement of the spec's single-threaded model: a
//! second thread cannot so much as name a shared `&Allocator` without an
//! external lock.

use std::ptr::{self, NonNull};

use crate::block::BlockRef;
use crate::config::{HEADER_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, SHRINK_MIN_SIZE};
use crate::error::{AllocError, FatalViolation};
use crate::freelist::FreeListRegistry;
use crate::heap::HeapRegion;

pub struct Allocator {
  heap: HeapRegion,
  bins: FreeListRegistry,
  /// Header address of the block currently touching `heap_hi`, or null if
  /// the heap is empty. Lets `allocate`'s top-extend and `reallocate`'s
  /// grow-in-place paths avoid a full right-edge scan.
  last_block: *mut u8,
}

impl Allocator {
  /// `init()` in the spec's ABI: bins start empty, heap bottom cache-line
  /// aligned.
  pub fn new() -> Result<Self, AllocError> {
    let heap = HeapRegion::init()?;
    Ok(Allocator { heap, bins: FreeListRegistry::new(), last_block: ptr::null_mut() })
  }

  /// Collapse the heap to empty and forget every block, without running any
  /// destructors — the spec's between-traces teardown.
  pub fn reset(&mut self) {
    self.heap.reset();
    self.bins = FreeListRegistry::new();
    self.last_block = ptr::null_mut();
  }

  pub fn heap_lo(&self) -> *mut u8 {
    self.heap.low()
  }

  pub fn heap_hi(&self) -> *mut u8 {
    self.heap.high()
  }

  /// `req = align_up(header + max(n, MIN_PAYLOAD) + footer)`, failing if the
  /// result would not fit in any size class.
  ///
  /// The bound against `MAX_BLOCK_SIZE` runs *before* `align_up_const`, not
  /// after: `align_up` adds up to `ALIGNMENT - 1` before masking, which
  /// wraps for an `n` within `ALIGNMENT` of `usize::MAX`. Rejecting an
  /// oversized request while it is still unaligned keeps every value that
  /// reaches `align_up_const` far below `usize::MAX`, so the add can't wrap.
  fn required_size(n: usize) -> Result<usize, AllocError> {
    let with_tags = n.checked_add(2 * HEADER_SIZE).ok_or(AllocError::HeapExhausted)?;
    let unaligned = with_tags.max(MIN_BLOCK_SIZE);
    if unaligned > MAX_BLOCK_SIZE {
      return Err(AllocError::HeapExhausted);
    }
    let req = crate::config::align_up_const(unaligned);
    if req > MAX_BLOCK_SIZE {
      return Err(AllocError::HeapExhausted);
    }
    Ok(req)
  }

  /// Typed entry point beneath the null-returning ABI surface.
  pub fn try_allocate(&mut self, n: usize) -> Result<NonNull<u8>, AllocError> {
    let req = Self::required_size(n)?;
    tracing::trace!(requested = n, req, "allocate");

    for bin in self.bins.bins_from(req) {
      if let Some(addr) = self.bins.pull_fit(req, bin) {
        let block = BlockRef::at(addr);
        self.shrink(block, req);
        tracing::debug!(bin, size = block.size(), "allocate: reused free block");
        return Ok(unsafe { NonNull::new_unchecked(block.payload()) });
      }
    }

    if !self.last_block.is_null() {
      let top = BlockRef::at(self.last_block);
      if top.is_free() {
        self.bins.extract(top.addr());
        let extra = req - top.size();
        self.heap.grow(extra)?;
        top.set(req, false);
        tracing::debug!(extra, "allocate: extended topmost free block");
        return Ok(unsafe { NonNull::new_unchecked(top.payload()) });
      }
    }

    let addr = self.heap.grow(req)?;
    let block = BlockRef::at(addr);
    block.set(req, false);
    self.last_block = addr;
    tracing::debug!(req, "allocate: grew heap for a new block");
    Ok(unsafe { NonNull::new_unchecked(block.payload()) })
  }

  /// ABI `allocate`: collapses `Err` to a null pointer.
  pub fn allocate(&mut self, n: usize) -> *mut u8 {
    self.try_allocate(n).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  fn fatal(&self, violation: FatalViolation, addr: *mut u8) {
    tracing::error!(?addr, %violation, "fatal precondition violation");
    debug_assert!(false, "{violation} at {addr:?}");
  }

  pub fn free(&mut self, p: *mut u8) {
    if p.is_null() {
      return;
    }
    let block = BlockRef::from_payload(p);
    if !self.heap.contains(block.addr()) {
      self.fatal(FatalViolation::InvalidFree, block.addr());
    }
    if !block.boundary_consistent() {
      self.fatal(FatalViolation::CorruptBoundary, block.addr());
    }
    if block.is_free() {
      self.fatal(FatalViolation::DoubleFree, block.addr());
    }
    self.coalesce(block);
  }

  /// `reallocate` per §4.4: null pointer and zero-size edge cases first,
  /// then exact/shrink/grow-in-place/grow-into-neighbor/move in that order.
  pub fn reallocate(&mut self, p: *mut u8, n: usize) -> *mut u8 {
    if p.is_null() {
      return self.allocate(n);
    }
    if n == 0 {
      self.free(p);
      return ptr::null_mut();
    }
    self.try_reallocate(p, n).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  fn try_reallocate(&mut self, p: *mut u8, n: usize) -> Result<NonNull<u8>, AllocError> {
    let req = Self::required_size(n)?;
    let block = BlockRef::from_payload(p);
    let old_size = block.size();

    if req == old_size {
      return Ok(unsafe { NonNull::new_unchecked(p) });
    }

    if req < old_size {
      self.shrink(block, req);
      return Ok(unsafe { NonNull::new_unchecked(p) });
    }

    if block.end() == self.heap.high() {
      let extra = req - old_size;
      self.heap.grow(extra)?;
      block.set(req, false);
      tracing::debug!(extra, "reallocate: grew topmost block in place");
      return Ok(unsafe { NonNull::new_unchecked(p) });
    }

    if let Some(right) = block.right(self.heap.high()) {
      if right.is_free() && old_size + right.size() >= req {
        let right_was_top = right.end() == self.heap.high();
        self.bins.extract(right.addr());
        let combined = old_size + right.size();
        block.set(combined, false);
        // `right`'s address stops being a distinct block once absorbed; if it
        // was the last-block anchor, `block` inherits that role until (and
        // unless) `shrink` below splits a fresh tail back off the top.
        if right_was_top {
          self.last_block = block.addr();
        }
        self.shrink(block, req);
        tracing::debug!("reallocate: absorbed right free neighbor");
        return Ok(unsafe { NonNull::new_unchecked(p) });
      }
    }

    let old_payload_size = old_size - 2 * HEADER_SIZE;
    let new_ptr = self.try_allocate(n)?;
    unsafe {
      ptr::copy_nonoverlapping(p, new_ptr.as_ptr(), old_payload_size.min(n));
    }
    self.free(p);
    tracing::debug!("reallocate: moved payload to a new block");
    Ok(new_ptr)
  }

  /// Merge `block` with free neighbors and reinsert the survivor, preserving
  /// invariant I5 (no two adjacent free blocks). Right-merge runs before
  /// left-merge so the last-block anchor update at the end always sees the
  /// final merged extent.
  fn coalesce(&mut self, block: BlockRef) {
    let mut addr = block.addr();
    let mut size = block.size();

    if let Some(right) = BlockRef::at(addr).right(self.heap.high()) {
      if right.is_free() {
        self.bins.extract(right.addr());
        size += right.size();
      }
    }
    BlockRef::at(addr).set(size, true);

    if let Some(left) = BlockRef::at(addr).left(self.heap.low()) {
      if left.is_free() {
        self.bins.extract(left.addr());
        size += left.size();
        left.set(size, true);
        addr = left.addr();
      }
    }
    self.bins.push(addr);

    if addr as usize + size == self.heap.high() as usize {
      self.last_block = addr;
    }
  }

  /// Split `block` into a `req`-sized head and a free tail remainder, unless
  /// the remainder would be too small to hold its own tags and links.
  fn shrink(&mut self, block: BlockRef, req: usize) {
    let total = block.size();
    debug_assert!(total >= req);
    let rem = total - req;
    if rem < SHRINK_MIN_SIZE {
      return;
    }
    block.set(req, false);
    let tail = BlockRef::at(block.end());
    tail.set(rem, true);
    tracing::trace!(req, rem, "shrink: split off free remainder");
    self.coalesce(tail);
  }

  /// Structural invariant check for debug builds; `0` means every checked
  /// invariant held. Walks the tile once (I3, I4, I5); cross-checks the
  /// free-list membership against the walk (I6, I7).
  pub fn check(&self) -> i32 {
    let mut addr = self.heap.low();
    let mut prev_free = false;
    let mut free_count = 0usize;

    while addr < self.heap.high() {
      let block = BlockRef::at(addr);
      if !block.boundary_consistent() {
        return 1;
      }
      if block.is_free() {
        if prev_free {
          return 2;
        }
        free_count += 1;
      }
      prev_free = block.is_free();
      addr = block.end();
    }
    if addr != self.heap.high() {
      return 3;
    }

    let reachable = self.bins.iter_free().count();
    if reachable != free_count {
      return 4;
    }
    0
  }
}
