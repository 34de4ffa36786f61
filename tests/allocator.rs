//! Integration coverage for the public ABI surface: the concrete scenarios
//! and randomized trace replay from the allocator's testable-properties
//! section, driven against a real `Allocator` backed by the live process
//! break rather than any mocked heap.

use std::collections::HashMap;

use rallocator::Allocator;

fn init_tracing() {
  use std::sync::Once;
  static ONCE: Once = Once::new();
  ONCE.call_once(|| {
    let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
  });
}

fn new_heap() -> Allocator {
  init_tracing();
  Allocator::new().expect("sbrk available in test environment")
}

fn is_aligned(p: *mut u8, align: usize) -> bool {
  (p as usize) % align == 0
}

#[test]
fn scenario_basic_trio_first_fit_reuse() {
  let mut heap = new_heap();
  let p1 = heap.allocate(24);
  let p2 = heap.allocate(24);
  assert!(!p1.is_null() && !p2.is_null());
  assert_eq!(heap.check(), 0);

  heap.free(p1);
  let hi_before_reuse = heap.heap_hi();

  let p3 = heap.allocate(24);
  assert_eq!(p3, p1, "first-fit must hand back the freed slot");
  assert_eq!(heap.heap_hi(), hi_before_reuse, "reuse must not grow the heap");
  assert_eq!(heap.check(), 0);
}

#[test]
fn scenario_coalescing_three_interior_frees() {
  let mut heap = new_heap();
  let blocks: Vec<_> = (0..5).map(|_| heap.allocate(24)).collect();
  assert!(blocks.iter().all(|p| !p.is_null()));

  heap.free(blocks[1]);
  heap.free(blocks[3]);
  heap.free(blocks[2]);
  assert_eq!(heap.check(), 0, "after the third free, b+c+d must be one span (I5)");
}

#[test]
fn scenario_split_suppressed_below_min_block_size() {
  let mut heap = new_heap();
  let p = heap.allocate(1024);
  let q = heap.reallocate(p, 1016);
  assert_eq!(q, p, "an 8-byte remainder can't hold a block, so no split happens");
}

#[test]
fn scenario_top_grow_realloc() {
  let mut heap = new_heap();
  let p = heap.allocate(64);
  let hi_before = heap.heap_hi();

  let q = heap.reallocate(p, 4096);
  assert_eq!(q, p);
  assert!(heap.heap_hi() as usize >= hi_before as usize + (4096 - 64));
}

#[test]
fn scenario_move_realloc_copies_payload() {
  let mut heap = new_heap();
  let p = heap.allocate(100);
  let pattern: Vec<u8> = (0..100u8).collect();
  unsafe {
    std::ptr::copy_nonoverlapping(pattern.as_ptr(), p, pattern.len());
  }
  let _pad = heap.allocate(8);

  let q = heap.reallocate(p, 10_000);
  assert_ne!(q, p);
  let copied = unsafe { std::slice::from_raw_parts(q, 100) };
  assert_eq!(copied, pattern.as_slice());
}

#[test]
fn scenario_heap_exhaustion_then_recovery() {
  // Scenario 6 is written against a harness that caps `grow` at K bytes; the
  // public ABI here has no such cap, so we approximate the same shape by
  // allocating a batch, freeing it all, and checking the next allocation of
  // the same size is satisfied without growing the heap (i.e. it came from
  // the free list, the behavior the cap is meant to force).
  let mut heap = new_heap();
  let sizes = [32usize, 64, 128, 256];
  let mut live = Vec::new();
  for &s in sizes.iter().cycle().take(40) {
    let p = heap.allocate(s);
    assert!(!p.is_null());
    live.push(p);
  }
  for p in live.drain(..) {
    heap.free(p);
  }
  assert_eq!(heap.check(), 0);

  let hi_before = heap.heap_hi();
  let p = heap.allocate(32);
  assert!(!p.is_null());
  assert_eq!(heap.heap_hi(), hi_before, "largest freed span satisfies this without growing");
}

#[test]
fn round_trip_shrink_then_grow_preserves_the_shrunken_prefix() {
  let mut heap = new_heap();
  let n = 512;
  let p = heap.allocate(n);
  let pattern: Vec<u8> = (0..n as u8 as usize).map(|i| (i % 251) as u8).collect();
  unsafe { std::ptr::copy_nonoverlapping(pattern.as_ptr(), p, n) };

  let half = n / 2;
  let p = heap.reallocate(p, half);
  let p = heap.reallocate(p, n);

  let observed = unsafe { std::slice::from_raw_parts(p, half) };
  assert_eq!(observed, &pattern[..half]);
}

#[test]
fn idempotent_exact_size_reallocate_returns_the_same_pointer() {
  let mut heap = new_heap();
  let p = heap.allocate(40);
  let q = heap.reallocate(p, 40);
  assert_eq!(q, p, "reallocate to the same size must be a no-op");
}

#[test]
fn allocations_are_aligned_and_in_bounds() {
  let mut heap = new_heap();
  for n in [1usize, 3, 8, 17, 64, 1000, 65536] {
    let p = heap.allocate(n);
    assert!(!p.is_null());
    assert!(is_aligned(p, rallocator::config::ALIGNMENT));
    assert!(heap.heap_lo() <= p);
    assert!(unsafe { p.add(n) } <= heap.heap_hi());
  }
  assert_eq!(heap.check(), 0);
}

#[test]
fn distinct_live_allocations_never_overlap() {
  let mut heap = new_heap();
  let mut spans = Vec::new();
  for n in [16usize, 32, 48, 64, 128, 256] {
    let p = heap.allocate(n) as usize;
    spans.push((p, p + n));
  }
  spans.sort();
  for w in spans.windows(2) {
    assert!(w[0].1 <= w[1].0, "allocations must not overlap: {:?} vs {:?}", w[0], w[1]);
  }
}

/// Randomized trace replay: a seeded sequence of allocate/free/reallocate
/// calls with sizes skewed toward small objects, cross-checked after every
/// call against a shadow map of (size, expected byte pattern) and the
/// allocator's own structural invariant check.
#[test]
fn randomized_trace_replay_preserves_payloads_and_invariants() {
  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  let mut heap = new_heap();
  let mut rng = StdRng::seed_from_u64(0xA110C_u64);
  let mut live: HashMap<*mut u8, (usize, u8)> = HashMap::new();

  for step in 0..2000u32 {
    let op = rng.gen_range(0..10);
    match op {
      0..=5 => {
        // Skewed toward small objects, per academic fragmentation benchmarks.
        let size = if rng.gen_bool(0.7) { rng.gen_range(1..=64) } else { rng.gen_range(65..=4096) };
        let pattern = (step % 251) as u8;
        let p = heap.allocate(size);
        if p.is_null() {
          continue;
        }
        unsafe { std::ptr::write_bytes(p, pattern, size) };
        live.insert(p, (size, pattern));
      }
      6..=7 if !live.is_empty() => {
        let key = *live.keys().nth(rng.gen_range(0..live.len())).unwrap();
        let (size, pattern) = live.remove(&key).unwrap();
        let observed = unsafe { std::slice::from_raw_parts(key, size) };
        assert!(observed.iter().all(|&b| b == pattern), "payload corrupted before free at step {step}");
        heap.free(key);
      }
      _ if !live.is_empty() => {
        let key = *live.keys().nth(rng.gen_range(0..live.len())).unwrap();
        let (old_size, pattern) = live.remove(&key).unwrap();
        let new_size = rng.gen_range(1..=4096);
        let q = heap.reallocate(key, new_size);
        if q.is_null() {
          continue;
        }
        let observed = unsafe { std::slice::from_raw_parts(q, old_size.min(new_size)) };
        assert!(observed.iter().all(|&b| b == pattern), "realloc lost payload bytes at step {step}");
        unsafe { std::ptr::write_bytes(q, pattern, new_size) };
        live.insert(q, (new_size, pattern));
      }
      _ => continue,
    }
    assert_eq!(heap.check(), 0, "structural invariant violated at step {step}");
  }

  for (p, _) in live.drain() {
    heap.free(p);
  }
  assert_eq!(heap.check(), 0);
}
