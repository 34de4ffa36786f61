//! # rallocator — a segregated-fit, boundary-tag heap allocator
//!
//! `rallocator` manages a single contiguous heap grown one-way via `sbrk(2)`,
//! the same break-pointer primitive the crate's bump-allocator predecessor
//! used, but on top of it implements the three classical allocator
//! operations — `allocate`, `free`, `reallocate` — with real block reuse:
//! boundary-tag blocks, a segregated free-list index, splitting, and
//! coalescing.
//!
//! ## Overview
//!
//! ```text
//!   allocate(n)                         free(p)
//!      │                                   │
//!      ▼                                   ▼
//!   ┌──────────────────────┐      ┌──────────────────┐
//!   │ bin_of(req)..NUM_BINS│      │ block_of(p)       │
//!   │   -> pull_fit        │      │   -> coalesce     │
//!   │   -> shrink          │      │   -> push         │
//!   └──────────┬───────────┘      └────────┬──────────┘
//!              │ miss                      │
//!              ▼                           ▼
//!   ┌──────────────────────┐      ┌──────────────────┐
//!   │ extend topmost free  │      │ segregated free-  │
//!   │ block, else sbrk(n)  │◄─────│ list registry      │
//!   └──────────────────────┘      └──────────────────┘
//! ```
//!
//! Every live block carries a boundary tag — an identical packed
//! `(size, free)` word at both its low and high ends — so the block
//! immediately to the left in memory can be found in O(1) without a
//! separate `prev_size` field. Free blocks are threaded onto one of
//! [`config::NUM_BINS`] doubly-linked, per-size-class lists; `allocate`
//! walks bins in ascending order from the requested size's class and takes
//! the first block that fits.
//!
//! ## Crate layout
//!
//! ```text
//!   rallocator
//!   ├── align       - alignment arithmetic shared by block and heap layout
//!   ├── config      - compile-time tunables (ALIGNMENT, MIN_POW, MAX_POW, ...)
//!   ├── error       - AllocError (recoverable) / FatalViolation (precondition)
//!   ├── block       - boundary-tag header/footer and free-list link slots
//!   ├── sizeclass   - size -> bin mapping
//!   ├── heap        - heap region manager wrapping libc::sbrk
//!   ├── freelist    - segregated free-list registry (push/pull_fit/extract)
//!   └── engine      - Allocator: allocate/free/reallocate on top of the above
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use rallocator::Allocator;
//!
//! let mut heap = Allocator::new().expect("sbrk available");
//!
//! let p = heap.allocate(64);
//! assert!(!p.is_null());
//!
//! let p = heap.reallocate(p, 256);
//! heap.free(p);
//! ```
//!
//! ## Safety
//!
//! This crate is inherently unsafe: it manages raw memory and hands out raw
//! pointers. `Allocator` is single-threaded by construction (it holds a raw
//! pointer field, so it is not `Sync`); sharing one instance across threads
//! requires an external lock, which this crate deliberately does not
//! provide. Passing a pointer to `free`/`reallocate` that was not returned
//! by this allocator, or freeing the same pointer twice, is a programmer
//! error: in debug builds it aborts via `debug_assert!`, in release builds
//! it is undefined behavior.

pub mod align;
mod block;
pub mod config;
mod engine;
pub mod error;
mod freelist;
mod heap;
mod sizeclass;

pub use engine::Allocator;
pub use error::AllocError;
