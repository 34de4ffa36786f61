//! Error taxonomy, split along the spec's §7 recoverable/fatal line.
//!
//! `AllocError` is data: it is the reason a `try_allocate`/`try_reallocate`
//! call returned `Err`, and the public ABI (`allocate`/`reallocate`)
//! collapses it to a null pointer the way C's `malloc` does. `FatalViolation`
//! is never returned to a caller — it exists only to give the `tracing::error!`
//! event emitted right before a precondition panic a structured field.

use std::fmt;

/// A recoverable runtime failure: the backing break-pointer primitive
/// refused to grow the heap. No allocator state is mutated before this is
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  HeapExhausted,
}

impl fmt::Display for AllocError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AllocError::HeapExhausted => write!(f, "heap exhausted: break-pointer primitive refused to grow"),
    }
  }
}

impl std::error::Error for AllocError {}

/// A caller precondition violation: a programmer error, not a runtime
/// condition. Reported by panic (debug) or silently undefined behavior
/// (release), never by `Result`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FatalViolation {
  InvalidFree,
  DoubleFree,
  CorruptBoundary,
}

impl fmt::Display for FatalViolation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let msg = match self {
      FatalViolation::InvalidFree => "pointer is not a live payload in this heap",
      FatalViolation::DoubleFree => "pointer was already freed",
      FatalViolation::CorruptBoundary => "header and footer disagree",
    };
    f.write_str(msg)
  }
}
