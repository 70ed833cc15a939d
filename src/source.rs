//! Heap-growth primitives.
//!
//! The allocator never touches the operating system itself. Whenever every
//! freelist is empty it asks its [`HeapSource`] for one more chunk:
//!
//! ```text
//!   BuddyAllocator ──grow(CHUNK_SIZE)──► HeapSource ──► sbrk(2) / std::alloc
//!                  ◄── chunk base ─────
//! ```

use std::{
  alloc::{self, Layout},
  io,
  ptr::NonNull,
};

use libc::{intptr_t, sbrk};

use crate::{align::is_aligned, align_to, error::SourceError};

/// Hands out fixed-size, size-aligned regions of memory.
pub trait HeapSource {
  /// Returns a fresh region of exactly `size` bytes whose base is a multiple
  /// of `size`. `size` is always a power of two.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, SourceError>;

  /// Gives back a region obtained from [`HeapSource::grow`].
  ///
  /// # Safety
  ///
  /// `chunk` must come from `grow(size)` on this source and must not be used
  /// afterwards.
  unsafe fn release(
    &mut self,
    chunk: NonNull<u8>,
    size: usize,
  );
}

/// Current program break, as reported by `sbrk(0)`.
pub fn program_break() -> *mut u8 {
  unsafe { sbrk(0) }.cast()
}

/// Grows the heap by moving the program break.
///
/// The break is first padded up to the next chunk boundary, so consecutive
/// chunks may be separated by a gap when something else also moves the
/// break. Only a chunk sitting directly below the break can be given back.
/// A failed [`HeapSource::grow`] leaves the break where it found it, unless
/// someone else moved it in between.
#[derive(Debug, Default)]
pub struct SbrkSource;

impl SbrkSource {
  pub const fn new() -> Self {
    Self
  }

  fn extend(increment: intptr_t) -> Result<*mut u8, SourceError> {
    let address = unsafe { sbrk(increment) };

    if address.addr() == usize::MAX {
      return Err(SourceError::Os {
        size: increment.unsigned_abs(),
        source: io::Error::last_os_error(),
      });
    }

    Ok(address.cast())
  }
}

/// Moves a break through `extend` (which behaves like `sbrk`) so that a
/// `size`-aligned region of `size` bytes sits directly below it.
fn claim_aligned(
  size: usize,
  extend: &mut impl FnMut(intptr_t) -> Result<*mut u8, SourceError>,
) -> Result<NonNull<u8>, SourceError> {
  let current = extend(0)?.addr();
  let padding = align_to!(current, size) - current;
  if padding != 0 {
    extend(padding as intptr_t)?;
  }

  let address = match extend(size as intptr_t) {
    Ok(address) => address,
    Err(error) => {
      retreat(extend, current + padding, padding);
      return Err(error);
    },
  };

  if !is_aligned(address.addr(), size) {
    // The break moved under us after padding; only the chunk is on top.
    retreat(extend, address.addr() + size, size);
    return Err(SourceError::Misaligned {
      addr: address.addr(),
      align: size,
    });
  }

  log::debug!("sbrk: {size} bytes at {address:?} after {padding} bytes of padding");

  NonNull::new(address).ok_or(SourceError::Null { size })
}

/// Lowers the break by `amount` if it still sits at `end`.
fn retreat(
  extend: &mut impl FnMut(intptr_t) -> Result<*mut u8, SourceError>,
  end: usize,
  amount: usize,
) {
  if amount == 0 {
    return;
  }

  match extend(0) {
    Ok(top) if top.addr() == end => match extend(-(amount as intptr_t)) {
      Ok(_) => log::debug!("sbrk: returned {amount} bytes below {end:#x}"),
      Err(error) => log::warn!("sbrk: could not return {amount} bytes: {error}"),
    },
    _ => log::debug!("sbrk: {amount} bytes below {end:#x} are no longer on top, leaving them mapped"),
  }
}

impl HeapSource for SbrkSource {
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, SourceError> {
    claim_aligned(size, &mut Self::extend)
  }

  unsafe fn release(
    &mut self,
    chunk: NonNull<u8>,
    size: usize,
  ) {
    retreat(&mut Self::extend, chunk.addr().get() + size, size);
  }
}

/// Takes chunks from the global Rust allocator.
///
/// An optional limit on the number of outstanding chunks turns the source
/// into a bounded heap, which is how out-of-memory paths are exercised.
#[derive(Debug, Default)]
pub struct SystemSource {
  limit: Option<usize>,
  outstanding: usize,
}

impl SystemSource {
  pub const fn new() -> Self {
    Self {
      limit: None,
      outstanding: 0,
    }
  }

  pub const fn with_limit(chunks: usize) -> Self {
    Self {
      limit: Some(chunks),
      outstanding: 0,
    }
  }

  /// Chunks handed out and not yet released.
  pub fn outstanding(&self) -> usize {
    self.outstanding
  }
}

impl HeapSource for SystemSource {
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, SourceError> {
    if let Some(limit) = self.limit {
      if self.outstanding >= limit {
        return Err(SourceError::Exhausted { limit });
      }
    }

    let layout = Layout::from_size_align(size, size)?;
    let chunk = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(SourceError::Null { size })?;
    self.outstanding += 1;

    Ok(chunk)
  }

  unsafe fn release(
    &mut self,
    chunk: NonNull<u8>,
    size: usize,
  ) {
    unsafe { alloc::dealloc(chunk.as_ptr(), Layout::from_size_align_unchecked(size, size)) };
    self.outstanding -= 1;
  }
}
