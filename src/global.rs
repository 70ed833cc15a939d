//! C-style free functions over a default allocator.
//!
//! Each thread lazily gets its own [`BuddyAllocator`] backed by
//! [`SystemSource`](crate::SystemSource). [`errno`] reports the outcome of
//! the calling thread's most recent call. Pointers must be freed on the
//! thread that allocated them and die with that thread.

use std::cell::RefCell;

use crate::{allocator::BuddyAllocator, error::ErrorStatus};

thread_local! {
  static HEAP: RefCell<BuddyAllocator> = RefCell::new(BuddyAllocator::new());
}

pub fn malloc(size: usize) -> *mut u8 {
  HEAP.with_borrow_mut(|heap| heap.allocate(size))
}

pub fn calloc(
  count: usize,
  size: usize,
) -> *mut u8 {
  HEAP.with_borrow_mut(|heap| heap.zero_allocate(count, size))
}

/// # Safety
///
/// `ptr` must be null or come from [`malloc`]/[`calloc`] on this thread.
pub unsafe fn free(ptr: *mut u8) {
  HEAP.with_borrow_mut(|heap| unsafe { heap.deallocate(ptr) })
}

/// # Safety
///
/// `src` must be valid for reads and `dest` valid for writes of `len` bytes.
pub unsafe fn memmove(
  dest: *mut u8,
  src: *const u8,
  len: usize,
) -> *mut u8 {
  HEAP.with_borrow_mut(|heap| unsafe { heap.copy(dest, src, len) })
}

pub fn errno() -> ErrorStatus {
  HEAP.with_borrow(|heap| heap.last_error())
}
