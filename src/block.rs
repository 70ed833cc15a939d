use std::ptr;

use crate::class::{class_index, class_size};
use crate::constants::HEADER_SIZE;

/// Every block start is a multiple of this, leaving the low bits of a link
/// free for the tag.
pub(crate) const TAG_ALIGN: usize = 16;

const TAG_MASK: usize = TAG_ALIGN - 1;
const IN_USE: usize = 0b0001;
const CLASS_MASK: usize = 0b1110;
const CLASS_SHIFT: usize = 1;

/// Metadata prefixed to every block, free or in use.
///
/// ```text
///   ┌──────────────────────────────────────┬────────────┬────────┐
///   │ next: freelist successor             │ class: 3   │ use: 1 │
///   ├──────────────────────────────────────┴────────────┴────────┤
///   │ prev: freelist predecessor                                 │
///   └────────────────────────────────────────────────────────────┘
/// ```
///
/// The size class and the in-use flag ride in the low bits of `next`, which
/// are always zero in a real link. The links are only meaningful while the
/// block sits in a freelist.
#[repr(C)]
pub struct BlockHeader {
  next: *mut BlockHeader,
  prev: *mut BlockHeader,
}

impl BlockHeader {
  /// Writes a free, unlinked header describing a block of `size` bytes.
  ///
  /// # Safety
  ///
  /// `at` must be valid for writes of a header and aligned to [`TAG_ALIGN`].
  pub unsafe fn write(
    at: *mut BlockHeader,
    size: usize,
  ) {
    unsafe {
      at.write(BlockHeader {
        next: ptr::null_mut(),
        prev: ptr::null_mut(),
      });
      (*at).set_size(size);
    }
  }

  /// Start of the payload handed to callers.
  #[inline]
  pub fn payload(block: *mut BlockHeader) -> *mut u8 {
    block.cast::<u8>().wrapping_add(HEADER_SIZE)
  }

  /// Recovers the header from a payload pointer.
  #[inline]
  pub fn from_payload(payload: *mut u8) -> *mut BlockHeader {
    payload.wrapping_sub(HEADER_SIZE).cast()
  }

  #[inline]
  fn tag(&self) -> usize {
    self.next.addr() & TAG_MASK
  }

  #[inline]
  fn set_tag(
    &mut self,
    tag: usize,
  ) {
    self.next = self.next.map_addr(|addr| (addr & !TAG_MASK) | tag);
  }

  #[inline]
  pub fn class(&self) -> usize {
    (self.tag() & CLASS_MASK) >> CLASS_SHIFT
  }

  /// Total block size in bytes, header included.
  #[inline]
  pub fn size(&self) -> usize {
    class_size(self.class())
  }

  pub fn set_size(
    &mut self,
    size: usize,
  ) {
    let class = class_index(size);
    debug_assert_eq!(class_size(class), size, "block size {size} is not a size class");

    self.set_tag((self.tag() & !CLASS_MASK) | (class << CLASS_SHIFT));
  }

  #[inline]
  pub fn in_use(&self) -> bool {
    self.tag() & IN_USE != 0
  }

  pub fn set_in_use(
    &mut self,
    in_use: bool,
  ) {
    let tag = if in_use {
      self.tag() | IN_USE
    } else {
      self.tag() & !IN_USE
    };
    self.set_tag(tag);
  }

  #[inline]
  pub fn next(&self) -> *mut BlockHeader {
    self.next.map_addr(|addr| addr & !TAG_MASK)
  }

  pub fn set_next(
    &mut self,
    next: *mut BlockHeader,
  ) {
    debug_assert_eq!(next.addr() & TAG_MASK, 0, "misaligned freelist link {next:?}");

    let tag = self.tag();
    self.next = next.map_addr(|addr| addr | tag);
  }

  #[inline]
  pub fn prev(&self) -> *mut BlockHeader {
    self.prev
  }

  pub fn set_prev(
    &mut self,
    prev: *mut BlockHeader,
  ) {
    self.prev = prev;
  }

  pub fn unlink(&mut self) {
    self.set_next(ptr::null_mut());
    self.set_prev(ptr::null_mut());
  }
}
