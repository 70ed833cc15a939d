use crate::constants::{CHUNK_SIZE, MIN_BLOCK_SIZE};

/// Smallest class whose blocks hold `size` bytes, header included.
///
/// ```text
///   class:  0    1    2    3     4     5     6      7
///   size:   16   32   64   128   256   512   1024   2048
/// ```
///
/// Callers reject sizes above [`CHUNK_SIZE`] before asking.
#[inline]
pub fn class_index(size: usize) -> usize {
  debug_assert!(size <= CHUNK_SIZE, "{size} bytes exceeds the largest class");

  let mut index = 0;
  let mut class = MIN_BLOCK_SIZE;
  while size > class {
    class <<= 1;
    index += 1;
  }
  index
}

/// Block size of class `index`.
#[inline]
pub const fn class_size(index: usize) -> usize {
  MIN_BLOCK_SIZE << index
}
