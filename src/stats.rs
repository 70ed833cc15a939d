use crate::class::class_size;
use crate::constants::{CHUNK_SIZE, CLASS_COUNT};

/// Snapshot of the heap, taken by walking the freelists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  /// Chunks obtained from the heap source.
  pub chunks: usize,
  /// Free blocks per size class.
  pub free_blocks: [usize; CLASS_COUNT],
  /// Blocks currently handed out.
  pub live_allocations: usize,
}

impl HeapStats {
  /// Total bytes under management, headers included.
  pub const fn capacity(&self) -> usize {
    self.chunks * CHUNK_SIZE
  }

  /// Bytes held by free blocks, headers included.
  pub fn free_bytes(&self) -> usize {
    self
      .free_blocks
      .iter()
      .enumerate()
      .map(|(index, count)| count * class_size(index))
      .sum()
  }

  /// Bytes held by in-use blocks, headers included.
  pub fn used_bytes(&self) -> usize {
    self.capacity() - self.free_bytes()
  }

  /// Whether every chunk is back to a single free block.
  pub fn is_drained(&self) -> bool {
    self.live_allocations == 0
      && self.free_blocks[CLASS_COUNT - 1] == self.chunks
      && self.free_blocks[..CLASS_COUNT - 1].iter().all(|&count| count == 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_accounting() {
    let mut stats = HeapStats {
      chunks: 2,
      ..HeapStats::default()
    };
    stats.free_blocks[CLASS_COUNT - 1] = 1;
    stats.free_blocks[0] = 1;
    stats.free_blocks[1] = 1;
    stats.live_allocations = 1;

    assert_eq!(stats.capacity(), 4096);
    assert_eq!(stats.free_bytes(), 2048 + 16 + 32);
    assert_eq!(stats.used_bytes(), 4096 - 2048 - 48);
    assert!(!stats.is_drained());
  }

  #[test]
  fn test_drained() {
    let mut stats = HeapStats {
      chunks: 3,
      ..HeapStats::default()
    };
    stats.free_blocks[CLASS_COUNT - 1] = 3;
    assert!(stats.is_drained());

    assert!(HeapStats::default().is_drained());
  }
}
