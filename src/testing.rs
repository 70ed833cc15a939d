//! Chunk-aligned scratch memory for exercising the block-level modules
//! without a heap source.

use crate::block::BlockHeader;
use crate::constants::CHUNK_SIZE;

const ARENA_CHUNKS: usize = 2;

#[repr(C, align(2048))]
struct Chunks([u8; CHUNK_SIZE * ARENA_CHUNKS]);

pub struct Arena {
  base: *mut Chunks,
}

impl Arena {
  pub fn new() -> Self {
    Self {
      base: Box::into_raw(Box::new(Chunks([0; CHUNK_SIZE * ARENA_CHUNKS]))),
    }
  }

  pub fn chunk(
    &mut self,
    index: usize,
  ) -> *mut BlockHeader {
    assert!(index < ARENA_CHUNKS);
    self.base.cast::<u8>().wrapping_add(index * CHUNK_SIZE).cast()
  }

  pub fn at(
    base: *mut BlockHeader,
    offset: usize,
  ) -> *mut BlockHeader {
    base.cast::<u8>().wrapping_add(offset).cast()
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    drop(unsafe { Box::from_raw(self.base) });
  }
}
