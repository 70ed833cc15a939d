//! Buddy identity by address arithmetic.
//!
//! Chunks start on a [`CHUNK_SIZE`] boundary and every split halves a block
//! in place, so a block of size `S` always starts at a multiple of `S`. Its
//! buddy is the other half of the `2S` block they were cut from, which is
//! the address with bit `S` flipped:
//!
//! ```text
//!   0x800            0x900            0xA00
//!   ├────── 256 ─────┼────── 256 ─────┤
//!   block            buddy = 0x800 ^ 0x100
//! ```

use crate::align::is_aligned;
use crate::block::BlockHeader;
use crate::constants::CHUNK_SIZE;

/// Address of the buddy of the block of `size` bytes at `addr`.
#[inline]
pub const fn buddy_address(
  addr: usize,
  size: usize,
) -> usize {
  addr ^ size
}

/// Returns the buddy header of `block`, if one currently exists.
///
/// A candidate only counts when the header found at the buddy address
/// declares the same size as `block`; a smaller size means the buddy has been
/// split. Chunk-sized blocks never have a buddy and nothing outside their
/// chunk is read.
///
/// # Safety
///
/// `block` must be a header inside a chunk owned by the calling allocator.
pub unsafe fn buddy_of(block: *mut BlockHeader) -> Option<*mut BlockHeader> {
  unsafe {
    let size = (*block).size();
    if size >= CHUNK_SIZE {
      return None;
    }
    debug_assert!(
      is_aligned(block.addr(), size),
      "block {block:?} is not aligned to its size {size}"
    );

    let buddy = block.map_addr(|addr| buddy_address(addr, size));
    if (*buddy).size() == size { Some(buddy) } else { None }
  }
}
