use crate::block::BlockHeader;
use crate::buddy::buddy_of;
use crate::freelist::FreeLists;

/// Joins two free buddies into one block of twice the size, headed at the
/// lower address.
///
/// # Safety
///
/// `block` and `buddy` must be buddies of equal size, unlisted.
pub unsafe fn merge(
  block: *mut BlockHeader,
  buddy: *mut BlockHeader,
) -> *mut BlockHeader {
  let first = if block.addr() < buddy.addr() { block } else { buddy };
  unsafe {
    let size = (*first).size() * 2;
    (*first).set_size(size);
  }
  first
}

/// Lists a block that has just been marked free, then keeps merging it with
/// its buddy while that buddy is free too.
///
/// Stops at the first block without a free buddy of the same size, which
/// includes every chunk-sized block. Returns the block that ended up listed.
///
/// # Safety
///
/// `block` must be a free, unlisted block inside an owned chunk.
pub unsafe fn coalesce(
  lists: &mut FreeLists,
  block: *mut BlockHeader,
) -> *mut BlockHeader {
  unsafe {
    debug_assert!(!(*block).in_use());

    // Links of an in-use block are stale.
    (*block).unlink();
    lists.append((*block).class(), block);

    let mut block = block;
    while let Some(buddy) = buddy_of(block).filter(|&buddy| !(*buddy).in_use()) {
      FreeLists::reconcile(block, buddy);
      lists.remove(buddy);
      lists.remove(block);

      block = merge(block, buddy);
      lists.append((*block).class(), block);

      log::trace!("merged into {block:?} ({} bytes)", (*block).size());
    }
    block
  }
}
