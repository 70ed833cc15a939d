use crate::block::BlockHeader;
use crate::class::class_size;
use crate::freelist::FreeLists;

/// Halves `block`, a free block listed in class `current`, until class
/// `target` is reached.
///
/// Each step removes the block from its list, shrinks it to half its size,
/// writes a sibling header at the midpoint, lists the pair one class lower
/// and continues with the sibling:
///
/// ```text
///   current:  [                  block                  ]
///   step 1:   [       block        ][      sibling      ]   (listed at current - 1)
///   step 2:                         [  block  ][ sibling ]   (listed at current - 2)
/// ```
///
/// The lower half of the final split becomes the head of `target` when that
/// list was empty, which is the case whenever the caller had to split.
///
/// # Safety
///
/// `block` must be listed in class `current`, and `target <= current`.
pub unsafe fn split(
  lists: &mut FreeLists,
  target: usize,
  current: usize,
  block: *mut BlockHeader,
) {
  debug_assert!(target <= current, "cannot split class {current} up to {target}");
  if target == current {
    return;
  }

  unsafe {
    lists.remove(block);

    let half = class_size(current - 1);
    (*block).set_size(half);

    let sibling = block.cast::<u8>().wrapping_add(half).cast::<BlockHeader>();
    BlockHeader::write(sibling, half);

    (*block).set_next(sibling);
    (*sibling).set_prev(block);
    lists.append(current - 1, block);

    log::trace!("split {block:?} into two {half}-byte blocks");

    split(lists, target, current - 1, sibling);
  }
}
