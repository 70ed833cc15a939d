use std::collections::HashMap;

use proptest::prelude::*;
use rbuddy::{BuddyAllocator, ErrorStatus, SystemSource, constants::MAX_PAYLOAD};

#[derive(Clone, Debug)]
enum Op {
  Alloc(usize),
  Dealloc,
}

/// Pairs of alloc/dealloc ops sharing an id, shuffled together.
fn ops() -> impl Strategy<Value = Vec<(usize, Op)>> {
  prop::collection::vec(0..=MAX_PAYLOAD, 1..64)
    .prop_map(|sizes| {
      sizes
        .into_iter()
        .enumerate()
        .flat_map(|(id, size)| [(id, Op::Alloc(size)), (id, Op::Dealloc)])
        .collect::<Vec<_>>()
    })
    .prop_shuffle()
}

proptest! {
  /// Whatever the interleaving, freeing everything must merge each chunk
  /// back into a single maximal block.
  #[test]
  fn no_fragmentation_survives_drainage(ops in ops(), limit in 1usize..6) {
    let _ = env_logger::try_init();

    let mut allocator = BuddyAllocator::with_source(SystemSource::with_limit(limit));
    let mut live = HashMap::new();
    let mut deferred = Vec::new();

    for (id, op) in ops {
      match op {
        Op::Alloc(size) => {
          let ptr = allocator.allocate(size);
          if ptr.is_null() {
            prop_assert_eq!(allocator.last_error(), ErrorStatus::OutOfMemory);
          } else {
            unsafe { ptr.write_bytes(id as u8, size) };
            live.insert(id, ptr);
          }
        }
        Op::Dealloc => match live.remove(&id) {
          Some(ptr) => unsafe { allocator.deallocate(ptr) },
          None => deferred.push(id),
        },
      }
      allocator.check_integrity();
    }

    for id in deferred {
      if let Some(ptr) = live.remove(&id) {
        unsafe { allocator.deallocate(ptr) };
      }
    }

    prop_assert!(live.is_empty());
    allocator.check_integrity();

    let stats = allocator.stats();
    prop_assert!(stats.chunks <= limit);
    prop_assert!(stats.is_drained(), "{:?}", stats);
  }
}
