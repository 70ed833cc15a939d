//! Buddy allocator benchmarks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rbuddy::{BuddyAllocator, constants::MAX_PAYLOAD};

fn bench_alloc_free_cycle(c: &mut Criterion) {
  let sizes: &[usize] = &[1, 16, 100, 500, MAX_PAYLOAD];
  let mut group = c.benchmark_group("alloc_free_cycle");

  for &size in sizes {
    group.bench_with_input(BenchmarkId::new("buddy", size), &size, |b, &size| {
      let mut allocator = BuddyAllocator::new();
      // Keep one block live so the chunk never fully merges and every
      // iteration walks the split path.
      let pin = allocator.allocate(1);
      b.iter(|| {
        let ptr = allocator.allocate(black_box(size));
        unsafe { allocator.deallocate(black_box(ptr)) };
      });
      unsafe { allocator.deallocate(pin) };
    });
  }
  group.finish();
}

fn bench_alloc_burst(c: &mut Criterion) {
  let mut group = c.benchmark_group("alloc_burst");

  group.bench_function("1000x64B", |b| {
    b.iter(|| {
      let mut allocator = BuddyAllocator::new();
      let ptrs: Vec<_> = (0..1000).map(|_| allocator.allocate(64)).collect();
      for ptr in ptrs {
        unsafe { allocator.deallocate(ptr) };
      }
      black_box(allocator.chunk_count());
    });
  });

  group.finish();
}

criterion_group!(benches, bench_alloc_free_cycle, bench_alloc_burst);
criterion_main!(benches);
