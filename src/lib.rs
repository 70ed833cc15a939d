//! # rbuddy - A Buddy-System Memory Allocator
//!
//! This crate provides a user-space **buddy allocator** that carves
//! power-of-two blocks out of fixed-size chunks obtained from a heap-growth
//! primitive such as `sbrk(2)`.
//!
//! ## Overview
//!
//! Every chunk starts life as one free block. Requests are rounded up to a
//! size class and served by halving larger blocks on demand; freed blocks are
//! merged with their buddy as long as the buddy is free as well:
//!
//! ```text
//!   Splitting a fresh chunk for a 100-byte request (128-byte class):
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                               2048                               │
//!   └──────────────────────────────────────────────────────────────────┘
//!   ┌────────────────────────────────┬────────────────┬────────┬───┬───┐
//!   │              1024              │      512       │  256   │128│128│
//!   └────────────────────────────────┴────────────────┴────────┴───┴───┘
//!                                                                 ▲
//!                                                                 └── handed out
//!
//!   Freeing it merges the pair back, then each level up, until the whole
//!   chunk is a single free block again.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rbuddy
//!   ├── align      - Alignment helpers (align_to!, is_aligned)
//!   ├── constants  - Heap geometry (chunk size, size classes, header size)
//!   ├── block      - Tagged block header (internal)
//!   ├── class      - Size-class index
//!   ├── buddy      - Buddy address computation
//!   ├── freelist   - Per-class intrusive freelists (internal)
//!   ├── split      - Block splitting (internal)
//!   ├── coalesce   - Buddy merging (internal)
//!   ├── copy       - Overlap-safe byte copy
//!   ├── source     - HeapSource trait, SbrkSource, SystemSource
//!   ├── error      - AllocError, SourceError, ErrorStatus
//!   ├── stats      - HeapStats snapshots
//!   ├── allocator  - BuddyAllocator
//!   └── global     - malloc / calloc / free / memmove / errno
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rbuddy::{BuddyAllocator, ErrorStatus};
//!
//! let mut allocator = BuddyAllocator::new();
//!
//! let ptr = allocator.allocate(100) as *mut u64;
//! assert!(!ptr.is_null());
//!
//! unsafe {
//!     *ptr = 42;
//!     allocator.deallocate(ptr as *mut u8);
//!
//!     // A second free is caught and ignored.
//!     allocator.deallocate(ptr as *mut u8);
//! }
//! assert_eq!(allocator.last_error(), ErrorStatus::DoubleFreeDetected);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ next | class |  │  │  ┌──────────────────────────┐  │
//!   │  │        in_use   │  │  │                          │  │
//!   │  │ prev            │  │  │  size - header usable    │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │   2 machine words     │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! The buddy of a block of size `S` lives at the block's address with bit
//! `S` flipped, which holds because chunks are aligned to their own size.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization; the allocator is `!Send`
//! - **One chunk per request**: nothing above `MAX_PAYLOAD` bytes
//! - **No resizing**: there is no realloc
//! - **Heuristic double-free detection**: trusts the header in front of the
//!   pointer
//!
//! ## Safety
//!
//! Deallocation and copying take raw pointers and are `unsafe`.

pub mod align;
mod allocator;
mod block;
mod buddy;
mod class;
mod coalesce;
pub mod constants;
mod copy;
mod error;
mod freelist;
pub mod global;
mod source;
mod split;
mod stats;

#[cfg(test)]
mod testing;

pub use allocator::BuddyAllocator;
pub use buddy::buddy_address;
pub use class::{class_index, class_size};
pub use copy::move_bytes;
pub use error::{AllocError, ErrorStatus, SourceError};
pub use source::{HeapSource, SbrkSource, SystemSource, program_break};
pub use stats::HeapStats;
