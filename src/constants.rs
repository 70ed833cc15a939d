//! Heap geometry.
//!
//! Everything else in the crate is derived from [`CHUNK_SIZE`] and
//! [`CLASS_COUNT`]; shrinking the chunk (for example to exercise growth in
//! tests) only requires editing these two values.

use std::mem;

use static_assertions::{assert_eq_size, const_assert};

use crate::block::{BlockHeader, TAG_ALIGN};

/// Bytes requested from the heap source per growth step. Also the largest
/// block size.
pub const CHUNK_SIZE: usize = 2048;

/// Number of power-of-two size classes, smallest block first.
pub const CLASS_COUNT: usize = 8;

/// Index of the class holding whole chunks.
pub const MAX_CLASS: usize = CLASS_COUNT - 1;

/// Size of the blocks in class 0.
pub const MIN_BLOCK_SIZE: usize = CHUNK_SIZE >> MAX_CLASS;

/// Bytes reserved in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Largest request a single allocation can satisfy.
pub const MAX_PAYLOAD: usize = CHUNK_SIZE - HEADER_SIZE;

const_assert!(CHUNK_SIZE.is_power_of_two());
// The class index lives in three tag bits of the header.
const_assert!(CLASS_COUNT >= 1 && CLASS_COUNT <= 8);
const_assert!(MIN_BLOCK_SIZE >= TAG_ALIGN);
const_assert!(MIN_BLOCK_SIZE >= HEADER_SIZE);
assert_eq_size!(BlockHeader, [usize; 2]);
