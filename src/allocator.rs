use std::{
  collections::HashSet,
  ptr::{self, NonNull},
};

use crate::{
  align::is_aligned,
  block::BlockHeader,
  class::{class_index, class_size},
  coalesce::coalesce,
  constants::{CHUNK_SIZE, CLASS_COUNT, HEADER_SIZE, MAX_CLASS, MAX_PAYLOAD},
  copy::move_bytes,
  error::{AllocError, ErrorStatus, SourceError},
  freelist::FreeLists,
  source::{HeapSource, SystemSource},
  split::split,
  stats::HeapStats,
};

/// Buddy-system allocator over chunks taken from a [`HeapSource`].
///
/// Construction acquires nothing; the first allocation pulls the first
/// chunk. Every operation leaves its outcome in a status slot readable via
/// [`BuddyAllocator::last_error`]. Dropping the allocator hands every chunk
/// back to its source, invalidating all outstanding pointers.
pub struct BuddyAllocator<S: HeapSource = SystemSource> {
  source: S,
  free_lists: FreeLists,
  chunks: Vec<NonNull<u8>>,
  live: usize,
  status: ErrorStatus,
}

impl BuddyAllocator<SystemSource> {
  pub fn new() -> Self {
    Self::with_source(SystemSource::new())
  }
}

impl Default for BuddyAllocator<SystemSource> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S: HeapSource> BuddyAllocator<S> {
  pub fn with_source(source: S) -> Self {
    Self {
      source,
      free_lists: FreeLists::new(),
      chunks: Vec::new(),
      live: 0,
      status: ErrorStatus::NoError,
    }
  }

  /// Outcome of the most recent operation.
  pub fn last_error(&self) -> ErrorStatus {
    self.status
  }

  pub fn chunk_count(&self) -> usize {
    self.chunks.len()
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  fn record<T>(
    &mut self,
    result: Result<T, AllocError>,
  ) -> Result<T, AllocError> {
    self.status = ErrorStatus::from(&result);
    result
  }

  /// Allocates at least `size` bytes. Returns null on failure, with the
  /// reason in [`BuddyAllocator::last_error`].
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    self.try_allocate(size).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  /// Allocates `count * size` bytes and zeroes the whole granted block.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> *mut u8 {
    self.try_zero_allocate(count, size).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  /// Frees a pointer returned by this allocator. Null is ignored.
  ///
  /// A block whose header already reads as free is reported as a double
  /// free and left alone, whatever the state of its buddy; requiring a
  /// missing buddy as well would miss frees whose buddy is still in use.
  /// The check trusts the header bytes: a pointer that was never allocated
  /// here, or one whose block has since been merged and handed out again,
  /// can slip past it.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a pointer obtained from this allocator, and the
  /// caller must not touch the payload afterwards.
  pub unsafe fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) {
    let _ = unsafe { self.try_deallocate(ptr) };
  }

  /// Overlap-safe copy of `len` bytes. Returns `dest`.
  ///
  /// # Safety
  ///
  /// `src` must be valid for reads and `dest` valid for writes of `len` bytes.
  pub unsafe fn copy(
    &mut self,
    dest: *mut u8,
    src: *const u8,
    len: usize,
  ) -> *mut u8 {
    let dest = unsafe { move_bytes(dest, src, len) };
    self.status = ErrorStatus::NoError;
    dest
  }

  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let result = self.allocate_block(size);
    self.record(result)
  }

  pub fn try_zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let result = self.zeroed_block(count, size);
    self.record(result)
  }

  /// # Safety
  ///
  /// Same contract as [`BuddyAllocator::deallocate`].
  pub unsafe fn try_deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    let result = unsafe { self.release(ptr) };
    self.record(result)
  }

  /// Usable bytes behind a live pointer, which can exceed the request.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live pointer obtained from this allocator.
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { (*BlockHeader::from_payload(ptr.as_ptr())).size() - HEADER_SIZE }
  }

  fn allocate_block(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let needed = match size.checked_add(HEADER_SIZE) {
      Some(needed) if needed <= CHUNK_SIZE => needed,
      _ => {
        return Err(AllocError::TooLarge {
          requested: size,
          max: MAX_PAYLOAD,
        });
      },
    };
    let target = class_index(needed);

    loop {
      if let Some(block) = unsafe { self.free_lists.pop(target) } {
        let payload = self.hand_out(block);
        log::trace!("allocate({size}) -> {payload:?} ({} byte block)", class_size(target));
        return Ok(payload);
      }

      match self.free_lists.nearest_nonempty(target + 1) {
        Some(index) => {
          let head = self.free_lists.head(index);
          unsafe { split(&mut self.free_lists, target, index, head) };
        },
        None => self.grow()?,
      }
    }
  }

  fn zeroed_block(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = match count.checked_mul(size) {
      Some(total) if total <= MAX_PAYLOAD => total,
      _ => {
        return Err(AllocError::TooLarge {
          requested: count.saturating_mul(size),
          max: MAX_PAYLOAD,
        });
      },
    };

    let payload = self.allocate_block(total)?;
    unsafe {
      let granted = self.usable_size(payload);
      ptr::write_bytes(payload.as_ptr(), 0, granted);
    }
    Ok(payload)
  }

  fn hand_out(
    &mut self,
    block: *mut BlockHeader,
  ) -> NonNull<u8> {
    self.live += 1;
    unsafe {
      (*block).set_in_use(true);
      // A header pointer is never null, and neither is the byte after it.
      NonNull::new_unchecked(BlockHeader::payload(block))
    }
  }

  unsafe fn release(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    if ptr.is_null() {
      return Ok(());
    }

    let block = BlockHeader::from_payload(ptr);
    unsafe {
      if !(*block).in_use() {
        log::warn!("double free of {ptr:?}");
        return Err(AllocError::DoubleFree { addr: block.addr() });
      }

      log::trace!("deallocate({ptr:?}) ({} byte block)", (*block).size());

      (*block).set_in_use(false);
      coalesce(&mut self.free_lists, block);
    }
    self.live -= 1;
    Ok(())
  }

  /// Takes one more chunk from the source and lists it as a single
  /// maximal block. Leaves the heap untouched on failure.
  fn grow(&mut self) -> Result<(), AllocError> {
    let chunk = self.source.grow(CHUNK_SIZE).inspect_err(|error| {
      log::warn!("heap source failed: {error}");
    })?;

    if !is_aligned(chunk.addr().get(), CHUNK_SIZE) {
      unsafe { self.source.release(chunk, CHUNK_SIZE) };
      return Err(
        SourceError::Misaligned {
          addr: chunk.addr().get(),
          align: CHUNK_SIZE,
        }
        .into(),
      );
    }

    let block = chunk.as_ptr().cast::<BlockHeader>();
    unsafe {
      BlockHeader::write(block, CHUNK_SIZE);
      self.free_lists.append(MAX_CLASS, block);
    }
    self.chunks.push(chunk);

    log::debug!("acquired chunk #{} at {chunk:?}", self.chunks.len());
    Ok(())
  }

  pub fn stats(&self) -> HeapStats {
    let mut free_blocks = [0; CLASS_COUNT];
    for (index, count) in free_blocks.iter_mut().enumerate() {
      *count = self.free_lists.len(index);
    }

    HeapStats {
      chunks: self.chunks.len(),
      free_blocks,
      live_allocations: self.live,
    }
  }

  /// Walks every chunk and every freelist, panicking on the first broken
  /// invariant.
  ///
  /// Blocks are found physically by hopping from header to header, so the
  /// walk also proves that blocks tile each chunk exactly.
  pub fn check_integrity(&self) {
    let mut listed = HashSet::new();

    for index in 0..CLASS_COUNT {
      let mut prev = ptr::null_mut();
      for node in self.free_lists.iter(index) {
        let header = unsafe { &*node };
        assert_eq!(header.size(), class_size(index), "{node:?} listed in the wrong class");
        assert!(!header.in_use(), "in-use block {node:?} is listed");
        assert_eq!(header.prev(), prev, "broken back link at {node:?}");
        assert!(listed.insert(node.addr()), "{node:?} is listed twice");
        prev = node;
      }
    }

    let mut in_use = 0;
    let mut free = 0;
    for chunk in &self.chunks {
      let base = chunk.as_ptr();
      let mut offset = 0;
      while offset < CHUNK_SIZE {
        let block = base.wrapping_add(offset).cast::<BlockHeader>();
        let header = unsafe { &*block };
        let size = header.size();
        assert!(is_aligned(block.addr(), size), "{block:?} is not aligned to {size}");
        assert!(offset + size <= CHUNK_SIZE, "{block:?} overruns its chunk");

        if header.in_use() {
          in_use += 1;
        } else {
          assert!(listed.contains(&block.addr()), "free block {block:?} is not listed");
          free += 1;
        }
        offset += size;
      }
    }

    assert_eq!(free, listed.len(), "listed blocks outside every chunk");
    assert_eq!(in_use, self.live, "live allocation count drifted");
  }
}

impl<S: HeapSource> Drop for BuddyAllocator<S> {
  fn drop(&mut self) {
    // Newest first, so an sbrk heap can shrink back chunk by chunk.
    while let Some(chunk) = self.chunks.pop() {
      unsafe { self.source.release(chunk, CHUNK_SIZE) };
    }
  }
}
