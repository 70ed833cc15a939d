/// Copies `len` bytes from `src` to `dest`, correct for overlapping ranges.
///
/// When `dest` lies above `src` the copy runs from the last byte down so no
/// source byte is overwritten before it is read; otherwise it runs upward.
///
/// ```text
///   [1, 2, 3, 4, 5]  src = 0, dest = 1, len = 4  ─►  [1, 1, 2, 3, 4]
///   [1, 2, 3, 4, 5]  src = 1, dest = 0, len = 4  ─►  [2, 3, 4, 5, 5]
/// ```
///
/// # Safety
///
/// `src` must be valid for reads and `dest` valid for writes of `len` bytes.
pub unsafe fn move_bytes(
  dest: *mut u8,
  src: *const u8,
  len: usize,
) -> *mut u8 {
  if dest.cast_const() == src {
    return dest;
  }

  unsafe {
    if dest.addr() > src.addr() {
      for i in (0..len).rev() {
        dest.add(i).write(src.add(i).read());
      }
    } else {
      for i in 0..len {
        dest.add(i).write(src.add(i).read());
      }
    }
  }

  dest
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_overlap_forward_shift() {
    let mut buffer = [1u8, 2, 3, 4, 5];
    let base = buffer.as_mut_ptr();

    let returned = unsafe { move_bytes(base.add(1), base, 4) };

    assert_eq!(returned, base.wrapping_add(1));
    assert_eq!(buffer, [1, 1, 2, 3, 4]);
  }

  #[test]
  fn test_overlap_backward_shift() {
    let mut buffer = [1u8, 2, 3, 4, 5];
    let base = buffer.as_mut_ptr();

    unsafe { move_bytes(base, base.add(1), 4) };

    assert_eq!(buffer, [2, 3, 4, 5, 5]);
  }

  #[test]
  fn test_same_pointer_and_disjoint() {
    let mut buffer = [7u8, 8, 9];
    let base = buffer.as_mut_ptr();
    unsafe { move_bytes(base, base, 3) };
    assert_eq!(buffer, [7, 8, 9]);

    let source = [1u8, 2, 3];
    let mut target = [0u8; 3];
    unsafe { move_bytes(target.as_mut_ptr(), source.as_ptr(), 3) };
    assert_eq!(target, source);
  }
}
