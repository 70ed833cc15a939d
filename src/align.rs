/// Rounds `$value` up to the next multiple of `$align`.
///
/// `$align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rbuddy::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(2048, 2048), 2048);
/// assert_eq!(align_to!(2049, 2048), 4096);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Returns `true` when `addr` is a multiple of the power of two `align`.
#[inline]
pub const fn is_aligned(
  addr: usize,
  align: usize,
) -> bool {
  addr & (align - 1) == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_to() {
    for shift in 4..=11 {
      let align = 1usize << shift;

      let mut alignments = Vec::new();

      for i in 0..4 {
        let sizes = (align * i + 1)..=(align * (i + 1));
        alignments.push((sizes, align * (i + 1)));
      }

      for (sizes, expected) in alignments {
        for size in sizes {
          assert_eq!(expected, align_to!(size, align));
        }
      }
    }
  }

  #[test]
  fn test_is_aligned() {
    assert!(is_aligned(0, 2048));
    assert!(is_aligned(4096, 2048));
    assert!(!is_aligned(4096 + 16, 2048));
    assert!(is_aligned(4096 + 16, 16));
    assert!(!is_aligned(4096 + 8, 16));
  }
}
