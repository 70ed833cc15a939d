//! Per-class registry of free blocks.
//!
//! ```text
//!   heads[0] (16)    ─► ○ ⇄ ○
//!   heads[1] (32)    ─► ∅
//!   heads[2] (64)    ─► ○
//!   ...
//!   heads[7] (2048)  ─► ○ ⇄ ○ ⇄ ○
//! ```
//!
//! Lists are intrusive: the links live in the free blocks' own headers.

use std::ptr;

use crate::block::BlockHeader;
use crate::constants::CLASS_COUNT;

pub struct FreeLists {
  heads: [*mut BlockHeader; CLASS_COUNT],
}

impl FreeLists {
  pub const fn new() -> Self {
    Self {
      heads: [ptr::null_mut(); CLASS_COUNT],
    }
  }

  #[inline]
  pub fn head(
    &self,
    index: usize,
  ) -> *mut BlockHeader {
    self.heads[index]
  }

  #[inline]
  pub fn is_empty(
    &self,
    index: usize,
  ) -> bool {
    self.heads[index].is_null()
  }

  /// First non-empty class at or above `from`.
  pub fn nearest_nonempty(
    &self,
    from: usize,
  ) -> Option<usize> {
    (from..CLASS_COUNT).find(|&index| !self.is_empty(index))
  }

  /// Appends `node`, together with anything already chained after it, to
  /// the tail of list `index`.
  ///
  /// # Safety
  ///
  /// `node` must be a free header not reachable from any list.
  pub unsafe fn append(
    &mut self,
    index: usize,
    node: *mut BlockHeader,
  ) {
    unsafe {
      let mut current = self.heads[index];
      if current.is_null() {
        (*node).set_prev(ptr::null_mut());
        self.heads[index] = node;
        return;
      }

      while !(*current).next().is_null() {
        current = (*current).next();
      }
      (*current).set_next(node);
      (*node).set_prev(current);
    }
  }

  /// Detaches `node` from the list of its class and clears its links.
  ///
  /// # Safety
  ///
  /// `node` must be linked into the list of its class, or be one of a pair
  /// passed to [`FreeLists::reconcile`] whose partner is.
  pub unsafe fn remove(
    &mut self,
    node: *mut BlockHeader,
  ) -> *mut BlockHeader {
    unsafe {
      let index = (*node).class();
      let next = (*node).next();
      let prev = (*node).prev();

      if prev.is_null() {
        if self.heads[index] == node {
          self.heads[index] = next;
        }
      } else {
        (*prev).set_next(next);
      }
      if !next.is_null() {
        (*next).set_prev(prev);
      }

      (*node).unlink();
      node
    }
  }

  /// Removes and returns the head of list `index`.
  ///
  /// # Safety
  ///
  /// Every node of the list must still be a valid header.
  pub unsafe fn pop(
    &mut self,
    index: usize,
  ) -> Option<*mut BlockHeader> {
    let head = self.heads[index];
    if head.is_null() {
      return None;
    }
    Some(unsafe { self.remove(head) })
  }

  /// Prepares two nodes for removal in either order.
  ///
  /// When `one` and `two` are direct neighbors, removing one of them first
  /// leaves the other pointing at a node that is no longer listed. Bridging
  /// over the partner beforehand makes both removals patch the surviving
  /// neighbors only. Nodes between them are left untouched.
  ///
  /// # Safety
  ///
  /// Both nodes must be listed in the same class.
  pub unsafe fn reconcile(
    one: *mut BlockHeader,
    two: *mut BlockHeader,
  ) {
    unsafe {
      if (*one).next() == two {
        (*one).set_next((*two).next());
      }
      if (*one).prev() == two {
        (*one).set_prev((*two).prev());
      }
      if (*two).next() == one {
        (*two).set_next((*one).next());
      }
      if (*two).prev() == one {
        (*two).set_prev((*one).prev());
      }
    }
  }

  pub fn iter(
    &self,
    index: usize,
  ) -> Iter<'_> {
    Iter {
      current: self.heads[index],
      _lists: self,
    }
  }

  pub fn len(
    &self,
    index: usize,
  ) -> usize {
    self.iter(index).count()
  }
}

/// Walks one list from head to tail.
pub struct Iter<'a> {
  current: *mut BlockHeader,
  _lists: &'a FreeLists,
}

impl Iterator for Iter<'_> {
  type Item = *mut BlockHeader;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }
    let node = self.current;
    self.current = unsafe { (*node).next() };
    Some(node)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::Arena;

  /// Writes `count` free 256-byte headers at the start of a chunk.
  fn blocks(
    arena: &mut Arena,
    count: usize,
  ) -> Vec<*mut BlockHeader> {
    let chunk = arena.chunk(0);
    (0..count)
      .map(|i| {
        let block = Arena::at(chunk, i * 256);
        unsafe { BlockHeader::write(block, 256) };
        block
      })
      .collect()
  }

  fn listed(
    lists: &FreeLists,
    index: usize,
  ) -> Vec<*mut BlockHeader> {
    lists.iter(index).collect()
  }

  #[test]
  fn test_append_and_remove() {
    let mut arena = Arena::new();
    let nodes = blocks(&mut arena, 3);
    let mut lists = FreeLists::new();
    let index = 4;

    unsafe {
      for &node in &nodes {
        lists.append(index, node);
      }
      assert_eq!(listed(&lists, index), nodes);
      assert_eq!(lists.nearest_nonempty(0), Some(index));

      lists.remove(nodes[1]);
      assert_eq!(listed(&lists, index), vec![nodes[0], nodes[2]]);
      assert_eq!((*nodes[2]).prev(), nodes[0]);

      lists.remove(nodes[0]);
      assert_eq!(lists.head(index), nodes[2]);
      assert!((*nodes[2]).prev().is_null());

      assert_eq!(lists.pop(index), Some(nodes[2]));
      assert!(lists.is_empty(index));
      assert_eq!(lists.pop(index), None);
      assert_eq!(lists.nearest_nonempty(0), None);
    }
  }

  #[test]
  fn test_append_keeps_chain() {
    let mut arena = Arena::new();
    let nodes = blocks(&mut arena, 3);
    let (middle, last) = (nodes[1], nodes[2]);
    let mut lists = FreeLists::new();

    unsafe {
      lists.append(4, nodes[0]);
      (*middle).set_next(last);
      (*last).set_prev(middle);
      lists.append(4, middle);
    }

    assert_eq!(listed(&lists, 4), nodes);
    assert_eq!(lists.len(4), 3);
  }

  #[test]
  fn test_reconcile_adjacent_pair_in_either_order() {
    for first_removed in 0..2 {
      for layout in [[0, 1, 2, 3], [2, 0, 1, 3], [3, 2, 1, 0], [1, 0, 2, 3]] {
        let mut arena = Arena::new();
        let nodes = blocks(&mut arena, 4);
        let mut lists = FreeLists::new();

        unsafe {
          for i in layout {
            lists.append(4, nodes[i]);
          }

          let pair = [nodes[0], nodes[1]];
          FreeLists::reconcile(pair[0], pair[1]);
          lists.remove(pair[first_removed]);
          lists.remove(pair[1 - first_removed]);
        }

        let survivors: Vec<_> = layout.iter().filter(|&&i| i >= 2).map(|&i| nodes[i]).collect();
        assert_eq!(listed(&lists, 4), survivors, "layout {layout:?}");
        for pair in survivors.windows(2) {
          assert_eq!(unsafe { (*pair[1]).prev() }, pair[0]);
        }
      }
    }
  }

  #[test]
  fn test_reconcile_keeps_nodes_between_pair() {
    let mut arena = Arena::new();
    let nodes = blocks(&mut arena, 4);
    let mut lists = FreeLists::new();

    unsafe {
      for &node in &nodes {
        lists.append(4, node);
      }
      FreeLists::reconcile(nodes[0], nodes[3]);
      lists.remove(nodes[3]);
      lists.remove(nodes[0]);
    }

    assert_eq!(listed(&lists, 4), vec![nodes[1], nodes[2]]);
  }
}
