use std::{mem, ptr::NonNull};

use crate::{align_to, provider::Region};

/// Bytes reserved at the front of every block grown onto the chain.
pub(crate) const BLOCK_HEADER_SIZE: usize = 4 * mem::size_of::<usize>();

/// Bytes reserved at the front of the head block: the block header plus
/// the pool-wide fields (threshold, current, large and cleanup heads).
pub(crate) const HEAD_HEADER_SIZE: usize = BLOCK_HEADER_SIZE + 4 * mem::size_of::<usize>();

/// One contiguous region of the chain.
///
/// `cursor` and `limit` are byte offsets into `region`.
///
/// ```text
///   ┌──────────┬──────────────────────┬───────────────────────┐
///   │  header  │   bumped allocations │       free space      │
///   └──────────┴──────────────────────┴───────────────────────┘
///   0       header                 cursor                  limit
/// ```
#[derive(Debug)]
pub struct Block {
  region: Region,
  header: usize,
  cursor: usize,
  limit: usize,
  pub fail_count: usize,
}

impl Block {
  pub fn new(
    region: Region,
    header: usize,
  ) -> Self {
    let limit = region.len();
    Self {
      region,
      header: header.min(limit),
      cursor: header.min(limit),
      limit,
      fail_count: 0,
    }
  }

  /// Carves `size` bytes off the free space, starting at an address that is
  /// a multiple of `align` when one is given.
  pub fn bump(
    &mut self,
    size: usize,
    align: Option<usize>,
  ) -> Option<NonNull<u8>> {
    let base = self.region.as_ptr() as usize;

    let start = match align {
      Some(align) => align_to!(base + self.cursor, align) - base,
      None => self.cursor,
    };

    if start > self.limit || self.limit - start < size {
      return None;
    }

    self.cursor = start + size;

    // `start <= limit == region.len()`, so the pointer stays inside (or one
    // past) the region.
    Some(unsafe { NonNull::new_unchecked(self.region.as_ptr().add(start)) })
  }

  /// Rewinds the cursor to just past the header.
  pub fn rewind(&mut self) {
    self.cursor = self.header;
    self.fail_count = 0;
  }

  #[cfg(test)]
  pub fn cursor(&self) -> usize {
    self.cursor
  }

  #[cfg(test)]
  pub fn limit(&self) -> usize {
    self.limit
  }

  #[cfg(test)]
  pub fn remaining(&self) -> usize {
    self.limit - self.cursor
  }

  pub fn into_region(self) -> Region {
    self.region
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::{Malloc, RawMemory};

  fn block(
    size: usize,
    header: usize,
  ) -> Block {
    Block::new(Malloc.reserve(size).unwrap(), header)
  }

  #[test]
  fn test_bump_advances_cursor() {
    let mut block = block(256, BLOCK_HEADER_SIZE);

    assert_eq!(block.cursor(), BLOCK_HEADER_SIZE);
    assert_eq!(block.limit(), 256);

    let first = block.bump(10, None).unwrap();
    let second = block.bump(10, None).unwrap();

    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 10);
    assert_eq!(block.cursor(), BLOCK_HEADER_SIZE + 20);

    Malloc.release(block.into_region());
  }

  #[test]
  fn test_bump_aligned() {
    let mut block = block(256, BLOCK_HEADER_SIZE);

    block.bump(3, None).unwrap();
    let ptr = block.bump(8, Some(16)).unwrap();

    assert_eq!(ptr.as_ptr() as usize % 16, 0);
    assert!(block.cursor() >= BLOCK_HEADER_SIZE + 3 + 8);

    Malloc.release(block.into_region());
  }

  #[test]
  fn test_bump_refuses_past_limit() {
    let mut block = block(128, BLOCK_HEADER_SIZE);
    let free = block.remaining();

    assert!(block.bump(free + 1, None).is_none());
    assert_eq!(block.cursor(), BLOCK_HEADER_SIZE);

    assert!(block.bump(free, None).is_some());
    assert_eq!(block.remaining(), 0);
    assert!(block.bump(1, None).is_none());
    assert!(block.bump(1, Some(64)).is_none());
    assert_eq!(block.cursor(), block.limit());

    Malloc.release(block.into_region());
  }

  #[test]
  fn test_rewind() {
    let mut block = block(256, HEAD_HEADER_SIZE);

    block.bump(100, Some(8)).unwrap();
    block.fail_count = 3;
    block.rewind();

    assert_eq!(block.cursor(), HEAD_HEADER_SIZE);
    assert_eq!(block.fail_count, 0);

    Malloc.release(block.into_region());
  }
}
