use std::mem;

use crate::{align_to, block::HEAD_HEADER_SIZE, large::LargeRecord};

/// Page size the small-allocation threshold is capped against.
pub const PAGE_SIZE: usize = 4096;

/// Largest request the block chain will ever serve.
pub const MAX_ALLOC_FROM_POOL: usize = PAGE_SIZE - 1;

/// Block size used by [`PoolConfig::default`].
pub const DEFAULT_POOL_SIZE: usize = 16 * 1024;

/// Largest alignment a pool can be configured with.
pub const POOL_ALIGNMENT: usize = 16;

/// Default alignment of small allocations: one machine word.
pub const ALIGNMENT: usize = mem::size_of::<usize>();

/// Smallest block size a pool accepts: the head header plus room for two
/// large-allocation records.
pub const MIN_POOL_SIZE: usize = align_to!(
  HEAD_HEADER_SIZE + 2 * mem::size_of::<LargeRecord>(),
  POOL_ALIGNMENT
);

/// Failed growth rounds after which a block stops being probed.
pub(crate) const MAX_FAILED: usize = 4;

/// Large records inspected for a free slot before a new one is made.
pub(crate) const LARGE_SCAN_LIMIT: usize = 4;

/// Sizing of a pool.
///
/// ```rust
/// use regionpool::PoolConfig;
///
/// let config = PoolConfig::new(4096).with_alignment(16);
///
/// assert_eq!(config.size(), 4096);
/// assert_eq!(config.alignment(), 16);
/// assert!(config.small_alloc_threshold() < config.size());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
  size: usize,
  alignment: usize,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      size: DEFAULT_POOL_SIZE,
      alignment: ALIGNMENT,
    }
  }
}

impl PoolConfig {
  /// A configuration with blocks of `size` bytes, raised to
  /// [`MIN_POOL_SIZE`] if smaller.
  pub fn new(size: usize) -> Self {
    Self::default().with_size(size)
  }

  pub fn with_size(
    mut self,
    size: usize,
  ) -> Self {
    self.size = size.max(MIN_POOL_SIZE);
    self
  }

  /// Sets the alignment of aligned small allocations.
  ///
  /// # Panics
  ///
  /// Panics if `alignment` is not a power of two or exceeds
  /// [`POOL_ALIGNMENT`].
  pub fn with_alignment(
    mut self,
    alignment: usize,
  ) -> Self {
    assert!(
      alignment.is_power_of_two() && alignment <= POOL_ALIGNMENT,
      "pool alignment must be a power of two no larger than {POOL_ALIGNMENT}, got {alignment}"
    );
    self.alignment = alignment;
    self
  }

  /// Total bytes of every block, head included.
  pub fn size(&self) -> usize {
    self.size
  }

  pub fn alignment(&self) -> usize {
    self.alignment
  }

  /// Largest request served by bump allocation.
  pub fn small_alloc_threshold(&self) -> usize {
    (self.size - HEAD_HEADER_SIZE).min(MAX_ALLOC_FROM_POOL)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default() {
    let config = PoolConfig::default();

    assert_eq!(config.size(), DEFAULT_POOL_SIZE);
    assert_eq!(config.alignment(), ALIGNMENT);
    assert_eq!(config.small_alloc_threshold(), MAX_ALLOC_FROM_POOL);
  }

  #[test]
  fn test_threshold_below_page() {
    let config = PoolConfig::new(1024);

    assert_eq!(config.small_alloc_threshold(), 1024 - HEAD_HEADER_SIZE);
  }

  #[test]
  fn test_size_is_raised_to_minimum() {
    assert_eq!(PoolConfig::new(0).size(), MIN_POOL_SIZE);
    assert_eq!(PoolConfig::new(1).size(), MIN_POOL_SIZE);
    assert!(PoolConfig::new(0).small_alloc_threshold() > 0);
    assert_eq!(MIN_POOL_SIZE % POOL_ALIGNMENT, 0);
  }

  #[test]
  #[should_panic]
  fn test_alignment_must_be_power_of_two() {
    let _ = PoolConfig::default().with_alignment(12);
  }

  #[test]
  #[should_panic]
  fn test_alignment_is_capped() {
    let _ = PoolConfig::default().with_alignment(64);
  }
}
