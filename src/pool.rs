use std::ptr::{self, NonNull};

use crate::{
  block::{Block, HEAD_HEADER_SIZE},
  cleanup::Cleanup,
  config::PoolConfig,
  error::PoolError,
  large::LargeRecord,
  provider::{Malloc, RawMemory},
};

/// A region of memory handing out allocations by bumping a cursor and
/// releasing all of them at once.
///
/// Requests up to [`Pool::small_alloc_threshold`] bytes are carved out of a
/// chain of equally sized blocks; bigger ones get their own region from the
/// provider and are tracked so that [`Pool::reset`] and dropping the pool
/// give them back.
///
/// Pointers returned by the allocation methods point into memory owned by
/// the pool. They must not be used after the pool is dropped, nor after a
/// [`Pool::reset`] that reclaimed them.
///
/// # Thread safety
///
/// A pool is single-owner and `!Send`; share it only behind external
/// synchronization, or keep one pool per worker.
pub struct Pool<P: RawMemory = Malloc> {
  pub(crate) provider: P,
  pub(crate) config: PoolConfig,
  // Chain order is index order; the head block is at index 0.
  pub(crate) blocks: Vec<Block>,
  // First block still worth probing for small allocations.
  pub(crate) current: usize,
  pub(crate) large: Vec<LargeRecord>,
  pub(crate) cleanups: Vec<Cleanup>,
}

/// Snapshot of a pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
  /// Blocks in the chain, head included.
  pub blocks: usize,
  /// Index of the first block probed by small allocations.
  pub current: usize,
  /// Large-allocation records, freed slots included.
  pub large_records: usize,
  /// Large allocations currently backed by provider memory.
  pub live_large: usize,
  pub cleanups: usize,
  pub small_alloc_threshold: usize,
}

impl Pool<Malloc> {
  /// Creates a pool of `size`-byte blocks backed by the system allocator.
  pub fn new(size: usize) -> Result<Self, PoolError> {
    Self::with_provider(size, Malloc)
  }
}

impl<P: RawMemory> Pool<P> {
  pub fn with_provider(
    size: usize,
    provider: P,
  ) -> Result<Self, PoolError> {
    Self::with_config(PoolConfig::new(size), provider)
  }

  /// Reserves the head block and sets up an empty pool.
  pub fn with_config(
    config: PoolConfig,
    mut provider: P,
  ) -> Result<Self, PoolError> {
    let size = config.size();
    let region = provider
      .reserve(size)
      .ok_or_else(|| PoolError::out_of_memory(size))?;

    log::debug!(
      "created pool of {} bytes at {:p}, small threshold {}",
      size,
      region.as_ptr(),
      config.small_alloc_threshold()
    );

    Ok(Self {
      provider,
      config,
      blocks: vec![Block::new(region, HEAD_HEADER_SIZE)],
      current: 0,
      large: Vec::new(),
      cleanups: Vec::new(),
    })
  }

  /// Allocates `size` bytes aligned to the configured alignment.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    if size <= self.small_alloc_threshold() {
      return self.alloc_small(size, true);
    }
    self.alloc_large(size)
  }

  /// Allocates `size` bytes with no alignment padding, for byte buffers.
  pub fn allocate_unaligned(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    if size <= self.small_alloc_threshold() {
      return self.alloc_small(size, false);
    }
    self.alloc_large(size)
  }

  /// Like [`Pool::allocate`], with the returned bytes set to zero.
  pub fn allocate_zeroed(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    let ptr = self.allocate(size)?;
    unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
    Ok(ptr)
  }

  /// Copies `bytes` into the pool through the unaligned path.
  pub fn copy_bytes(
    &mut self,
    bytes: &[u8],
  ) -> Result<NonNull<[u8]>, PoolError> {
    let ptr = self.allocate_unaligned(bytes.len())?;
    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len()) };
    Ok(NonNull::slice_from_raw_parts(ptr, bytes.len()))
  }

  /// Gives every large allocation back to the provider and rewinds every
  /// block, keeping the chain.
  ///
  /// Registered cleanups are neither run nor dropped; they still fire when
  /// the pool is destroyed.
  pub fn reset(&mut self) {
    for record in self.large.iter_mut() {
      if let Some(region) = record.data.take() {
        self.provider.release(region);
      }
    }
    self.large.clear();

    for block in self.blocks.iter_mut() {
      block.rewind();
    }
    self.current = 0;

    log::debug!(
      "reset pool, {} blocks kept, {} cleanups pending",
      self.blocks.len(),
      self.cleanups.len()
    );
  }

  /// Runs the cleanups and releases all memory. Same as dropping the pool.
  pub fn destroy(self) {
    drop(self);
  }

  pub fn small_alloc_threshold(&self) -> usize {
    self.config.small_alloc_threshold()
  }

  pub fn config(&self) -> &PoolConfig {
    &self.config
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  pub fn stats(&self) -> PoolStats {
    PoolStats {
      blocks: self.blocks.len(),
      current: self.current,
      large_records: self.large.len(),
      live_large: self.large.iter().filter(|record| record.data.is_some()).count(),
      cleanups: self.cleanups.len(),
      small_alloc_threshold: self.small_alloc_threshold(),
    }
  }
}

impl<P: RawMemory> Drop for Pool<P> {
  fn drop(&mut self) {
    log::debug!(
      "destroying pool: {} cleanups, {} large records, {} blocks",
      self.cleanups.len(),
      self.large.len(),
      self.blocks.len()
    );

    self.run_cleanups();

    for record in self.large.drain(..) {
      if let Some(region) = record.data {
        self.provider.release(region);
      }
    }

    for block in self.blocks.drain(..) {
      self.provider.release(block.into_region());
    }
  }
}
