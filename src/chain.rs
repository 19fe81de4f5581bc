use std::ptr::NonNull;

use crate::{
  block::{BLOCK_HEADER_SIZE, Block},
  config::MAX_FAILED,
  error::PoolError,
  pool::Pool,
  provider::RawMemory,
};

impl<P: RawMemory> Pool<P> {
  /// Bump-allocates `size` bytes from the first block, starting at
  /// `current`, that still has room; grows the chain when none has.
  pub(crate) fn alloc_small(
    &mut self,
    size: usize,
    aligned: bool,
  ) -> Result<NonNull<u8>, PoolError> {
    let align = aligned.then_some(self.config.alignment());

    for (index, block) in self.blocks.iter_mut().enumerate().skip(self.current) {
      if let Some(ptr) = block.bump(size, align) {
        log::trace!("allocated {} bytes at {:p} from block {}", size, ptr, index);
        return Ok(ptr);
      }
    }

    self.grow_chain(size)
  }

  /// Appends a block as large as the head block and serves `size` bytes from
  /// it.
  ///
  /// Every block probed and found full since `current` takes a failure; the
  /// ones that failed too often are skipped by later small allocations.
  fn grow_chain(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    let block_size = self.config.size();
    let region = self
      .provider
      .reserve(block_size)
      .ok_or_else(|| PoolError::out_of_memory(block_size))?;

    let mut block = Block::new(region, BLOCK_HEADER_SIZE);

    // The payload of a fresh block is always aligned.
    let Some(ptr) = block.bump(size, Some(self.config.alignment())) else {
      self.provider.release(block.into_region());
      return Err(PoolError::out_of_memory(size));
    };

    let tail = self.blocks.len() - 1;
    for index in self.current..tail {
      let failed = self.blocks[index].fail_count;
      self.blocks[index].fail_count += 1;

      if failed > MAX_FAILED {
        self.current = index + 1;
      }
    }

    self.blocks.push(block);

    log::debug!(
      "grew chain to {} blocks, probing from block {}",
      self.blocks.len(),
      self.current
    );

    Ok(ptr)
  }
}
