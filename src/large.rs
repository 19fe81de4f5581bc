use std::{mem, ptr::NonNull};

use crate::{
  config::LARGE_SCAN_LIMIT,
  error::PoolError,
  pool::Pool,
  provider::{RawMemory, Region},
};

/// Tracks one allocation too big for the block chain.
///
/// A freed allocation leaves its record behind with no data so the slot can
/// be reused. Records are ordered oldest first; the list head is the last
/// element.
#[derive(Debug)]
pub(crate) struct LargeRecord {
  pub data: Option<Region>,
}

impl<P: RawMemory> Pool<P> {
  /// Reserves `size` bytes straight from the provider and tracks them.
  pub(crate) fn alloc_large(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, PoolError> {
    let region = self
      .provider
      .reserve(size)
      .ok_or_else(|| PoolError::out_of_memory(size))?;
    let ptr = region.as_non_null();

    if let Some(record) = self
      .large
      .iter_mut()
      .rev()
      .take(LARGE_SCAN_LIMIT)
      .find(|record| record.data.is_none())
    {
      record.data = Some(region);
      log::trace!("allocated {} large bytes at {:p}, slot reused", size, ptr);
      return Ok(ptr);
    }

    // The record itself lives in the chain like any small allocation.
    if let Err(err) = self.alloc_small(mem::size_of::<LargeRecord>(), true) {
      self.provider.release(region);
      return Err(err);
    }

    self.large.push(LargeRecord { data: Some(region) });
    log::trace!("allocated {} large bytes at {:p}", size, ptr);

    Ok(ptr)
  }

  /// Gives a large allocation back to the provider early.
  ///
  /// Anything that is not a live large allocation of this pool (a small
  /// allocation, a pointer already freed, a foreign pointer) is ignored.
  pub fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    let found = self
      .large
      .iter_mut()
      .rev()
      .find(|record| record.data.as_ref().is_some_and(|region| region.as_non_null() == ptr));

    if let Some(region) = found.and_then(|record| record.data.take()) {
      log::trace!("freed {} large bytes at {:p}", region.len(), ptr);
      self.provider.release(region);
    }
  }
}
