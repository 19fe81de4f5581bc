use thiserror::Error;

/// Errors raised by pool operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
  /// The raw-memory provider refused a reservation, either for a new block
  /// or for a large allocation.
  #[error("out of memory: provider denied a request for {requested} bytes")]
  OutOfMemory { requested: usize },
}

impl PoolError {
  pub(crate) fn out_of_memory(requested: usize) -> Self {
    log::warn!("provider denied {} bytes", requested);
    Self::OutOfMemory { requested }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let err = PoolError::OutOfMemory { requested: 4096 };

    assert_eq!(
      err.to_string(),
      "out of memory: provider denied a request for 4096 bytes"
    );
  }
}
