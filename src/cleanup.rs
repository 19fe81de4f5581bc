use std::{fmt, mem, ptr::NonNull};

use crate::{error::PoolError, pool::Pool, provider::RawMemory};

/// Callback run when the pool is destroyed, given the cleanup's data buffer.
pub type CleanupHandler = Box<dyn FnOnce(Option<NonNull<[u8]>>)>;

/// A deferred teardown action registered with [`Pool::register_cleanup`].
///
/// The pool never reads `data`; it is handed to `handler` as is. A cleanup
/// with no handler does nothing.
pub struct Cleanup {
  pub handler: Option<CleanupHandler>,
  /// Buffer allocated from the pool at registration, if any was requested.
  pub data: Option<NonNull<[u8]>>,
}

impl Cleanup {
  pub fn set_handler<F>(
    &mut self,
    handler: F,
  ) where
    F: FnOnce(Option<NonNull<[u8]>>) + 'static,
  {
    self.handler = Some(Box::new(handler));
  }
}

impl fmt::Debug for Cleanup {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Cleanup")
      .field("handler", &self.handler.is_some())
      .field("data", &self.data)
      .finish()
  }
}

impl<P: RawMemory> Pool<P> {
  /// Registers a cleanup with a `size`-byte data buffer (none when `size` is
  /// zero) and returns it for the caller to fill in.
  ///
  /// Cleanups survive [`Pool::reset`] and run once, most recent first, when
  /// the pool is destroyed. If the data buffer cannot be allocated the
  /// record's space stays used in the chain until the next reset.
  pub fn register_cleanup(
    &mut self,
    size: usize,
  ) -> Result<&mut Cleanup, PoolError> {
    self.allocate(mem::size_of::<Cleanup>())?;

    let data = if size > 0 {
      let ptr = self.allocate(size)?;
      Some(NonNull::slice_from_raw_parts(ptr, size))
    } else {
      None
    };

    let index = self.cleanups.len();
    self.cleanups.push(Cleanup {
      handler: None,
      data,
    });

    log::trace!("registered cleanup {} with {} data bytes", index, size);

    Ok(&mut self.cleanups[index])
  }

  pub(crate) fn run_cleanups(&mut self) {
    while let Some(cleanup) = self.cleanups.pop() {
      if let Some(handler) = cleanup.handler {
        handler(cleanup.data);
      }
    }
  }
}
