//! The raw-memory side of the pool.
//!
//! A [`RawMemory`] provider hands out fixed-size contiguous [`Region`]s and
//! takes them back. The pool never touches the system allocator directly.

use std::{cell::Cell, fmt, ptr::NonNull, rc::Rc};

use libc::{c_void, free, malloc};

/// An owned, contiguous byte range obtained from a [`RawMemory`] provider.
///
/// A region is not `Clone`: exactly one owner holds it until it is handed
/// back through [`RawMemory::release`].
pub struct Region {
  ptr: NonNull<u8>,
  len: usize,
}

impl Region {
  /// Wraps `len` bytes starting at `ptr`.
  ///
  /// # Safety
  ///
  /// `ptr` must be valid for reads and writes of `len` bytes and must not be
  /// reachable through any other region until this one is released.
  pub unsafe fn from_raw_parts(
    ptr: NonNull<u8>,
    len: usize,
  ) -> Self {
    Self { ptr, len }
  }

  pub fn as_ptr(&self) -> *mut u8 {
    self.ptr.as_ptr()
  }

  pub fn as_non_null(&self) -> NonNull<u8> {
    self.ptr
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }
}

impl fmt::Debug for Region {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Region")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .finish()
  }
}

/// Source of the blocks and large allocations of a pool.
pub trait RawMemory {
  /// Reserves exactly `size` bytes, or `None` when out of memory.
  fn reserve(
    &mut self,
    size: usize,
  ) -> Option<Region>;

  /// Gives a region obtained from [`RawMemory::reserve`] back.
  fn release(
    &mut self,
    region: Region,
  );
}

/// The system allocator, through `malloc(3)` and `free(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Malloc;

impl RawMemory for Malloc {
  fn reserve(
    &mut self,
    size: usize,
  ) -> Option<Region> {
    // malloc(0) may legally return null; always ask for at least one byte.
    let ptr = unsafe { malloc(size.max(1)) } as *mut u8;

    NonNull::new(ptr).map(|ptr| unsafe { Region::from_raw_parts(ptr, size) })
  }

  fn release(
    &mut self,
    region: Region,
  ) {
    unsafe { free(region.as_ptr() as *mut c_void) }
  }
}

#[derive(Debug, Default)]
struct Counters {
  reserves: Cell<usize>,
  releases: Cell<usize>,
  denied: Cell<usize>,
  live_bytes: Cell<usize>,
  peak_bytes: Cell<usize>,
  last_reserved: Cell<Option<usize>>,
  limit: Cell<Option<usize>>,
}

/// Shared view on the counters of a [`Metered`] provider.
///
/// Cloning a meter is cheap; every clone observes the same provider, which
/// keeps working after the provider itself has been moved into a pool.
#[derive(Debug, Clone, Default)]
pub struct Meter(Rc<Counters>);

impl Meter {
  /// Successful reservations so far.
  pub fn reserves(&self) -> usize {
    self.0.reserves.get()
  }

  pub fn releases(&self) -> usize {
    self.0.releases.get()
  }

  /// Reservations refused because of the byte limit or the inner provider.
  pub fn denied(&self) -> usize {
    self.0.denied.get()
  }

  pub fn live_regions(&self) -> usize {
    self.reserves() - self.releases()
  }

  pub fn live_bytes(&self) -> usize {
    self.0.live_bytes.get()
  }

  pub fn peak_bytes(&self) -> usize {
    self.0.peak_bytes.get()
  }

  /// Size of the most recent successful reservation.
  pub fn last_reserved(&self) -> Option<usize> {
    self.0.last_reserved.get()
  }

  pub fn limit(&self) -> Option<usize> {
    self.0.limit.get()
  }

  /// Caps the live bytes of the provider. Requests that would exceed the cap
  /// are denied; `None` removes the cap.
  pub fn set_limit(
    &self,
    limit: Option<usize>,
  ) {
    self.0.limit.set(limit);
  }
}

/// Wraps a provider, counting what goes through it and optionally capping
/// the number of live bytes.
#[derive(Debug)]
pub struct Metered<P> {
  inner: P,
  meter: Meter,
}

impl<P: RawMemory> Metered<P> {
  pub fn new(inner: P) -> Self {
    Self {
      inner,
      meter: Meter::default(),
    }
  }

  pub fn with_limit(
    inner: P,
    limit: usize,
  ) -> Self {
    let metered = Self::new(inner);
    metered.meter.set_limit(Some(limit));
    metered
  }

  pub fn meter(&self) -> Meter {
    self.meter.clone()
  }

  pub fn into_inner(self) -> P {
    self.inner
  }
}

impl<P: RawMemory> RawMemory for Metered<P> {
  fn reserve(
    &mut self,
    size: usize,
  ) -> Option<Region> {
    let counters = &self.meter.0;
    let live = counters.live_bytes.get();

    let over_limit = counters
      .limit
      .get()
      .is_some_and(|limit| live.checked_add(size).is_none_or(|total| total > limit));

    let region = if over_limit {
      None
    } else {
      self.inner.reserve(size)
    };

    match region {
      Some(region) => {
        counters.reserves.set(counters.reserves.get() + 1);
        counters.live_bytes.set(live + region.len());
        counters
          .peak_bytes
          .set(counters.peak_bytes.get().max(live + region.len()));
        counters.last_reserved.set(Some(region.len()));
        Some(region)
      }
      None => {
        counters.denied.set(counters.denied.get() + 1);
        None
      }
    }
  }

  fn release(
    &mut self,
    region: Region,
  ) {
    let counters = &self.meter.0;
    counters.releases.set(counters.releases.get() + 1);
    counters
      .live_bytes
      .set(counters.live_bytes.get() - region.len());

    self.inner.release(region);
  }
}
