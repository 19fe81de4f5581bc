//! Property tests over arbitrary allocation sequences.

use std::ptr::NonNull;

use proptest::prelude::*;
use regionpool::{Malloc, Metered, Pool, PoolConfig};

#[derive(Debug, Clone)]
enum Op {
  Aligned(usize),
  Unaligned(usize),
  Zeroed(usize),
  FreeLast,
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    4 => (0usize..600).prop_map(Op::Aligned),
    2 => (0usize..600).prop_map(Op::Unaligned),
    1 => (0usize..600).prop_map(Op::Zeroed),
    1 => (600usize..3000).prop_map(Op::Aligned),
    1 => Just(Op::FreeLast),
  ]
}

fn arb_alignment() -> impl Strategy<Value = usize> {
  prop_oneof![Just(1usize), Just(2), Just(4), Just(8), Just(16)]
}

fn overlaps(
  a: (usize, usize),
  b: (usize, usize),
) -> bool {
  a.0 < b.0 + b.1 && b.0 < a.0 + a.1
}

proptest! {
  #[test]
  fn aligned_allocations_are_aligned(
    alignment in arb_alignment(),
    sizes in prop::collection::vec(0usize..700, 1..64),
  ) {
    let config = PoolConfig::new(1024).with_alignment(alignment);
    let mut pool = Pool::with_config(config, Malloc).unwrap();

    for size in sizes {
      let ptr = pool.allocate(size).unwrap();
      if size <= pool.small_alloc_threshold() {
        prop_assert_eq!(ptr.as_ptr() as usize % alignment, 0);
      }
    }
  }
}

proptest! {
  #[test]
  fn live_allocations_never_overlap(ops in prop::collection::vec(arb_op(), 1..96)) {
    let mut pool = Pool::with_provider(1024, Metered::new(Malloc)).unwrap();
    let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

    for op in ops {
      let (ptr, size) = match op {
        Op::Aligned(size) => (pool.allocate(size).unwrap(), size),
        Op::Unaligned(size) => (pool.allocate_unaligned(size).unwrap(), size),
        Op::Zeroed(size) => {
          let ptr = pool.allocate_zeroed(size).unwrap();
          let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), size) };
          prop_assert!(bytes.iter().all(|&b| b == 0));
          (ptr, size)
        }
        Op::FreeLast => {
          if let Some((ptr, size)) = live.pop() {
            pool.free(ptr);
            // A freed small allocation stays reserved; keep it live.
            if size <= pool.small_alloc_threshold() {
              live.push((ptr, size));
            }
          }
          continue;
        }
      };

      let range = (ptr.as_ptr() as usize, size);
      for &(other, other_size) in &live {
        prop_assert!(!overlaps(range, (other.as_ptr() as usize, other_size)));
      }

      unsafe { ptr.as_ptr().write_bytes(0xEE, size) };
      live.push((ptr, size));
    }
  }
}

proptest! {
  #[test]
  fn threshold_decides_the_path(size in 1usize..8192) {
    let provider = Metered::new(Malloc);
    let meter = provider.meter();
    let mut pool = Pool::with_provider(4096, provider).unwrap();
    let threshold = pool.small_alloc_threshold();

    pool.allocate(size).unwrap();

    if size <= threshold {
      prop_assert_eq!(pool.stats().large_records, 0);
      prop_assert_eq!(meter.reserves(), 1);
    } else {
      prop_assert_eq!(pool.stats().live_large, 1);
      prop_assert_eq!(meter.last_reserved(), Some(size));
    }
  }
}
