//! # regionpool - A Region-Based Memory Pool
//!
//! This crate provides a **region allocator** (also known as a memory pool):
//! memory is carved out of pre-reserved blocks by bumping a pointer, single
//! allocations are never freed on their own, and everything goes back to the
//! system at once when the pool is reset or dropped.
//!
//! ## Overview
//!
//! ```text
//!   Pool Layout:
//!
//!   blocks[0] (head)          blocks[1]                 blocks[2]
//!   ┌──────┬─────────┬────┐   ┌────┬──────────┬────┐    ┌────┬─────┬──────┐
//!   │ hdr  │ A1 A2 A3│free│ → │hdr │ A4 A5 L1 │free│ →  │hdr │ A6  │ free │
//!   └──────┴─────────┴────┘   └────┴──────────┴────┘    └────┴─────┴──────┘
//!      ▲                                  │
//!      └── current                        ▼
//!                                 ┌─────────────────┐
//!                                 │  large payload  │  (own region)
//!                                 └─────────────────┘
//! ```
//!
//! - **Small allocations** (up to [`Pool::small_alloc_threshold`] bytes) bump
//!   the cursor of the first block with room, starting at `current`. When no
//!   block has room the chain grows by one block of the creation size.
//! - **Large allocations** get a dedicated region from the provider. Their
//!   records live in the chain; [`Pool::free`] gives the region back early
//!   and leaves the record for reuse.
//! - **Cleanups** are callbacks registered with [`Pool::register_cleanup`],
//!   run most recent first when the pool is destroyed.
//!
//! ## Crate Structure
//!
//! ```text
//!   regionpool
//!   ├── align      - Alignment macro (align_to!)
//!   ├── block      - One block of the chain (internal)
//!   ├── chain      - Bump allocation and chain growth (internal)
//!   ├── large      - Large allocation tracking and Pool::free
//!   ├── cleanup    - Cleanup registry
//!   ├── config     - PoolConfig and sizing constants
//!   ├── error      - PoolError
//!   ├── pool       - Pool lifecycle and allocation entry points
//!   └── provider   - RawMemory, Malloc and the Metered wrapper
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use regionpool::Pool;
//!
//! let mut pool = Pool::new(4096)?;
//!
//! let small = pool.allocate(100)?;
//! let large = pool.allocate(5000)?;
//!
//! unsafe {
//!   small.as_ptr().write_bytes(1, 100);
//!   large.as_ptr().write_bytes(2, 5000);
//! }
//!
//! pool.register_cleanup(0)?.set_handler(|_| println!("pool destroyed"));
//!
//! // Frees `large`, rewinds every block.
//! pool.reset();
//!
//! // Runs the cleanup and releases the blocks.
//! pool.destroy();
//! # Ok::<(), regionpool::PoolError>(())
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: a pool is `!Send` and has no locking
//! - **No per-object free**: only large allocations can be freed early
//! - **No compaction**: blocks are never moved or merged
//!
//! ## Safety
//!
//! Allocations are returned as raw [`NonNull`](std::ptr::NonNull) pointers
//! into pool-owned memory. Reading or writing through them is `unsafe`, and
//! they dangle once the pool is dropped or a reset reclaims them.

mod align;
mod block;
mod chain;
mod cleanup;
mod config;
mod error;
mod large;
mod pool;
mod provider;

pub use cleanup::{Cleanup, CleanupHandler};
pub use config::{
  ALIGNMENT, DEFAULT_POOL_SIZE, MAX_ALLOC_FROM_POOL, MIN_POOL_SIZE, PAGE_SIZE, POOL_ALIGNMENT,
  PoolConfig,
};
pub use error::PoolError;
pub use pool::{Pool, PoolStats};
pub use provider::{Malloc, Meter, Metered, RawMemory, Region};
