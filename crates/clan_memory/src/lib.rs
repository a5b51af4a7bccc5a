//! # Clan Memory
//!
//! A fixed-capacity, single-threaded stack allocator:
//! - One buffer reserved at construction, never grown
//! - O(1) bump allocation, aligned allocation and marker rollback
//! - O(1) clear of every outstanding allocation
//!
//! ## Rules
//!
//! 1. **LIFO only** - Blocks are released by rolling back to a marker, newest first
//! 2. **Offsets, not pointers** - Memory is reached through checked slices
//! 3. **Two-tier contracts** - `alloc`/`free` assert, `try_alloc`/`try_free` report
//!
//! ## Example
//!
//! ```rust
//! use clan_memory::{ArenaConfig, StackArena};
//!
//! let mut arena = StackArena::with_config(&ArenaConfig::debug(1024))?;
//!
//! let frame = arena.marker();
//! let scratch = arena.alloc(128);
//! let aligned = arena.alloc_aligned(64, 16);
//! assert_eq!(arena.bytes(aligned).map(<[u8]>::len), Some(64));
//!
//! arena.free(frame);
//! assert!(arena.bytes(scratch).is_none());
//! # Ok::<(), clan_memory::ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;

pub use config::ArenaConfig;
pub use error::{ArenaError, ArenaResult};
pub use memory::{AlignedRelease, ArenaStats, AssertionMode, Block, Marker, StackArena};
