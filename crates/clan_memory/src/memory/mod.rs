//! # Memory Management
//!
//! A fixed-capacity stack arena for scratch allocations with strict LIFO
//! lifetimes.
//!
//! ## Design Philosophy
//!
//! All memory is reserved once, at construction. After that:
//! - No heap allocations
//! - Reclamation is a cursor move (rollback or clear)
//! - Addresses are offsets; memory is only reached through checked slices

mod align;
mod contract;
mod stack;
mod typed;

pub use align::{align_up, aligned_shift, decode_shift, encode_shift, is_valid_align, MAX_ALIGN};
pub use contract::AssertionMode;
pub use stack::{AlignedRelease, ArenaStats, Block, Marker, StackArena};
