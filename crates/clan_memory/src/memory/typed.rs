//! # Typed Views
//!
//! Plain-old-data access to arena blocks. Allocations go through the aligned
//! path with `align_of::<T>()`, so the cast back is always well aligned.

use bytemuck::Pod;

use crate::error::{ArenaError, ArenaResult};

use super::stack::{Block, StackArena};

impl StackArena {
    /// Allocates a zeroed block sized and aligned for `count` values of `T`.
    ///
    /// Like every aligned allocation this consumes `size + align` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::SizeOverflow`] if the byte size does not fit in
    /// `u32`, [`ArenaError::InvalidAlignment`] if `T` needs more than 256-byte
    /// alignment, and [`ArenaError::CapacityExceeded`] if it does not fit.
    pub fn alloc_slice<T: Pod>(&mut self, count: u32) -> ArenaResult<Block> {
        let element_size = std::mem::size_of::<T>();
        let size = element_size
            .checked_mul(count as usize)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .ok_or(ArenaError::SizeOverflow {
                count,
                element_size,
            })?;
        let align = u32::try_from(std::mem::align_of::<T>())
            .map_err(|_| ArenaError::InvalidAlignment(u32::MAX))?;

        let block = self.try_alloc_aligned(size, align)?;
        if let Some(bytes) = self.bytes_mut(block) {
            bytes.fill(0);
        }
        Ok(block)
    }

    /// Allocates a block holding a copy of `values`.
    ///
    /// # Errors
    ///
    /// Same as [`alloc_slice`](Self::alloc_slice).
    pub fn alloc_copy<T: Pod>(&mut self, values: &[T]) -> ArenaResult<Block> {
        let count = u32::try_from(values.len()).map_err(|_| ArenaError::SizeOverflow {
            count: u32::MAX,
            element_size: std::mem::size_of::<T>(),
        })?;
        let block = self.alloc_slice::<T>(count)?;
        if let Some(bytes) = self.bytes_mut(block) {
            bytes.copy_from_slice(bytemuck::cast_slice(values));
        }
        Ok(block)
    }

    /// Views a live block as a slice of `T`.
    ///
    /// Returns `None` if the block was released or its length or alignment
    /// does not fit `T`.
    #[must_use]
    pub fn view<T: Pod>(&self, block: Block) -> Option<&[T]> {
        bytemuck::try_cast_slice(self.bytes(block)?).ok()
    }

    /// Mutably views a live block as a slice of `T`.
    ///
    /// Returns `None` under the same conditions as [`view`](Self::view).
    #[must_use]
    pub fn view_mut<T: Pod>(&mut self, block: Block) -> Option<&mut [T]> {
        bytemuck::try_cast_slice_mut(self.bytes_mut(block)?).ok()
    }
}
