//! # Stack Arena
//!
//! A fixed-capacity linear allocator. One buffer is reserved at construction;
//! blocks are handed out by bumping a cursor and reclaimed in reverse order
//! (rollback to a [`Marker`]) or all at once ([`StackArena::clear`]).
//!
//! ```text
//!  base                     top                    limit
//!   │◄──────── in use ──────►│◄────── free ────────►│
//!   [ blk0 ][ blk1 ][h|blk2 ]│                      │
//!                     ▲
//!                     └ aligned header byte: shift back to the raw start
//! ```
//!
//! Everything is an offset into the buffer. Memory is only reachable through
//! checked slices, so a block that the cursor has already passed back over
//! has no view.

use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};

use super::align::{aligned_shift, decode_shift, encode_shift, is_valid_align};
use super::contract::{enforce, AssertionMode};

/// Word size of the backing storage; offset 0 is aligned to at least this.
const WORD: usize = std::mem::size_of::<u64>();

/// What [`StackArena::free_aligned`] does with the recovered raw start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignedRelease {
    /// Roll the cursor back to the raw start of the reservation.
    #[default]
    Rollback,
    /// Leave the cursor untouched; the space is reclaimed only by an
    /// enclosing rollback or a clear.
    Ignore,
}

/// A previously observed cursor position.
///
/// Rolling back to a marker releases everything allocated after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker(u32);

impl Marker {
    /// Creates a marker at the given byte offset from the arena base.
    #[inline]
    #[must_use]
    pub const fn from_offset(offset: u32) -> Self {
        Self(offset)
    }

    /// Byte offset from the arena base.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0
    }
}

/// Handle to a block handed out by a [`StackArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Start offset from the arena base.
    offset: u32,
    /// Usable length in bytes.
    len: u32,
}

impl Block {
    /// Start offset from the arena base.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Usable length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.len
    }

    /// Returns `true` for a zero-length block.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Marker at the start of this block.
    ///
    /// Freeing to it releases this block and everything allocated after it.
    #[inline]
    #[must_use]
    pub const fn marker(self) -> Marker {
        Marker(self.offset)
    }
}

/// Counters describing how an arena has been used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Plain and aligned allocations served.
    pub allocations: u64,
    /// Aligned allocations served (subset of `allocations`).
    pub aligned_allocations: u64,
    /// Cursor rollbacks through `free` or `free_aligned`.
    pub rollbacks: u64,
    /// Calls to `clear`.
    pub clears: u64,
    /// Highest cursor offset ever reached.
    pub high_water_mark: u32,
}

/// A fixed-capacity, single-threaded stack allocator.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Every mutating call takes `&mut self`;
/// share it across threads only behind external serialization.
///
/// # Example
///
/// ```rust
/// use clan_memory::StackArena;
///
/// let mut arena = StackArena::new(64);
/// let first = arena.alloc(10);
/// let second = arena.alloc(20);
/// assert_eq!(arena.size(), 30);
///
/// arena.free(second.marker());
/// assert_eq!(arena.size(), 10);
/// assert_eq!(first.offset(), 0);
/// ```
pub struct StackArena {
    /// The backing storage, in words so the base is word-aligned.
    storage: Box<[u64]>,
    /// Usable bytes (the storage may be up to one word longer).
    capacity: u32,
    /// Cursor: offset of the next byte a plain allocation hands out.
    top: u32,
    /// Contract checking for the panicking entry points.
    assertions: AssertionMode,
    /// Behaviour of `free_aligned`.
    aligned_release: AlignedRelease,
    /// Usage counters.
    stats: ArenaStats,
}

impl StackArena {
    /// Creates an arena of `capacity` bytes with default settings.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self::build(capacity, AssertionMode::default(), AlignedRelease::default())
    }

    /// Creates an arena from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the configuration is invalid.
    pub fn with_config(config: &ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self::build(
            config.capacity,
            config.assertions,
            config.aligned_release,
        ))
    }

    fn build(capacity: u32, assertions: AssertionMode, aligned_release: AlignedRelease) -> Self {
        let words = (capacity as usize).div_ceil(WORD);
        let storage = vec![0u64; words].into_boxed_slice();
        tracing::debug!(capacity, ?assertions, ?aligned_release, "stack arena reserved");
        Self {
            storage,
            capacity,
            top: 0,
            assertions,
            aligned_release,
            stats: ArenaStats::default(),
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the bytes currently in use (`top - base`).
    ///
    /// Can exceed [`capacity`](Self::capacity) only after an unchecked
    /// overflow with assertions disabled.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.top
    }

    /// Returns the bytes left above the cursor.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.top)
    }

    /// Returns `true` if nothing is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Returns a marker at the current cursor.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> Marker {
        Marker(self.top)
    }

    /// Returns the highest cursor offset ever reached.
    #[inline]
    #[must_use]
    pub const fn high_water_mark(&self) -> u32 {
        self.stats.high_water_mark
    }

    /// Returns a snapshot of the usage counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Returns the assertion mode of the panicking entry points.
    #[inline]
    #[must_use]
    pub const fn assertions(&self) -> AssertionMode {
        self.assertions
    }

    /// Returns the `free_aligned` policy.
    #[inline]
    #[must_use]
    pub const fn aligned_release(&self) -> AlignedRelease {
        self.aligned_release
    }

    // =========================================================================
    // Plain allocation
    // =========================================================================

    /// Allocates `size` bytes at the cursor.
    ///
    /// The memory is not zeroed and carries no alignment beyond whatever the
    /// cursor happens to have.
    ///
    /// # Panics
    ///
    /// With assertions enabled, panics if fewer than `size` bytes remain.
    /// With assertions disabled the cursor moves past the end instead and the
    /// returned block has no view.
    #[track_caller]
    pub fn alloc(&mut self, size: u32) -> Block {
        let _ = enforce(
            self.assertions,
            "limit - top >= size",
            self.check_fits(u64::from(size)),
        );
        self.bump(size)
    }

    /// Allocates `size` bytes at the cursor, always checking capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CapacityExceeded`] if fewer than `size` bytes
    /// remain; the cursor is left unchanged.
    pub fn try_alloc(&mut self, size: u32) -> ArenaResult<Block> {
        self.check_fits(u64::from(size))?;
        Ok(self.bump(size))
    }

    // =========================================================================
    // Aligned allocation
    // =========================================================================

    /// Allocates `size` bytes aligned to `align`.
    ///
    /// Reserves `size + align` bytes, so the cursor always advances by that
    /// amount. The byte in front of the returned block records how far the
    /// block sits from the start of the reservation.
    ///
    /// # Panics
    ///
    /// With assertions enabled, panics if `align` is not a power of two in
    /// `1..=256` or if fewer than `size + align` bytes remain.
    #[track_caller]
    pub fn alloc_aligned(&mut self, size: u32, align: u32) -> Block {
        let _ = enforce(
            self.assertions,
            "align is a power of two <= 256",
            Self::check_align(align),
        );
        let align = align.max(1);
        let _ = enforce(
            self.assertions,
            "limit - top >= size + align",
            self.check_fits(u64::from(size) + u64::from(align)),
        );
        self.place_aligned(size, align)
    }

    /// Allocates `size` bytes aligned to `align`, always checking.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidAlignment`] for a bad `align` and
    /// [`ArenaError::CapacityExceeded`] if `size + align` bytes do not fit.
    pub fn try_alloc_aligned(&mut self, size: u32, align: u32) -> ArenaResult<Block> {
        Self::check_align(align)?;
        self.check_fits(u64::from(size) + u64::from(align))?;
        Ok(self.place_aligned(size, align))
    }

    /// Reads the shift recorded in front of an aligned block.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidHeader`] if the block has no live header
    /// byte in front of it or the shift points before the arena base.
    pub fn header_shift(&self, block: Block) -> ArenaResult<u32> {
        let invalid = ArenaError::InvalidHeader {
            offset: block.offset,
        };
        if block.offset == 0 || block.offset > self.top.min(self.capacity) {
            return Err(invalid);
        }
        let byte = self.buffer()[block.offset as usize - 1];
        let shift = decode_shift(byte);
        if shift > block.offset {
            return Err(invalid);
        }
        Ok(shift)
    }

    // =========================================================================
    // Rollback
    // =========================================================================

    /// Rolls the cursor back to `marker`.
    ///
    /// Undoes every allocation made since the marker was taken. Markers must
    /// be released in LIFO order; nothing tracks individual blocks.
    ///
    /// # Panics
    ///
    /// With assertions enabled, panics if `marker` is above the cursor, or if
    /// the arena is exactly full at the time of the call.
    #[track_caller]
    pub fn free(&mut self, marker: Marker) {
        let _ = enforce(
            self.assertions,
            "marker <= top && top < limit",
            self.check_rollback(marker),
        );
        self.rollback(marker.0);
    }

    /// Rolls the cursor back to `marker`, always checking.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidMarker`] if `marker` is above the cursor
    /// and [`ArenaError::RollbackAtLimit`] if the arena is exactly full.
    pub fn try_free(&mut self, marker: Marker) -> ArenaResult<()> {
        self.check_rollback(marker)?;
        self.rollback(marker.0);
        Ok(())
    }

    /// Releases an aligned block. `None` is a no-op.
    ///
    /// Recovers the raw reservation start from the header byte, then applies
    /// the configured [`AlignedRelease`] policy.
    ///
    /// # Panics
    ///
    /// With assertions enabled, panics if the block has no live, valid header.
    #[track_caller]
    pub fn free_aligned(&mut self, block: Option<Block>) {
        let Some(block) = block else {
            return;
        };
        if let Some(raw) = enforce(
            self.assertions,
            "0 < shift <= offset <= top",
            self.header_shift(block).map(|shift| block.offset - shift),
        ) {
            self.release_aligned(raw);
        }
    }

    /// Releases an aligned block, always checking. `None` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidHeader`] for a block without a live,
    /// valid header.
    pub fn try_free_aligned(&mut self, block: Option<Block>) -> ArenaResult<()> {
        let Some(block) = block else {
            return Ok(());
        };
        let raw = block.offset - self.header_shift(block)?;
        self.release_aligned(raw);
        Ok(())
    }

    /// Releases every allocation at once.
    #[inline]
    pub fn clear(&mut self) {
        tracing::debug!(released = self.top, "stack arena cleared");
        self.top = 0;
        self.stats.clears += 1;
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Borrows the bytes of a live block.
    ///
    /// Returns `None` if the block reaches past the cursor (it was released)
    /// or past the end of the buffer.
    #[must_use]
    pub fn bytes(&self, block: Block) -> Option<&[u8]> {
        let range = self.live_range(block)?;
        self.buffer().get(range)
    }

    /// Mutably borrows the bytes of a live block.
    ///
    /// Returns `None` under the same conditions as [`bytes`](Self::bytes).
    #[must_use]
    pub fn bytes_mut(&mut self, block: Block) -> Option<&mut [u8]> {
        let range = self.live_range(block)?;
        self.buffer_mut().get_mut(range)
    }

    /// Borrows the whole in-use region, `base..top`, headers included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.top.min(self.capacity) as usize;
        &self.buffer()[..end]
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn buffer(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.storage)[..self.capacity as usize]
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        let capacity = self.capacity as usize;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage)[..capacity]
    }

    fn live_range(&self, block: Block) -> Option<std::ops::Range<usize>> {
        let end = block.offset.checked_add(block.len)?;
        if end > self.top || end > self.capacity {
            return None;
        }
        Some(block.offset as usize..end as usize)
    }

    fn check_fits(&self, requested: u64) -> ArenaResult<()> {
        let remaining = self.remaining();
        if requested > u64::from(remaining) {
            return Err(ArenaError::CapacityExceeded {
                requested,
                remaining,
            });
        }
        Ok(())
    }

    fn check_align(align: u32) -> ArenaResult<()> {
        if is_valid_align(align) {
            Ok(())
        } else {
            Err(ArenaError::InvalidAlignment(align))
        }
    }

    fn check_rollback(&self, marker: Marker) -> ArenaResult<()> {
        if marker.0 > self.top {
            return Err(ArenaError::InvalidMarker {
                marker: marker.0,
                top: self.top,
            });
        }
        // Rollback is refused while the arena is exactly full, even for a
        // valid marker.
        if self.top >= self.capacity {
            return Err(ArenaError::RollbackAtLimit {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn bump(&mut self, size: u32) -> Block {
        let offset = self.top;
        self.top = self.top.saturating_add(size);
        self.stats.allocations += 1;
        self.stats.high_water_mark = self.stats.high_water_mark.max(self.top);
        Block { offset, len: size }
    }

    fn place_aligned(&mut self, size: u32, align: u32) -> Block {
        let raw = self.bump(size.saturating_add(align));
        let base = self.storage.as_ptr() as usize;
        let raw_addr = base + raw.offset as usize;
        // shift <= align <= 256, so it fits the header byte's 1..=256 range.
        #[allow(clippy::cast_possible_truncation)]
        let shift = aligned_shift(raw_addr, align as usize) as u32;
        let offset = raw.offset.saturating_add(shift);
        if let Some(header) = self.buffer_mut().get_mut(offset as usize - 1) {
            *header = encode_shift(shift);
        }
        self.stats.aligned_allocations += 1;
        Block { offset, len: size }
    }

    /// `raw` comes from a live header, so it is never above the cursor.
    fn release_aligned(&mut self, raw: u32) {
        match self.aligned_release {
            AlignedRelease::Rollback => self.rollback(raw),
            AlignedRelease::Ignore => {
                tracing::warn!(raw, top = self.top, "aligned release ignored; cursor unchanged");
            }
        }
    }

    fn rollback(&mut self, offset: u32) {
        tracing::trace!(from = self.top, to = offset, "stack arena rollback");
        self.top = offset;
        self.stats.rollbacks += 1;
    }
}

impl Drop for StackArena {
    fn drop(&mut self) {
        tracing::debug!(
            capacity = self.capacity,
            in_use = self.top,
            high_water_mark = self.stats.high_water_mark,
            "stack arena released"
        );
    }
}

impl std::fmt::Debug for StackArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackArena")
            .field("capacity", &self.capacity)
            .field("top", &self.top)
            .field("assertions", &self.assertions)
            .field("aligned_release", &self.aligned_release)
            .finish_non_exhaustive()
    }
}
