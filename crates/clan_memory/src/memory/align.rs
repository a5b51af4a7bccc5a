//! # Alignment Arithmetic
//!
//! Power-of-two rounding and the one-byte shift header used by aligned
//! allocations.

/// Largest alignment an aligned allocation accepts.
///
/// The shift header is a single byte, and the widest shift an aligned
/// allocation can produce equals its alignment, so 256 is the ceiling
/// (stored as `0`).
pub const MAX_ALIGN: u32 = 256;

/// Returns `true` if `align` is a power of two no greater than [`MAX_ALIGN`].
#[inline]
#[must_use]
pub const fn is_valid_align(align: u32) -> bool {
    align.is_power_of_two() && align <= MAX_ALIGN
}

/// Rounds `addr` up to the next multiple of `align`.
///
/// `align` must be non-zero. For powers of two this is the usual mask trick;
/// other values give a result `>= addr` that is not necessarily a multiple.
#[inline]
#[must_use]
pub const fn align_up(addr: usize, align: usize) -> usize {
    let mask = align - 1;
    (addr + mask) & !mask
}

/// Distance from `addr` to the aligned address handed out for it.
///
/// Always at least one byte: an address that is already aligned is pushed a
/// full `align` step forward so the header byte has somewhere to live.
#[inline]
#[must_use]
pub const fn aligned_shift(addr: usize, align: usize) -> usize {
    let aligned = align_up(addr, align);
    if aligned == addr {
        align
    } else {
        aligned - addr
    }
}

/// Encodes a shift (`1..=256`) into its header byte. 256 is stored as `0`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn encode_shift(shift: u32) -> u8 {
    (shift & 0xFF) as u8
}

/// Decodes a header byte back into a shift in `1..=256`.
#[inline]
#[must_use]
pub const fn decode_shift(byte: u8) -> u32 {
    if byte == 0 {
        MAX_ALIGN
    } else {
        byte as u32
    }
}
