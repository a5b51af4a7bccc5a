//! # Stack Arena Behaviour Tests
//!
//! End-to-end checks of the public arena contract:
//!
//! 1. **Bump allocation**: monotone offsets, exact size accounting
//! 2. **Aligned allocation**: real alignment, header byte, `size + align` cost
//! 3. **Rollback and clear**: markers, the exactly-full refusal, bulk reset
//! 4. **Two-tier contracts**: instrumented panics vs unchecked cursor moves
//!
//! Run with: cargo test --test stack_arena

use clan_memory::{
    AlignedRelease, ArenaConfig, ArenaError, Block, Marker, StackArena,
};

fn checked(capacity: u32) -> StackArena {
    StackArena::with_config(&ArenaConfig::debug(capacity)).unwrap()
}

fn unchecked(capacity: u32) -> StackArena {
    StackArena::with_config(&ArenaConfig::production(capacity)).unwrap()
}

fn address(arena: &StackArena, block: Block) -> usize {
    arena.bytes(block).unwrap().as_ptr() as usize
}

// ============================================================================
// BUMP ALLOCATION
// ============================================================================

#[test]
fn sequential_allocations_are_contiguous() {
    let sizes = [1u32, 7, 16, 3, 0, 33, 4];
    let total: u32 = sizes.iter().sum();
    let mut arena = checked(total);

    let mut previous: Option<Block> = None;
    for size in sizes {
        let block = arena.alloc(size);
        if let Some(prev) = previous {
            assert!(block.offset() >= prev.offset() + prev.len());
        }
        previous = Some(block);
    }

    assert_eq!(arena.size(), total);
    assert_eq!(arena.remaining(), 0);
}

#[test]
fn scenario_rollback_to_second_block() {
    let mut arena = checked(64);
    let _first = arena.alloc(10);
    assert_eq!(arena.size(), 10);
    let second = arena.alloc(20);
    assert_eq!(arena.size(), 30);

    arena.free(second.marker());
    assert_eq!(arena.size(), 10);
}

#[test]
fn nested_markers_unwind_in_lifo_order() {
    let mut arena = checked(256);
    let outer = arena.marker();
    let _ = arena.alloc(32);
    let inner = arena.marker();
    let _ = arena.alloc(64);
    let _ = arena.alloc_aligned(8, 32);

    arena.free(inner);
    assert_eq!(arena.size(), 32);
    arena.free(outer);
    assert_eq!(arena.size(), 0);
    assert_eq!(arena.stats().rollbacks, 2);
}

#[test]
fn capacity_is_fixed_for_the_lifetime() {
    let mut arena = checked(100);
    for _ in 0..3 {
        let _ = arena.alloc(40);
        let _ = arena.alloc_aligned(10, 8);
        arena.clear();
        assert_eq!(arena.capacity(), 100);
        assert_eq!(arena.size(), 0);
    }
}

// ============================================================================
// ALIGNED ALLOCATION
// ============================================================================

#[test]
fn aligned_blocks_are_aligned_in_memory() {
    let mut arena = checked(4096);
    for align in [1u32, 2, 4, 8, 16, 32, 64, 128, 256] {
        for pad in [0u32, 1, 3] {
            let _ = arena.alloc(pad);
            let before = arena.marker();
            let block = arena.alloc_aligned(5, align);

            assert_eq!(address(&arena, block) % align as usize, 0, "align {align}");
            let shift = arena.header_shift(block).unwrap();
            assert_eq!(block.offset() - before.offset(), shift);
            assert!(shift >= 1 && shift <= align);
            assert_eq!(arena.size() - before.offset(), 5 + align);

            let header = arena.as_bytes()[block.offset() as usize - 1];
            assert_eq!(u32::from(header), shift & 0xFF);
        }
    }
}

#[test]
fn scenario_aligned_on_aligned_base_steps_forward() {
    let mut arena = checked(16);
    let block = arena.alloc_aligned(4, 8);

    assert_eq!(block.offset(), 8);
    assert_eq!(arena.as_bytes()[7], 8);
    assert_eq!(arena.size(), 12);
}

#[test]
fn scenario_clear_then_alloc_returns_base() {
    let mut arena = checked(16);
    let _ = arena.alloc_aligned(4, 8);
    arena.clear();

    assert_eq!(arena.size(), 0);
    let block = arena.alloc(5);
    assert_eq!(block.offset(), 0);
    assert_eq!(block.marker(), Marker::from_offset(0));
}

#[test]
fn full_step_of_256_is_stored_as_zero() {
    let mut arena = checked(1024);
    let base = arena.as_bytes().as_ptr() as usize;
    let pad = u32::try_from((256 - base % 256) % 256).unwrap();
    let _ = arena.alloc(pad);

    let block = arena.alloc_aligned(1, 256);
    assert_eq!(block.offset(), pad + 256);
    assert_eq!(arena.as_bytes()[block.offset() as usize - 1], 0);
    assert_eq!(arena.header_shift(block), Ok(256));

    arena.free_aligned(Some(block));
    assert_eq!(arena.size(), pad);
}

#[test]
fn try_alloc_aligned_reports_bad_requests() {
    let mut arena = checked(32);
    assert_eq!(
        arena.try_alloc_aligned(4, 3),
        Err(ArenaError::InvalidAlignment(3))
    );
    assert_eq!(
        arena.try_alloc_aligned(4, 512),
        Err(ArenaError::InvalidAlignment(512))
    );
    assert_eq!(
        arena.try_alloc_aligned(20, 16),
        Err(ArenaError::CapacityExceeded {
            requested: 36,
            remaining: 32
        })
    );
    assert!(arena.is_empty());
}

// ============================================================================
// ROLLBACK
// ============================================================================

#[test]
#[should_panic(expected = "top < limit")]
fn scenario_free_when_exactly_full_halts() {
    let mut arena = checked(8);
    let block = arena.alloc(8);
    assert_eq!(arena.size(), 8);
    arena.free(block.marker());
}

#[test]
fn free_is_allowed_one_byte_short_of_full() {
    let mut arena = checked(8);
    let block = arena.alloc(7);
    arena.free(block.marker());
    assert_eq!(arena.size(), 0);
}

#[test]
fn try_free_rejects_marker_above_cursor() {
    let mut arena = checked(32);
    let _ = arena.alloc(4);
    assert_eq!(
        arena.try_free(Marker::from_offset(10)),
        Err(ArenaError::InvalidMarker { marker: 10, top: 4 })
    );
    assert_eq!(arena.size(), 4);
}

#[test]
fn aligned_release_ignore_leaves_cursor() {
    let config = ArenaConfig {
        aligned_release: AlignedRelease::Ignore,
        ..ArenaConfig::debug(64)
    };
    let mut arena = StackArena::with_config(&config).unwrap();
    let block = arena.alloc_aligned(8, 8);
    let size = arena.size();

    assert_eq!(arena.try_free_aligned(Some(block)), Ok(()));
    assert_eq!(arena.size(), size);
    assert_eq!(arena.try_free_aligned(None), Ok(()));
}

#[test]
fn aligned_release_rollback_after_later_rollback_is_rejected() {
    let mut arena = checked(128);
    let _ = arena.alloc(16);
    let block = arena.alloc_aligned(8, 8);
    arena.free(Marker::from_offset(0));

    // The header is no longer live once the cursor has passed back over it.
    assert_eq!(
        arena.try_free_aligned(Some(block)),
        Err(ArenaError::InvalidHeader {
            offset: block.offset()
        })
    );
}

// ============================================================================
// CONTRACT TIERS
// ============================================================================

#[test]
#[should_panic(expected = "limit - top >= size")]
fn instrumented_alloc_over_capacity_halts() {
    let mut arena = checked(16);
    let _ = arena.alloc(10);
    let _ = arena.alloc(7);
}

#[test]
#[should_panic(expected = "align is a power of two")]
fn instrumented_bad_alignment_halts() {
    let mut arena = checked(64);
    let _ = arena.alloc_aligned(4, 12);
}

#[test]
#[should_panic(expected = "marker <= top")]
fn instrumented_marker_above_cursor_halts() {
    let mut arena = checked(64);
    arena.free(Marker::from_offset(1));
}

#[test]
fn unchecked_alloc_moves_cursor_past_limit() {
    let mut arena = unchecked(16);
    let _ = arena.alloc(10);
    let block = arena.alloc(10);

    assert_eq!(arena.size(), 20);
    assert!(arena.size() > arena.capacity());
    assert_eq!(arena.remaining(), 0);
    assert!(arena.bytes(block).is_none());
    assert_eq!(arena.high_water_mark(), 20);
}

#[test]
fn unchecked_free_at_limit_goes_through() {
    let mut arena = unchecked(8);
    let block = arena.alloc(8);
    arena.free(block.marker());
    assert_eq!(arena.size(), 0);
}

#[test]
fn checked_entry_points_ignore_assertion_mode() {
    let mut arena = unchecked(8);
    assert!(matches!(
        arena.try_alloc(9),
        Err(ArenaError::CapacityExceeded { .. })
    ));
    let block = arena.try_alloc(8).unwrap();
    assert_eq!(
        arena.try_free(block.marker()),
        Err(ArenaError::RollbackAtLimit { capacity: 8 })
    );
}
