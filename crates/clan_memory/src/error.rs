//! # Arena Error Types
//!
//! Errors reported by the checked (`try_*`) arena entry points and by
//! configuration loading.

use thiserror::Error;

/// Errors that can occur while using a stack arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The request does not fit in the space left above the cursor.
    #[error("capacity exceeded: requested {requested} bytes, {remaining} remaining")]
    CapacityExceeded {
        /// Bytes the request would consume (including alignment slack).
        requested: u64,
        /// Bytes left between the cursor and the end of the buffer.
        remaining: u32,
    },

    /// A rollback marker lies above the current cursor.
    #[error("invalid marker {marker}: cursor is at {top}")]
    InvalidMarker {
        /// The offending marker offset.
        marker: u32,
        /// Cursor offset at the time of the call.
        top: u32,
    },

    /// Rollback attempted while the arena is exactly full.
    #[error("rollback refused: arena is exactly full at {capacity} bytes")]
    RollbackAtLimit {
        /// Capacity of the arena.
        capacity: u32,
    },

    /// Alignment is not a power of two in `1..=256`.
    #[error("invalid alignment {0}: must be a power of two no greater than 256")]
    InvalidAlignment(u32),

    /// The shift header in front of an aligned block is missing or corrupt.
    #[error("invalid aligned header for block at offset {offset}")]
    InvalidHeader {
        /// Offset of the aligned block.
        offset: u32,
    },

    /// A typed request does not fit the 32-bit size domain.
    #[error("request of {count} elements of {element_size} bytes overflows")]
    SizeOverflow {
        /// Number of elements requested.
        count: u32,
        /// Size of one element in bytes.
        element_size: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
