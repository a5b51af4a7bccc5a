//! # Contract Checking
//!
//! Arena preconditions are assertions. With assertions enabled a violation is
//! reported (condition, error and caller location) and execution halts. With
//! assertions disabled the check is skipped and the operation goes ahead.
//!
//! ```text
//! Enabled:   violation -> tracing::error! -> panic
//! Disabled:  violation -> cursor moves anyway (no memory is touched out of range)
//! ```
//!
//! The `try_*` entry points of [`StackArena`](super::StackArena) ignore this
//! setting and always return an [`ArenaError`].

use std::panic::Location;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

/// Whether arena preconditions are checked by the panicking entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionMode {
    /// Violations are logged and halt execution.
    Enabled,
    /// Violations are not checked; the cursor is updated regardless.
    Disabled,
}

impl AssertionMode {
    /// Returns `true` if violations halt execution.
    #[inline]
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl Default for AssertionMode {
    /// Follows `debug_assertions`: enabled in dev builds, disabled in release.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Applies `mode` to the outcome of a precondition check.
///
/// Returns the checked value on success and `None` for a violation that was
/// let through.
///
/// # Panics
///
/// Panics on a violation when `mode` is [`AssertionMode::Enabled`].
#[inline]
#[track_caller]
pub(crate) fn enforce<T>(mode: AssertionMode, condition: &str, result: ArenaResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if mode.is_enabled() => violated(condition, &err),
        Err(_) => None,
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn violated(condition: &str, err: &ArenaError) -> ! {
    let location = Location::caller();
    tracing::error!(condition, error = %err, %location, "arena contract violated");
    panic!("arena contract violated: `{condition}` ({err}) at {location}");
}
