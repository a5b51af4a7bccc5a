//! # Arena Configuration
//!
//! Settings for a [`StackArena`](crate::StackArena), loaded once at startup
//! from TOML:
//!
//! ```toml
//! capacity = 65536
//! assertions = "enabled"       # or "disabled"
//! aligned_release = "rollback" # or "ignore"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};
use crate::memory::{AlignedRelease, AssertionMode};

/// Default arena size: 64 KiB.
pub const DEFAULT_CAPACITY: u32 = 64 * 1024;

/// Configuration for a stack arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Buffer size in bytes. Must be non-zero.
    pub capacity: u32,
    /// Contract checking for the panicking entry points.
    pub assertions: AssertionMode,
    /// What `free_aligned` does with the recovered reservation.
    pub aligned_release: AlignedRelease,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            assertions: AssertionMode::default(),
            aligned_release: AlignedRelease::default(),
        }
    }
}

impl ArenaConfig {
    /// Development config: every precondition is checked and halts on
    /// violation.
    #[must_use]
    pub const fn debug(capacity: u32) -> Self {
        Self {
            capacity,
            assertions: AssertionMode::Enabled,
            aligned_release: AlignedRelease::Rollback,
        }
    }

    /// Production config: the panicking entry points skip their checks.
    ///
    /// Use the `try_*` entry points where a violation must be reported.
    #[must_use]
    pub const fn production(capacity: u32) -> Self {
        Self {
            capacity,
            assertions: AssertionMode::Disabled,
            aligned_release: AlignedRelease::Rollback,
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] on malformed TOML, unknown keys
    /// or invalid values.
    pub fn from_toml_str(source: &str) -> ArenaResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ArenaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the file cannot be read or
    /// does not hold a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ArenaError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), capacity = config.capacity, "arena config loaded");
        Ok(config)
    }

    /// Checks the configuration for values no arena can be built from.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] for a zero capacity.
    pub fn validate(&self) -> ArenaResult<()> {
        if self.capacity == 0 {
            return Err(ArenaError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
