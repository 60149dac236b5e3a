//! # Heap Configuration
//!
//! Sizing for a heap, loaded once at startup from TOML or built in code.
//!
//! ```toml
//! capacity = 4096
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{HeapError, HeapResult};

/// Default heap capacity in cells.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Configuration for a [`Heap`](crate::Heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeapConfig {
    /// Number of cells in the backing buffer. Fixed for the heap's lifetime.
    pub capacity: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl HeapConfig {
    /// Creates a configuration with the given capacity.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing fields fall back to [`HeapConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidConfig`] if the text is not valid TOML,
    /// contains unknown keys, or fails [`HeapConfig::validate`].
    pub fn from_toml_str(text: &str) -> HeapResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| HeapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a usable heap.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidConfig`] if `capacity` is zero.
    pub fn validate(&self) -> HeapResult<()> {
        if self.capacity == 0 {
            return Err(HeapError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
