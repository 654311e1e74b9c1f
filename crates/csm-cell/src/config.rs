//! Decoder resource limits
//!
//! Values can be overridden from the environment:
//! - `CSM_MAX_SNAKE_CELLS`
//! - `CSM_MAX_BOC_CELLS`
//! - `CSM_MAX_BOC_BYTES`

use serde::{Deserialize, Serialize};

/// Default bound on the number of cells walked by a snake decoder.
pub const DEFAULT_MAX_SNAKE_CELLS: usize = 4096;

/// Limits applied while decoding untrusted input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecLimits {
    /// Maximum number of cells in one snake chain
    pub max_snake_cells: usize,
    /// Maximum number of cells in one bag of cells
    pub max_boc_cells: usize,
    /// Maximum size of a serialized bag of cells in bytes
    pub max_boc_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_snake_cells: DEFAULT_MAX_SNAKE_CELLS,
            max_boc_cells: 65_536,
            max_boc_bytes: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl CodecLimits {
    /// Defaults overridden by any `CSM_MAX_*` variables that parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CodecLimits::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());
        let defaults = Self::default();

        Self {
            max_snake_cells: parsed("CSM_MAX_SNAKE_CELLS").unwrap_or(defaults.max_snake_cells),
            max_boc_cells: parsed("CSM_MAX_BOC_CELLS").unwrap_or(defaults.max_boc_cells),
            max_boc_bytes: parsed("CSM_MAX_BOC_BYTES").unwrap_or(defaults.max_boc_bytes),
        }
    }
}
