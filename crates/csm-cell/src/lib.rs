//! # CSM Cell
//!
//! Bit-cell codec for the TON-style data model used by the Crypto Style
//! matrix contracts.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure data model, no I/O
//!   - `Cell`: up to 1023 bits and 4 shared child references
//!   - `Builder`: append integers, coins, addresses, references
//!   - `Slice`: read them back, failing instead of reading past the end
//!   - `Address`: workchain + 256-bit hash, friendly and raw text forms
//!
//! - **Codec Layer** (`codec/`): multi-cell encodings
//!   - `boc`: bag-of-cells bytes (hex/base64 helpers included)
//!   - `snake`: 127-byte chunk chains for long strings
//!   - `dict`: `HashmapE` tries keyed by `u32` or SHA-256 digests
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: a cell never exceeds 1023 bits, 4 references or depth 1024
//! - **INVARIANT-2**: cells are immutable, children are built before parents,
//!   so the graph is acyclic
//! - **INVARIANT-3**: every read is bounds-checked and returns `CellError`
//!   instead of panicking
//! - **INVARIANT-4**: encoding is deterministic; equal inputs give equal hashes
//!
//! ## Usage Example
//!
//! ```ignore
//! use csm_cell::{Builder, Slice, boc};
//!
//! let mut builder = Builder::new();
//! builder.store_uint(0x179b74a8, 32)?.store_uint(7, 64)?;
//! let cell = builder.end_cell()?;
//!
//! let bytes = boc::to_boc(&cell)?;
//! let mut slice = Slice::from(&boc::from_boc(&bytes)?);
//! assert_eq!(slice.load_uint(32)?, 0x179b74a8);
//! ```

pub mod codec;
pub mod config;
pub mod domain;

pub use codec::{boc, dict, snake};
pub use codec::{BocOptions, DictKey, DictValue, Dictionary};
pub use config::{CodecLimits, DEFAULT_MAX_SNAKE_CELLS};
pub use domain::*;
