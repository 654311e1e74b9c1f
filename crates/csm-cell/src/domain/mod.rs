//! Domain Layer - the cell data model
//!
//! This layer contains:
//! - `Cell`: immutable bit-cell with representation hash
//! - `Builder` / `Slice`: write and read cursors
//! - `Address`: internal account address and its text forms
//! - Error types
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod address;
pub mod builder;
pub mod cell;
pub mod errors;
pub mod slice;

pub use address::{Address, FriendlyFlags, ADDRESS_BITS};
pub use builder::{Builder, MAX_COINS_BYTES};
pub use cell::{Bits, Cell, CellRef, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};
pub use errors::{AddressError, BocError, CellError, DictError, SnakeError};
pub use slice::Slice;
