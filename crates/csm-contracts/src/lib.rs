//! # CSM Contracts
//!
//! Typed records and message builders for the Crypto Style contracts:
//! multi (matrix aggregate), places, invites, the profile collection and
//! profile items.
//!
//! ## Architecture
//!
//! - `records/`: storage layouts, each a `CellCodec` (`to_cell` / `from_cell`)
//! - `messages/`: internal message bodies, each a `MessageBody` with the
//!   `op:uint32 query_id:uint64` header added by `to_cell`
//! - `opcodes`: op and exit code registry
//! - `errors`: `DecodeError` naming the record and field that failed
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: field order equals the on-chain storage layout
//! - **INVARIANT-2**: `from_cell(to_cell(x)) == x` for every valid record
//! - **INVARIANT-3**: builders are pure; equal arguments give equal cells
//! - **INVARIANT-4**: out-of-range values fail decode with a constraint
//!   error instead of being clamped
//!
//! ## Usage Example
//!
//! ```ignore
//! use csm_contracts::messages::{BuyPlace, MessageBody};
//! use csm_contracts::records::{CellCodec, MatrixLevel, PlaceRecord};
//!
//! let place = PlaceRecord::from_boc(&bytes)?;
//! let body = BuyPlace {
//!     m: MatrixLevel::new(2).unwrap(),
//!     profile,
//!     pos: None,
//! }
//! .to_cell(query_id)?;
//! ```

pub mod errors;
pub mod messages;
pub mod opcodes;
pub mod records;

pub use errors::{DecodeError, DecodeFailure};
pub use messages::{AnyMessage, MessageBody};
pub use records::CellCodec;
