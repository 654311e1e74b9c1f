//! Typed contract records
//!
//! Every record implements `CellCodec`. Field order is the contract's
//! storage layout and is documented on each type; reordering breaks wire
//! compatibility.

pub mod common;
pub mod content;
pub mod invite;
pub mod multi;
pub mod place;
pub mod profile_item;
pub mod program;
pub mod task;

use csm_cell::{boc, Builder, CellError, CellRef, CodecLimits, Slice};

use crate::errors::{Context, DecodeError};

pub use common::{LevelAmounts, MatrixLevel, PlacePos, SecurityInfo, Side};
pub use content::{
    profile_item_index, NftContent, ProfileContent, DEFAULT_PROFILE_IMAGE, PROFILE_DESCRIPTION,
};
pub use invite::{InviteRecord, OwnerInfo};
pub use multi::{MultiAggregate, ProfileTasks};
pub use place::{PlaceChildren, PlaceRecord, ProfileRefs, MAX_DECODED_FILL_COUNT};
pub use profile_item::{ProfileItemRecord, ProfileItemState};
pub use program::{ProfilePrograms, ProgramData};
pub use task::{TaskItem, TaskPayload};

/// Conversion between a record and its cell layout
pub trait CellCodec: Sized {
    /// Record name used in decode errors
    const NAME: &'static str;

    /// Append the record's fields to `builder`.
    fn store(&self, builder: &mut Builder) -> Result<(), CellError>;

    /// Read the record's fields from the slice cursor.
    fn load(slice: &mut Slice) -> Result<Self, DecodeError>;

    fn to_cell(&self) -> Result<CellRef, CellError> {
        let mut builder = Builder::new();
        self.store(&mut builder)?;
        builder.end_cell()
    }

    fn from_cell(cell: &CellRef) -> Result<Self, DecodeError> {
        Self::load(&mut Slice::from(cell))
    }

    /// Decode a single-root bag of cells.
    fn from_boc(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_boc_with(bytes, &CodecLimits::default())
    }

    fn from_boc_with(bytes: &[u8], limits: &CodecLimits) -> Result<Self, DecodeError> {
        let cell = boc::from_boc_with(bytes, limits).ctx(Self::NAME, "boc")?;
        Self::from_cell(&cell)
    }

    fn to_boc(&self) -> Result<Vec<u8>, CellError> {
        boc::to_boc(&self.to_cell()?)
    }
}
