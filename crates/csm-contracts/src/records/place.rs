//! Matrix place storage
//!
//! | Field      | Type                  |
//! |------------|-----------------------|
//! | marketing  | MsgAddress            |
//! | m          | uint3 (1..=6)         |
//! | parent     | MsgAddress / none     |
//! | created_at | uint64                |
//! | fill_count | uint3                 |
//! | profiles   | ^ProfileRefs          |
//! | security   | ^SecurityInfo         |
//! | children   | Maybe ^PlaceChildren  |

use csm_cell::{Address, Builder, CellError, Slice};
use serde::{Deserialize, Serialize};

use super::common::{MatrixLevel, SecurityInfo};
use super::CellCodec;
use crate::errors::{Context, DecodeError};

/// Largest fill count accepted on decode.
pub const MAX_DECODED_FILL_COUNT: u8 = 6;

/// Occupant of a place
///
/// | Field           | Type              |
/// |-----------------|-------------------|
/// | clone           | uint1             |
/// | profile         | MsgAddress        |
/// | place_number    | uint32            |
/// | inviter_profile | MsgAddress / none |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRefs {
    pub clone: bool,
    pub profile: Address,
    pub place_number: u32,
    pub inviter_profile: Option<Address>,
}

impl CellCodec for ProfileRefs {
    const NAME: &'static str = "ProfileRefs";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_bit(self.clone)?
            .store_address(&self.profile)?
            .store_uint(self.place_number as u64, 32)?
            .store_maybe_address(self.inviter_profile.as_ref())?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            clone: slice.load_bit().ctx(Self::NAME, "clone")?,
            profile: slice.load_address().ctx(Self::NAME, "profile")?,
            place_number: slice.load_uint(32).ctx(Self::NAME, "place_number")? as u32,
            inviter_profile: slice
                .load_maybe_address()
                .ctx(Self::NAME, "inviter_profile")?,
        })
    }
}

/// Child places, filled left first
///
/// | Field | Type              |
/// |-------|-------------------|
/// | left  | MsgAddress        |
/// | right | Maybe MsgAddress  |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceChildren {
    pub left: Address,
    pub right: Option<Address>,
}

impl CellCodec for PlaceChildren {
    const NAME: &'static str = "PlaceChildren";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.left)?;
        match &self.right {
            Some(right) => builder.store_bit(true)?.store_address(right)?,
            None => builder.store_bit(false)?,
        };
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let left = slice.load_address().ctx(Self::NAME, "left")?;
        let right = if slice.load_bit().ctx(Self::NAME, "right")? {
            Some(slice.load_address().ctx(Self::NAME, "right")?)
        } else {
            None
        };
        Ok(Self { left, right })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub marketing: Address,
    pub m: MatrixLevel,
    /// `None` for the root place of a matrix
    pub parent: Option<Address>,
    pub created_at: u64,
    /// Places filled in the subtree below this one
    pub fill_count: u8,
    pub profiles: ProfileRefs,
    pub security: SecurityInfo,
    pub children: Option<PlaceChildren>,
}

impl PlaceRecord {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn left_child(&self) -> Option<Address> {
        self.children.map(|c| c.left)
    }

    pub fn right_child(&self) -> Option<Address> {
        self.children.and_then(|c| c.right)
    }
}

impl CellCodec for PlaceRecord {
    const NAME: &'static str = "PlaceRecord";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.marketing)?;
        self.m.store(builder)?;
        builder
            .store_maybe_address(self.parent.as_ref())?
            .store_uint(self.created_at, 64)?
            .store_uint(self.fill_count as u64, 3)?
            .store_ref(self.profiles.to_cell()?)?
            .store_ref(self.security.to_cell()?)?;
        let children = self.children.map(|c| c.to_cell()).transpose()?;
        builder.store_maybe_ref(children)?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let marketing = slice.load_address().ctx(Self::NAME, "marketing")?;
        let m = MatrixLevel::load(slice, Self::NAME, "m")?;
        let parent = slice.load_maybe_address().ctx(Self::NAME, "parent")?;
        let created_at = slice.load_uint(64).ctx(Self::NAME, "created_at")?;
        let fill_count = slice.load_uint(3).ctx(Self::NAME, "fill_count")? as u8;
        if fill_count > MAX_DECODED_FILL_COUNT {
            return Err(DecodeError::constraint(
                Self::NAME,
                "fill_count",
                format!("{fill_count} exceeds {MAX_DECODED_FILL_COUNT}"),
            ));
        }
        let profiles = ProfileRefs::from_cell(&slice.load_ref().ctx(Self::NAME, "profiles")?)?;
        let security = SecurityInfo::from_cell(&slice.load_ref().ctx(Self::NAME, "security")?)?;
        let children = slice
            .load_maybe_ref()
            .ctx(Self::NAME, "children")?
            .map(|cell| PlaceChildren::from_cell(&cell))
            .transpose()?;

        Ok(Self {
            marketing,
            m,
            parent,
            created_at,
            fill_count,
            profiles,
            security,
            children,
        })
    }
}
