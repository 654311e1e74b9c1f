//! Invite contract storage
//!
//! | Field       | Type              |
//! |-------------|-------------------|
//! | admin       | MsgAddress        |
//! | program     | uint32 (> 0)      |
//! | next_ref_no | uint32 (>= 1)     |
//! | number      | uint32 (>= 1)     |
//! | parent      | MsgAddress / none |
//! | owner       | Maybe ^OwnerInfo  |

use csm_cell::{Address, Builder, CellError, Slice};
use serde::{Deserialize, Serialize};

use super::CellCodec;
use crate::errors::{Context, DecodeError};

/// Current owner of an invite and when it was assigned
///
/// | Field  | Type       |
/// |--------|------------|
/// | owner  | MsgAddress |
/// | set_at | uint64     |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub owner: Address,
    pub set_at: u64,
}

impl CellCodec for OwnerInfo {
    const NAME: &'static str = "OwnerInfo";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.owner)?.store_uint(self.set_at, 64)?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            owner: slice.load_address().ctx(Self::NAME, "owner")?,
            set_at: slice.load_uint(64).ctx(Self::NAME, "set_at")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    pub admin: Address,
    pub program: u32,
    /// Next referral sequence number to hand out; issued numbers are
    /// `1..next_ref_no`.
    pub next_ref_no: u32,
    pub number: u32,
    pub parent: Option<Address>,
    pub owner: Option<OwnerInfo>,
}

impl InviteRecord {
    /// Number of referrals issued so far.
    pub fn referral_count(&self) -> u32 {
        self.next_ref_no.saturating_sub(1)
    }
}

impl CellCodec for InviteRecord {
    const NAME: &'static str = "InviteRecord";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_address(&self.admin)?
            .store_uint(self.program as u64, 32)?
            .store_uint(self.next_ref_no as u64, 32)?
            .store_uint(self.number as u64, 32)?
            .store_maybe_address(self.parent.as_ref())?;
        let owner = self.owner.map(|o| o.to_cell()).transpose()?;
        builder.store_maybe_ref(owner)?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let admin = slice.load_address().ctx(Self::NAME, "admin")?;
        let program = slice.load_uint(32).ctx(Self::NAME, "program")? as u32;
        if program == 0 {
            return Err(DecodeError::constraint(Self::NAME, "program", "program id must be non-zero"));
        }
        let next_ref_no = slice.load_uint(32).ctx(Self::NAME, "next_ref_no")? as u32;
        if next_ref_no == 0 {
            return Err(DecodeError::constraint(Self::NAME, "next_ref_no", "must be at least 1"));
        }
        let number = slice.load_uint(32).ctx(Self::NAME, "number")? as u32;
        if number == 0 {
            return Err(DecodeError::constraint(Self::NAME, "number", "must be at least 1"));
        }
        let parent = slice.load_maybe_address().ctx(Self::NAME, "parent")?;
        let owner = slice
            .load_maybe_ref()
            .ctx(Self::NAME, "owner")?
            .map(|cell| OwnerInfo::from_cell(&cell))
            .transpose()?;

        Ok(Self {
            admin,
            program,
            next_ref_no,
            number,
            parent,
            owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::program;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    fn sample() -> InviteRecord {
        InviteRecord {
            admin: addr(1),
            program: program::MULTI,
            next_ref_no: 12,
            number: 3,
            parent: Some(addr(2)),
            owner: Some(OwnerInfo {
                owner: addr(3),
                set_at: 1_717_000_000,
            }),
        }
    }

    #[test]
    fn test_roundtrip() {
        let record = sample();
        let cell = record.to_cell().unwrap();
        assert_eq!(InviteRecord::from_cell(&cell).unwrap(), record);
        assert_eq!(record.referral_count(), 11);
    }

    #[test]
    fn test_root_invite_without_owner() {
        let record = InviteRecord {
            parent: None,
            owner: None,
            ..sample()
        };
        let cell = record.to_cell().unwrap();
        assert!(cell.refs().is_empty());
        assert_eq!(InviteRecord::from_cell(&cell).unwrap(), record);
    }

    #[test]
    fn test_zero_sequence_rejected() {
        let record = InviteRecord {
            next_ref_no: 0,
            ..sample()
        };
        let cell = record.to_cell().unwrap();
        let err = InviteRecord::from_cell(&cell).unwrap_err();
        assert_eq!(err.field, "next_ref_no");
    }

    #[test]
    fn test_truncated_owner_names_field() {
        let mut builder = Builder::new();
        builder.store_address(&addr(1)).unwrap();
        let cell = builder.end_cell().unwrap();
        let err = InviteRecord::from_cell(&cell).unwrap_err();
        assert_eq!(err.record, "InviteRecord");
        assert_eq!(err.field, "program");
        assert!(err.is_exhausted());
    }
}
