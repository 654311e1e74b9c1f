//! Per-program referral data kept by a profile item
//!
//! | Field     | Type       |
//! |-----------|------------|
//! | inviter   | MsgAddress |
//! | seq_no    | uint32     |
//! | invite    | MsgAddress |
//! | confirmed | uint1      |

use csm_cell::{Address, Builder, CellError, DictValue, Dictionary, Slice};
use serde::{Deserialize, Serialize};

use super::CellCodec;
use crate::errors::{Context, DecodeError};

/// Programs a profile has joined, keyed by program id
pub type ProfilePrograms = Dictionary<u32, ProgramData>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramData {
    /// Profile that invited this one
    pub inviter: Address,
    pub seq_no: u32,
    /// Invite contract issued for this profile
    pub invite: Address,
    /// Set once the invite reported back as valid
    pub confirmed: bool,
}

impl CellCodec for ProgramData {
    const NAME: &'static str = "ProgramData";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_address(&self.inviter)?
            .store_uint(self.seq_no as u64, 32)?
            .store_address(&self.invite)?
            .store_bit(self.confirmed)?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            inviter: slice.load_address().ctx(Self::NAME, "inviter")?,
            seq_no: slice.load_uint(32).ctx(Self::NAME, "seq_no")? as u32,
            invite: slice.load_address().ctx(Self::NAME, "invite")?,
            confirmed: slice.load_bit().ctx(Self::NAME, "confirmed")?,
        })
    }
}

impl DictValue for ProgramData {
    type Error = DecodeError;

    fn store_value(&self, builder: &mut Builder) -> Result<(), CellError> {
        self.store(builder)
    }

    fn load_value(slice: &mut Slice) -> Result<Self, DecodeError> {
        Self::load(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::program;

    #[test]
    fn test_programs_dictionary() {
        let data = ProgramData {
            inviter: Address::new(0, [1; 32]),
            seq_no: 4,
            invite: Address::new(0, [2; 32]),
            confirmed: true,
        };
        let mut programs = ProfilePrograms::new();
        programs.set(program::MULTI, data);

        let mut builder = Builder::new();
        programs.store_maybe(&mut builder).unwrap();
        let cell = builder.end_cell().unwrap();

        let back = ProfilePrograms::load_maybe(&mut Slice::from(&cell)).unwrap();
        assert_eq!(back.get(&program::MULTI), Some(&data));
    }

    #[test]
    fn test_truncated_value_reports_program_field() {
        let mut builder = Builder::new();
        builder.store_address(&Address::new(0, [1; 32])).unwrap();
        let err = ProgramData::from_cell(&builder.end_cell().unwrap()).unwrap_err();
        assert_eq!((err.record, err.field), ("ProgramData", "seq_no"));
    }
}
