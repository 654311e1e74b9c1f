//! Messages accepted by invite contracts

use csm_cell::{Address, Builder, CellError, Slice};

use super::MessageBody;
use crate::errors::{Context, DecodeError};
use crate::opcodes::op;

/// add_referal: issue the next referral sequence number for `program`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddReferal {
    pub program: u32,
    pub seq_no: u32,
    pub invite: Address,
}

impl MessageBody for AddReferal {
    const OP: u32 = op::ADD_REFERAL;
    const NAME: &'static str = "AddReferal";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.program as u64, 32)?
            .store_uint(self.seq_no as u64, 32)?
            .store_address(&self.invite)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            program: slice.load_uint(32).ctx(Self::NAME, "program")? as u32,
            seq_no: slice.load_uint(32).ctx(Self::NAME, "seq_no")? as u32,
            invite: slice.load_address().ctx(Self::NAME, "invite")?,
        })
    }
}

/// set_owner: bind an invite to the profile that accepted it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetOwner {
    pub owner: Address,
}

impl MessageBody for SetOwner {
    const OP: u32 = op::SET_OWNER;
    const NAME: &'static str = "SetOwner";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.owner)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            owner: slice.load_address().ctx(Self::NAME, "owner")?,
        })
    }
}
