//! Messages accepted by profile items

use csm_cell::{Address, Builder, CellError, CellRef, Slice};

use super::MessageBody;
use crate::errors::{Context, DecodeError};
use crate::opcodes::item_op;
use crate::records::{CellCodec, NftContent};

/// choose_inviter: join `program` under the given inviter and invite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChooseInviter {
    pub program: u32,
    pub inviter: Address,
    pub seq_no: u32,
    pub invite: Address,
}

impl MessageBody for ChooseInviter {
    const OP: u32 = item_op::CHOOSE_INVITER;
    const NAME: &'static str = "ChooseInviter";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.program as u64, 32)?
            .store_address(&self.inviter)?
            .store_uint(self.seq_no as u64, 32)?
            .store_address(&self.invite)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            program: slice.load_uint(32).ctx(Self::NAME, "program")? as u32,
            inviter: slice.load_address().ctx(Self::NAME, "inviter")?,
            seq_no: slice.load_uint(32).ctx(Self::NAME, "seq_no")? as u32,
            invite: slice.load_address().ctx(Self::NAME, "invite")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditContent {
    pub content: NftContent,
}

impl MessageBody for EditContent {
    const OP: u32 = item_op::EDIT_CONTENT;
    const NAME: &'static str = "EditContent";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_ref(self.content.to_cell()?)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let cell = slice.load_ref().ctx(Self::NAME, "content")?;
        Ok(Self {
            content: NftContent::from_cell(&cell)?,
        })
    }
}

/// Payload forwarded to the new owner on transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardPayload {
    /// Bits and refs of the cell written directly into the message
    Inline(CellRef),
    Ref(CellRef),
}

/// transfer: standard NFT transfer
///
/// `new_owner, response_destination, custom_payload (always none),
/// forward_amount, Either Cell ^Cell`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub new_owner: Address,
    pub response: Option<Address>,
    pub forward_amount: u128,
    pub forward_payload: Option<ForwardPayload>,
}

impl MessageBody for Transfer {
    const OP: u32 = item_op::TRANSFER;
    const NAME: &'static str = "Transfer";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_address(&self.new_owner)?
            .store_maybe_address(self.response.as_ref())?
            .store_bit(false)?
            .store_coins(self.forward_amount)?;
        match &self.forward_payload {
            Some(ForwardPayload::Ref(cell)) => {
                builder.store_bit(true)?.store_ref(cell.clone())?;
            }
            Some(ForwardPayload::Inline(cell)) => {
                builder.store_bit(false)?.store_slice(&Slice::from(cell))?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let new_owner = slice.load_address().ctx(Self::NAME, "new_owner")?;
        let response = slice.load_maybe_address().ctx(Self::NAME, "response")?;
        if slice.load_bit().ctx(Self::NAME, "custom_payload")? {
            slice.load_ref().ctx(Self::NAME, "custom_payload")?;
        }
        let forward_amount = slice.load_coins().ctx(Self::NAME, "forward_amount")?;
        let forward_payload = if slice.load_bit().ctx(Self::NAME, "forward_payload")? {
            Some(ForwardPayload::Ref(
                slice.load_ref().ctx(Self::NAME, "forward_payload")?,
            ))
        } else if slice.is_empty() {
            None
        } else {
            let mut rest = Builder::new();
            rest.store_slice(slice).ctx(Self::NAME, "forward_payload")?;
            Some(ForwardPayload::Inline(
                rest.end_cell().ctx(Self::NAME, "forward_payload")?,
            ))
        };

        Ok(Self {
            new_owner,
            response,
            forward_amount,
            forward_payload,
        })
    }
}

/// withdraw: send `amount` from the item balance to its owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Withdraw {
    pub amount: u128,
}

impl MessageBody for Withdraw {
    const OP: u32 = item_op::WITHDRAW;
    const NAME: &'static str = "Withdraw";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_coins(self.amount)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            amount: slice.load_coins().ctx(Self::NAME, "amount")?,
        })
    }
}

/// report_of_invite: invite contract confirming (or rejecting) a referral
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOfInvite {
    pub program: u32,
    pub valid: bool,
}

impl MessageBody for ReportOfInvite {
    const OP: u32 = item_op::REPORT_OF_INVITE;
    const NAME: &'static str = "ReportOfInvite";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.program as u64, 32)?
            .store_bit(self.valid)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            program: slice.load_uint(32).ctx(Self::NAME, "program")? as u32,
            valid: slice.load_bit().ctx(Self::NAME, "valid")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bonus {
    pub comment: CellRef,
}

impl MessageBody for Bonus {
    const OP: u32 = item_op::BONUS;
    const NAME: &'static str = "Bonus";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_ref(self.comment.clone())?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            comment: slice.load_ref().ctx(Self::NAME, "comment")?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetStaticData;

impl MessageBody for GetStaticData {
    const OP: u32 = item_op::GET_STATIC_DATA;
    const NAME: &'static str = "GetStaticData";

    fn store_fields(&self, _builder: &mut Builder) -> Result<(), CellError> {
        Ok(())
    }

    fn load_fields(_slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}
