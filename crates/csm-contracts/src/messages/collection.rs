//! Messages accepted by the profile collection

use csm_cell::{Address, Builder, CellError, CellRef, Slice};

use super::MessageBody;
use crate::errors::{Context, DecodeError};
use crate::opcodes::collection_op;
use crate::records::{profile_item_index, CellCodec, NftContent};

/// deploy_item: mint the profile item for `login`
///
/// The login is stored as a string tail right after the header, so a long
/// login spills into a reference placed before the content reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployItem {
    pub login: String,
    pub content: NftContent,
}

impl DeployItem {
    /// Index of the item this message deploys.
    pub fn item_index(&self) -> [u8; 32] {
        profile_item_index(&self.login)
    }
}

impl MessageBody for DeployItem {
    const OP: u32 = collection_op::DEPLOY_ITEM;
    const NAME: &'static str = "DeployItem";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        let content = self.content.to_cell()?;
        builder.store_string_tail(&self.login)?;
        builder.store_ref(content)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let content_cell = match slice.remaining_refs() {
            1 => slice.unread_refs()[0].clone(),
            2 => slice.unread_refs()[1].clone(),
            n => {
                return Err(DecodeError::constraint(
                    Self::NAME,
                    "content",
                    format!("expected 1 or 2 refs, found {n}"),
                ))
            }
        };
        let mut bytes = slice.load_bytes(slice.remaining_bits() / 8).ctx(Self::NAME, "login")?;
        if slice.remaining_refs() == 2 {
            let tail = slice.load_ref().ctx(Self::NAME, "login")?;
            bytes.extend(
                csm_cell::snake::decode_snake(&tail, csm_cell::DEFAULT_MAX_SNAKE_CELLS)
                    .ctx(Self::NAME, "login")?,
            );
        }
        slice.load_ref().ctx(Self::NAME, "content")?;
        let login = String::from_utf8(bytes)
            .map_err(|_| CellError::from(csm_cell::SnakeError::Utf8))
            .ctx(Self::NAME, "login")?;

        Ok(Self {
            login,
            content: NftContent::from_cell(&content_cell)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeCollectionOwner {
    pub owner: Address,
}

impl MessageBody for ChangeCollectionOwner {
    const OP: u32 = collection_op::CHANGE_OWNER;
    const NAME: &'static str = "ChangeCollectionOwner";

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

/// change_content: replace the collection content cell as a whole
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeCollectionContent {
    pub content: CellRef,
}

impl MessageBody for ChangeCollectionContent {
    const OP: u32 = collection_op::CHANGE_CONTENT;
    const NAME: &'static str = "ChangeCollectionContent";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_ref(self.content.clone())?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            content: slice.load_ref().ctx(Self::NAME, "content")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionWithdraw {
    pub amount: u128,
}

impl MessageBody for CollectionWithdraw {
    const OP: u32 = collection_op::WITHDRAW;
    const NAME: &'static str = "CollectionWithdraw";

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
