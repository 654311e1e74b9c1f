//! Internal message bodies
//!
//! Every body is `op:uint32 query_id:uint64` followed by the fields of the
//! operation. Builders are pure: the same arguments always produce the
//! same cell.

pub mod collection;
pub mod invite;
pub mod multi;
pub mod profile;

use csm_cell::{Address, Builder, CellError, CellRef, Slice};

use crate::errors::{Context, DecodeError};
use crate::opcodes::{collection_op, item_op, op};

pub use collection::{ChangeCollectionContent, ChangeCollectionOwner, CollectionWithdraw, DeployItem};
pub use invite::{AddReferal, SetOwner};
pub use multi::{
    BuyPlace, CancelTask, DeployPlace, LockPos, UnlockPos, UpdateFees, UpdateMaxTasks,
    UpdateProcessor,
};
pub use profile::{
    Bonus, ChooseInviter, EditContent, ForwardPayload, GetStaticData, ReportOfInvite, Transfer,
    Withdraw,
};

/// Fields of one operation, without the op/query_id header
pub trait MessageBody: Sized {
    const OP: u32;
    const NAME: &'static str;

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError>;

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError>;

    /// Full message cell with the given query id.
    fn to_cell(&self, query_id: u64) -> Result<CellRef, CellError> {
        let mut builder = Builder::new();
        builder.store_uint(Self::OP as u64, 32)?.store_uint(query_id, 64)?;
        self.store_fields(&mut builder)?;
        builder.end_cell()
    }

    /// Parse a full message cell, returning the query id and body.
    fn from_cell(cell: &CellRef) -> Result<(u64, Self), DecodeError> {
        let mut slice = Slice::from(cell);
        let found = slice.load_uint(32).ctx(Self::NAME, "op")?;
        if found != Self::OP as u64 {
            return Err(DecodeError::unknown_variant(Self::NAME, "op", found));
        }
        let query_id = slice.load_uint(64).ctx(Self::NAME, "query_id")?;
        let body = Self::load_fields(&mut slice)?;
        Ok((query_id, body))
    }
}

/// update_admin: replace the admin of a multi or invite contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateAdmin {
    pub admin: Address,
}

impl MessageBody for UpdateAdmin {
    const OP: u32 = op::UPDATE_ADMIN;
    const NAME: &'static str = "UpdateAdmin";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.admin)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            admin: slice.load_address().ctx(Self::NAME, "admin")?,
        })
    }
}

/// upgrade: replace contract code and data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upgrade {
    pub code: CellRef,
    pub data: CellRef,
}

impl MessageBody for Upgrade {
    const OP: u32 = op::UPGRADE;
    const NAME: &'static str = "Upgrade";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_ref(self.code.clone())?.store_ref(self.data.clone())?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            code: slice.load_ref().ctx(Self::NAME, "code")?,
            data: slice.load_ref().ctx(Self::NAME, "data")?,
        })
    }
}

/// proxy: have the contract send `message` with the given send mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proxy {
    pub mode: u8,
    pub message: CellRef,
}

impl MessageBody for Proxy {
    const OP: u32 = op::PROXY;
    const NAME: &'static str = "Proxy";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.mode as u64, 8)?
            .store_ref(self.message.clone())?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            mode: slice.load_uint(8).ctx(Self::NAME, "mode")? as u8,
            message: slice.load_ref().ctx(Self::NAME, "message")?,
        })
    }
}

/// Any message body this crate knows how to build, keyed by its op code
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyMessage {
    BuyPlace(BuyPlace),
    LockPos(LockPos),
    UnlockPos(UnlockPos),
    CancelTask(CancelTask),
    DeployPlace(DeployPlace),
    UpdateFees(UpdateFees),
    UpdateMaxTasks(UpdateMaxTasks),
    UpdateProcessor(UpdateProcessor),
    UpdateAdmin(UpdateAdmin),
    Upgrade(Upgrade),
    Proxy(Proxy),
    AddReferal(AddReferal),
    SetOwner(SetOwner),
    ChooseInviter(ChooseInviter),
    EditContent(EditContent),
    Transfer(Transfer),
    Withdraw(Withdraw),
    ReportOfInvite(ReportOfInvite),
    Bonus(Bonus),
    GetStaticData(GetStaticData),
    DeployItem(DeployItem),
    ChangeCollectionOwner(ChangeCollectionOwner),
    ChangeCollectionContent(ChangeCollectionContent),
    CollectionWithdraw(CollectionWithdraw),
}

impl AnyMessage {
    /// Dispatch on the op code of `cell` and decode the matching body.
    pub fn decode(cell: &CellRef) -> Result<(u64, Self), DecodeError> {
        fn wrap<M: MessageBody>(
            cell: &CellRef,
            variant: fn(M) -> AnyMessage,
        ) -> Result<(u64, AnyMessage), DecodeError> {
            M::from_cell(cell).map(|(query_id, body)| (query_id, variant(body)))
        }

        let code = Slice::from(cell).preload_uint(32).ctx("Message", "op")? as u32;
        match code {
            op::BUY_PLACE => wrap(cell, Self::BuyPlace),
            op::LOCK_POS => wrap(cell, Self::LockPos),
            op::UNLOCK_POS => wrap(cell, Self::UnlockPos),
            op::CANCEL_TASK => wrap(cell, Self::CancelTask),
            op::DEPLOY_PLACE => wrap(cell, Self::DeployPlace),
            op::UPDATE_FEES => wrap(cell, Self::UpdateFees),
            op::UPDATE_MAX_TASKS => wrap(cell, Self::UpdateMaxTasks),
            op::UPDATE_PROCESSOR => wrap(cell, Self::UpdateProcessor),
            op::UPDATE_ADMIN => wrap(cell, Self::UpdateAdmin),
            op::UPGRADE => wrap(cell, Self::Upgrade),
            op::PROXY => wrap(cell, Self::Proxy),
            op::ADD_REFERAL => wrap(cell, Self::AddReferal),
            op::SET_OWNER => wrap(cell, Self::SetOwner),
            op::CHOOSE_INVITER => wrap(cell, Self::ChooseInviter),
            item_op::EDIT_CONTENT => wrap(cell, Self::EditContent),
            item_op::TRANSFER => wrap(cell, Self::Transfer),
            item_op::WITHDRAW => wrap(cell, Self::Withdraw),
            op::REPORT_OF_INVITE => wrap(cell, Self::ReportOfInvite),
            op::BONUS => wrap(cell, Self::Bonus),
            item_op::GET_STATIC_DATA => wrap(cell, Self::GetStaticData),
            collection_op::DEPLOY_ITEM => wrap(cell, Self::DeployItem),
            collection_op::CHANGE_OWNER => wrap(cell, Self::ChangeCollectionOwner),
            collection_op::CHANGE_CONTENT => wrap(cell, Self::ChangeCollectionContent),
            collection_op::WITHDRAW => wrap(cell, Self::CollectionWithdraw),
            other => Err(DecodeError::unknown_variant("Message", "op", other as u64)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BuyPlace(_) => BuyPlace::NAME,
            Self::LockPos(_) => LockPos::NAME,
            Self::UnlockPos(_) => UnlockPos::NAME,
            Self::CancelTask(_) => CancelTask::NAME,
            Self::DeployPlace(_) => DeployPlace::NAME,
            Self::UpdateFees(_) => UpdateFees::NAME,
            Self::UpdateMaxTasks(_) => UpdateMaxTasks::NAME,
            Self::UpdateProcessor(_) => UpdateProcessor::NAME,
            Self::UpdateAdmin(_) => UpdateAdmin::NAME,
            Self::Upgrade(_) => Upgrade::NAME,
            Self::Proxy(_) => Proxy::NAME,
            Self::AddReferal(_) => AddReferal::NAME,
            Self::SetOwner(_) => SetOwner::NAME,
            Self::ChooseInviter(_) => ChooseInviter::NAME,
            Self::EditContent(_) => EditContent::NAME,
            Self::Transfer(_) => Transfer::NAME,
            Self::Withdraw(_) => Withdraw::NAME,
            Self::ReportOfInvite(_) => ReportOfInvite::NAME,
            Self::Bonus(_) => Bonus::NAME,
            Self::GetStaticData(_) => GetStaticData::NAME,
            Self::DeployItem(_) => DeployItem::NAME,
            Self::ChangeCollectionOwner(_) => ChangeCollectionOwner::NAME,
            Self::ChangeCollectionContent(_) => ChangeCollectionContent::NAME,
            Self::CollectionWithdraw(_) => CollectionWithdraw::NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csm_cell::Cell;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    #[test]
    fn test_header_layout() {
        let cell = UpdateAdmin { admin: addr(1) }.to_cell(42).unwrap();
        let mut slice = Slice::from(&cell);
        assert_eq!(slice.load_uint(32).unwrap(), 0x8a3447f9);
        assert_eq!(slice.load_uint(64).unwrap(), 42);
        assert_eq!(slice.load_address().unwrap(), addr(1));
        assert!(slice.is_empty());
    }

    #[test]
    fn test_op_mismatch() {
        let cell = UpdateAdmin { admin: addr(1) }.to_cell(0).unwrap();
        let err = Upgrade::from_cell(&cell).unwrap_err();
        assert!(err.is_unknown_variant());
        assert_eq!(err.field, "op");
    }

    #[test]
    fn test_dispatch() {
        let proxy = Proxy {
            mode: 64,
            message: Cell::empty(),
        };
        let (query_id, decoded) = AnyMessage::decode(&proxy.to_cell(5).unwrap()).unwrap();
        assert_eq!(query_id, 5);
        assert_eq!(decoded, AnyMessage::Proxy(proxy));
        assert_eq!(decoded.name(), "Proxy");

        let mut builder = Builder::new();
        builder.store_uint(0xdeadbeef, 32).unwrap();
        let err = AnyMessage::decode(&builder.end_cell().unwrap()).unwrap_err();
        assert!(err.is_unknown_variant());
    }
}
