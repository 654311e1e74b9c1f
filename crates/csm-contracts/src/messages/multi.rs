//! Messages accepted by the multi (matrix) contract

use csm_cell::{Address, Builder, CellError, Slice};

use super::MessageBody;
use crate::errors::{Context, DecodeError};
use crate::opcodes::op;
use crate::records::{CellCodec, LevelAmounts, MatrixLevel, PlacePos, ProfileRefs};

/// buy_place: queue a purchase at level `m`; with no `pos` the contract
/// picks the next free position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuyPlace {
    pub m: MatrixLevel,
    pub profile: Address,
    pub pos: Option<PlacePos>,
}

impl MessageBody for BuyPlace {
    const OP: u32 = op::BUY_PLACE;
    const NAME: &'static str = "BuyPlace";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        self.m.store(builder)?;
        let pos = self.pos.map(|p| p.to_cell()).transpose()?;
        builder.store_address(&self.profile)?.store_maybe_ref(pos)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let m = MatrixLevel::load(slice, Self::NAME, "m")?;
        let profile = slice.load_address().ctx(Self::NAME, "profile")?;
        let pos = slice
            .load_maybe_ref()
            .ctx(Self::NAME, "pos")?
            .map(|cell| PlacePos::from_cell(&cell))
            .transpose()?;
        Ok(Self { m, profile, pos })
    }
}

fn store_pos_fields(
    builder: &mut Builder,
    m: MatrixLevel,
    profile: &Address,
    pos: &PlacePos,
) -> Result<(), CellError> {
    m.store(builder)?;
    builder.store_address(profile)?.store_ref(pos.to_cell()?)?;
    Ok(())
}

fn load_pos_fields(
    slice: &mut Slice,
    name: &'static str,
) -> Result<(MatrixLevel, Address, PlacePos), DecodeError> {
    let m = MatrixLevel::load(slice, name, "m")?;
    let profile = slice.load_address().ctx(name, "profile")?;
    let pos = PlacePos::from_cell(&slice.load_ref().ctx(name, "pos")?)?;
    Ok((m, profile, pos))
}

/// lock_pos: block a position so nobody can buy under it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPos {
    pub m: MatrixLevel,
    pub profile: Address,
    pub pos: PlacePos,
}

impl MessageBody for LockPos {
    const OP: u32 = op::LOCK_POS;
    const NAME: &'static str = "LockPos";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        store_pos_fields(builder, self.m, &self.profile, &self.pos)
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let (m, profile, pos) = load_pos_fields(slice, Self::NAME)?;
        Ok(Self { m, profile, pos })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnlockPos {
    pub m: MatrixLevel,
    pub profile: Address,
    pub pos: PlacePos,
}

impl MessageBody for UnlockPos {
    const OP: u32 = op::UNLOCK_POS;
    const NAME: &'static str = "UnlockPos";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        store_pos_fields(builder, self.m, &self.profile, &self.pos)
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        let (m, profile, pos) = load_pos_fields(slice, Self::NAME)?;
        Ok(Self { m, profile, pos })
    }
}

/// cancel_task: drop a queued task by its queue key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelTask {
    pub key: u32,
}

impl MessageBody for CancelTask {
    const OP: u32 = op::CANCEL_TASK;
    const NAME: &'static str = "CancelTask";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_uint(self.key as u64, 32)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            key: slice.load_uint(32).ctx(Self::NAME, "key")? as u32,
        })
    }
}

/// deploy_place: processor instruction to deploy the place for a task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployPlace {
    pub key: u32,
    pub parent: Address,
    pub profiles: ProfileRefs,
}

impl MessageBody for DeployPlace {
    const OP: u32 = op::DEPLOY_PLACE;
    const NAME: &'static str = "DeployPlace";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.key as u64, 32)?
            .store_address(&self.parent)?
            .store_ref(self.profiles.to_cell()?)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            key: slice.load_uint(32).ctx(Self::NAME, "key")? as u32,
            parent: slice.load_address().ctx(Self::NAME, "parent")?,
            profiles: ProfileRefs::from_cell(&slice.load_ref().ctx(Self::NAME, "profiles")?)?,
        })
    }
}

/// update_fees: six Coins inline, level 1 first
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateFees {
    pub fees: LevelAmounts,
}

impl MessageBody for UpdateFees {
    const OP: u32 = op::UPDATE_FEES;
    const NAME: &'static str = "UpdateFees";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        self.fees.store(builder)
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            fees: LevelAmounts::load(slice)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateMaxTasks {
    pub max_tasks: u16,
}

impl MessageBody for UpdateMaxTasks {
    const OP: u32 = op::UPDATE_MAX_TASKS;
    const NAME: &'static str = "UpdateMaxTasks";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_uint(self.max_tasks as u64, 16)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            max_tasks: slice.load_uint(16).ctx(Self::NAME, "max_tasks")? as u16,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateProcessor {
    pub processor: Address,
}

impl MessageBody for UpdateProcessor {
    const OP: u32 = op::UPDATE_PROCESSOR;
    const NAME: &'static str = "UpdateProcessor";

    fn store_fields(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.processor)?;
        Ok(())
    }

    fn load_fields(slice: &mut Slice) -> Result<Self, DecodeError> {
        Ok(Self {
            processor: slice.load_address().ctx(Self::NAME, "processor")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Side;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    fn level(m: u8) -> MatrixLevel {
        MatrixLevel::new(m).unwrap()
    }

    #[test]
    fn test_buy_place_is_deterministic() {
        let msg = BuyPlace {
            m: level(3),
            profile: addr(1),
            pos: Some(PlacePos::new(addr(2), Side::Right)),
        };
        let a = csm_cell::boc::to_boc(&msg.to_cell(7).unwrap()).unwrap();
        let b = csm_cell::boc::to_boc(&msg.to_cell(7).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(BuyPlace::from_cell(&msg.to_cell(7).unwrap()).unwrap(), (7, msg));
    }

    #[test]
    fn test_buy_place_without_position() {
        let msg = BuyPlace {
            m: level(1),
            profile: addr(1),
            pos: None,
        };
        let cell = msg.to_cell(0).unwrap();
        // header + m + profile + maybe bit
        assert_eq!(cell.bit_len(), 32 + 64 + 3 + 267 + 1);
        assert!(cell.refs().is_empty());
    }

    #[test]
    fn test_lock_and_unlock_share_layout() {
        let pos = PlacePos::new(addr(2), Side::Left);
        let lock = LockPos {
            m: level(2),
            profile: addr(1),
            pos,
        };
        let unlock = UnlockPos {
            m: level(2),
            profile: addr(1),
            pos,
        };
        let lock_cell = lock.to_cell(1).unwrap();
        let unlock_cell = unlock.to_cell(1).unwrap();
        assert_eq!(lock_cell.bits()[32..], unlock_cell.bits()[32..]);
        assert_eq!(lock_cell.refs(), unlock_cell.refs());
        assert_eq!(UnlockPos::from_cell(&unlock_cell).unwrap().1, unlock);
    }

    #[test]
    fn test_admin_messages() {
        let fees = UpdateFees {
            fees: LevelAmounts::from_tons([1, 2, 3, 4, 5, 6]),
        };
        assert_eq!(UpdateFees::from_cell(&fees.to_cell(3).unwrap()).unwrap().1, fees);

        let deploy = DeployPlace {
            key: 12,
            parent: addr(3),
            profiles: ProfileRefs {
                clone: true,
                profile: addr(4),
                place_number: 9,
                inviter_profile: None,
            },
        };
        assert_eq!(DeployPlace::from_cell(&deploy.to_cell(0).unwrap()).unwrap().1, deploy);

        let cancel = CancelTask { key: 5 };
        let mut slice = Slice::from(&cancel.to_cell(0).unwrap());
        assert_eq!(slice.load_uint(32).unwrap(), 0xba25f1e9);
    }
}
