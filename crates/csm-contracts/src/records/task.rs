//! Queued matrix tasks
//!
//! Values of the multi contract's `queue: HashmapE 32 TaskItem`, stored
//! inline in the dictionary leaves.
//!
//! | Field    | Type        |
//! |----------|-------------|
//! | query_id | uint64      |
//! | m        | uint3       |
//! | profile  | MsgAddress  |
//! | payload  | TaskPayload |
//!
//! Payload tags (uint4): 1 create_place, 2 create_clone, 3 lock_pos,
//! 4 unlock_pos.

use csm_cell::{Address, Builder, CellError, DictValue, Slice};
use serde::{Deserialize, Serialize};

use super::common::PlacePos;
use super::CellCodec;
use crate::errors::{Context, DecodeError};

const TAG_BITS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Buy a place; `pos` is `None` when the contract picks the position.
    CreatePlace {
        source: Address,
        pos: Option<PlacePos>,
    },
    CreateClone,
    LockPos {
        source: Address,
        pos: PlacePos,
    },
    UnlockPos {
        source: Address,
        pos: PlacePos,
    },
}

impl TaskPayload {
    pub fn tag(&self) -> u8 {
        match self {
            Self::CreatePlace { .. } => 1,
            Self::CreateClone => 2,
            Self::LockPos { .. } => 3,
            Self::UnlockPos { .. } => 4,
        }
    }

    /// Position this task targets, if any.
    pub fn pos(&self) -> Option<&PlacePos> {
        match self {
            Self::CreatePlace { pos, .. } => pos.as_ref(),
            Self::CreateClone => None,
            Self::LockPos { pos, .. } | Self::UnlockPos { pos, .. } => Some(pos),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub query_id: u64,
    /// Raw 3-bit level; queued items are not re-validated.
    pub m: u8,
    pub profile: Address,
    pub payload: TaskPayload,
}

impl CellCodec for TaskItem {
    const NAME: &'static str = "TaskItem";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_uint(self.query_id, 64)?
            .store_uint(self.m as u64, 3)?
            .store_address(&self.profile)?
            .store_uint(self.payload.tag() as u64, TAG_BITS)?;

        match &self.payload {
            TaskPayload::CreatePlace { source, pos } => {
                let pos = pos.map(|p| p.to_cell()).transpose()?;
                builder.store_address(source)?.store_maybe_ref(pos)?;
            }
            TaskPayload::CreateClone => {}
            TaskPayload::LockPos { source, pos } | TaskPayload::UnlockPos { source, pos } => {
                builder.store_address(source)?.store_ref(pos.to_cell()?)?;
            }
        }
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let query_id = slice.load_uint(64).ctx(Self::NAME, "query_id")?;
        let m = slice.load_uint(3).ctx(Self::NAME, "m")? as u8;
        let profile = slice.load_address().ctx(Self::NAME, "profile")?;
        let tag = slice.load_uint(TAG_BITS).ctx(Self::NAME, "payload")?;

        let payload = match tag {
            1 => {
                let source = slice.load_address().ctx(Self::NAME, "source")?;
                let pos = slice
                    .load_maybe_ref()
                    .ctx(Self::NAME, "pos")?
                    .map(|cell| PlacePos::from_cell(&cell))
                    .transpose()?;
                TaskPayload::CreatePlace { source, pos }
            }
            2 => TaskPayload::CreateClone,
            3 | 4 => {
                let source = slice.load_address().ctx(Self::NAME, "source")?;
                let pos = PlacePos::from_cell(&slice.load_ref().ctx(Self::NAME, "pos")?)?;
                if tag == 3 {
                    TaskPayload::LockPos { source, pos }
                } else {
                    TaskPayload::UnlockPos { source, pos }
                }
            }
            other => return Err(DecodeError::unknown_variant(Self::NAME, "payload", other)),
        };

        Ok(Self {
            query_id,
            m,
            profile,
            payload,
        })
    }
}

impl DictValue for TaskItem {
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
    use crate::records::Side;
    use csm_cell::Dictionary;

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    fn item(payload: TaskPayload) -> TaskItem {
        TaskItem {
            query_id: 99,
            m: 2,
            profile: addr(1),
            payload,
        }
    }

    #[test]
    fn test_all_payload_variants() {
        let pos = PlacePos::new(addr(3), Side::Left);
        let payloads = [
            TaskPayload::CreatePlace {
                source: addr(2),
                pos: None,
            },
            TaskPayload::CreatePlace {
                source: addr(2),
                pos: Some(pos),
            },
            TaskPayload::CreateClone,
            TaskPayload::LockPos {
                source: addr(2),
                pos,
            },
            TaskPayload::UnlockPos {
                source: addr(2),
                pos,
            },
        ];
        for payload in payloads {
            let task = item(payload);
            assert_eq!(TaskItem::from_cell(&task.to_cell().unwrap()).unwrap(), task);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let mut builder = Builder::new();
        builder
            .store_uint(1, 64)
            .unwrap()
            .store_uint(1, 3)
            .unwrap()
            .store_address(&addr(1))
            .unwrap()
            .store_uint(9, 4)
            .unwrap();
        let err = TaskItem::from_cell(&builder.end_cell().unwrap()).unwrap_err();
        assert!(err.is_unknown_variant());
        assert_eq!(err.field, "payload");
    }

    #[test]
    fn test_queue_dictionary() {
        let queue: Dictionary<u32, TaskItem> = (0..5u32)
            .map(|key| {
                let mut task = item(TaskPayload::CreateClone);
                task.query_id = key as u64;
                (key, task)
            })
            .collect();
        let root = queue.build_root().unwrap().unwrap();
        let back = Dictionary::<u32, TaskItem>::load_root(&root).unwrap();
        assert_eq!(back, queue);
        assert_eq!(back.get(&3).unwrap().query_id, 3);
    }
}
