//! Multi (matrix aggregate) contract storage
//!
//! | Field      | Type                      |
//! |------------|---------------------------|
//! | processor  | MsgAddress                |
//! | max_tasks  | uint16                    |
//! | queue_size | uint16                    |
//! | seq_no     | uint32                    |
//! | fees       | ^LevelAmounts             |
//! | security   | ^SecurityInfo             |
//! | place_code | ^Cell                     |
//! | queue      | HashmapE 32 TaskItem      |

use csm_cell::{Address, Builder, CellError, CellRef, Dictionary, Slice};
use serde::{Deserialize, Serialize};

use super::common::{LevelAmounts, MatrixLevel, SecurityInfo};
use super::task::{TaskItem, TaskPayload};
use super::CellCodec;
use crate::errors::{Context, DecodeError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiAggregate {
    pub processor: Address,
    pub max_tasks: u16,
    pub queue_size: u16,
    pub seq_no: u32,
    /// Processing fee per level, charged on top of the place price
    pub fees: LevelAmounts,
    pub security: SecurityInfo,
    pub place_code: CellRef,
    pub queue: Dictionary<u32, TaskItem>,
}

impl MultiAggregate {
    pub fn fee(&self, level: MatrixLevel) -> u128 {
        self.fees.for_level(level)
    }

    /// Lowest-keyed queued task, the one the processor handles next.
    pub fn next_task(&self) -> Option<(u32, &TaskItem)> {
        self.queue.iter().next().map(|(key, task)| (*key, task))
    }

    pub fn is_queue_full(&self) -> bool {
        self.queue_size >= self.max_tasks
    }

    /// Positions of `profile`'s tasks in the whole queue, grouped by kind.
    pub fn tasks_for(&self, profile: &Address) -> ProfileTasks {
        let mut tasks = ProfileTasks::default();
        for (index, task) in self.queue.values().enumerate() {
            if task.profile != *profile {
                continue;
            }
            let position = index as u32 + 1;
            match task.payload {
                TaskPayload::CreatePlace { .. } => tasks.buy.push(position),
                TaskPayload::CreateClone => tasks.clone.push(position),
                TaskPayload::LockPos { .. } => tasks.lock.push(position),
                TaskPayload::UnlockPos { .. } => tasks.unlock.push(position),
            }
        }
        tasks
    }
}

/// 1-based queue positions of one profile's pending tasks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTasks {
    pub buy: Vec<u32>,
    pub clone: Vec<u32>,
    pub lock: Vec<u32>,
    pub unlock: Vec<u32>,
}

impl ProfileTasks {
    pub fn total(&self) -> usize {
        self.buy.len() + self.clone.len() + self.lock.len() + self.unlock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl CellCodec for MultiAggregate {
    const NAME: &'static str = "MultiAggregate";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_address(&self.processor)?
            .store_uint(self.max_tasks as u64, 16)?
            .store_uint(self.queue_size as u64, 16)?
            .store_uint(self.seq_no as u64, 32)?
            .store_ref(self.fees.to_cell()?)?
            .store_ref(self.security.to_cell()?)?
            .store_ref(self.place_code.clone())?;
        self.queue.store_maybe(builder)
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let processor = slice.load_address().ctx(Self::NAME, "processor")?;
        let max_tasks = slice.load_uint(16).ctx(Self::NAME, "max_tasks")? as u16;
        let queue_size = slice.load_uint(16).ctx(Self::NAME, "queue_size")? as u16;
        let seq_no = slice.load_uint(32).ctx(Self::NAME, "seq_no")? as u32;
        let fees = LevelAmounts::from_cell(&slice.load_ref().ctx(Self::NAME, "fees")?)?;
        let security = SecurityInfo::from_cell(&slice.load_ref().ctx(Self::NAME, "security")?)?;
        let place_code = slice.load_ref().ctx(Self::NAME, "place_code")?;
        let queue = Dictionary::load_maybe(slice)?;

        Ok(Self {
            processor,
            max_tasks,
            queue_size,
            seq_no,
            fees,
            security,
            place_code,
            queue,
        })
    }
}
