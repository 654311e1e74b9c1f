//! In-Memory Chain Adapter
//!
//! Implements every outbound port over hash maps. Records are stored as
//! encoded bags of cells, so reads go through the same decode path as a
//! live endpoint.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use csm_cell::{boc, Address, CellError};
use csm_contracts::records::{
    CellCodec, InviteRecord, MatrixLevel, MultiAggregate, PlaceChildren, PlaceRecord,
    ProfileContent, ProfilePrograms, ProfileRefs, SecurityInfo,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::DEFAULT_CAPACITY;
use crate::domain::LockSet;
use crate::error::FetchError;
use crate::ports::{ChainQuery, MatrixIndex, MessageEnvelope, TransactionSubmitter};

type LevelKey = (Address, MatrixLevel);

#[derive(Default)]
struct ChainState {
    places: HashMap<Address, Vec<u8>>,
    invites: HashMap<Address, Vec<u8>>,
    contents: HashMap<Address, Vec<u8>>,
    programs: HashMap<Address, Vec<u8>>,
    multi: Option<Vec<u8>>,
    roots: HashMap<LevelKey, Address>,
    counts: HashMap<LevelKey, u32>,
    locks: HashMap<LevelKey, LockSet>,
    referrals: HashMap<(Address, u32), Address>,
}

#[derive(Default)]
pub struct InMemoryChain {
    state: RwLock<ChainState>,
    place_fetches: Mutex<HashMap<Address, usize>>,
    submitted: Mutex<Vec<MessageEnvelope>>,
    latency: Option<Duration>,
    offline: AtomicBool,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query sleeps for `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// While offline every query fails with `FetchError::Unreachable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    pub fn insert_place(&self, address: Address, place: &PlaceRecord) -> Result<(), CellError> {
        let bytes = place.to_boc()?;
        self.state.write().places.insert(address, bytes);
        Ok(())
    }

    pub fn insert_invite(&self, address: Address, record: &InviteRecord) -> Result<(), CellError> {
        let bytes = record.to_boc()?;
        self.state.write().invites.insert(address, bytes);
        Ok(())
    }

    pub fn insert_profile(&self, profile: Address, content: &ProfileContent) -> Result<(), CellError> {
        let bytes = content.to_nft_content().to_boc()?;
        self.state.write().contents.insert(profile, bytes);
        Ok(())
    }

    /// Content bytes stored as given, for malformed-data cases.
    pub fn insert_raw_content(&self, profile: Address, bytes: Vec<u8>) {
        self.state.write().contents.insert(profile, bytes);
    }

    pub fn set_programs(&self, profile: Address, programs: &ProfilePrograms) -> Result<(), CellError> {
        let root = programs.build_root()?;
        let mut state = self.state.write();
        match root {
            Some(root) => {
                state.programs.insert(profile, boc::to_boc(&root)?);
            }
            None => {
                state.programs.remove(&profile);
            }
        }
        Ok(())
    }

    pub fn set_multi(&self, multi: &MultiAggregate) -> Result<(), CellError> {
        let bytes = multi.to_boc()?;
        self.state.write().multi = Some(bytes);
        Ok(())
    }

    pub fn set_root_place(&self, profile: Address, level: MatrixLevel, place: Address) {
        self.state.write().roots.insert((profile, level), place);
    }

    pub fn set_place_count(&self, profile: Address, level: MatrixLevel, count: u32) {
        self.state.write().counts.insert((profile, level), count);
    }

    pub fn set_locks(&self, profile: Address, level: MatrixLevel, locks: LockSet) {
        self.state.write().locks.insert((profile, level), locks);
    }

    pub fn set_referral(&self, invite: Address, seq_no: u32, address: Address) {
        self.state.write().referrals.insert((invite, seq_no), address);
    }

    /// Times the place at `address` was read through `ChainQuery::place`.
    pub fn place_fetches(&self, address: &Address) -> usize {
        self.place_fetches.lock().get(address).copied().unwrap_or(0)
    }

    pub fn submitted(&self) -> Vec<MessageEnvelope> {
        self.submitted.lock().clone()
    }

    /// Fill a matrix for `owner` with `count` places in level order.
    ///
    /// Place `i` (1-based) sits at position `i`; its profile gets the login
    /// `user{i}`, and the first place is the owner's root. Returns the root
    /// address, or `None` when `count` is 0.
    pub fn seed_matrix(
        &self,
        owner: Address,
        level: MatrixLevel,
        count: u32,
    ) -> Result<Option<Address>, CellError> {
        if count == 0 {
            return Ok(None);
        }
        let address_of = |i: u32| seeded_address(0xa0, level, i);
        let profile_of = |i: u32| {
            if i == 1 {
                owner
            } else {
                seeded_address(0xb0, level, i)
            }
        };
        let exists = |i: u32| (1..=count).contains(&i);
        // children and grandchildren, capped where the contract closes a place
        let fill_count = |i: u32| {
            let below = [2 * i, 2 * i + 1, 4 * i, 4 * i + 1, 4 * i + 2, 4 * i + 3];
            let filled = below.into_iter().filter(|&k| exists(k)).count() as u8;
            filled.min(DEFAULT_CAPACITY)
        };

        for i in 1..=count {
            let children = exists(2 * i).then(|| PlaceChildren {
                left: address_of(2 * i),
                right: exists(2 * i + 1).then(|| address_of(2 * i + 1)),
            });
            let place = PlaceRecord {
                marketing: seeded_address(0xc0, level, 0),
                m: level,
                parent: (i > 1).then(|| address_of(i / 2)),
                created_at: 1_700_000_000 + i as u64,
                fill_count: fill_count(i),
                profiles: ProfileRefs {
                    clone: false,
                    profile: profile_of(i),
                    place_number: i,
                    inviter_profile: (i > 1).then(|| profile_of(i / 2)),
                },
                security: SecurityInfo {
                    admin: seeded_address(0xc1, level, 0),
                },
                children,
            };
            self.insert_place(address_of(i), &place)?;
            if i > 1 {
                let login = format!("user{i}");
                let content = ProfileContent::normalized(&login, None, None, None, None);
                self.insert_profile(profile_of(i), &content)?;
            }
        }

        let root = address_of(1);
        let mut state = self.state.write();
        state.roots.insert((owner, level), root);
        *state.counts.entry((owner, level)).or_default() += 1;
        Ok(Some(root))
    }

    async fn answer<T>(&self, read: impl FnOnce(&ChainState) -> T) -> Result<T, FetchError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::Acquire) {
            return Err(FetchError::Unreachable("in-memory chain is offline".into()));
        }
        Ok(read(&self.state.read()))
    }
}

fn seeded_address(tag: u8, level: MatrixLevel, i: u32) -> Address {
    let mut hash = [0u8; 32];
    hash[0] = tag;
    hash[1] = level.get();
    hash[28..].copy_from_slice(&i.to_be_bytes());
    Address::new(0, hash)
}

#[async_trait]
impl ChainQuery for InMemoryChain {
    async fn place(&self, address: &Address) -> Result<Option<Vec<u8>>, FetchError> {
        *self.place_fetches.lock().entry(*address).or_default() += 1;
        debug!(%address, "[csm-matrix] In-memory place query");
        self.answer(|s| s.places.get(address).cloned()).await
    }

    async fn invite(&self, address: &Address) -> Result<Option<Vec<u8>>, FetchError> {
        self.answer(|s| s.invites.get(address).cloned()).await
    }

    async fn profile_content(&self, profile: &Address) -> Result<Option<Vec<u8>>, FetchError> {
        self.answer(|s| s.contents.get(profile).cloned()).await
    }

    async fn profile_programs(
        &self,
        profile: &Address,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        self.answer(|s| s.programs.get(profile).cloned()).await
    }

    async fn multi(&self) -> Result<Option<Vec<u8>>, FetchError> {
        self.answer(|s| s.multi.clone()).await
    }
}

#[async_trait]
impl MatrixIndex for InMemoryChain {
    async fn root_place(
        &self,
        profile: &Address,
        level: MatrixLevel,
    ) -> Result<Option<Address>, FetchError> {
        self.answer(|s| s.roots.get(&(*profile, level)).copied()).await
    }

    async fn place_count(&self, profile: &Address, level: MatrixLevel) -> Result<u32, FetchError> {
        self.answer(|s| s.counts.get(&(*profile, level)).copied().unwrap_or(0))
            .await
    }

    async fn locks(&self, profile: &Address, level: MatrixLevel) -> Result<LockSet, FetchError> {
        self.answer(|s| s.locks.get(&(*profile, level)).cloned().unwrap_or_default())
            .await
    }

    async fn invite_address(
        &self,
        invite: &Address,
        seq_no: u32,
    ) -> Result<Option<Address>, FetchError> {
        self.answer(|s| s.referrals.get(&(*invite, seq_no)).copied()).await
    }
}

#[async_trait]
impl TransactionSubmitter for InMemoryChain {
    async fn submit(&self, envelope: MessageEnvelope) -> Result<(), FetchError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(FetchError::Unreachable("in-memory chain is offline".into()));
        }
        self.submitted.lock().push(envelope);
        Ok(())
    }
}

/// Level-order walk over stored places, used by tests to compare against
/// the seeded shape.
pub fn stored_places(chain: &InMemoryChain, root: Address) -> Vec<(Address, PlaceRecord)> {
    let state = chain.state.read();
    let mut out = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(address) = queue.pop_front() {
        let Some(place) = state
            .places
            .get(&address)
            .and_then(|bytes| PlaceRecord::from_boc(bytes).ok())
        else {
            continue;
        };
        queue.extend(place.left_child());
        queue.extend(place.right_child());
        out.push((address, place));
    }
    out
}
