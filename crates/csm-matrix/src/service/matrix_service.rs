//! Matrix Service
//!
//! Orchestrates the ports and the pure algorithms. Place fetches are
//! de-duplicated while in flight and resolved profiles are kept in a
//! bounded LRU cache.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use csm_cell::{boc, Address};
use csm_contracts::messages::{BuyPlace, LockPos, MessageBody, UnlockPos};
use csm_contracts::opcodes::program;
use csm_contracts::records::{
    CellCodec, InviteRecord, MatrixLevel, MultiAggregate, NftContent, PlacePos, PlaceRecord,
    ProfileContent, ProfilePrograms, ProfileTasks,
};
use csm_contracts::DecodeError;
use futures::future::{try_join_all, FutureExt};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::inflight::InFlight;
use super::request::{Channel, RequestToken, RequestTracker};
use crate::algorithms::{
    child_at, eligibility, BreadcrumbWalk, NextPositionScan, ReferralWindow, ScanStep,
    TreeBuilder, WalkStep,
};
use crate::config::{MatrixConfig, MAX_TREE_DEPTH};
use crate::domain::{
    ConfigError, LockSet, MatrixError, MatrixNode, NextPosition, Occupant, PositionState,
    ProfileStanding,
};
use crate::error::ServiceError;
use crate::ports::{
    ChainQuery, MatrixApi, MatrixIndex, MessageEnvelope, PositionAction, Referral, ReferralPage,
    SubtreeQuery, TransactionSubmitter,
};

type PlaceFetch = Result<Option<PlaceRecord>, ServiceError>;

pub struct MatrixService<C, I, T> {
    chain: Arc<C>,
    index: Arc<I>,
    submitter: Arc<T>,
    config: MatrixConfig,
    requests: RequestTracker,
    places: InFlight<Address, PlaceFetch>,
    profiles: Mutex<LruCache<Address, Occupant>>,
}

impl<C, I, T> MatrixService<C, I, T>
where
    C: ChainQuery + 'static,
    I: MatrixIndex,
    T: TransactionSubmitter,
{
    /// Service with the default configuration.
    pub fn new(chain: Arc<C>, index: Arc<I>, submitter: Arc<T>) -> Self {
        Self::build(chain, index, submitter, MatrixConfig::default())
    }

    pub fn with_config(
        chain: Arc<C>,
        index: Arc<I>,
        submitter: Arc<T>,
        config: MatrixConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(chain, index, submitter, config))
    }

    fn build(chain: Arc<C>, index: Arc<I>, submitter: Arc<T>, config: MatrixConfig) -> Self {
        let cache_size = NonZeroUsize::new(config.profile_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            chain,
            index,
            submitter,
            config,
            requests: RequestTracker::new(),
            places: InFlight::new(),
            profiles: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    /// Profiles currently cached.
    pub fn cached_profiles(&self) -> usize {
        self.profiles.lock().len()
    }

    fn multi_address(&self) -> Result<Address, ServiceError> {
        self.config
            .multi_address
            .ok_or(ServiceError::Config(ConfigError::MissingMultiAddress))
    }

    async fn fetch_place(&self, token: &RequestToken, address: Address) -> PlaceFetch {
        let chain = Arc::clone(&self.chain);
        let fetch = self.places.run(address, move || {
            async move {
                chain
                    .place(&address)
                    .await
                    .map_err(ServiceError::from)
                    .and_then(decode::<PlaceRecord>)
            }
            .boxed()
        });
        token.guard(fetch).await?
    }

    /// A place the caller asked for by address.
    async fn require_place(
        &self,
        token: &RequestToken,
        address: Address,
    ) -> Result<PlaceRecord, ServiceError> {
        self.fetch_place(token, address)
            .await?
            .ok_or_else(|| ServiceError::not_found("place", address))
    }

    /// Places referenced by other places; a missing one is a broken tree.
    async fn fetch_referenced(
        &self,
        token: &RequestToken,
        addresses: &[Address],
    ) -> Result<Vec<(Address, PlaceRecord)>, ServiceError> {
        try_join_all(addresses.iter().map(|&address| async move {
            let place = self
                .fetch_place(token, address)
                .await?
                .ok_or(MatrixError::MissingPlace { address })?;
            Ok::<_, ServiceError>((address, place))
        }))
        .await
    }

    async fn fetch_invite(
        &self,
        token: &RequestToken,
        address: Address,
    ) -> Result<Option<InviteRecord>, ServiceError> {
        decode(token.guard(self.chain.invite(&address)).await??)
    }

    async fn locks(
        &self,
        token: &RequestToken,
        profile: Address,
        level: MatrixLevel,
    ) -> Result<LockSet, ServiceError> {
        Ok(token.guard(self.index.locks(&profile, level)).await??)
    }

    /// Login and image of a profile, through the cache.
    ///
    /// Content that does not decode as profile content leaves the occupant
    /// unresolved instead of failing the caller.
    async fn occupant(
        &self,
        token: &RequestToken,
        profile: Address,
    ) -> Result<Occupant, ServiceError> {
        let cached = self.profiles.lock().get(&profile).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let Some(bytes) = token.guard(self.chain.profile_content(&profile)).await?? else {
            debug!(%profile, "[csm-matrix] Profile content not found");
            return Ok(Occupant::unresolved(profile));
        };
        let parsed = NftContent::from_boc(&bytes)
            .and_then(|content| ProfileContent::from_nft_content(&content));
        let occupant = match parsed {
            Ok(content) => Occupant {
                profile,
                login: Some(content.login),
                image: content.image,
            },
            Err(e) => {
                warn!(%profile, error = %e, "[csm-matrix] Unreadable profile content");
                Occupant::unresolved(profile)
            }
        };
        self.profiles.lock().put(profile, occupant.clone());
        Ok(occupant)
    }

    async fn fee(&self, token: &RequestToken, level: MatrixLevel) -> Result<u128, ServiceError> {
        if let Some(fees) = &self.config.fees {
            return Ok(fees.for_level(level));
        }
        Ok(self.aggregate(token).await?.fee(level))
    }

    async fn aggregate(&self, token: &RequestToken) -> Result<MultiAggregate, ServiceError> {
        let multi = self.multi_address()?;
        decode(token.guard(self.chain.multi()).await??)?
            .ok_or_else(|| ServiceError::not_found("multi contract", multi))
    }

    /// Lazy breadth-first search, fetching one frontier at a time into
    /// `places`.
    async fn scan_next(
        &self,
        token: &RequestToken,
        level: MatrixLevel,
        root: Address,
        locks: &LockSet,
        places: &mut HashMap<Address, PlaceRecord>,
    ) -> Result<Option<NextPosition>, ServiceError> {
        let mut scan = NextPositionScan::new(
            root,
            level,
            self.config.capacity(level),
            self.config.scan_limit,
        );
        loop {
            match scan.advance(&*places, locks)? {
                ScanStep::Found(next) => {
                    debug!(
                        %level,
                        %root,
                        position = next.position.get(),
                        visited = scan.visited(),
                        "[csm-matrix] Next position found"
                    );
                    return Ok(Some(next));
                }
                ScanStep::Full => {
                    debug!(%level, %root, "[csm-matrix] Matrix has no open position");
                    return Ok(None);
                }
                ScanStep::NeedPlaces(missing) => {
                    places.extend(self.fetch_referenced(token, &missing).await?);
                }
            }
        }
    }

    fn envelope<B: MessageBody>(
        &self,
        body: &B,
        value: u128,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        Ok(MessageEnvelope {
            target: self.multi_address()?,
            value,
            body: body.to_cell(query_id)?,
        })
    }
}

#[async_trait]
impl<C, I, T> MatrixApi for MatrixService<C, I, T>
where
    C: ChainQuery + 'static,
    I: MatrixIndex,
    T: TransactionSubmitter,
{
    fn begin(&self, channel: Channel) -> RequestToken {
        self.requests.begin(channel)
    }

    async fn root_place(
        &self,
        token: &RequestToken,
        profile: Address,
        level: MatrixLevel,
    ) -> Result<Option<Address>, ServiceError> {
        Ok(token.guard(self.index.root_place(&profile, level)).await??)
    }

    async fn load_subtree(
        &self,
        token: &RequestToken,
        query: SubtreeQuery,
    ) -> Result<MatrixNode, ServiceError> {
        let level = query.level;
        let depth = query.depth.unwrap_or(self.config.tree_depth);
        if depth > MAX_TREE_DEPTH {
            return Err(MatrixError::TreeTooDeep {
                depth,
                max: MAX_TREE_DEPTH,
            }
            .into());
        }
        debug!(%level, root = %query.root, depth, "[csm-matrix] Loading subtree");

        let root = self.require_place(token, query.root).await?;
        let mut places = HashMap::new();
        if let Some(parent) = root.parent {
            if let Some(place) = self.fetch_place(token, parent).await? {
                places.insert(parent, place);
            }
        }
        let mut profiles = vec![root.profiles.profile];
        places.insert(query.root, root);

        let mut frontier = vec![query.root];
        for _ in 0..depth {
            let children: Vec<Address> = frontier
                .iter()
                .filter_map(|address| places.get(address))
                .flat_map(|place| [place.left_child(), place.right_child()])
                .flatten()
                .collect();
            if children.is_empty() {
                break;
            }
            for (address, place) in self.fetch_referenced(token, &children).await? {
                profiles.push(place.profiles.profile);
                places.insert(address, place);
            }
            frontier = children;
        }

        let (next, locks, standing) = match query.viewer {
            Some(viewer) => {
                let (matrix_root, locks, standing) = futures::try_join!(
                    self.root_place(token, viewer, level),
                    self.locks(token, viewer, level),
                    self.profile_standing(token, viewer),
                )?;
                let next = match matrix_root {
                    Some(matrix_root) => {
                        self.scan_next(token, level, matrix_root, &locks, &mut places)
                            .await?
                    }
                    None => None,
                };
                (next, locks, Some(standing))
            }
            None => (None, LockSet::new(), None),
        };

        let unique: HashSet<Address> = profiles.into_iter().collect();
        let occupants: HashMap<Address, Occupant> =
            try_join_all(unique.into_iter().map(|profile| self.occupant(token, profile)))
                .await?
                .into_iter()
                .map(|occupant| (occupant.profile, occupant))
                .collect();

        let mut builder = TreeBuilder::new(&places, level, self.config.capacity(level))
            .locks(&locks)
            .occupants(&occupants)
            .next_position(next);
        if let Some(standing) = standing {
            builder = builder.standing(standing);
        }
        let tree = builder.build(query.root, depth)?;
        token.check()?;
        Ok(tree)
    }

    async fn next_position(
        &self,
        token: &RequestToken,
        level: MatrixLevel,
        root: Address,
        viewer: Address,
    ) -> Result<Option<NextPosition>, ServiceError> {
        let (root_place, locks) = futures::try_join!(
            self.require_place(token, root),
            self.locks(token, viewer, level),
        )?;
        let mut places = HashMap::from([(root, root_place)]);
        self.scan_next(token, level, root, &locks, &mut places).await
    }

    async fn breadcrumbs(
        &self,
        token: &RequestToken,
        start: Address,
        root: Address,
    ) -> Result<Vec<Address>, ServiceError> {
        let mut walk = BreadcrumbWalk::new(start, root, self.config.breadcrumb_depth);
        let mut step = walk.begin();
        loop {
            match step {
                WalkStep::Done(path) => return Ok(path),
                WalkStep::Fetch(address) => {
                    let place = self.fetch_place(token, address).await?;
                    step = walk.step(place.as_ref())?;
                }
            }
        }
    }

    async fn profile_standing(
        &self,
        token: &RequestToken,
        profile: Address,
    ) -> Result<ProfileStanding, ServiceError> {
        let programs = token.guard(self.chain.profile_programs(&profile)).await??;
        let program_confirmed = match programs {
            None => false,
            Some(bytes) => {
                let root = boc::from_boc(&bytes).map_err(DecodeError::from)?;
                ProfilePrograms::load_root(&root)?
                    .get(&program::MULTI)
                    .is_some_and(|data| data.confirmed)
            }
        };

        let counts = token
            .guard(try_join_all(
                MatrixLevel::all().map(|level| self.index.place_count(&profile, level)),
            ))
            .await??;
        let mut places = [0u32; 6];
        for (slot, count) in places.iter_mut().zip(counts) {
            *slot = count;
        }

        Ok(ProfileStanding {
            program_confirmed,
            places,
        })
    }

    async fn position_state(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<PositionState, ServiceError> {
        let parent = self.require_place(token, action.pos.parent).await?;
        if parent.m != action.level {
            return Err(MatrixError::LevelMismatch {
                address: action.pos.parent,
                found: parent.m,
                expected: action.level,
            }
            .into());
        }
        if child_at(&parent, action.pos.side).is_none() {
            return Ok(PositionState::Empty);
        }
        let locks = self.locks(token, action.profile, action.level).await?;
        Ok(if locks.contains(&action.pos) {
            PositionState::FilledLocked
        } else {
            PositionState::Filled
        })
    }

    async fn check_buy(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        root: Address,
    ) -> Result<(), ServiceError> {
        let (state, next, standing) = futures::try_join!(
            self.position_state(token, action),
            self.next_position(token, action.level, root, action.profile),
            self.profile_standing(token, action.profile),
        )?;
        let is_next = next.is_some_and(|next| next.pos == action.pos);
        eligibility::check_buy(state, is_next, action.level, &standing)?;
        Ok(())
    }

    async fn check_lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<(), ServiceError> {
        let (state, standing) = futures::try_join!(
            self.position_state(token, action),
            self.profile_standing(token, action.profile),
        )?;
        eligibility::check_lock(state, action.level, &standing)?;
        Ok(())
    }

    async fn check_unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<(), ServiceError> {
        let (state, standing) = futures::try_join!(
            self.position_state(token, action),
            self.profile_standing(token, action.profile),
        )?;
        eligibility::check_unlock(state, action.level, &standing)?;
        Ok(())
    }

    async fn prepare_buy(
        &self,
        token: &RequestToken,
        level: MatrixLevel,
        profile: Address,
        pos: Option<PlacePos>,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        let value = self.config.price(level) + self.fee(token, level).await?;
        let body = BuyPlace {
            m: level,
            profile,
            pos,
        };
        self.envelope(&body, value, query_id)
    }

    async fn prepare_lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        let value = self.fee(token, action.level).await?;
        let body = LockPos {
            m: action.level,
            profile: action.profile,
            pos: action.pos,
        };
        self.envelope(&body, value, query_id)
    }

    async fn prepare_unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        let value = self.fee(token, action.level).await?;
        let body = UnlockPos {
            m: action.level,
            profile: action.profile,
            pos: action.pos,
        };
        self.envelope(&body, value, query_id)
    }

    async fn submit(
        &self,
        token: &RequestToken,
        envelope: MessageEnvelope,
    ) -> Result<(), ServiceError> {
        // a stale request must not reach the wallet; once sent it stands
        token.check()?;
        info!(
            target_address = %envelope.target,
            value = envelope.value,
            "[csm-matrix] Submitting message"
        );
        self.submitter.submit(envelope).await?;
        Ok(())
    }

    async fn buy(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        root: Address,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        self.check_buy(token, action, root).await?;
        let envelope = self
            .prepare_buy(token, action.level, action.profile, Some(action.pos), query_id)
            .await?;
        self.submit(token, envelope.clone()).await?;
        Ok(envelope)
    }

    async fn lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        self.check_lock(token, action).await?;
        let envelope = self.prepare_lock(token, action, query_id).await?;
        self.submit(token, envelope.clone()).await?;
        Ok(envelope)
    }

    async fn unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError> {
        self.check_unlock(token, action).await?;
        let envelope = self.prepare_unlock(token, action, query_id).await?;
        self.submit(token, envelope.clone()).await?;
        Ok(envelope)
    }

    async fn load_referrals(
        &self,
        token: &RequestToken,
        invite: Address,
        last: u32,
    ) -> Result<ReferralPage, ServiceError> {
        let record = self
            .fetch_invite(token, invite)
            .await?
            .ok_or_else(|| ServiceError::not_found("invite", invite))?;
        let window = ReferralWindow::after(last, record.next_ref_no, self.config.referral_batch);
        debug!(%invite, from = window.from, to = window.to, "[csm-matrix] Loading referrals");

        let mut referrals = Vec::with_capacity(window.len() as usize);
        for seq_no in window.seq_nos() {
            let Some(address) = token.guard(self.index.invite_address(&invite, seq_no)).await??
            else {
                debug!(%invite, seq_no, "[csm-matrix] Referral not indexed yet");
                break;
            };
            let Some(record) = self.fetch_invite(token, address).await? else {
                debug!(%address, seq_no, "[csm-matrix] Referral invite not deployed yet");
                break;
            };
            let owner = match record.owner {
                Some(info) => Some(self.occupant(token, info.owner).await?),
                None => None,
            };
            referrals.push(Referral {
                seq_no,
                address,
                record,
                owner,
            });
        }

        Ok(ReferralPage { window, referrals })
    }

    async fn profile_tasks(
        &self,
        token: &RequestToken,
        profile: Address,
    ) -> Result<ProfileTasks, ServiceError> {
        let aggregate = self.aggregate(token).await?;
        let tasks = aggregate.tasks_for(&profile);
        debug!(
            %profile,
            pending = tasks.total(),
            queued = aggregate.queue.len(),
            "[csm-matrix] Profile task queue"
        );
        Ok(tasks)
    }
}

fn decode<R: CellCodec>(bytes: Option<Vec<u8>>) -> Result<Option<R>, ServiceError> {
    bytes
        .map(|bytes| R::from_boc(&bytes))
        .transpose()
        .map_err(ServiceError::from)
}
