//! Inbound Ports (Driving Ports)
//!
//! The API the UI layer calls. Every call takes a `RequestToken` from
//! `MatrixApi::begin`; a newer request on the same channel makes it stale.

use async_trait::async_trait;
use csm_cell::Address;
use csm_contracts::records::{InviteRecord, MatrixLevel, PlacePos, ProfileTasks};
use serde::{Deserialize, Serialize};

use super::outbound::MessageEnvelope;
use crate::algorithms::ReferralWindow;
use crate::domain::{MatrixNode, NextPosition, Occupant, PositionState, ProfileStanding};
use crate::error::ServiceError;
use crate::service::{Channel, RequestToken};

/// Subtree request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubtreeQuery {
    pub level: MatrixLevel,
    /// Place shown at the top
    pub root: Address,
    /// Profile whose standing drives the `can_*` flags and whose matrix
    /// supplies the next position and lock set
    pub viewer: Option<Address>,
    /// Levels below `root`; the configured depth when `None`
    pub depth: Option<usize>,
}

/// A buy, lock or unlock at one position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionAction {
    pub level: MatrixLevel,
    /// Acting profile
    pub profile: Address,
    pub pos: PlacePos,
}

/// One referral of an invite
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub seq_no: u32,
    pub address: Address,
    pub record: InviteRecord,
    /// Profile that accepted the invite, when it has an owner
    pub owner: Option<Occupant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralPage {
    pub window: ReferralWindow,
    /// In sequence order; stops early at the first referral not yet indexed
    pub referrals: Vec<Referral>,
}

impl ReferralPage {
    /// Value of `last` for the following page.
    pub fn last(&self) -> Option<u32> {
        self.referrals.last().map(|r| r.seq_no)
    }
}

#[async_trait]
pub trait MatrixApi: Send + Sync {
    /// Start a request on `channel`, superseding older ones there.
    fn begin(&self, channel: Channel) -> RequestToken;

    /// Root place of the profile's matrix at `level`.
    async fn root_place(
        &self,
        token: &RequestToken,
        profile: Address,
        level: MatrixLevel,
    ) -> Result<Option<Address>, ServiceError>;

    async fn load_subtree(
        &self,
        token: &RequestToken,
        query: SubtreeQuery,
    ) -> Result<MatrixNode, ServiceError>;

    /// Leftmost open position below `root`, or `None` when the matrix is
    /// full. Places locked by `viewer` and everything under them are
    /// skipped.
    async fn next_position(
        &self,
        token: &RequestToken,
        level: MatrixLevel,
        root: Address,
        viewer: Address,
    ) -> Result<Option<NextPosition>, ServiceError>;

    /// Addresses from `root` down to `start`.
    async fn breadcrumbs(
        &self,
        token: &RequestToken,
        start: Address,
        root: Address,
    ) -> Result<Vec<Address>, ServiceError>;

    async fn profile_standing(
        &self,
        token: &RequestToken,
        profile: Address,
    ) -> Result<ProfileStanding, ServiceError>;

    async fn position_state(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<PositionState, ServiceError>;

    /// `ServiceError::Policy` names the first unmet precondition.
    async fn check_buy(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        root: Address,
    ) -> Result<(), ServiceError>;

    async fn check_lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<(), ServiceError>;

    async fn check_unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
    ) -> Result<(), ServiceError>;

    /// `buy_place` carrying the level price plus fee.
    async fn prepare_buy(
        &self,
        token: &RequestToken,
        level: MatrixLevel,
        profile: Address,
        pos: Option<PlacePos>,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    /// `lock_pos` carrying the level fee.
    async fn prepare_lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    /// `unlock_pos` carrying the level fee.
    async fn prepare_unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    async fn submit(
        &self,
        token: &RequestToken,
        envelope: MessageEnvelope,
    ) -> Result<(), ServiceError>;

    /// Check, prepare and submit a buy at `action.pos`.
    async fn buy(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        root: Address,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    async fn lock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    async fn unlock(
        &self,
        token: &RequestToken,
        action: &PositionAction,
        query_id: u64,
    ) -> Result<MessageEnvelope, ServiceError>;

    /// Referrals of `invite` after sequence number `last` (0 for the first
    /// page).
    async fn load_referrals(
        &self,
        token: &RequestToken,
        invite: Address,
        last: u32,
    ) -> Result<ReferralPage, ServiceError>;

    /// Where `profile`'s pending tasks sit in the multi contract queue.
    async fn profile_tasks(
        &self,
        token: &RequestToken,
        profile: Address,
    ) -> Result<ProfileTasks, ServiceError>;
}
