//! Outbound Ports (Driven Ports)
//!
//! What the matrix service needs from the outside: raw contract state, an
//! index over places and invites, and a way to send messages.

use async_trait::async_trait;
use csm_cell::{boc, Address, CellError, CellRef};
use csm_contracts::records::MatrixLevel;

use crate::domain::LockSet;
use crate::error::FetchError;

/// Raw contract state as bag-of-cells bytes
///
/// `Ok(None)` means the contract or record does not exist.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Storage of a place contract (`PlaceRecord`).
    async fn place(&self, address: &Address) -> Result<Option<Vec<u8>>, FetchError>;

    /// Storage of an invite contract (`InviteRecord`).
    async fn invite(&self, address: &Address) -> Result<Option<Vec<u8>>, FetchError>;

    /// Content cell of a profile item (`NftContent`).
    async fn profile_content(&self, profile: &Address) -> Result<Option<Vec<u8>>, FetchError>;

    /// Root of the profile's program dictionary (`ProfilePrograms`).
    ///
    /// `Ok(None)` when the profile has joined no program.
    async fn profile_programs(&self, profile: &Address)
        -> Result<Option<Vec<u8>>, FetchError>;

    /// Storage of the multi contract (`MultiAggregate`).
    async fn multi(&self) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Index over places and invites maintained off-chain
#[async_trait]
pub trait MatrixIndex: Send + Sync {
    /// First place the profile bought at `level`, the root of its matrix.
    async fn root_place(
        &self,
        profile: &Address,
        level: MatrixLevel,
    ) -> Result<Option<Address>, FetchError>;

    /// Number of places the profile holds at `level`.
    async fn place_count(&self, profile: &Address, level: MatrixLevel) -> Result<u32, FetchError>;

    /// Positions the profile has locked in its matrix at `level`.
    async fn locks(&self, profile: &Address, level: MatrixLevel) -> Result<LockSet, FetchError>;

    /// Address of the referral invite issued as `seq_no` by `invite`.
    async fn invite_address(
        &self,
        invite: &Address,
        seq_no: u32,
    ) -> Result<Option<Address>, FetchError>;
}

/// Internal message ready to be signed and sent by a wallet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub target: Address,
    /// Attached value in nanotons
    pub value: u128,
    pub body: CellRef,
}

impl MessageEnvelope {
    pub fn body_boc(&self) -> Result<Vec<u8>, CellError> {
        boc::to_boc(&self.body)
    }

    /// Body as base64, the form wallet connectors accept.
    pub fn body_base64(&self) -> Result<String, CellError> {
        boc::to_base64(&self.body)
    }
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, envelope: MessageEnvelope) -> Result<(), FetchError>;
}
