//! # CSM Matrix
//!
//! Binary referral matrix for the Crypto Style multi program: tree
//! assembly, next-position search, breadcrumbs, buy/lock eligibility and
//! the messages that act on a matrix.
//!
//! ## Architecture
//!
//! - `domain/`: positions, node variants and the position state machine
//! - `algorithms/`: pure functions over places already in memory
//! - `ports/`: `MatrixApi` (inbound) and `ChainQuery`, `MatrixIndex`,
//!   `TransactionSubmitter` (outbound)
//! - `service/`: `MatrixService`, request generations and in-flight
//!   de-duplication
//! - `adapters/`: `InMemoryChain`
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: position `k` has children `2k` and `2k + 1`; the root
//!   of a requested subtree is position 1
//! - **INVARIANT-2**: the next position is the first open slot in
//!   breadth-first order, left before right
//! - **INVARIANT-3**: nothing is placed below a locked position
//! - **INVARIANT-4**: a request superseded on its channel never delivers a
//!   result and never submits a message
//!
//! ## Usage Example
//!
//! ```ignore
//! use csm_matrix::{Channel, InMemoryChain, MatrixApi, MatrixService, SubtreeQuery};
//!
//! let chain = Arc::new(InMemoryChain::new());
//! let service = MatrixService::new(chain.clone(), chain.clone(), chain);
//!
//! let token = service.begin(Channel::Subtree);
//! let tree = service
//!     .load_subtree(&token, SubtreeQuery { level, root, viewer: Some(me), depth: None })
//!     .await?;
//! ```

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::InMemoryChain;
pub use config::MatrixConfig;
pub use domain::{
    ConfigError, EmptyNode, FilledNode, LockSet, MatrixError, MatrixNode, NextPosition, Occupant,
    PolicyViolation, PositionIndex, PositionState, ProfileStanding,
};
pub use error::{ErrorClass, FetchError, ServiceError};
pub use ports::{
    ChainQuery, MatrixApi, MatrixIndex, MessageEnvelope, PositionAction, Referral, ReferralPage,
    SubtreeQuery, TransactionSubmitter,
};
pub use service::{Channel, MatrixService, RequestToken};
