//! Ports Layer
//!
//! - Driving port (inbound): `MatrixApi`, used by the UI layer
//! - Driven ports (outbound): chain queries, the place index and the
//!   transaction submitter

pub mod inbound;
pub mod outbound;

pub use inbound::{MatrixApi, PositionAction, Referral, ReferralPage, SubtreeQuery};
pub use outbound::{ChainQuery, MatrixIndex, MessageEnvelope, TransactionSubmitter};
