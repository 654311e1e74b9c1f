//! Shared builders for the integration scenarios

use std::sync::Arc;

use csm_cell::Address;
use csm_contracts::records::{
    LevelAmounts, MatrixLevel, PlaceChildren, PlaceRecord, ProfileRefs, SecurityInfo,
};
use csm_matrix::{InMemoryChain, MatrixConfig, MatrixService};

pub type TestService = MatrixService<InMemoryChain, InMemoryChain, InMemoryChain>;

/// Flat fee used by `service_with_fees`, 0.1 TON
pub const TEST_FEE: u128 = 100_000_000;

pub fn addr(b: u8) -> Address {
    Address::new(0, [b; 32])
}

pub fn level(m: u8) -> MatrixLevel {
    MatrixLevel::new(m).expect("level in 1..=6")
}

/// A place record with only the fields the matrix logic reads set
/// meaningfully.
pub fn place(
    m: MatrixLevel,
    profile: Address,
    place_number: u32,
    parent: Option<Address>,
    fill_count: u8,
    children: Option<PlaceChildren>,
) -> PlaceRecord {
    PlaceRecord {
        marketing: addr(0xee),
        m,
        parent,
        created_at: 1_700_000_000 + place_number as u64,
        fill_count,
        profiles: ProfileRefs {
            clone: false,
            profile,
            place_number,
            inviter_profile: None,
        },
        security: SecurityInfo { admin: addr(0xef) },
        children,
    }
}

/// Service over `chain` with fixed fees and a multi address, so no multi
/// contract state is needed.
pub fn service_with_fees(chain: &Arc<InMemoryChain>, config: MatrixConfig) -> TestService {
    let config = MatrixConfig {
        fees: Some(LevelAmounts([TEST_FEE; 6])),
        multi_address: Some(addr(0xf0)),
        ..config
    };
    MatrixService::with_config(chain.clone(), chain.clone(), chain.clone(), config)
        .expect("valid test configuration")
}
