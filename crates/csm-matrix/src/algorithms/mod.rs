//! Pure matrix algorithms over fetched places
//!
//! Every algorithm reads places through `PlaceLookup`, so the service can
//! run them over whatever it has fetched so far.

pub mod breadcrumbs;
pub mod eligibility;
pub mod next_position;
pub mod referral_window;
pub mod tree_builder;

use std::collections::HashMap;

use csm_cell::Address;
use csm_contracts::records::{PlaceRecord, Side};

pub use breadcrumbs::{breadcrumbs, BreadcrumbWalk, WalkStep};
pub use eligibility::{check_buy, check_lock, check_unlock};
pub use next_position::{next_position, NextPositionScan, ScanStep};
pub use referral_window::ReferralWindow;
pub use tree_builder::TreeBuilder;

/// Read access to places already in memory
pub trait PlaceLookup {
    fn place(&self, address: &Address) -> Option<&PlaceRecord>;
}

impl PlaceLookup for HashMap<Address, PlaceRecord> {
    fn place(&self, address: &Address) -> Option<&PlaceRecord> {
        self.get(address)
    }
}

pub(crate) fn child_at(place: &PlaceRecord, side: Side) -> Option<Address> {
    match side {
        Side::Left => place.left_child(),
        Side::Right => place.right_child(),
    }
}

/// Side of `parent` that holds `child`, if any.
pub(crate) fn side_of(parent: &PlaceRecord, child: &Address) -> Option<Side> {
    [Side::Left, Side::Right]
        .into_iter()
        .find(|side| child_at(parent, *side).as_ref() == Some(child))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-built matrices shared by the algorithm tests

    use std::collections::HashMap;

    use csm_cell::Address;
    use csm_contracts::records::{
        MatrixLevel, PlaceChildren, PlaceRecord, ProfileRefs, SecurityInfo,
    };

    pub fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    pub fn place(
        n: u8,
        level: u8,
        parent: Option<u8>,
        fill_count: u8,
        children: (Option<u8>, Option<u8>),
    ) -> PlaceRecord {
        let children = match children {
            (None, None) => None,
            (Some(left), right) => Some(PlaceChildren {
                left: addr(left),
                right: right.map(addr),
            }),
            (None, Some(_)) => panic!("right child without a left child"),
        };
        PlaceRecord {
            marketing: addr(200),
            m: MatrixLevel::new(level).unwrap(),
            parent: parent.map(addr),
            created_at: 1_700_000_000 + n as u64,
            fill_count,
            profiles: ProfileRefs {
                clone: false,
                profile: addr(100 + n),
                place_number: n as u32,
                inviter_profile: None,
            },
            security: SecurityInfo { admin: addr(201) },
            children,
        }
    }

    /// Positions 1 to 6 filled, 7 empty:
    ///
    /// ```text
    ///          1
    ///      2       3
    ///    4   5   6   .
    /// ```
    pub fn six_filled() -> HashMap<Address, PlaceRecord> {
        [
            place(1, 1, None, 4, (Some(2), Some(3))),
            place(2, 1, Some(1), 2, (Some(4), Some(5))),
            place(3, 1, Some(1), 1, (Some(6), None)),
            place(4, 1, Some(2), 0, (None, None)),
            place(5, 1, Some(2), 0, (None, None)),
            place(6, 1, Some(3), 0, (None, None)),
        ]
        .into_iter()
        .map(|p| (addr(p.profiles.place_number as u8), p))
        .collect()
    }
}
