//! Matrix tree entities
//!
//! A `MatrixNode` is derived from fetched places and never stored. A refresh
//! rebuilds the whole subtree.

use std::collections::HashSet;

use csm_cell::Address;
use csm_contracts::records::{MatrixLevel, PlacePos, Side};
use serde::{Deserialize, Serialize};

use super::errors::PolicyViolation;

/// Positions locked by the matrix owner, keyed by parent and side
pub type LockSet = HashSet<PlacePos>;

/// Level-order number of a tree position
///
/// The root is 1 and the children of `k` are `2k` (left) and `2k + 1`
/// (right).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionIndex(u64);

impl PositionIndex {
    pub const ROOT: Self = Self(1);

    pub fn new(index: u64) -> Option<Self> {
        (index >= 1).then_some(Self(index))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// `None` once the index no longer fits in 64 bits.
    pub fn child(self, side: Side) -> Option<Self> {
        self.0
            .checked_mul(2)
            .and_then(|k| k.checked_add(side.index() as u64))
            .map(Self)
    }

    pub fn parent(self) -> Option<Self> {
        (self.0 > 1).then_some(Self(self.0 / 2))
    }

    pub fn side(self) -> Option<Side> {
        (self.0 > 1).then_some(Side::from_bit(self.0 & 1 == 1))
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(self) -> usize {
        (u64::BITS - 1 - self.0.leading_zeros()) as usize
    }
}

/// Lifecycle of a single position
///
/// `Empty -> buy -> Filled -> lock -> FilledLocked -> unlock -> Filled`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Empty,
    Filled,
    FilledLocked,
}

impl PositionState {
    pub fn buy(self) -> Result<Self, PolicyViolation> {
        match self {
            Self::Empty => Ok(Self::Filled),
            Self::Filled | Self::FilledLocked => Err(PolicyViolation::NotEmpty),
        }
    }

    pub fn lock(self) -> Result<Self, PolicyViolation> {
        match self {
            Self::Empty => Err(PolicyViolation::NotFilled),
            Self::Filled => Ok(Self::FilledLocked),
            Self::FilledLocked => Err(PolicyViolation::AlreadyLocked),
        }
    }

    pub fn unlock(self) -> Result<Self, PolicyViolation> {
        match self {
            Self::Empty => Err(PolicyViolation::NotFilled),
            Self::Filled => Err(PolicyViolation::NotLocked),
            Self::FilledLocked => Ok(Self::Filled),
        }
    }

    pub fn is_filled(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// What a profile holds, as needed by the eligibility rules
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStanding {
    /// Membership in the multi program is confirmed by the inviter
    pub program_confirmed: bool,
    /// Places held per level, level 1 first
    pub places: [u32; 6],
}

impl ProfileStanding {
    pub fn places_at(&self, level: MatrixLevel) -> u32 {
        self.places[level.index()]
    }
}

/// Profile shown in a filled position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub profile: Address,
    pub login: Option<String>,
    pub image: Option<String>,
}

impl Occupant {
    /// Occupant whose content has not been resolved.
    pub fn unresolved(profile: Address) -> Self {
        Self {
            profile,
            login: None,
            image: None,
        }
    }
}

/// The deterministic next position of a matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPosition {
    pub position: PositionIndex,
    pub pos: PlacePos,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledNode {
    pub address: Address,
    /// `None` for the root of the subtree
    pub parent: Option<Address>,
    pub side: Option<Side>,
    pub position: PositionIndex,
    pub place_number: u32,
    pub clone: bool,
    pub occupant: Occupant,
    pub created_at: u64,
    /// Places filled below this one, as counted by the contract
    pub descendants: u8,
    pub locked: bool,
    pub can_lock: bool,
    pub can_unlock: bool,
    /// Left then right; `None` past the requested depth or for a closed
    /// slot with no child
    pub children: [Option<MatrixNode>; 2],
}

impl FilledNode {
    /// Slot this place occupies under its parent.
    pub fn pos(&self) -> Option<PlacePos> {
        Some(PlacePos::new(self.parent?, self.side?))
    }

    pub fn state(&self) -> PositionState {
        if self.locked {
            PositionState::FilledLocked
        } else {
            PositionState::Filled
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyNode {
    pub parent: Address,
    pub side: Side,
    pub position: PositionIndex,
    pub is_next: bool,
    pub can_buy: bool,
    pub can_lock: bool,
}

impl EmptyNode {
    pub fn pos(&self) -> PlacePos {
        PlacePos::new(self.parent, self.side)
    }
}

/// One position of a reconstructed matrix subtree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MatrixNode {
    Filled(Box<FilledNode>),
    Empty(EmptyNode),
}

impl MatrixNode {
    pub fn position(&self) -> PositionIndex {
        match self {
            Self::Filled(node) => node.position,
            Self::Empty(node) => node.position,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn as_filled(&self) -> Option<&FilledNode> {
        match self {
            Self::Filled(node) => Some(node),
            Self::Empty(_) => None,
        }
    }

    pub fn as_empty(&self) -> Option<&EmptyNode> {
        match self {
            Self::Empty(node) => Some(node),
            Self::Filled(_) => None,
        }
    }

    pub fn child(&self, side: Side) -> Option<&MatrixNode> {
        self.as_filled()?.children[side.index()].as_ref()
    }

    /// Nodes in breadth-first order, this node first.
    pub fn breadth_first(&self) -> Vec<&MatrixNode> {
        let mut out = vec![self];
        let mut i = 0;
        while let Some(node) = out.get(i).copied() {
            if let Self::Filled(filled) = node {
                out.extend(filled.children.iter().flatten());
            }
            i += 1;
        }
        out
    }

    pub fn find(&self, position: PositionIndex) -> Option<&MatrixNode> {
        self.breadth_first()
            .into_iter()
            .find(|node| node.position() == position)
    }

    /// The empty node marked as the next position, if it is in this subtree.
    pub fn next_position(&self) -> Option<&EmptyNode> {
        self.breadth_first()
            .into_iter()
            .filter_map(Self::as_empty)
            .find(|node| node.is_next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_numbering() {
        let root = PositionIndex::ROOT;
        let left = root.child(Side::Left).unwrap();
        let right = root.child(Side::Right).unwrap();
        assert_eq!((left.get(), right.get()), (2, 3));
        assert_eq!(right.child(Side::Right).unwrap().get(), 7);
        assert_eq!(right.parent(), Some(root));
        assert_eq!(right.side(), Some(Side::Right));
        assert_eq!(root.side(), None);
        assert_eq!(PositionIndex::new(7).unwrap().depth(), 2);
        assert_eq!(PositionIndex::new(0), None);
    }

    #[test]
    fn test_position_overflow() {
        let deep = PositionIndex::new(u64::MAX / 2 + 1).unwrap();
        assert_eq!(deep.child(Side::Left), None);
        assert_eq!(deep.depth(), 63);
    }

    #[test]
    fn test_state_machine() {
        let filled = PositionState::Empty.buy().unwrap();
        assert_eq!(filled, PositionState::Filled);
        assert_eq!(PositionState::Empty.lock(), Err(PolicyViolation::NotFilled));
        assert_eq!(filled.unlock(), Err(PolicyViolation::NotLocked));

        let locked = filled.lock().unwrap();
        assert_eq!(locked.lock(), Err(PolicyViolation::AlreadyLocked));
        assert_eq!(locked.buy(), Err(PolicyViolation::NotEmpty));
        assert_eq!(locked.unlock().unwrap().lock().unwrap(), PositionState::FilledLocked);
    }

    proptest::proptest! {
        #[test]
        fn prop_child_knows_its_parent(k in 1u64..(1 << 62), right: bool) {
            let node = PositionIndex::new(k).unwrap();
            let side = Side::from_bit(right);
            let child = node.child(side).unwrap();
            proptest::prop_assert_eq!(child.parent(), Some(node));
            proptest::prop_assert_eq!(child.side(), Some(side));
            proptest::prop_assert_eq!(child.depth(), node.depth() + 1);
        }
    }
}
