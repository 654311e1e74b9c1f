//! Subtree reconstruction
//!
//! Positions are numbered from the requested root, which is always 1. An
//! open slot (no child, fill count below capacity) becomes an `Empty` node;
//! a closed slot is left out.

use std::collections::HashMap;

use csm_cell::Address;
use csm_contracts::records::{MatrixLevel, PlacePos, Side};

use super::eligibility::{check_buy, check_lock, check_unlock};
use super::{child_at, side_of, PlaceLookup};
use crate::config::MAX_TREE_DEPTH;
use crate::domain::{
    EmptyNode, FilledNode, LockSet, MatrixError, MatrixNode, NextPosition, Occupant,
    PositionIndex, PositionState, ProfileStanding,
};

/// Builds a `MatrixNode` tree from fetched places
///
/// Without a `standing` every `can_*` flag is false.
pub struct TreeBuilder<'a, L: ?Sized> {
    places: &'a L,
    level: MatrixLevel,
    capacity: u8,
    locks: Option<&'a LockSet>,
    occupants: Option<&'a HashMap<Address, Occupant>>,
    next: Option<NextPosition>,
    standing: Option<ProfileStanding>,
}

impl<'a, L: PlaceLookup + ?Sized> TreeBuilder<'a, L> {
    pub fn new(places: &'a L, level: MatrixLevel, capacity: u8) -> Self {
        Self {
            places,
            level,
            capacity,
            locks: None,
            occupants: None,
            next: None,
            standing: None,
        }
    }

    pub fn locks(mut self, locks: &'a LockSet) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn occupants(mut self, occupants: &'a HashMap<Address, Occupant>) -> Self {
        self.occupants = Some(occupants);
        self
    }

    pub fn next_position(mut self, next: Option<NextPosition>) -> Self {
        self.next = next;
        self
    }

    pub fn standing(mut self, standing: ProfileStanding) -> Self {
        self.standing = Some(standing);
        self
    }

    /// Resolve `root` and `depth` levels below it.
    pub fn build(&self, root: Address, depth: usize) -> Result<MatrixNode, MatrixError> {
        if depth > MAX_TREE_DEPTH {
            return Err(MatrixError::TreeTooDeep {
                depth,
                max: MAX_TREE_DEPTH,
            });
        }
        let place = self
            .places
            .place(&root)
            .ok_or(MatrixError::MissingPlace { address: root })?;
        // the root's side is known only when its parent was fetched too
        let side = place
            .parent
            .and_then(|parent| self.places.place(&parent))
            .and_then(|parent| side_of(parent, &root));
        self.filled(root, place.parent, side, PositionIndex::ROOT, depth)
    }

    fn filled(
        &self,
        address: Address,
        parent: Option<Address>,
        side: Option<Side>,
        position: PositionIndex,
        remaining: usize,
    ) -> Result<MatrixNode, MatrixError> {
        let place = self
            .places
            .place(&address)
            .ok_or(MatrixError::MissingPlace { address })?;
        if place.m != self.level {
            return Err(MatrixError::LevelMismatch {
                address,
                found: place.m,
                expected: self.level,
            });
        }

        let pos = parent.zip(side).map(|(parent, side)| PlacePos::new(parent, side));
        let locked = pos.is_some_and(|p| self.locks.is_some_and(|locks| locks.contains(&p)));
        let state = if locked {
            PositionState::FilledLocked
        } else {
            PositionState::Filled
        };
        let (can_lock, can_unlock) = match (&self.standing, pos) {
            (Some(standing), Some(_)) => (
                check_lock(state, self.level, standing).is_ok(),
                check_unlock(state, self.level, standing).is_ok(),
            ),
            _ => (false, false),
        };

        let profile = place.profiles.profile;
        let occupant = self
            .occupants
            .and_then(|o| o.get(&profile))
            .cloned()
            .unwrap_or_else(|| Occupant::unresolved(profile));

        let mut children = [None, None];
        if remaining > 0 {
            for side in [Side::Left, Side::Right] {
                let index = position.child(side).ok_or(MatrixError::TreeTooDeep {
                    depth: position.depth() + 1,
                    max: MAX_TREE_DEPTH,
                })?;
                children[side.index()] = match child_at(place, side) {
                    Some(child) => {
                        Some(self.filled(child, Some(address), Some(side), index, remaining - 1)?)
                    }
                    None if place.fill_count < self.capacity => {
                        Some(self.empty(address, side, index))
                    }
                    None => None,
                };
            }
        }

        Ok(MatrixNode::Filled(Box::new(FilledNode {
            address,
            parent,
            side,
            position,
            place_number: place.profiles.place_number,
            clone: place.profiles.clone,
            occupant,
            created_at: place.created_at,
            descendants: place.fill_count,
            locked,
            can_lock,
            can_unlock,
            children,
        })))
    }

    fn empty(&self, parent: Address, side: Side, position: PositionIndex) -> MatrixNode {
        let is_next = self
            .next
            .is_some_and(|next| next.pos == PlacePos::new(parent, side));
        let (can_buy, can_lock) = match &self.standing {
            Some(standing) => (
                check_buy(PositionState::Empty, is_next, self.level, standing).is_ok(),
                check_lock(PositionState::Empty, self.level, standing).is_ok(),
            ),
            None => (false, false),
        };
        MatrixNode::Empty(EmptyNode {
            parent,
            side,
            position,
            is_next,
            can_buy,
            can_lock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{addr, place, six_filled};
    use crate::algorithms::next_position;

    fn m1() -> MatrixLevel {
        MatrixLevel::new(1).unwrap()
    }

    fn member() -> ProfileStanding {
        ProfileStanding {
            program_confirmed: true,
            places: [1, 0, 0, 0, 0, 0],
        }
    }

    #[test]
    fn test_full_depth_tree() {
        let places = six_filled();
        let next = next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100).unwrap();
        let tree = TreeBuilder::new(&places, m1(), 4)
            .next_position(next)
            .standing(member())
            .build(addr(1), 2)
            .unwrap();

        let nodes = tree.breadth_first();
        let positions: Vec<u64> = nodes.iter().map(|n| n.position().get()).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6, 7]);

        let seven = tree.find(PositionIndex::new(7).unwrap()).unwrap();
        let empty = seven.as_empty().unwrap();
        assert!(empty.is_next);
        assert!(empty.can_buy);
        assert!(!empty.can_lock);
        assert_eq!(tree.next_position().unwrap().pos(), PlacePos::new(addr(3), Side::Right));
    }

    #[test]
    fn test_depth_limits_expansion() {
        let places = six_filled();
        let tree = TreeBuilder::new(&places, m1(), 4).build(addr(1), 1).unwrap();
        assert_eq!(tree.breadth_first().len(), 3);
        let left = tree.child(Side::Left).unwrap().as_filled().unwrap();
        assert_eq!(left.children, [None, None]);

        let leaf_only = TreeBuilder::new(&places, m1(), 4).build(addr(1), 0).unwrap();
        assert_eq!(leaf_only.breadth_first().len(), 1);
    }

    #[test]
    fn test_closed_slot_is_omitted() {
        let mut places = six_filled();
        places.get_mut(&addr(3)).unwrap().fill_count = 4;
        let tree = TreeBuilder::new(&places, m1(), 4).build(addr(1), 2).unwrap();
        assert!(tree.find(PositionIndex::new(7).unwrap()).is_none());
    }

    #[test]
    fn test_lock_flags() {
        let places = six_filled();
        let locks: LockSet = [PlacePos::new(addr(1), Side::Right)].into();
        let tree = TreeBuilder::new(&places, m1(), 4)
            .locks(&locks)
            .standing(member())
            .build(addr(1), 2)
            .unwrap();

        let three = tree.child(Side::Right).unwrap().as_filled().unwrap();
        assert!(three.locked);
        assert!(!three.can_lock);
        assert!(three.can_unlock);

        let two = tree.child(Side::Left).unwrap().as_filled().unwrap();
        assert!(!two.locked);
        assert!(two.can_lock);

        // the subtree root has no parent, so there is no position to lock
        let root = tree.as_filled().unwrap();
        assert!(!root.can_lock && !root.can_unlock);
    }

    #[test]
    fn test_subtree_root_side_from_parent() {
        let places = six_filled();
        let tree = TreeBuilder::new(&places, m1(), 4).build(addr(3), 1).unwrap();
        let root = tree.as_filled().unwrap();
        assert_eq!(root.pos(), Some(PlacePos::new(addr(1), Side::Right)));
        assert_eq!(root.position, PositionIndex::ROOT);
        // slot under place 3 is renumbered from the subtree root
        assert_eq!(tree.child(Side::Right).unwrap().position().get(), 3);
    }

    #[test]
    fn test_occupants_and_missing_place() {
        let mut places = six_filled();
        let occupants: HashMap<_, _> = [(
            addr(101),
            Occupant {
                profile: addr(101),
                login: Some("alice".into()),
                image: None,
            },
        )]
        .into();
        let tree = TreeBuilder::new(&places, m1(), 4)
            .occupants(&occupants)
            .build(addr(1), 0)
            .unwrap();
        assert_eq!(tree.as_filled().unwrap().occupant.login.as_deref(), Some("alice"));

        places.remove(&addr(6));
        assert_eq!(
            TreeBuilder::new(&places, m1(), 4).build(addr(1), 2),
            Err(MatrixError::MissingPlace { address: addr(6) })
        );
    }

    #[test]
    fn test_depth_guard() {
        let places: HashMap<_, _> = [(addr(1), place(1, 1, None, 0, (None, None)))].into();
        assert!(matches!(
            TreeBuilder::new(&places, m1(), 4).build(addr(1), MAX_TREE_DEPTH + 1),
            Err(MatrixError::TreeTooDeep { .. })
        ));
    }
}
