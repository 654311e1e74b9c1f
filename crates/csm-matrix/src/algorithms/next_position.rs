//! Breadth-first search for the next open position
//!
//! A slot is open when it has no child, its parent's fill count is below
//! the level capacity, and its parent is not locked. Nothing under a locked
//! place is considered. The first open slot in level order is the next
//! position.
//!
//! `NextPositionScan` is resumable: when it reaches a place that has not
//! been fetched yet it reports the missing addresses and picks up from the
//! same spot on the next `advance`.

use std::collections::VecDeque;

use csm_cell::Address;
use csm_contracts::records::{MatrixLevel, PlacePos, Side};

use super::{child_at, PlaceLookup};
use crate::domain::{LockSet, MatrixError, NextPosition, PositionIndex};

/// Deepest level a `PositionIndex` can number.
const MAX_INDEX_DEPTH: usize = (u64::BITS - 1) as usize;

/// Outcome of one `advance`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanStep {
    Found(NextPosition),
    /// Places queued for a visit that are not in the lookup yet
    NeedPlaces(Vec<Address>),
    /// Every slot reachable from the root is taken or closed
    Full,
}

#[derive(Clone, Debug)]
pub struct NextPositionScan {
    level: MatrixLevel,
    capacity: u8,
    limit: usize,
    visited: usize,
    queue: VecDeque<(Address, PositionIndex, Option<PlacePos>)>,
}

impl NextPositionScan {
    pub fn new(root: Address, level: MatrixLevel, capacity: u8, limit: usize) -> Self {
        Self {
            level,
            capacity,
            limit,
            visited: 0,
            queue: VecDeque::from([(root, PositionIndex::ROOT, None)]),
        }
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn advance<L: PlaceLookup + ?Sized>(
        &mut self,
        places: &L,
        locks: &LockSet,
    ) -> Result<ScanStep, MatrixError> {
        while let Some(&(address, position, pos)) = self.queue.front() {
            let Some(place) = places.place(&address) else {
                let missing = self
                    .queue
                    .iter()
                    .map(|(a, _, _)| *a)
                    .filter(|a| places.place(a).is_none())
                    .collect();
                return Ok(ScanStep::NeedPlaces(missing));
            };
            self.queue.pop_front();

            self.visited += 1;
            if self.visited > self.limit {
                return Err(MatrixError::ScanLimitExceeded { limit: self.limit });
            }
            if place.m != self.level {
                return Err(MatrixError::LevelMismatch {
                    address,
                    found: place.m,
                    expected: self.level,
                });
            }
            if pos.is_some_and(|p| locks.contains(&p)) {
                continue;
            }

            for side in [Side::Left, Side::Right] {
                let slot = PlacePos::new(address, side);
                let index = position.child(side).ok_or(MatrixError::TreeTooDeep {
                    depth: position.depth() + 1,
                    max: MAX_INDEX_DEPTH,
                })?;
                match child_at(place, side) {
                    Some(child) => self.queue.push_back((child, index, Some(slot))),
                    None if place.fill_count < self.capacity => {
                        return Ok(ScanStep::Found(NextPosition {
                            position: index,
                            pos: slot,
                        }));
                    }
                    None => {}
                }
            }
        }
        Ok(ScanStep::Full)
    }
}

/// Run a scan over places that are all in memory.
///
/// A referenced place missing from `places` is an error.
pub fn next_position<L: PlaceLookup + ?Sized>(
    places: &L,
    root: Address,
    level: MatrixLevel,
    capacity: u8,
    locks: &LockSet,
    limit: usize,
) -> Result<Option<NextPosition>, MatrixError> {
    let mut scan = NextPositionScan::new(root, level, capacity, limit);
    match scan.advance(places, locks)? {
        ScanStep::Found(next) => Ok(Some(next)),
        ScanStep::Full => Ok(None),
        ScanStep::NeedPlaces(missing) => Err(MatrixError::MissingPlace {
            address: missing.first().copied().unwrap_or(root),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::algorithms::fixtures::{addr, place, six_filled};

    fn m1() -> MatrixLevel {
        MatrixLevel::new(1).unwrap()
    }

    #[test]
    fn test_six_filled_next_is_seven() {
        let places = six_filled();
        let next = next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(next.position.get(), 7);
        assert_eq!(next.pos, PlacePos::new(addr(3), Side::Right));
    }

    #[test]
    fn test_fixture_fill_counts_fit_default_capacity() {
        let places = six_filled();
        assert!(places
            .values()
            .all(|p| p.fill_count <= crate::config::DEFAULT_CAPACITY));
        // the root is full, its children still take places
        assert_eq!(places[&addr(1)].fill_count, crate::config::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_empty_root_gives_left_slot() {
        let places: HashMap<_, _> = [(addr(1), place(1, 1, None, 0, (None, None)))].into();
        let next = next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(next.position.get(), 2);
        assert_eq!(next.pos.side, Side::Left);
    }

    #[test]
    fn test_full_parent_is_skipped() {
        let mut places = six_filled();
        // place 3 reached capacity, so slot 7 is closed and the scan moves
        // on to the leaves
        places.get_mut(&addr(3)).unwrap().fill_count = 4;
        let next = next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(next.position.get(), 8);
        assert_eq!(next.pos, PlacePos::new(addr(4), Side::Left));
    }

    #[test]
    fn test_locked_subtree_is_skipped() {
        let places = six_filled();
        let locks: LockSet = [PlacePos::new(addr(1), Side::Right)].into();
        let next = next_position(&places, addr(1), m1(), 4, &locks, 100)
            .unwrap()
            .unwrap();
        // slot 7 sits under the locked place 3
        assert_eq!(next.position.get(), 8);
    }

    #[test]
    fn test_full_tree() {
        let places: HashMap<_, _> = [(addr(1), place(1, 1, None, 4, (None, None)))].into();
        assert_eq!(
            next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100).unwrap(),
            None
        );
    }

    #[test]
    fn test_scan_limit() {
        let places = six_filled();
        assert_eq!(
            next_position(&places, addr(1), m1(), 4, &LockSet::new(), 2),
            Err(MatrixError::ScanLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn test_resumes_after_missing_places() {
        let all = six_filled();
        let mut fetched: HashMap<_, _> = [(addr(1), all[&addr(1)].clone())].into();
        let mut scan = NextPositionScan::new(addr(1), m1(), 4, 100);

        let mut rounds = 0;
        let next = loop {
            rounds += 1;
            match scan.advance(&fetched, &LockSet::new()).unwrap() {
                ScanStep::Found(next) => break next,
                ScanStep::NeedPlaces(missing) => {
                    for a in missing {
                        fetched.insert(a, all[&a].clone());
                    }
                }
                ScanStep::Full => panic!("tree is not full"),
            }
        };
        assert_eq!(next.position.get(), 7);
        assert_eq!(rounds, 2);
        assert_eq!(scan.visited(), 3);
    }

    #[test]
    fn test_level_mismatch() {
        let places: HashMap<_, _> = [(addr(1), place(1, 2, None, 0, (None, None)))].into();
        assert!(matches!(
            next_position(&places, addr(1), m1(), 4, &LockSet::new(), 100),
            Err(MatrixError::LevelMismatch { .. })
        ));
    }
}
