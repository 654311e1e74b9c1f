//! Path from a place up to the matrix root
//!
//! The walk follows `parent` references one place at a time, so the service
//! can fetch each parent as it goes. The hop count is bounded to stop on
//! malformed data that loops.

use csm_cell::Address;
use csm_contracts::records::PlaceRecord;

use super::PlaceLookup;
use crate::domain::MatrixError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkStep {
    /// The place to pass to the next `step`
    Fetch(Address),
    /// Addresses ordered root first, ending with the start place
    Done(Vec<Address>),
}

#[derive(Clone, Debug)]
pub struct BreadcrumbWalk {
    start: Address,
    root: Address,
    max_depth: usize,
    current: Address,
    path: Vec<Address>,
}

impl BreadcrumbWalk {
    pub fn new(start: Address, root: Address, max_depth: usize) -> Self {
        Self {
            start,
            root,
            max_depth,
            current: start,
            path: vec![start],
        }
    }

    /// First step; a walk that starts at the root is already done.
    pub fn begin(&self) -> WalkStep {
        if self.start == self.root {
            WalkStep::Done(vec![self.root])
        } else {
            WalkStep::Fetch(self.start)
        }
    }

    /// Feed the place requested by the previous step.
    pub fn step(&mut self, place: Option<&PlaceRecord>) -> Result<WalkStep, MatrixError> {
        let current = self.current;
        let place = place.ok_or(MatrixError::MissingPlace { address: current })?;
        let Some(parent) = place.parent else {
            return Err(MatrixError::ForeignRoot {
                start: self.start,
                found: current,
                expected: self.root,
            });
        };
        if self.path.len() > self.max_depth {
            return Err(MatrixError::PathTooDeep {
                start: self.start,
                max_depth: self.max_depth,
            });
        }
        self.path.push(parent);
        self.current = parent;

        if parent == self.root {
            let mut path = std::mem::take(&mut self.path);
            path.reverse();
            return Ok(WalkStep::Done(path));
        }
        Ok(WalkStep::Fetch(parent))
    }
}

/// Walk over places that are all in memory.
pub fn breadcrumbs<L: PlaceLookup + ?Sized>(
    places: &L,
    start: Address,
    root: Address,
    max_depth: usize,
) -> Result<Vec<Address>, MatrixError> {
    let mut walk = BreadcrumbWalk::new(start, root, max_depth);
    let mut step = walk.begin();
    loop {
        match step {
            WalkStep::Done(path) => return Ok(path),
            WalkStep::Fetch(address) => step = walk.step(places.place(&address))?,
        }
    }
}
