//! Error types for the matrix domain
//!
//! `PolicyViolation` is an expected outcome of an eligibility check and is
//! shown to the user. `MatrixError` means the fetched data does not form a
//! valid tree.

use csm_cell::Address;
use csm_contracts::records::MatrixLevel;
use thiserror::Error;

/// A missing precondition for buy, lock or unlock
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum PolicyViolation {
    #[error("position is already filled")]
    NotEmpty,

    #[error("position is not the next position of the matrix")]
    NotNextPosition,

    #[error("program membership is not confirmed; choose an inviter first")]
    ProgramNotConfirmed,

    #[error("a place at {level} is required before buying here")]
    NoPlacesAtPreviousLevel { level: MatrixLevel },

    #[error("no places in matrix")]
    NoPlacesInMatrix,

    #[error("position is empty")]
    NotFilled,

    #[error("position is already locked")]
    AlreadyLocked,

    #[error("position is not locked")]
    NotLocked,
}

/// Structural faults in fetched matrix data
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("place {address} is referenced but was not found")]
    MissingPlace { address: Address },

    #[error("breadcrumb path from {start} reached root {found}, expected {expected}")]
    ForeignRoot {
        start: Address,
        found: Address,
        expected: Address,
    },

    #[error("breadcrumb path from {start} exceeds {max_depth} steps")]
    PathTooDeep { start: Address, max_depth: usize },

    #[error("requested depth {depth} exceeds maximum {max}")]
    TreeTooDeep { depth: usize, max: usize },

    #[error("next position scan gave up after {limit} places")]
    ScanLimitExceeded { limit: usize },

    #[error("place {address} belongs to {found}, expected {expected}")]
    LevelMismatch {
        address: Address,
        found: MatrixLevel,
        expected: MatrixLevel,
    },
}

/// Invalid `MatrixConfig` values
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capacity {capacity} for level {level} outside 1..={max}")]
    InvalidCapacity { level: u8, capacity: u8, max: u8 },

    #[error("tree depth {depth} exceeds maximum {max}")]
    TreeDepth { depth: usize, max: usize },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },

    #[error("multi contract address is not configured")]
    MissingMultiAddress,
}
