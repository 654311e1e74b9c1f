//! Domain Layer - matrix tree model and policy outcomes
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod entities;
pub mod errors;

pub use entities::{
    EmptyNode, FilledNode, LockSet, MatrixNode, NextPosition, Occupant, PositionIndex,
    PositionState, ProfileStanding,
};
pub use errors::{ConfigError, MatrixError, PolicyViolation};
