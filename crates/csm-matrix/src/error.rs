//! Error types for the matrix service

use csm_cell::{Address, CellError};
use csm_contracts::DecodeError;
use thiserror::Error;

use crate::domain::{ConfigError, MatrixError, PolicyViolation};

/// Failures reported by the chain query, index and submitter ports
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited by endpoint")]
    RateLimited,

    #[error("endpoint rejected request: {0}")]
    Rejected(String),
}

/// How a caller should react to a `ServiceError`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transport problem; the same request may succeed later
    Unreachable,
    /// Data or request is invalid; retrying will not help
    Malformed,
    NotFound,
    /// A buy, lock or unlock precondition is not met
    Policy,
    /// Superseded by a newer request on the same channel
    Cancelled,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("chain query failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("message encoding failed: {0}")]
    Encode(#[from] CellError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("{0}")]
    Policy(#[from] PolicyViolation),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{kind} not found: {address}")]
    NotFound { kind: &'static str, address: Address },

    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn not_found(kind: &'static str, address: Address) -> Self {
        Self::NotFound { kind, address }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Fetch(FetchError::Rejected(_)) => ErrorClass::Malformed,
            Self::Fetch(_) => ErrorClass::Unreachable,
            Self::Decode(_) | Self::Encode(_) | Self::Matrix(_) | Self::Config(_) => {
                ErrorClass::Malformed
            }
            Self::Policy(_) => ErrorClass::Policy,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Cancelled => ErrorClass::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }

    pub fn policy(&self) -> Option<PolicyViolation> {
        match self {
            Self::Policy(violation) => Some(*violation),
            _ => None,
        }
    }
}
