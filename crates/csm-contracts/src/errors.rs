//! Record-level decode errors

use csm_cell::CellError;
use thiserror::Error;

/// What went wrong underneath a `DecodeError`
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeFailure {
    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("unknown variant tag {tag}")]
    UnknownVariant { tag: u64 },

    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Failure to decode a record, naming the record type and field
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Failed to decode {record}.{field}: {source}")]
pub struct DecodeError {
    pub record: &'static str,
    pub field: &'static str,
    #[source]
    pub source: DecodeFailure,
}

impl DecodeError {
    pub fn new(record: &'static str, field: &'static str, source: impl Into<DecodeFailure>) -> Self {
        Self {
            record,
            field,
            source: source.into(),
        }
    }

    pub fn constraint(record: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self::new(record, field, DecodeFailure::Constraint(message.into()))
    }

    pub fn unknown_variant(record: &'static str, field: &'static str, tag: u64) -> Self {
        Self::new(record, field, DecodeFailure::UnknownVariant { tag })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(&self.source, DecodeFailure::Cell(e) if e.is_exhausted())
    }

    pub fn is_unknown_variant(&self) -> bool {
        matches!(self.source, DecodeFailure::UnknownVariant { .. })
    }

    pub fn is_address_format(&self) -> bool {
        matches!(self.source, DecodeFailure::Cell(CellError::AddressFormat(_)))
    }
}

/// Errors raised while walking a dictionary before any record is involved.
impl From<CellError> for DecodeError {
    fn from(err: CellError) -> Self {
        Self::new("Dictionary", "entry", err)
    }
}

/// Attach record and field names to a low-level result.
pub(crate) trait Context<T> {
    fn ctx(self, record: &'static str, field: &'static str) -> Result<T, DecodeError>;
}

impl<T, E: Into<DecodeFailure>> Context<T> for Result<T, E> {
    fn ctx(self, record: &'static str, field: &'static str) -> Result<T, DecodeError> {
        self.map_err(|e| DecodeError::new(record, field, e))
    }
}
