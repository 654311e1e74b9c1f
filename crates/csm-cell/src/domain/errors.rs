//! Error types for the cell codec
//!
//! Every `load_*`, `store_*` and deserialization entry point returns one of
//! these. None of them panic on malformed input.

use thiserror::Error;

/// Errors raised while building, reading or serializing cells
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CellError {
    #[error("Cell bit overflow: {requested} bits requested, {available} available")]
    BitOverflow { requested: usize, available: usize },

    #[error("Cell reference overflow: cell already holds {current} references")]
    RefOverflow { current: usize },

    #[error("Slice exhausted: {requested} bits requested, {remaining} remaining")]
    BitsExhausted { requested: usize, remaining: usize },

    #[error("Slice exhausted: no unread references left")]
    RefsExhausted,

    #[error("Value does not fit in {bits} bits: {value}")]
    ValueOutOfRange { value: String, bits: usize },

    #[error("Cell depth {depth} exceeds maximum {max}")]
    DepthExceeded { depth: u16, max: u16 },

    #[error("Invalid address: {0}")]
    AddressFormat(#[from] AddressError),

    #[error("Snake string error: {0}")]
    Snake(#[from] SnakeError),

    #[error("Dictionary error: {0}")]
    Dict(#[from] DictError),

    #[error("Bag-of-cells error: {0}")]
    Boc(#[from] BocError),
}

impl CellError {
    /// True for errors caused by writing too much into one cell.
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::BitOverflow { .. } | Self::RefOverflow { .. })
    }

    /// True for errors caused by reading past the end of a slice.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::BitsExhausted { .. } | Self::RefsExhausted)
    }
}

/// Address parsing failures, both on the wire and in text form
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("unsupported address tag {tag:#04b}")]
    UnsupportedTag { tag: u8 },

    #[error("anycast addresses are not supported")]
    Anycast,

    #[error("expected a non-empty address, found addr_none")]
    Missing,

    #[error("hash must be 32 bytes, got {0}")]
    HashLength(usize),

    #[error("friendly address must decode to 36 bytes, got {0}")]
    FriendlyLength(usize),

    #[error("unknown friendly address flags {0:#04x}")]
    FriendlyTag(u8),

    #[error("checksum mismatch")]
    Checksum,

    #[error("invalid workchain: {0}")]
    Workchain(String),

    #[error("malformed address text: {0}")]
    Malformed(String),
}

/// Snake string chain failures
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnakeError {
    #[error("chain cell holds {bits} bits, not a whole number of bytes")]
    NotByteAligned { bits: usize },

    #[error("chain cell has {refs} references, expected at most one")]
    Branching { refs: usize },

    #[error("chain longer than {max} cells")]
    TooLong { max: usize },

    #[error("chain content is not valid UTF-8")]
    Utf8,
}

/// Dictionary trie failures
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DictError {
    #[error("label length {length} exceeds remaining key length {remaining}")]
    LabelTooLong { length: usize, remaining: usize },

    #[error("key length mismatch: expected {expected} bits, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("a direct dictionary root cannot be empty")]
    Empty,
}

/// Bag-of-cells serialization failures
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BocError {
    #[error("unknown magic {0:#010x}")]
    Magic(u32),

    #[error("input truncated while reading {0}")]
    Truncated(&'static str),

    #[error("crc32c mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    Crc { stored: u32, computed: u32 },

    #[error("invalid size field {field}: {value}")]
    SizeField { field: &'static str, value: usize },

    #[error("cell count {count} exceeds limit {max}")]
    TooManyCells { count: usize, max: usize },

    #[error("input size {size} exceeds limit {max}")]
    TooLarge { size: usize, max: usize },

    #[error("cell {cell} references index {target}, references must point forward")]
    BackReference { cell: usize, target: usize },

    #[error("cell {cell} references index {target} outside the bag")]
    DanglingReference { cell: usize, target: usize },

    #[error("cell {0} is exotic, only ordinary cells are supported")]
    Exotic(usize),

    #[error("root index {0} out of range")]
    Root(usize),

    #[error("absent cells are not supported")]
    Absent,

    #[error("expected exactly one root, found {0}")]
    RootCount(usize),

    #[error("invalid text encoding: {0}")]
    Encoding(String),

    #[error("{0} trailing bytes after the last cell")]
    TrailingBytes(usize),

    #[error("cell {0} has an unaligned data length but no completion tag")]
    Padding(usize),

    #[error("cell data is {actual} bytes, header declares {declared}")]
    DataSize { declared: usize, actual: usize },

    #[error("cache bits flag set without an index")]
    CacheBitsWithoutIndex,
}
