//! Small value types shared by several records

use std::fmt;

use csm_cell::{Address, Builder, CellError, Slice};
use serde::{Deserialize, Serialize};

use super::CellCodec;
use crate::errors::{Context, DecodeError};

/// Matrix level, 1 to 6, stored in 3 bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MatrixLevel(u8);

impl MatrixLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    pub const BITS: usize = 3;

    pub fn new(m: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&m).then_some(Self(m))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index into per-level tables.
    pub fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    pub fn previous(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    pub(crate) fn store(self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_uint(self.0 as u64, Self::BITS)?;
        Ok(())
    }

    pub(crate) fn load(
        slice: &mut Slice,
        record: &'static str,
        field: &'static str,
    ) -> Result<Self, DecodeError> {
        let m = slice.load_uint(Self::BITS).ctx(record, field)? as u8;
        Self::new(m).ok_or_else(|| {
            DecodeError::constraint(record, field, format!("level {m} outside 1..=6"))
        })
    }
}

impl TryFrom<u8> for MatrixLevel {
    type Error = String;

    fn try_from(m: u8) -> Result<Self, Self::Error> {
        Self::new(m).ok_or_else(|| format!("matrix level {m} outside 1..=6"))
    }
}

impl From<MatrixLevel> for u8 {
    fn from(level: MatrixLevel) -> Self {
        level.0
    }
}

impl fmt::Display for MatrixLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Child slot under a parent place
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn bit(self) -> bool {
        matches!(self, Self::Right)
    }

    pub fn index(self) -> usize {
        self.bit() as usize
    }
}

/// A slot in the tree: the parent place and the side under it
///
/// | Field  | Type       |
/// |--------|------------|
/// | parent | MsgAddress |
/// | side   | uint1      |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlacePos {
    pub parent: Address,
    pub side: Side,
}

impl PlacePos {
    pub fn new(parent: Address, side: Side) -> Self {
        Self { parent, side }
    }
}

impl CellCodec for PlacePos {
    const NAME: &'static str = "PlacePos";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_address(&self.parent)?
            .store_bit(self.side.bit())?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let parent = slice.load_address().ctx(Self::NAME, "parent")?;
        let side = Side::from_bit(slice.load_bit().ctx(Self::NAME, "side")?);
        Ok(Self { parent, side })
    }
}

/// Administrative info kept in its own cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub admin: Address,
}

impl CellCodec for SecurityInfo {
    const NAME: &'static str = "SecurityInfo";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_address(&self.admin)?;
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let admin = slice.load_address().ctx(Self::NAME, "admin")?;
        Ok(Self { admin })
    }
}

/// One Coins amount per matrix level (fees, prices)
///
/// Six consecutive `Coins` fields, level 1 first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAmounts(pub [u128; 6]);

impl LevelAmounts {
    pub fn for_level(&self, level: MatrixLevel) -> u128 {
        self.0[level.index()]
    }

    /// Whole TON amounts converted to nanotons.
    pub fn from_tons(tons: [u64; 6]) -> Self {
        Self(tons.map(|t| t as u128 * 1_000_000_000))
    }
}

impl CellCodec for LevelAmounts {
    const NAME: &'static str = "LevelAmounts";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        for amount in self.0 {
            builder.store_coins(amount)?;
        }
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        const FIELDS: [&str; 6] = ["m1", "m2", "m3", "m4", "m5", "m6"];
        let mut amounts = [0u128; 6];
        for (amount, field) in amounts.iter_mut().zip(FIELDS) {
            *amount = slice.load_coins().ctx(Self::NAME, field)?;
        }
        Ok(Self(amounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert!(MatrixLevel::new(0).is_none());
        assert!(MatrixLevel::new(7).is_none());
        let m1 = MatrixLevel::new(1).unwrap();
        assert_eq!(m1.previous(), None);
        assert_eq!(MatrixLevel::new(3).unwrap().previous(), MatrixLevel::new(2));
        assert_eq!(MatrixLevel::all().count(), 6);
        assert_eq!(m1.to_string(), "m1");
    }

    #[test]
    fn test_level_decode_rejects_zero() {
        let mut builder = Builder::new();
        builder.store_uint(0, 3).unwrap();
        let cell = builder.end_cell().unwrap();
        let err = MatrixLevel::load(&mut Slice::from(&cell), "PlaceRecord", "m").unwrap_err();
        assert_eq!(err.field, "m");
        assert!(matches!(err.source, crate::errors::DecodeFailure::Constraint(_)));
    }

    #[test]
    fn test_place_pos_layout() {
        let pos = PlacePos::new(Address::new(0, [1; 32]), Side::Right);
        let cell = pos.to_cell().unwrap();
        assert_eq!(cell.bit_len(), 268);
        assert_eq!(PlacePos::from_cell(&cell).unwrap(), pos);
    }

    #[test]
    fn test_level_amounts() {
        let prices = LevelAmounts::from_tons([15, 45, 100, 240, 500, 1200]);
        assert_eq!(prices.for_level(MatrixLevel::new(2).unwrap()), 45_000_000_000);
        let back = LevelAmounts::from_cell(&prices.to_cell().unwrap()).unwrap();
        assert_eq!(back, prices);
    }

    #[test]
    fn test_level_serde() {
        let level: MatrixLevel = serde_json::from_str("4").unwrap();
        assert_eq!(level.get(), 4);
        assert!(serde_json::from_str::<MatrixLevel>("9").is_err());
    }
}
