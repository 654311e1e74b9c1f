//! Cell reader
//!
//! A `Slice` is a cursor over one cell's unread bits and references. Reads
//! past the end return `CellError::BitsExhausted` / `RefsExhausted`.

use bitvec::prelude::*;

use super::address::Address;
use super::cell::{Bits, CellRef};
use super::errors::{AddressError, CellError};

#[derive(Clone, Debug)]
pub struct Slice {
    cell: CellRef,
    bit_pos: usize,
    ref_pos: usize,
}

impl From<&CellRef> for Slice {
    fn from(cell: &CellRef) -> Self {
        Self::new(cell.clone())
    }
}

impl Slice {
    pub fn new(cell: CellRef) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// The cell this slice reads from.
    pub fn cell(&self) -> &CellRef {
        &self.cell
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    pub fn unread_bits(&self) -> &BitSlice<u8, Msb0> {
        &self.cell.bits()[self.bit_pos..]
    }

    pub fn unread_refs(&self) -> &[CellRef] {
        &self.cell.refs()[self.ref_pos..]
    }

    fn ensure_bits(&self, requested: usize) -> Result<(), CellError> {
        let remaining = self.remaining_bits();
        if requested > remaining {
            return Err(CellError::BitsExhausted {
                requested,
                remaining,
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&BitSlice<u8, Msb0>, CellError> {
        self.ensure_bits(n)?;
        let start = self.bit_pos;
        self.bit_pos += n;
        Ok(&self.cell.bits()[start..start + n])
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<(), CellError> {
        self.take(n).map(|_| ())
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        let bits = self.take(1)?;
        Ok(bits[0])
    }

    /// Read the next bit without advancing.
    pub fn preload_bit(&self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        Ok(self.cell.bits()[self.bit_pos])
    }

    /// Read an unsigned big-endian integer of at most 64 bits.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::ValueOutOfRange {
                value: format!("u{bits}"),
                bits: 64,
            });
        }
        let slice = self.take(bits)?;
        Ok(slice
            .iter()
            .by_vals()
            .fold(0u64, |acc, bit| (acc << 1) | bit as u64))
    }

    pub fn preload_uint(&self, bits: usize) -> Result<u64, CellError> {
        self.clone().load_uint(bits)
    }

    /// Read a two's complement integer of at most 64 bits.
    pub fn load_int(&mut self, bits: usize) -> Result<i64, CellError> {
        if bits == 0 {
            return Ok(0);
        }
        let raw = self.load_uint(bits)?;
        if bits < 64 && raw >> (bits - 1) & 1 == 1 {
            Ok((raw | (u64::MAX << bits)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    pub fn load_bits(&mut self, n: usize) -> Result<Bits, CellError> {
        Ok(self.take(n)?.to_bitvec())
    }

    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>, CellError> {
        let bits = self.take(n * 8)?;
        Ok(bits
            .chunks(8)
            .map(|byte| byte.iter().by_vals().fold(0u8, |acc, bit| (acc << 1) | bit as u8))
            .collect())
    }

    pub fn load_coins(&mut self) -> Result<u128, CellError> {
        let len = self.load_uint(4)? as usize;
        let bytes = self.load_bytes(len)?;
        Ok(bytes
            .iter()
            .fold(0u128, |acc, byte| (acc << 8) | *byte as u128))
    }

    /// Read a standard internal address. `addr_none` is an error here.
    pub fn load_address(&mut self) -> Result<Address, CellError> {
        match self.load_maybe_address()? {
            Some(address) => Ok(address),
            None => Err(AddressError::Missing.into()),
        }
    }

    /// Read a standard internal address or `addr_none`.
    pub fn load_maybe_address(&mut self) -> Result<Option<Address>, CellError> {
        let tag = self.load_uint(2)? as u8;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(AddressError::Anycast.into());
                }
                let workchain = self.load_int(8)? as i8;
                let bytes = self.load_bytes(32)?;
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes);
                Ok(Some(Address::new(workchain, hash)))
            }
            other => Err(AddressError::UnsupportedTag { tag: other }.into()),
        }
    }

    pub fn load_ref(&mut self) -> Result<CellRef, CellError> {
        let cell = self
            .cell
            .reference(self.ref_pos)
            .cloned()
            .ok_or(CellError::RefsExhausted)?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Load a reference and start reading it.
    pub fn load_ref_slice(&mut self) -> Result<Slice, CellError> {
        self.load_ref().map(Slice::new)
    }

    pub fn load_maybe_ref(&mut self) -> Result<Option<CellRef>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a UTF-8 string stored with `Builder::store_string_tail`.
    pub fn load_string_tail(&mut self) -> Result<String, CellError> {
        let bytes = crate::codec::snake::load_bytes_tail(self, crate::config::DEFAULT_MAX_SNAKE_CELLS)?;
        String::from_utf8(bytes).map_err(|_| super::errors::SnakeError::Utf8.into())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::builder::Builder;
    use proptest::prelude::*;

    fn address() -> impl Strategy<Value = Address> {
        (prop_oneof![Just(0i8), Just(-1i8), any::<i8>()], any::<[u8; 32]>())
            .prop_map(|(workchain, hash)| Address::new(workchain, hash))
    }

    /// Width and a value that fits it unsigned.
    fn uint() -> impl Strategy<Value = (usize, u64)> {
        (1usize..=64, any::<u64>()).prop_map(|(bits, raw)| {
            let value = if bits == 64 { raw } else { raw & ((1u64 << bits) - 1) };
            (bits, value)
        })
    }

    /// Width and a value that fits it in two's complement.
    fn int() -> impl Strategy<Value = (usize, i64)> {
        (1usize..=64, any::<u64>()).prop_map(|(bits, raw)| {
            let shift = 64 - bits;
            (bits, ((raw << shift) as i64) >> shift)
        })
    }

    proptest! {
        #[test]
        fn store_then_load(
            (uint_bits, uint_value) in uint(),
            (int_bits, int_value) in int(),
            coins in 0u128..(1u128 << 120),
            address in address(),
            maybe in proptest::option::of(address()),
        ) {
            let mut builder = Builder::new();
            builder
                .store_uint(uint_value, uint_bits)
                .and_then(|b| b.store_int(int_value, int_bits))
                .and_then(|b| b.store_coins(coins))
                .and_then(|b| b.store_address(&address))
                .and_then(|b| b.store_maybe_address(maybe.as_ref()))
                .unwrap_or_else(|e| panic!("store failed: {e}"));
            let cell = builder.end_cell().unwrap_or_else(|e| panic!("end_cell failed: {e}"));

            let mut slice = Slice::from(&cell);
            prop_assert_eq!(slice.load_uint(uint_bits), Ok(uint_value));
            prop_assert_eq!(slice.load_int(int_bits), Ok(int_value));
            prop_assert_eq!(slice.load_coins(), Ok(coins));
            prop_assert_eq!(slice.load_address(), Ok(address));
            prop_assert_eq!(slice.load_maybe_address(), Ok(maybe));
            prop_assert!(slice.is_empty());
        }
    }
}
