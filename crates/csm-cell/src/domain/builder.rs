//! Cell writer
//!
//! Every store checks the remaining capacity before touching the buffer, so
//! a failed store leaves the builder unchanged.

use bitvec::prelude::*;

use super::address::Address;
use super::cell::{Bits, Cell, CellRef, MAX_CELL_BITS, MAX_CELL_REFS};
use super::errors::CellError;
use super::slice::Slice;

/// Maximum byte length of a Coins amount (4-bit length prefix).
pub const MAX_COINS_BYTES: usize = 15;

/// Accumulates bits and references for a single cell
#[derive(Clone, Debug, Default)]
pub struct Builder {
    bits: Bits,
    refs: Vec<CellRef>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bits.len()
    }

    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.refs.len()
    }

    fn ensure_bits(&self, requested: usize) -> Result<(), CellError> {
        let available = self.available_bits();
        if requested > available {
            return Err(CellError::BitOverflow {
                requested,
                available,
            });
        }
        Ok(())
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.bits.push(bit);
        Ok(self)
    }

    /// Store an unsigned integer in `bits` bits, big-endian.
    ///
    /// Widths above 64 are zero-extended.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        self.ensure_bits(bits)?;
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueOutOfRange {
                value: value.to_string(),
                bits,
            });
        }
        for i in (0..bits).rev() {
            self.bits.push(i < 64 && (value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store a signed integer in `bits` bits, two's complement.
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self, CellError> {
        self.ensure_bits(bits)?;
        if bits == 0 || bits > 64 {
            return Err(CellError::ValueOutOfRange {
                value: value.to_string(),
                bits,
            });
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::ValueOutOfRange {
                    value: value.to_string(),
                    bits,
                });
            }
        }
        let raw = value as u64;
        for i in (0..bits).rev() {
            self.bits.push((raw >> i) & 1 == 1);
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.ensure_bits(bytes.len() * 8)?;
        self.bits.extend_from_bitslice(bytes.view_bits::<Msb0>());
        Ok(self)
    }

    pub fn store_bits(&mut self, bits: &BitSlice<u8, Msb0>) -> Result<&mut Self, CellError> {
        self.ensure_bits(bits.len())?;
        self.bits.extend_from_bitslice(bits);
        Ok(self)
    }

    /// Store a variable-length amount: 4-bit byte count, then the minimal
    /// big-endian bytes. Zero is a bare zero length.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self, CellError> {
        let len = coins_byte_len(amount);
        if len > MAX_COINS_BYTES {
            return Err(CellError::ValueOutOfRange {
                value: amount.to_string(),
                bits: MAX_COINS_BYTES * 8,
            });
        }
        self.ensure_bits(4 + len * 8)?;
        self.store_uint(len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[bytes.len() - len..])
    }

    /// Store `addr_std$10 anycast:0 workchain:int8 hash:bits256`.
    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self, CellError> {
        self.ensure_bits(super::address::ADDRESS_BITS)?;
        self.store_uint(0b10, 2)?;
        self.store_bit(false)?;
        self.store_int(address.workchain() as i64, 8)?;
        self.store_bytes(address.hash())
    }

    /// Store an address or `addr_none$00`.
    pub fn store_maybe_address(&mut self, address: Option<&Address>) -> Result<&mut Self, CellError> {
        match address {
            Some(address) => self.store_address(address),
            None => self.store_uint(0, 2),
        }
    }

    pub fn store_ref(&mut self, cell: CellRef) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::RefOverflow {
                current: self.refs.len(),
            });
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Presence bit followed by an optional reference.
    pub fn store_maybe_ref(&mut self, cell: Option<CellRef>) -> Result<&mut Self, CellError> {
        match cell {
            Some(cell) => {
                if self.refs.len() >= MAX_CELL_REFS {
                    return Err(CellError::RefOverflow {
                        current: self.refs.len(),
                    });
                }
                self.store_bit(true)?;
                self.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// Append the unread remainder of a slice (bits and references).
    pub fn store_slice(&mut self, slice: &Slice) -> Result<&mut Self, CellError> {
        let refs = slice.unread_refs();
        if refs.len() > self.available_refs() {
            return Err(CellError::RefOverflow {
                current: self.refs.len(),
            });
        }
        self.store_bits(slice.unread_bits())?;
        self.refs.extend(refs.iter().cloned());
        Ok(self)
    }

    /// Store a UTF-8 string: as many whole bytes as fit here, the rest as a
    /// snake chain in one reference.
    pub fn store_string_tail(&mut self, text: &str) -> Result<&mut Self, CellError> {
        crate::codec::snake::store_bytes_tail(self, text.as_bytes())?;
        Ok(self)
    }

    /// Finish the cell.
    pub fn end_cell(self) -> Result<CellRef, CellError> {
        Cell::new(self.bits, self.refs)
    }

    /// Builder pre-filled with the content of an existing cell.
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            bits: cell.bits().to_bitvec(),
            refs: cell.refs().to_vec(),
        }
    }
}

/// Minimal number of bytes needed to represent `amount` (0 for zero).
pub(crate) fn coins_byte_len(amount: u128) -> usize {
    (128 - amount.leading_zeros() as usize).div_ceil(8)
}
