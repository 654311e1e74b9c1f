//! Immutable bit-cell
//!
//! A cell holds up to 1023 data bits and up to 4 references to other cells.
//! Children are shared through `Arc` and must exist before their parent is
//! built, so a cell graph is always acyclic.
//!
//! INVARIANTS:
//! - bit length <= 1023, reference count <= 4, depth <= 1024
//! - `hash` is the representation hash of an ordinary level-0 cell

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitvec::prelude::*;
use sha2::{Digest, Sha256};

use super::errors::CellError;

/// Maximum number of data bits in one cell
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references in one cell
pub const MAX_CELL_REFS: usize = 4;

/// Maximum depth of a cell tree
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Bit storage used by builders and cells (most significant bit first)
pub type Bits = BitVec<u8, Msb0>;

/// Shared handle to an immutable cell
pub type CellRef = Arc<Cell>;

/// Immutable node of the cell DAG
#[derive(Clone)]
pub struct Cell {
    bits: Bits,
    refs: Vec<CellRef>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Create a cell, validating protocol limits.
    pub fn new(bits: Bits, refs: Vec<CellRef>) -> Result<CellRef, CellError> {
        if bits.len() > MAX_CELL_BITS {
            return Err(CellError::BitOverflow {
                requested: bits.len(),
                available: MAX_CELL_BITS,
            });
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(CellError::RefOverflow {
                current: MAX_CELL_REFS,
            });
        }

        let depth = refs.iter().map(|r| r.depth + 1).max().unwrap_or(0);
        if depth > MAX_CELL_DEPTH {
            return Err(CellError::DepthExceeded {
                depth,
                max: MAX_CELL_DEPTH,
            });
        }

        let hash = representation_hash(&bits, &refs);
        Ok(Arc::new(Self {
            bits,
            refs,
            hash,
            depth,
        }))
    }

    /// The empty cell (no bits, no references).
    pub fn empty() -> CellRef {
        let bits = Bits::new();
        let hash = representation_hash(&bits, &[]);
        Arc::new(Self {
            bits,
            refs: Vec::new(),
            hash,
            depth: 0,
        })
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    pub fn refs(&self) -> &[CellRef] {
        &self.refs
    }

    pub fn reference(&self, index: usize) -> Option<&CellRef> {
        self.refs.get(index)
    }

    /// Representation hash (SHA-256)
    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// 0 for a leaf, otherwise one more than the deepest child.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Descriptor bytes `d1` (reference count) and `d2` (data length class).
    pub fn descriptors(&self) -> [u8; 2] {
        descriptors(self.bits.len(), self.refs.len())
    }

    /// Data bytes with the completion tag appended when not byte-aligned.
    pub fn padded_data(&self) -> Vec<u8> {
        padded_bytes(&self.bits)
    }

    /// Number of cells reachable from this one, counting shared cells once.
    pub fn unique_cell_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut stack: Vec<&Cell> = vec![self];
        while let Some(cell) = stack.pop() {
            if seen.insert(cell.hash) {
                stack.extend(cell.refs.iter().map(|r| r.as_ref()));
            }
        }
        seen.len()
    }
}

pub(crate) fn descriptors(bit_len: usize, ref_count: usize) -> [u8; 2] {
    let d1 = ref_count as u8;
    let d2 = ((bit_len / 8) + bit_len.div_ceil(8)) as u8;
    [d1, d2]
}

/// Pack bits into bytes, appending a single `1` then zeros when the length
/// is not a multiple of eight.
pub(crate) fn padded_bytes(bits: &BitSlice<u8, Msb0>) -> Vec<u8> {
    let len = bits.len();
    let mut out = vec![0u8; len.div_ceil(8)];
    for (i, bit) in bits.iter().by_vals().enumerate() {
        if bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    if len % 8 != 0 {
        out[len / 8] |= 0x80 >> (len % 8);
    }
    out
}

fn representation_hash(bits: &BitSlice<u8, Msb0>, refs: &[CellRef]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(descriptors(bits.len(), refs.len()));
    hasher.update(padded_bytes(bits));
    for child in refs {
        hasher.update(child.depth.to_be_bytes());
    }
    for child in refs {
        hasher.update(child.hash);
    }
    hasher.finalize().into()
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({} bits, {} refs, {})", self.bits.len(), self.refs.len(), &self.hash_hex()[..16])
    }
}

/// Fift-style dump: `x{DEADBEEF_}` with children indented below.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_cell(cell: &Cell, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut data = hex::encode_upper(padded_bytes(&cell.bits));
            data.truncate(cell.bits.len().div_ceil(4));
            if cell.bits.len() % 4 != 0 {
                data.push('_');
            }
            writeln!(f, "{:indent$}x{{{}}}", "", data, indent = indent)?;
            for child in &cell.refs {
                write_cell(child, indent + 1, f)?;
            }
            Ok(())
        }
        write_cell(self, 0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_hash() {
        // Well-known representation hash of the empty ordinary cell.
        let cell = Cell::empty();
        assert_eq!(
            cell.hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
        assert_eq!(cell.depth(), 0);
        assert_eq!(cell.descriptors(), [0, 0]);
    }

    #[test]
    fn test_padding() {
        let mut bits = Bits::new();
        bits.extend([true, false, true]);
        assert_eq!(padded_bytes(&bits), vec![0b1011_0000]);

        let mut aligned = Bits::new();
        aligned.extend([true; 8]);
        assert_eq!(padded_bytes(&aligned), vec![0xff]);
    }

    #[test]
    fn test_limits_enforced() {
        let bits = bitvec![u8, Msb0; 0; MAX_CELL_BITS + 1];
        assert!(matches!(
            Cell::new(bits, Vec::new()),
            Err(CellError::BitOverflow { .. })
        ));

        let refs = vec![Cell::empty(); MAX_CELL_REFS + 1];
        assert!(matches!(
            Cell::new(Bits::new(), refs),
            Err(CellError::RefOverflow { .. })
        ));
    }

    #[test]
    fn test_depth_and_sharing() {
        let leaf = Cell::empty();
        let mid = Cell::new(Bits::new(), vec![leaf.clone(), leaf.clone()]).unwrap();
        let root = Cell::new(Bits::new(), vec![mid.clone(), leaf]).unwrap();

        assert_eq!(mid.depth(), 1);
        assert_eq!(root.depth(), 2);
        assert_eq!(root.unique_cell_count(), 3);
    }

    #[test]
    fn test_equality_is_structural() {
        let mut bits = Bits::new();
        bits.extend([true, true, false]);
        let a = Cell::new(bits.clone(), Vec::new()).unwrap();
        let b = Cell::new(bits, Vec::new()).unwrap();
        assert_eq!(a, b, "identical content must hash identically");
        assert_ne!(*a, *Cell::empty());
    }

    #[test]
    fn test_display() {
        let mut bits = Bits::new();
        bits.extend([true, false, true, false, true, true, true, true]);
        let cell = Cell::new(bits, vec![Cell::empty()]).unwrap();
        assert_eq!(cell.to_string(), "x{AF}\n x{}\n");

        let mut odd = Bits::new();
        odd.extend([true, false, true]);
        let cell = Cell::new(odd, Vec::new()).unwrap();
        assert_eq!(cell.to_string(), "x{B_}\n");
    }
}
