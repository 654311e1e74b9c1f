//! Bag of cells
//!
//! Layout (`serialized_boc#b5ee9c72`):
//!
//! | Field            | Size                                 |
//! |------------------|--------------------------------------|
//! | magic            | 4 bytes                              |
//! | flags            | 1 byte: idx, crc32c, cache, 00, size |
//! | off_bytes        | 1 byte                               |
//! | cells            | size bytes                           |
//! | roots            | size bytes                           |
//! | absent           | size bytes (always 0)                |
//! | tot_cells_size   | off_bytes                            |
//! | root_list        | roots * size bytes                   |
//! | index            | cells * off_bytes (optional)         |
//! | cell_data        | tot_cells_size                       |
//! | crc32c           | 4 bytes little-endian (optional)     |
//!
//! Cells are deduplicated by representation hash and stored parents first,
//! so every reference points at a higher index. The reader enforces that
//! ordering, which rules out cycles in untrusted input.

use std::collections::{HashMap, HashSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crc::{Crc, CRC_32_ISCSI};

use crate::config::CodecLimits;
use crate::domain::{Bits, BocError, Cell, CellError, CellRef};

pub const BOC_MAGIC: u32 = 0xb5ee9c72;

const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;
const SIZE_MASK: u8 = 0x07;

/// Serializer switches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BocOptions {
    pub has_idx: bool,
    pub has_crc32c: bool,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self {
            has_idx: false,
            has_crc32c: true,
        }
    }
}

/// Serialize one or more roots into a single bag.
pub fn serialize(roots: &[CellRef], options: BocOptions) -> Result<Vec<u8>, CellError> {
    let order = topological_order(roots);
    let index: HashMap<[u8; 32], usize> = order
        .iter()
        .enumerate()
        .map(|(i, cell)| (*cell.hash(), i))
        .collect();

    let size_bytes = byte_width(order.len()).max(1);
    let cell_sizes: Vec<usize> = order
        .iter()
        .map(|cell| 2 + cell.bit_len().div_ceil(8) + cell.refs().len() * size_bytes)
        .collect();
    let total: usize = cell_sizes.iter().sum();
    let off_bytes = byte_width(total).max(1);

    let mut out = Vec::with_capacity(total + 32);
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());

    let mut flags = size_bytes as u8;
    if options.has_idx {
        flags |= FLAG_HAS_IDX;
    }
    if options.has_crc32c {
        flags |= FLAG_HAS_CRC32C;
    }
    out.push(flags);
    out.push(off_bytes as u8);
    write_uint(&mut out, order.len(), size_bytes);
    write_uint(&mut out, roots.len(), size_bytes);
    write_uint(&mut out, 0, size_bytes);
    write_uint(&mut out, total, off_bytes);
    for root in roots {
        write_uint(&mut out, index[root.hash()], size_bytes);
    }

    if options.has_idx {
        let mut offset = 0;
        for size in &cell_sizes {
            offset += size;
            write_uint(&mut out, offset, off_bytes);
        }
    }

    for cell in &order {
        out.extend_from_slice(&cell.descriptors());
        out.extend_from_slice(&cell.padded_data());
        for child in cell.refs() {
            write_uint(&mut out, index[child.hash()], size_bytes);
        }
    }

    if options.has_crc32c {
        let crc = CRC32C.checksum(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }
    Ok(out)
}

/// Parents before children, shared cells once, first root first.
fn topological_order(roots: &[CellRef]) -> Vec<CellRef> {
    fn visit(cell: &CellRef, seen: &mut HashSet<[u8; 32]>, post: &mut Vec<CellRef>) {
        if !seen.insert(*cell.hash()) {
            return;
        }
        for child in cell.refs().iter().rev() {
            visit(child, seen, post);
        }
        post.push(cell.clone());
    }

    let mut seen = HashSet::new();
    let mut post = Vec::new();
    for root in roots.iter().rev() {
        visit(root, &mut seen, &mut post);
    }
    post.reverse();
    post
}

fn byte_width(value: usize) -> usize {
    (usize::BITS - value.leading_zeros()).div_ceil(8) as usize
}

fn write_uint(out: &mut Vec<u8>, value: usize, bytes: usize) {
    let be = (value as u64).to_be_bytes();
    out.extend_from_slice(&be[8 - bytes..]);
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], BocError> {
        let end = self.pos.checked_add(n).ok_or(BocError::Truncated(what))?;
        let slice = self.data.get(self.pos..end).ok_or(BocError::Truncated(what))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, BocError> {
        Ok(self.bytes(1, what)?[0])
    }

    fn uint(&mut self, n: usize, what: &'static str) -> Result<usize, BocError> {
        Ok(self
            .bytes(n, what)?
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize))
    }
}

struct RawCell {
    bits: Bits,
    refs: Vec<usize>,
}

/// Parse a bag with default limits.
pub fn deserialize(bytes: &[u8]) -> Result<Vec<CellRef>, CellError> {
    deserialize_with(bytes, &CodecLimits::default())
}

pub fn deserialize_with(bytes: &[u8], limits: &CodecLimits) -> Result<Vec<CellRef>, CellError> {
    if bytes.len() > limits.max_boc_bytes {
        return Err(BocError::TooLarge {
            size: bytes.len(),
            max: limits.max_boc_bytes,
        }
        .into());
    }

    let mut reader = Reader {
        data: bytes,
        pos: 0,
    };
    let magic = reader.uint(4, "magic")? as u32;
    if magic != BOC_MAGIC {
        return Err(BocError::Magic(magic).into());
    }

    let flags = reader.u8("flags")?;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc = flags & FLAG_HAS_CRC32C != 0;
    if flags & FLAG_HAS_CACHE_BITS != 0 && !has_idx {
        return Err(BocError::CacheBitsWithoutIndex.into());
    }
    let size_bytes = (flags & SIZE_MASK) as usize;
    if size_bytes == 0 || size_bytes > 4 {
        return Err(BocError::SizeField {
            field: "size_bytes",
            value: size_bytes,
        }
        .into());
    }
    let off_bytes = reader.u8("off_bytes")? as usize;
    if off_bytes == 0 || off_bytes > 8 {
        return Err(BocError::SizeField {
            field: "off_bytes",
            value: off_bytes,
        }
        .into());
    }

    let cell_count = reader.uint(size_bytes, "cell count")?;
    if cell_count > limits.max_boc_cells {
        return Err(BocError::TooManyCells {
            count: cell_count,
            max: limits.max_boc_cells,
        }
        .into());
    }
    let root_count = reader.uint(size_bytes, "root count")?;
    let absent = reader.uint(size_bytes, "absent count")?;
    if absent != 0 {
        return Err(BocError::Absent.into());
    }
    let total_size = reader.uint(off_bytes, "total size")?;

    let mut root_indices = Vec::with_capacity(root_count.min(cell_count));
    for _ in 0..root_count {
        let root = reader.uint(size_bytes, "root list")?;
        if root >= cell_count {
            return Err(BocError::Root(root).into());
        }
        root_indices.push(root);
    }
    if has_idx {
        let index_len = cell_count
            .checked_mul(off_bytes)
            .ok_or(BocError::Truncated("index"))?;
        reader.bytes(index_len, "index")?;
    }

    let data_start = reader.pos;
    let mut raw_cells = Vec::with_capacity(cell_count);
    for i in 0..cell_count {
        raw_cells.push(read_raw_cell(&mut reader, i, cell_count, size_bytes)?);
    }
    if reader.pos - data_start != total_size {
        return Err(BocError::DataSize {
            declared: total_size,
            actual: reader.pos - data_start,
        }
        .into());
    }

    if has_crc {
        let computed = CRC32C.checksum(&bytes[..reader.pos]);
        let stored_bytes = reader.bytes(4, "crc32c")?;
        let stored = u32::from_le_bytes([
            stored_bytes[0],
            stored_bytes[1],
            stored_bytes[2],
            stored_bytes[3],
        ]);
        if stored != computed {
            return Err(BocError::Crc { stored, computed }.into());
        }
    }
    if reader.pos != bytes.len() {
        return Err(BocError::TrailingBytes(bytes.len() - reader.pos).into());
    }

    // References only point forward, so building back to front always
    // finds children already in the arena.
    let mut arena: Vec<Option<CellRef>> = vec![None; cell_count];
    for (i, raw) in raw_cells.into_iter().enumerate().rev() {
        let mut refs = Vec::with_capacity(raw.refs.len());
        for target in raw.refs {
            let child = arena[target]
                .clone()
                .ok_or(BocError::DanglingReference { cell: i, target })?;
            refs.push(child);
        }
        arena[i] = Some(Cell::new(raw.bits, refs)?);
    }

    let roots = root_indices
        .into_iter()
        .map(|i| arena[i].clone().ok_or(BocError::Root(i)))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::trace!(cells = cell_count, roots = roots.len(), "decoded bag of cells");
    Ok(roots)
}

fn read_raw_cell(
    reader: &mut Reader<'_>,
    index: usize,
    cell_count: usize,
    size_bytes: usize,
) -> Result<RawCell, BocError> {
    let d1 = reader.u8("cell descriptor")?;
    let d2 = reader.u8("cell descriptor")?;

    if d1 & 0x08 != 0 {
        return Err(BocError::Exotic(index));
    }
    let ref_count = (d1 & 0x07) as usize;
    if ref_count > 4 {
        return Err(BocError::SizeField {
            field: "refs",
            value: ref_count,
        });
    }
    if d1 & 0x10 != 0 {
        // Stored hashes and depths, one pair per level.
        let level = (d1 >> 5) as usize;
        reader.bytes((level + 1) * (32 + 2), "stored hashes")?;
    }

    let data_len = (d2 as usize).div_ceil(2);
    let data = reader.bytes(data_len, "cell data")?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data.last().copied().unwrap_or(0);
        if last == 0 {
            return Err(BocError::Padding(index));
        }
        data_len * 8 - (last.trailing_zeros() as usize + 1)
    };
    let mut bits = Bits::from_vec(data);
    bits.truncate(bit_len);

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = reader.uint(size_bytes, "cell references")?;
        if target >= cell_count {
            return Err(BocError::DanglingReference {
                cell: index,
                target,
            });
        }
        if target <= index {
            return Err(BocError::BackReference {
                cell: index,
                target,
            });
        }
        refs.push(target);
    }
    Ok(RawCell { bits, refs })
}

/// Single root with CRC.
pub fn to_boc(cell: &CellRef) -> Result<Vec<u8>, CellError> {
    serialize(std::slice::from_ref(cell), BocOptions::default())
}

/// Parse a bag that must hold exactly one root.
pub fn from_boc(bytes: &[u8]) -> Result<CellRef, CellError> {
    from_boc_with(bytes, &CodecLimits::default())
}

pub fn from_boc_with(bytes: &[u8], limits: &CodecLimits) -> Result<CellRef, CellError> {
    let mut roots = deserialize_with(bytes, limits)?;
    if roots.len() != 1 {
        return Err(BocError::RootCount(roots.len()).into());
    }
    Ok(roots.remove(0))
}

pub fn to_hex(cell: &CellRef) -> Result<String, CellError> {
    to_boc(cell).map(hex::encode)
}

pub fn to_base64(cell: &CellRef) -> Result<String, CellError> {
    to_boc(cell).map(|bytes| STANDARD.encode(bytes))
}

pub fn from_hex(text: &str) -> Result<CellRef, CellError> {
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(text).map_err(|e| BocError::Encoding(e.to_string()))?;
    from_boc(&bytes)
}

pub fn from_base64(text: &str) -> Result<CellRef, CellError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| BocError::Encoding(e.to_string()))?;
    from_boc(&bytes)
}

/// Accept either hex or base64, as chain query backends return both.
pub fn from_text(text: &str) -> Result<CellRef, CellError> {
    let trimmed = text.trim();
    let looks_hex = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .chars()
        .all(|c| c.is_ascii_hexdigit());
    if looks_hex {
        from_hex(trimmed)
    } else {
        from_base64(trimmed)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::Builder;
    use proptest::prelude::*;
    use proptest::sample::Index;

    type NodeShape = (u64, usize, Vec<Index>);

    /// Cells built bottom-up, each referencing only earlier ones.
    fn build_dag(specs: &[NodeShape]) -> Vec<CellRef> {
        let mut cells: Vec<CellRef> = Vec::with_capacity(specs.len());
        for (i, (value, width, refs)) in specs.iter().enumerate() {
            let value = if *width == 64 {
                *value
            } else {
                value & ((1u64 << width) - 1)
            };
            let mut builder = Builder::new();
            builder.store_uint(value, *width).unwrap();
            if i > 0 {
                for index in refs {
                    builder.store_ref(cells[index.index(i)].clone()).unwrap();
                }
            }
            cells.push(builder.end_cell().unwrap());
        }
        cells
    }

    fn node() -> impl Strategy<Value = NodeShape> {
        (any::<u64>(), 0usize..=64, prop::collection::vec(any::<Index>(), 0..=4))
    }

    proptest! {
        #[test]
        fn dag_roundtrip(
            specs in prop::collection::vec(node(), 1..24),
            extra_root in any::<Index>(),
            has_idx in any::<bool>(),
            has_crc32c in any::<bool>(),
        ) {
            let cells = build_dag(&specs);
            let roots = vec![
                cells[cells.len() - 1].clone(),
                cells[extra_root.index(cells.len())].clone(),
            ];
            let bytes = serialize(&roots, BocOptions { has_idx, has_crc32c })
                .unwrap_or_else(|e| panic!("serialize failed: {e}"));
            prop_assert_eq!(deserialize(&bytes), Ok(roots));
        }
    }
}
