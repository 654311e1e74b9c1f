//! Snake strings
//!
//! A byte buffer split into 127-byte chunks, one chunk per cell, each cell
//! pointing at the next through its single reference.
//!
//! INVARIANTS:
//! - every chain cell is byte-aligned and holds at most one reference
//! - decoding visits at most `max_cells` cells

use crate::domain::{Builder, Cell, CellError, CellRef, Slice, SnakeError};

/// Bytes per chain cell (1023 bits rounded down to whole bytes).
pub const SNAKE_CHUNK_BYTES: usize = 127;

/// Encode a buffer as a snake chain. The empty buffer is one empty cell.
pub fn encode_snake(data: &[u8]) -> Result<CellRef, CellError> {
    let mut next: Option<CellRef> = None;
    for chunk in data.chunks(SNAKE_CHUNK_BYTES).rev() {
        let mut builder = Builder::new();
        builder.store_bytes(chunk)?;
        if let Some(tail) = next.take() {
            builder.store_ref(tail)?;
        }
        next = Some(builder.end_cell()?);
    }
    Ok(next.unwrap_or_else(Cell::empty))
}

/// Decode a snake chain starting at `cell`.
pub fn decode_snake(cell: &CellRef, max_cells: usize) -> Result<Vec<u8>, CellError> {
    let mut slice = Slice::from(cell);
    load_bytes_tail(&mut slice, max_cells)
}

/// Store bytes in the builder's free whole bytes, continuing into a snake
/// chain held by one new reference.
pub fn store_bytes_tail(builder: &mut Builder, data: &[u8]) -> Result<(), CellError> {
    let free = builder.available_bits() / 8;
    if data.len() <= free {
        builder.store_bytes(data)?;
        return Ok(());
    }
    if builder.available_refs() == 0 {
        return Err(CellError::RefOverflow {
            current: builder.ref_count(),
        });
    }
    let (head, rest) = data.split_at(free);
    let tail = encode_snake(rest)?;
    builder.store_bytes(head)?;
    builder.store_ref(tail)?;
    Ok(())
}

/// Read the rest of `slice` and the chain hanging off it.
pub fn load_bytes_tail(slice: &mut Slice, max_cells: usize) -> Result<Vec<u8>, CellError> {
    let mut out = Vec::new();
    let mut visited = 1;
    read_chain_cell(slice, &mut out)?;

    while slice.remaining_refs() > 0 {
        if slice.remaining_refs() > 1 {
            return Err(SnakeError::Branching {
                refs: slice.remaining_refs(),
            }
            .into());
        }
        visited += 1;
        if visited > max_cells {
            return Err(SnakeError::TooLong { max: max_cells }.into());
        }
        *slice = slice.load_ref_slice()?;
        read_chain_cell(slice, &mut out)?;
    }
    Ok(out)
}

fn read_chain_cell(slice: &mut Slice, out: &mut Vec<u8>) -> Result<(), CellError> {
    let bits = slice.remaining_bits();
    if bits % 8 != 0 {
        return Err(SnakeError::NotByteAligned { bits }.into());
    }
    out.extend(slice.load_bytes(bits / 8)?);
    Ok(())
}
