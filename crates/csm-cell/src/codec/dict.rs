//! Dictionaries (`HashmapE n X`)
//!
//! A sorted map stored as a binary trie of cells. Each node holds a label
//! (the common prefix of the keys below it) followed either by the leaf
//! value or by two references, left for next bit 0 and right for next bit 1.
//!
//! Labels use the shortest of three encodings:
//! - `hml_short$0`: unary length then the bits
//! - `hml_long$10`: length in `bitlen(m)` bits then the bits
//! - `hml_same$11`: one repeated bit then the length
//!
//! Key widths: 32-bit integers, and 256-bit SHA-256 digests of attribute
//! names.

use std::collections::BTreeMap;

use bitvec::prelude::*;
use sha2::{Digest, Sha256};

use crate::domain::{Bits, Builder, CellError, CellRef, DictError, Slice};

/// Fixed-width dictionary key
pub trait DictKey: Ord + Clone {
    /// Key width in bits
    const BITS: usize;

    fn to_bits(&self) -> Bits;

    fn from_bits(bits: &BitSlice<u8, Msb0>) -> Result<Self, CellError>;
}

/// Dictionary value codec
///
/// `Error` lets record types surface their own decode errors from inside a
/// dictionary walk.
pub trait DictValue: Sized {
    type Error: From<CellError>;

    fn store_value(&self, builder: &mut Builder) -> Result<(), CellError>;

    fn load_value(slice: &mut Slice) -> Result<Self, Self::Error>;
}

impl DictKey for u32 {
    const BITS: usize = 32;

    fn to_bits(&self) -> Bits {
        self.to_be_bytes().view_bits::<Msb0>().to_bitvec()
    }

    fn from_bits(bits: &BitSlice<u8, Msb0>) -> Result<Self, CellError> {
        check_key_len(bits, <Self as DictKey>::BITS)?;
        Ok(bits
            .iter()
            .by_vals()
            .fold(0u32, |acc, bit| (acc << 1) | bit as u32))
    }
}

impl DictKey for [u8; 32] {
    const BITS: usize = 256;

    fn to_bits(&self) -> Bits {
        self.view_bits::<Msb0>().to_bitvec()
    }

    fn from_bits(bits: &BitSlice<u8, Msb0>) -> Result<Self, CellError> {
        check_key_len(bits, Self::BITS)?;
        let mut out = [0u8; 32];
        for (i, bit) in bits.iter().by_vals().enumerate() {
            if bit {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Ok(out)
    }
}

fn check_key_len(bits: &BitSlice<u8, Msb0>, expected: usize) -> Result<(), CellError> {
    if bits.len() != expected {
        return Err(DictError::KeyLength {
            expected,
            actual: bits.len(),
        }
        .into());
    }
    Ok(())
}

/// Values stored as a reference to their own cell.
impl DictValue for CellRef {
    type Error = CellError;

    fn store_value(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_ref(self.clone())?;
        Ok(())
    }

    fn load_value(slice: &mut Slice) -> Result<Self, CellError> {
        slice.load_ref()
    }
}

impl DictValue for u32 {
    type Error = CellError;

    fn store_value(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_uint(*self as u64, 32)?;
        Ok(())
    }

    fn load_value(slice: &mut Slice) -> Result<Self, CellError> {
        Ok(slice.load_uint(32)? as u32)
    }
}

/// SHA-256 key of an attribute name.
pub fn sha256_key(name: &str) -> [u8; 32] {
    Sha256::digest(name.as_bytes()).into()
}

/// Sparse map with a trie cell encoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary<K: DictKey, V> {
    entries: BTreeMap<K, V>,
}

impl<K: DictKey, V> Default for Dictionary<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: DictKey, V> FromIterator<(K, V)> for Dictionary<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K: DictKey, V> Dictionary<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace, returning the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}

impl<K: DictKey, V: DictValue> Dictionary<K, V> {
    /// Build the trie root cell, `None` for an empty dictionary.
    pub fn build_root(&self) -> Result<Option<CellRef>, CellError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut builder = Builder::new();
        self.store_direct(&mut builder)?;
        builder.end_cell().map(Some)
    }

    /// Write the trie root inline (`Hashmap n X`, never empty).
    pub fn store_direct(&self, builder: &mut Builder) -> Result<(), CellError> {
        if self.is_empty() {
            return Err(DictError::Empty.into());
        }
        let keys: Vec<Bits> = self.entries.keys().map(DictKey::to_bits).collect();
        let entries: Vec<(&BitSlice<u8, Msb0>, &V)> = keys
            .iter()
            .map(|bits| bits.as_bitslice())
            .zip(self.entries.values())
            .collect();
        write_node(builder, &entries, K::BITS)
    }

    /// Write `HashmapE`: presence bit plus the optional root reference.
    pub fn store_maybe(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder.store_maybe_ref(self.build_root()?)?;
        Ok(())
    }

    /// Parse a trie rooted at `cell`.
    pub fn load_root(cell: &CellRef) -> Result<Self, V::Error> {
        Self::load_direct(&mut Slice::from(cell))
    }

    /// Parse a trie whose root node starts at the slice cursor.
    pub fn load_direct(slice: &mut Slice) -> Result<Self, V::Error> {
        let mut entries = BTreeMap::<K, V>::new();
        let mut prefix = Bits::with_capacity(K::BITS);
        read_node::<K, V>(slice, K::BITS, &mut prefix, &mut entries)?;
        Ok(Self { entries })
    }

    /// Parse `HashmapE`.
    pub fn load_maybe(slice: &mut Slice) -> Result<Self, V::Error> {
        match slice.load_maybe_ref()? {
            Some(root) => Self::load_root(&root),
            None => Ok(Self::new()),
        }
    }
}

fn write_node<V: DictValue>(
    builder: &mut Builder,
    entries: &[(&BitSlice<u8, Msb0>, &V)],
    remaining: usize,
) -> Result<(), CellError> {
    if let [(key, value)] = entries {
        write_label(builder, key, remaining)?;
        return value.store_value(builder);
    }

    let first = entries[0].0;
    let prefix_len = entries[1..]
        .iter()
        .map(|(key, _)| common_prefix(first, key))
        .min()
        .unwrap_or(0);
    write_label(builder, &first[..prefix_len], remaining)?;

    let mut left = Vec::new();
    let mut right = Vec::new();
    for &(key, value) in entries {
        let rest = &key[prefix_len + 1..];
        if key[prefix_len] {
            right.push((rest, value));
        } else {
            left.push((rest, value));
        }
    }

    for side in [left, right] {
        let mut child = Builder::new();
        write_node(&mut child, &side, remaining - prefix_len - 1)?;
        builder.store_ref(child.end_cell()?)?;
    }
    Ok(())
}

fn common_prefix(a: &BitSlice<u8, Msb0>, b: &BitSlice<u8, Msb0>) -> usize {
    a.iter()
        .by_vals()
        .zip(b.iter().by_vals())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Bits needed to store a label length of at most `max`.
fn length_bits(max: usize) -> usize {
    (usize::BITS - max.leading_zeros()) as usize
}

fn write_label(
    builder: &mut Builder,
    label: &BitSlice<u8, Msb0>,
    max: usize,
) -> Result<(), CellError> {
    let len = label.len();
    let k = length_bits(max);

    let short = 2 * len + 2;
    let long = 2 + k + len;
    let same = 3 + k;
    let uniform = label.not_any() || label.all();

    if uniform && same < short.min(long) {
        builder.store_uint(0b11, 2)?;
        builder.store_bit(label.first().map(|b| *b).unwrap_or(false))?;
        builder.store_uint(len as u64, k)?;
    } else if long < short {
        builder.store_uint(0b10, 2)?;
        builder.store_uint(len as u64, k)?;
        builder.store_bits(label)?;
    } else {
        builder.store_bit(false)?;
        for _ in 0..len {
            builder.store_bit(true)?;
        }
        builder.store_bit(false)?;
        builder.store_bits(label)?;
    }
    Ok(())
}

fn read_label(slice: &mut Slice, max: usize) -> Result<Bits, CellError> {
    let too_long = |length| DictError::LabelTooLong {
        length,
        remaining: max,
    };

    if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
            if len > max {
                return Err(too_long(len).into());
            }
        }
        return slice.load_bits(len);
    }

    let k = length_bits(max);
    if !slice.load_bit()? {
        let len = slice.load_uint(k)? as usize;
        if len > max {
            return Err(too_long(len).into());
        }
        slice.load_bits(len)
    } else {
        let bit = slice.load_bit()?;
        let len = slice.load_uint(k)? as usize;
        if len > max {
            return Err(too_long(len).into());
        }
        Ok(BitVec::repeat(bit, len))
    }
}

fn read_node<K: DictKey, V: DictValue>(
    slice: &mut Slice,
    remaining: usize,
    prefix: &mut Bits,
    out: &mut BTreeMap<K, V>,
) -> Result<(), V::Error> {
    let label = read_label(slice, remaining)?;
    let base = prefix.len();
    prefix.extend_from_bitslice(&label);

    if label.len() == remaining {
        let key = K::from_bits(prefix)?;
        let value = V::load_value(slice)?;
        out.insert(key, value);
    } else {
        let child_remaining = remaining - label.len() - 1;
        let left = slice.load_ref()?;
        let right = slice.load_ref()?;
        for (bit, child) in [(false, left), (true, right)] {
            prefix.push(bit);
            read_node(&mut Slice::new(child), child_remaining, prefix, out)?;
            prefix.pop();
        }
    }

    prefix.truncate(base);
    Ok(())
}
