//! Codecs layered on top of single cells
//!
//! - `boc`: bag-of-cells byte serialization
//! - `snake`: byte buffers spread over a chain of cells
//! - `dict`: `HashmapE` binary tries

pub mod boc;
pub mod dict;
pub mod snake;

pub use boc::{
    deserialize, deserialize_with, from_base64, from_boc, from_boc_with, from_hex, from_text,
    serialize, to_base64, to_boc, to_hex, BocOptions, BOC_MAGIC,
};
pub use dict::{sha256_key, DictKey, DictValue, Dictionary};
pub use snake::{decode_snake, encode_snake, load_bytes_tail, store_bytes_tail, SNAKE_CHUNK_BYTES};
