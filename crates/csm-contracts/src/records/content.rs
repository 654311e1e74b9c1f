//! NFT content and the profile fields packed into it
//!
//! Off-chain content is `0x01` followed by a reference to the URI as a snake
//! chain; inline URI bytes after the tag are accepted when reading.
//! On-chain content is `0x00` followed by `HashmapE 256 ^Cell`, keyed by
//! the SHA-256 of the attribute name. Each value cell carries its own
//! tag:
//! - `0x00`: snake string tail (always used when writing)
//! - `0x01`: `Hashmap 32 ^Cell` of snake chunks joined in key order

use std::collections::BTreeMap;

use csm_cell::dict::sha256_key;
use csm_cell::snake::{decode_snake, load_bytes_tail, store_bytes_tail};
use csm_cell::{
    Builder, CellError, CellRef, CodecLimits, Dictionary, Slice, SnakeError,
    DEFAULT_MAX_SNAKE_CELLS,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::CellCodec;
use crate::errors::{Context, DecodeError};

pub const DEFAULT_PROFILE_IMAGE: &str = "https://cryptostylematrix.github.io/frontend/cs-big.png";
pub const PROFILE_DESCRIPTION: &str = "Crypto Style Profile";

const ON_CHAIN_TAG: u64 = 0x00;
const OFF_CHAIN_TAG: u64 = 0x01;

const VALUE_SNAKE: u64 = 0x00;
const VALUE_CHUNKS: u64 = 0x01;

/// Attribute names that may appear in on-chain content.
pub const ON_CHAIN_KEYS: [&str; 15] = [
    "uri",
    "name",
    "description",
    "image",
    "image_data",
    "symbol",
    "decimals",
    "amount_style",
    "render_type",
    "currency",
    "game",
    "content_type",
    "content_url",
    "lottie",
    "attributes",
];

/// Item index derived from a login: SHA-256 of its UTF-8 bytes.
pub fn profile_item_index(login: &str) -> [u8; 32] {
    Sha256::digest(login.as_bytes()).into()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NftContent {
    OffChain { uri: String },
    OnChain { data: BTreeMap<String, String> },
}

impl NftContent {
    /// Decode with an explicit bound on snake chain length.
    pub fn from_cell_with(cell: &CellRef, limits: &CodecLimits) -> Result<Self, DecodeError> {
        Self::load_limited(&mut Slice::from(cell), limits.max_snake_cells)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Self::OnChain { data } => data.get(key).map(String::as_str),
            Self::OffChain { .. } => None,
        }
    }

    fn load_limited(slice: &mut Slice, max_cells: usize) -> Result<Self, DecodeError> {
        let tag = slice.load_uint(8).ctx(Self::NAME, "tag")?;
        match tag {
            OFF_CHAIN_TAG => {
                let bytes = load_bytes_tail(slice, max_cells).ctx(Self::NAME, "uri")?;
                let uri = String::from_utf8(bytes)
                    .map_err(|_| CellError::from(SnakeError::Utf8))
                    .ctx(Self::NAME, "uri")?;
                Ok(Self::OffChain { uri })
            }
            ON_CHAIN_TAG => {
                let cells = Dictionary::<[u8; 32], CellRef>::load_maybe(slice)
                    .ctx(Self::NAME, "data")?;
                let mut data = BTreeMap::new();
                for name in ON_CHAIN_KEYS {
                    if let Some(cell) = cells.get(&sha256_key(name)) {
                        data.insert(name.to_string(), load_value(cell, max_cells)?);
                    }
                }
                if data.len() < cells.len() {
                    tracing::debug!(
                        skipped = cells.len() - data.len(),
                        "ignoring on-chain content entries with unknown keys"
                    );
                }
                Ok(Self::OnChain { data })
            }
            other => Err(DecodeError::unknown_variant(Self::NAME, "tag", other)),
        }
    }
}

fn store_value(text: &str) -> Result<CellRef, CellError> {
    let mut builder = Builder::new();
    builder.store_uint(VALUE_SNAKE, 8)?;
    store_bytes_tail(&mut builder, text.as_bytes())?;
    builder.end_cell()
}

fn load_value(cell: &CellRef, max_cells: usize) -> Result<String, DecodeError> {
    const RECORD: &str = "OnChainValue";

    let mut slice = Slice::from(cell);
    let bytes = match slice.load_uint(8).ctx(RECORD, "tag")? {
        VALUE_SNAKE => load_bytes_tail(&mut slice, max_cells).ctx(RECORD, "value")?,
        VALUE_CHUNKS => {
            let chunks = Dictionary::<u32, CellRef>::load_direct(&mut slice).ctx(RECORD, "chunks")?;
            let mut out = Vec::new();
            for chunk in chunks.values() {
                out.extend(decode_snake(chunk, max_cells).ctx(RECORD, "chunks")?);
            }
            out
        }
        other => return Err(DecodeError::unknown_variant(RECORD, "tag", other)),
    };
    String::from_utf8(bytes)
        .map_err(|_| CellError::from(SnakeError::Utf8))
        .ctx(RECORD, "value")
}

impl CellCodec for NftContent {
    const NAME: &'static str = "NftContent";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        match self {
            Self::OffChain { uri } => {
                builder
                    .store_uint(OFF_CHAIN_TAG, 8)?
                    .store_ref(csm_cell::snake::encode_snake(uri.as_bytes())?)?;
            }
            Self::OnChain { data } => {
                let mut cells = Dictionary::<[u8; 32], CellRef>::new();
                for (name, value) in data {
                    if !ON_CHAIN_KEYS.contains(&name.as_str()) {
                        tracing::warn!(key = %name, "dropping unsupported on-chain content key");
                        continue;
                    }
                    cells.set(sha256_key(name), store_value(value)?);
                }
                builder.store_uint(ON_CHAIN_TAG, 8)?;
                cells.store_maybe(builder)?;
            }
        }
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        Self::load_limited(slice, DEFAULT_MAX_SNAKE_CELLS)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ProfileAttribute {
    trait_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

const FIRST_NAME: &str = "firstName";
const LAST_NAME: &str = "lastName";
const TG_USERNAME: &str = "tgUsername";

/// Profile fields carried in a profile item's on-chain content
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileContent {
    pub login: String,
    pub image: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub tg_username: Option<String>,
}

fn lower(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn capitalize(value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let mut chars = value.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect())
}

impl ProfileContent {
    /// Build content with the normalization applied at profile creation:
    /// lowercase login, image and telegram handle, capitalized names and
    /// the default image when none is given.
    pub fn normalized(
        login: &str,
        image: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        tg_username: Option<&str>,
    ) -> Self {
        Self {
            login: login.trim().to_lowercase(),
            image: Some(lower(image).unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string())),
            first_name: capitalize(first_name),
            last_name: capitalize(last_name),
            tg_username: lower(tg_username),
        }
    }

    pub fn item_index(&self) -> [u8; 32] {
        profile_item_index(&self.login)
    }

    pub fn to_nft_content(&self) -> NftContent {
        let attributes = [
            (FIRST_NAME, &self.first_name),
            (LAST_NAME, &self.last_name),
            (TG_USERNAME, &self.tg_username),
        ]
        .map(|(trait_type, value)| ProfileAttribute {
            trait_type: trait_type.to_string(),
            value: value.clone(),
        });

        let mut data = BTreeMap::new();
        data.insert("name".to_string(), self.login.clone());
        data.insert("description".to_string(), PROFILE_DESCRIPTION.to_string());
        if let Some(image) = &self.image {
            data.insert("image".to_string(), image.clone());
        }
        // Serializing plain strings cannot fail.
        if let Ok(json) = serde_json::to_string(&attributes) {
            data.insert("attributes".to_string(), json);
        }
        NftContent::OnChain { data }
    }

    pub fn from_nft_content(content: &NftContent) -> Result<Self, DecodeError> {
        let NftContent::OnChain { data } = content else {
            return Err(DecodeError::constraint(
                Self::NAME,
                "content",
                "profile content must be on-chain",
            ));
        };
        let login = data
            .get("name")
            .cloned()
            .ok_or_else(|| DecodeError::constraint(Self::NAME, "name", "missing"))?;

        let mut profile = Self {
            login,
            image: data.get("image").cloned(),
            ..Self::default()
        };

        if let Some(json) = data.get("attributes") {
            let attributes: Vec<ProfileAttribute> = serde_json::from_str(json).map_err(|e| {
                DecodeError::constraint(Self::NAME, "attributes", e.to_string())
            })?;
            for attribute in attributes {
                let slot = match attribute.trait_type.as_str() {
                    FIRST_NAME => &mut profile.first_name,
                    LAST_NAME => &mut profile.last_name,
                    TG_USERNAME => &mut profile.tg_username,
                    _ => continue,
                };
                *slot = attribute.value;
            }
        }
        Ok(profile)
    }
}

impl CellCodec for ProfileContent {
    const NAME: &'static str = "ProfileContent";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        self.to_nft_content().store(builder)
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        Self::from_nft_content(&NftContent::load(slice)?)
    }
}
