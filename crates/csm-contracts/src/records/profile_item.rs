//! Profile item (NFT) storage
//!
//! | Field      | Type                          |
//! |------------|-------------------------------|
//! | index      | uint256                       |
//! | collection | MsgAddress                    |
//! | owner      | MsgAddress    (initialized)   |
//! | content    | ^NftContent   (initialized)   |
//! | login      | ^string tail  (initialized)   |
//! | programs   | HashmapE 32 ProgramData (initialized) |
//!
//! An item deployed by its collection but not yet initialized stores only
//! the index and the collection address.

use csm_cell::{Address, Builder, CellError, CellRef, Slice};
use serde::{Deserialize, Serialize};

use super::content::NftContent;
use super::program::ProfilePrograms;
use super::CellCodec;
use crate::errors::{Context, DecodeError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileItemState {
    pub owner: Address,
    pub content: NftContent,
    pub login: String,
    #[serde(skip)]
    pub programs: ProfilePrograms,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileItemRecord {
    #[serde(with = "hex_index")]
    pub index: [u8; 32],
    pub collection: Address,
    pub state: Option<ProfileItemState>,
}

impl ProfileItemRecord {
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn owner(&self) -> Option<Address> {
        self.state.as_ref().map(|s| s.owner)
    }
}

fn login_cell(login: &str) -> Result<CellRef, CellError> {
    let mut builder = Builder::new();
    builder.store_string_tail(login)?;
    builder.end_cell()
}

impl CellCodec for ProfileItemRecord {
    const NAME: &'static str = "ProfileItemRecord";

    fn store(&self, builder: &mut Builder) -> Result<(), CellError> {
        builder
            .store_bytes(&self.index)?
            .store_address(&self.collection)?;
        if let Some(state) = &self.state {
            builder
                .store_address(&state.owner)?
                .store_ref(state.content.to_cell()?)?
                .store_ref(login_cell(&state.login)?)?;
            state.programs.store_maybe(builder)?;
        }
        Ok(())
    }

    fn load(slice: &mut Slice) -> Result<Self, DecodeError> {
        let index: [u8; 32] = slice
            .load_bytes(32)
            .ctx(Self::NAME, "index")?
            .try_into()
            .map_err(|_| DecodeError::constraint(Self::NAME, "index", "expected 32 bytes"))?;
        let collection = slice.load_address().ctx(Self::NAME, "collection")?;

        if slice.is_empty() {
            return Ok(Self {
                index,
                collection,
                state: None,
            });
        }

        let owner = slice.load_address().ctx(Self::NAME, "owner")?;
        let content = NftContent::from_cell(&slice.load_ref().ctx(Self::NAME, "content")?)?;
        let login = slice
            .load_ref_slice()
            .and_then(|mut login| login.load_string_tail())
            .ctx(Self::NAME, "login")?;
        let programs = ProfilePrograms::load_maybe(slice)?;

        Ok(Self {
            index,
            collection,
            state: Some(ProfileItemState {
                owner,
                content,
                login,
                programs,
            }),
        })
    }
}

mod hex_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(index: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(index))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(text).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("index must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::program;
    use crate::records::{profile_item_index, ProfileContent, ProgramData};

    fn addr(b: u8) -> Address {
        Address::new(0, [b; 32])
    }

    #[test]
    fn test_uninitialized_item() {
        let record = ProfileItemRecord {
            index: profile_item_index("alice"),
            collection: addr(1),
            state: None,
        };
        let cell = record.to_cell().unwrap();
        assert_eq!(cell.bit_len(), 256 + 267);
        assert_eq!(ProfileItemRecord::from_cell(&cell).unwrap(), record);
    }

    #[test]
    fn test_initialized_item() {
        let profile = ProfileContent::normalized("alice", None, Some("alice"), None, None);
        let mut programs = ProfilePrograms::new();
        programs.set(
            program::MULTI,
            ProgramData {
                inviter: addr(4),
                seq_no: 2,
                invite: addr(5),
                confirmed: false,
            },
        );
        let record = ProfileItemRecord {
            index: profile.item_index(),
            collection: addr(1),
            state: Some(ProfileItemState {
                owner: addr(2),
                content: profile.to_nft_content(),
                login: profile.login.clone(),
                programs,
            }),
        };
        let back = ProfileItemRecord::from_cell(&record.to_cell().unwrap()).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.owner(), Some(addr(2)));
        let state = back.state.unwrap();
        assert_eq!(ProfileContent::from_nft_content(&state.content).unwrap(), profile);
    }

    #[test]
    fn test_index_serializes_as_hex() {
        let record = ProfileItemRecord {
            index: [0xab; 32],
            collection: addr(1),
            state: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["index"], "ab".repeat(32));
    }
}
