//! Internal account addresses
//!
//! Text forms:
//! - friendly: base64 of `flags | workchain | hash[32] | crc16` (36 bytes)
//! - raw: `<workchain>:<64 hex chars>`
//!
//! The wire form (`addr_std`) lives in the builder and slice cursors.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::AddressError;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET: u8 = 0x80;

/// Bits taken by a standard internal address on the wire
/// (tag + anycast + workchain + hash).
pub const ADDRESS_BITS: usize = 2 + 1 + 8 + 256;

/// Workchain id plus 256-bit account hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

/// Flags carried by a friendly address string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriendlyFlags {
    pub bounceable: bool,
    pub testnet: bool,
}

impl Address {
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Parse either the friendly or the raw form.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let text = text.trim();
        if text.contains(':') {
            Self::parse_raw(text)
        } else {
            Self::parse_friendly(text).map(|(address, _)| address)
        }
    }

    pub fn parse_raw(text: &str) -> Result<Self, AddressError> {
        let (wc, hash_hex) = text
            .split_once(':')
            .ok_or_else(|| AddressError::Malformed(text.to_string()))?;
        let workchain = wc
            .parse::<i8>()
            .map_err(|_| AddressError::Workchain(wc.to_string()))?;
        let bytes = hex::decode(hash_hex).map_err(|e| AddressError::Malformed(e.to_string()))?;
        let hash: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::HashLength(bytes.len()))?;
        Ok(Self::new(workchain, hash))
    }

    /// Parse a friendly string in either base64 alphabet.
    pub fn parse_friendly(text: &str) -> Result<(Self, FriendlyFlags), AddressError> {
        let normalized: String = text
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        let bytes = STANDARD
            .decode(normalized)
            .map_err(|e| AddressError::Malformed(e.to_string()))?;
        if bytes.len() != 36 {
            return Err(AddressError::FriendlyLength(bytes.len()));
        }

        let checksum = u16::from_be_bytes([bytes[34], bytes[35]]);
        if CRC16.checksum(&bytes[..34]) != checksum {
            return Err(AddressError::Checksum);
        }

        let mut tag = bytes[0];
        let testnet = tag & FLAG_TESTNET != 0;
        if testnet {
            tag ^= FLAG_TESTNET;
        }
        let bounceable = match tag {
            FLAG_BOUNCEABLE => true,
            FLAG_NON_BOUNCEABLE => false,
            other => return Err(AddressError::FriendlyTag(other)),
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok((
            Self::new(bytes[1] as i8, hash),
            FriendlyFlags {
                bounceable,
                testnet,
            },
        ))
    }

    pub fn to_friendly(&self, flags: FriendlyFlags) -> String {
        let mut tag = if flags.bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if flags.testnet {
            tag |= FLAG_TESTNET;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        bytes.extend_from_slice(&CRC16.checksum(&bytes).to_be_bytes());
        URL_SAFE.encode(bytes)
    }

    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl Default for FriendlyFlags {
    fn default() -> Self {
        Self {
            bounceable: true,
            testnet: false,
        }
    }
}

/// Friendly, bounceable, mainnet form.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(FriendlyFlags::default()))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_raw())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Address {
        let mut hash = [0u8; 32];
        for (i, byte) in hash.iter_mut().enumerate() {
            *byte = i as u8;
        }
        Address::new(0, hash)
    }

    #[test]
    fn test_friendly_roundtrip_all_flags() {
        let address = sample();
        for bounceable in [true, false] {
            for testnet in [true, false] {
                let flags = FriendlyFlags {
                    bounceable,
                    testnet,
                };
                let text = address.to_friendly(flags);
                assert_eq!(text.len(), 48);
                let (parsed, parsed_flags) = Address::parse_friendly(&text).unwrap();
                assert_eq!(parsed, address);
                assert_eq!(parsed_flags, flags);
            }
        }
    }

    #[test]
    fn test_bounceable_prefix() {
        // Bounceable mainnet basechain addresses always start with "EQ".
        assert!(sample().to_string().starts_with("EQ"));
        let non_bounceable = sample().to_friendly(FriendlyFlags {
            bounceable: false,
            testnet: false,
        });
        assert!(non_bounceable.starts_with("UQ"));
    }

    #[test]
    fn test_raw_roundtrip() {
        let address = Address::new(-1, [0xab; 32]);
        let raw = address.to_raw();
        assert!(raw.starts_with("-1:abab"));
        assert_eq!(Address::parse(&raw).unwrap(), address);
    }

    #[test]
    fn test_checksum_rejected() {
        let mut text = sample().to_string().into_bytes();
        // Flip one character in the hash section.
        text[10] = if text[10] == b'A' { b'B' } else { b'A' };
        let text = String::from_utf8(text).unwrap();
        assert_eq!(Address::parse(&text), Err(AddressError::Checksum));
    }

    #[test]
    fn test_rejects_bad_lengths() {
        assert!(matches!(
            Address::parse("0:abcd"),
            Err(AddressError::HashLength(2))
        ));
        assert!(matches!(
            Address::parse("EQAA"),
            Err(AddressError::FriendlyLength(3))
        ));
    }

    #[test]
    fn test_standard_alphabet_accepted() {
        let address = Address::new(0, [0xfb; 32]);
        let url_safe = address.to_string();
        let standard = url_safe.replace('-', "+").replace('_', "/");
        assert_eq!(Address::parse(&standard).unwrap(), address);
    }

    #[test]
    fn test_serde_as_string() {
        let address = sample();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
