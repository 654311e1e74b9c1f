//! Matrix service configuration
//!
//! Values can be overridden from the environment:
//! - `CSM_MATRIX_CAPACITY` (one value for all levels, or six comma separated)
//! - `CSM_TREE_DEPTH`
//! - `CSM_BREADCRUMB_DEPTH`
//! - `CSM_SCAN_LIMIT`
//! - `CSM_REFERRAL_BATCH`
//! - `CSM_PROFILE_CACHE_SIZE`
//! - `CSM_MULTI_ADDRESS`

use csm_cell::Address;
use csm_contracts::records::{LevelAmounts, MatrixLevel, MAX_DECODED_FILL_COUNT};
use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

/// Places the contract fills under one place before it is closed.
pub const DEFAULT_CAPACITY: u8 = 4;

/// Place prices in whole TON, level 1 first.
pub const DEFAULT_PRICES_TON: [u64; 6] = [15, 45, 100, 240, 500, 1200];

/// Upper bound for `tree_depth`.
pub const MAX_TREE_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Fill count at which a place stops accepting children, per level
    pub capacity: [u8; 6],
    /// Place price per level in nanotons
    pub prices: LevelAmounts,
    /// Fee table override; `None` reads fees from the multi contract
    pub fees: Option<LevelAmounts>,
    /// Levels below the root loaded by a subtree request
    pub tree_depth: usize,
    /// Maximum parent hops when computing breadcrumbs
    pub breadcrumb_depth: usize,
    /// Maximum places visited while searching for the next position
    pub scan_limit: usize,
    /// Referrals loaded per window
    pub referral_batch: u32,
    /// Resolved profiles kept in memory
    pub profile_cache_size: usize,
    /// Multi contract receiving buy, lock and unlock messages
    pub multi_address: Option<Address>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            capacity: [DEFAULT_CAPACITY; 6],
            prices: LevelAmounts::from_tons(DEFAULT_PRICES_TON),
            fees: None,
            tree_depth: 2,
            breadcrumb_depth: 64,
            scan_limit: 4096,
            referral_batch: 10,
            profile_cache_size: 256,
            multi_address: None,
        }
    }
}

impl MatrixConfig {
    /// Defaults overridden by any `CSM_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = env_var("CSM_MATRIX_CAPACITY") {
            config.capacity = parse_capacity(&raw).ok_or(ConfigError::Env {
                key: "CSM_MATRIX_CAPACITY",
                value: raw,
            })?;
        }
        if let Some(v) = env_parse("CSM_TREE_DEPTH")? {
            config.tree_depth = v;
        }
        if let Some(v) = env_parse("CSM_BREADCRUMB_DEPTH")? {
            config.breadcrumb_depth = v;
        }
        if let Some(v) = env_parse("CSM_SCAN_LIMIT")? {
            config.scan_limit = v;
        }
        if let Some(v) = env_parse("CSM_REFERRAL_BATCH")? {
            config.referral_batch = v;
        }
        if let Some(v) = env_parse("CSM_PROFILE_CACHE_SIZE")? {
            config.profile_cache_size = v;
        }
        if let Some(raw) = env_var("CSM_MULTI_ADDRESS") {
            let address = Address::parse(&raw).map_err(|_| ConfigError::Env {
                key: "CSM_MULTI_ADDRESS",
                value: raw,
            })?;
            config.multi_address = Some(address);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (level, capacity) in MatrixLevel::all().zip(self.capacity) {
            if capacity == 0 || capacity > MAX_DECODED_FILL_COUNT {
                return Err(ConfigError::InvalidCapacity {
                    level: level.get(),
                    capacity,
                    max: MAX_DECODED_FILL_COUNT,
                });
            }
        }
        if self.tree_depth > MAX_TREE_DEPTH {
            return Err(ConfigError::TreeDepth {
                depth: self.tree_depth,
                max: MAX_TREE_DEPTH,
            });
        }
        if self.breadcrumb_depth == 0 {
            return Err(ConfigError::Zero("breadcrumb_depth"));
        }
        if self.scan_limit == 0 {
            return Err(ConfigError::Zero("scan_limit"));
        }
        if self.referral_batch == 0 {
            return Err(ConfigError::Zero("referral_batch"));
        }
        if self.profile_cache_size == 0 {
            return Err(ConfigError::Zero("profile_cache_size"));
        }
        Ok(())
    }

    pub fn capacity(&self, level: MatrixLevel) -> u8 {
        self.capacity[level.index()]
    }

    pub fn price(&self, level: MatrixLevel) -> u128 {
        self.prices.for_level(level)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value: raw }),
    }
}

fn parse_capacity(raw: &str) -> Option<[u8; 6]> {
    let values = raw
        .split(',')
        .map(|v| v.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    match values.as_slice() {
        [one] => Some([*one; 6]),
        _ => values.try_into().ok(),
    }
}
