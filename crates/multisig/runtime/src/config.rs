//! Configuration for the multisig engine

use multisig_types::{MultisigError, MultisigResult, QuorumConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial members and passing rule
    pub quorum: QuorumConfig,

    /// Voting period limits
    #[serde(default)]
    pub voting: VotingConfig,

    /// Pagination limits for list queries
    #[serde(default)]
    pub listing: ListingConfig,
}

impl EngineConfig {
    pub fn new(quorum: QuorumConfig) -> Self {
        Self {
            quorum,
            voting: VotingConfig::default(),
            listing: ListingConfig::default(),
        }
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MultisigResult<()> {
        self.quorum.validate()?;

        if self.voting.default_voting_period_secs == 0 {
            return Err(invalid("default_voting_period_secs must be positive"));
        }
        if self.voting.default_voting_period_secs > self.voting.max_voting_period_secs {
            return Err(invalid(
                "default_voting_period_secs exceeds max_voting_period_secs",
            ));
        }
        if self.listing.default_limit == 0 || self.listing.max_limit == 0 {
            return Err(invalid("listing limits must be positive"));
        }
        if self.listing.default_limit > self.listing.max_limit {
            return Err(invalid("listing default_limit exceeds max_limit"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> MultisigError {
    MultisigError::InvalidConfig(msg.to_string())
}

/// Voting period configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Period used when a proposal gives no expiration
    #[serde(default = "default_voting_period")]
    pub default_voting_period_secs: u64,

    /// Longest expiration a proposal may request
    #[serde(default = "default_max_voting_period")]
    pub max_voting_period_secs: u64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            default_voting_period_secs: default_voting_period(),
            max_voting_period_secs: default_max_voting_period(),
        }
    }
}

/// Listing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

// Default value functions

fn default_voting_period() -> u64 {
    3 * 24 * 60 * 60
}

fn default_max_voting_period() -> u64 {
    14 * 24 * 60 * 60
}

fn default_limit() -> u32 {
    10
}

fn default_max_limit() -> u32 {
    30
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] MultisigError),
}
