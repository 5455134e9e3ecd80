use serde::Deserialize;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::path::Path;
use thiserror::Error;

use crate::types::SolanaChain;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Commitment level as written in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

/// Connection settings for one chain.
///
/// Every field is optional in TOML; endpoints default to the public
/// endpoints of `chain`.
///
/// ```toml
/// chain = "solana:devnet"
/// rpc_url = "https://api.devnet.solana.com"
/// commitment = "finalized"
/// log_filter = "walletkit_sdk=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub chain: SolanaChain,
    pub rpc_url: Option<String>,
    pub ws_url: Option<String>,
    pub commitment: Commitment,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_chain(SolanaChain::Devnet)
    }
}

impl ClientConfig {
    pub fn for_chain(chain: SolanaChain) -> Self {
        Self {
            chain,
            rpc_url: None,
            ws_url: None,
            commitment: Commitment::default(),
            log_filter: "info".to_string(),
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.chain.default_rpc_url().to_string())
    }

    pub fn ws_url(&self) -> String {
        self.ws_url
            .clone()
            .unwrap_or_else(|| self.chain.default_ws_url().to_string())
    }

    pub fn commitment(&self) -> CommitmentConfig {
        let commitment = match self.commitment {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        };
        CommitmentConfig { commitment }
    }
}
