use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::constants::{
    DEVNET_RPC_URL, DEVNET_WS_URL, LOCALNET_RPC_URL, LOCALNET_WS_URL, MAINNET_RPC_URL,
    MAINNET_WS_URL, TESTNET_RPC_URL, TESTNET_WS_URL,
};
use crate::error::WalletKitError;

/// A Solana cluster, named by its wallet-standard chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SolanaChain {
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

impl SolanaChain {
    pub const ALL: [SolanaChain; 4] = [
        SolanaChain::Mainnet,
        SolanaChain::Devnet,
        SolanaChain::Testnet,
        SolanaChain::Localnet,
    ];

    /// Wallet-standard identifier, e.g. `solana:devnet`
    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaChain::Mainnet => "solana:mainnet",
            SolanaChain::Devnet => "solana:devnet",
            SolanaChain::Testnet => "solana:testnet",
            SolanaChain::Localnet => "solana:localnet",
        }
    }

    /// Cluster query value understood by the Solana explorer
    pub fn explorer_cluster(&self) -> &'static str {
        match self {
            SolanaChain::Mainnet => "mainnet-beta",
            SolanaChain::Devnet => "devnet",
            SolanaChain::Testnet => "testnet",
            SolanaChain::Localnet => "custom&customUrl=http://localhost:8899",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            SolanaChain::Mainnet => MAINNET_RPC_URL,
            SolanaChain::Devnet => DEVNET_RPC_URL,
            SolanaChain::Testnet => TESTNET_RPC_URL,
            SolanaChain::Localnet => LOCALNET_RPC_URL,
        }
    }

    pub fn default_ws_url(&self) -> &'static str {
        match self {
            SolanaChain::Mainnet => MAINNET_WS_URL,
            SolanaChain::Devnet => DEVNET_WS_URL,
            SolanaChain::Testnet => TESTNET_WS_URL,
            SolanaChain::Localnet => LOCALNET_WS_URL,
        }
    }
}

impl fmt::Display for SolanaChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolanaChain {
    type Err = WalletKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Bare cluster names are accepted for config files.
        let name = s.strip_prefix("solana:").unwrap_or(s);
        match name {
            "mainnet" | "mainnet-beta" => Ok(SolanaChain::Mainnet),
            "devnet" => Ok(SolanaChain::Devnet),
            "testnet" => Ok(SolanaChain::Testnet),
            "localnet" => Ok(SolanaChain::Localnet),
            _ => Err(WalletKitError::input_invalid(format!("Unknown chain: {}", s))),
        }
    }
}

impl TryFrom<String> for SolanaChain {
    type Error = WalletKitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SolanaChain> for String {
    fn from(chain: SolanaChain) -> Self {
        chain.as_str().to_string()
    }
}

/// Exact amount in the chain's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Lamports(pub u64);

impl Lamports {
    pub const ZERO: Lamports = Lamports(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Lamports {
    fn from(value: u64) -> Self {
        Lamports(value)
    }
}

/// Unit a user-entered quantity is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denomination {
    /// Integer smallest units
    Lamports,
    /// Native token with 9 decimal places
    Sol,
}

impl Denomination {
    pub fn decimals(&self) -> u32 {
        match self {
            Denomination::Lamports => 0,
            Denomination::Sol => crate::core::constants::SOL_DECIMALS,
        }
    }
}

/// A connected wallet account snapshot. Never mutated by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub address: Pubkey,

    /// Name of the wallet that exposes this account
    pub wallet_name: String,

    pub chains: BTreeSet<SolanaChain>,

    /// Wallet-standard feature names, e.g. `solana:signMessage`
    pub features: BTreeSet<String>,

    pub label: Option<String>,
}

impl WalletAccount {
    pub fn new(wallet_name: impl Into<String>, address: Pubkey) -> Self {
        Self {
            address,
            wallet_name: wallet_name.into(),
            chains: BTreeSet::new(),
            features: BTreeSet::new(),
            label: None,
        }
    }

    pub fn with_chain(mut self, chain: SolanaChain) -> Self {
        self.chains.insert(chain);
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn supports_chain(&self, chain: SolanaChain) -> bool {
        self.chains.contains(&chain)
    }

    pub fn supports_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Stable key identifying this account across wallets
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.wallet_name, self.address)
    }

    pub fn balance_key(&self, chain: SolanaChain) -> BalanceKey {
        BalanceKey::new(self.address, chain)
    }
}

/// Cache and subscription key for a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BalanceKey {
    pub address: Pubkey,
    pub chain: SolanaChain,
}

impl BalanceKey {
    pub fn new(address: Pubkey, chain: SolanaChain) -> Self {
        Self { address, chain }
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain)
    }
}

/// A balance observed by the transport at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBalance {
    pub slot: u64,

    /// `None` when the transport had no balance for the address
    pub lamports: Option<Lamports>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parse_accepts_prefixed_and_bare_names() {
        assert_eq!("solana:devnet".parse::<SolanaChain>().unwrap(), SolanaChain::Devnet);
        assert_eq!("mainnet-beta".parse::<SolanaChain>().unwrap(), SolanaChain::Mainnet);
        assert!("solana:moonnet".parse::<SolanaChain>().is_err());
    }

    #[test]
    fn test_storage_key_includes_wallet_name() {
        let address = Pubkey::new_unique();
        let account = WalletAccount::new("Backpack", address);
        assert_eq!(account.storage_key(), format!("Backpack:{}", address));
    }
}
