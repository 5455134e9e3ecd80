use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::core::constants::{SIGN_AND_SEND_TRANSACTION, SIGN_IN, SIGN_MESSAGE, SIGN_TRANSACTION};
use crate::core::signer::{MessageSigner, SignInSigner, TransactionSendingSigner, TransactionSigner};
use crate::error::{Result, WalletKitError};
use crate::types::SolanaChain;

/// A callable registered under a wallet-standard feature name
#[derive(Clone)]
pub enum Capability {
    SignAndSendTransaction(Arc<dyn TransactionSendingSigner>),
    SignTransaction(Arc<dyn TransactionSigner>),
    SignMessage(Arc<dyn MessageSigner>),
    SignIn(Arc<dyn SignInSigner>),
}

impl Capability {
    pub fn feature_name(&self) -> &'static str {
        match self {
            Capability::SignAndSendTransaction(_) => SIGN_AND_SEND_TRANSACTION,
            Capability::SignTransaction(_) => SIGN_TRANSACTION,
            Capability::SignMessage(_) => SIGN_MESSAGE,
            Capability::SignIn(_) => SIGN_IN,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.feature_name()).finish()
    }
}

/// Capability table of one connected wallet, supplied by the wallet
/// integration layer. Lookups go through typed accessors that fail with
/// `WalletFeatureUnimplemented` instead of returning nothing.
#[derive(Debug, Clone)]
pub struct WalletCapabilities {
    pub wallet_name: String,
    pub chains: Vec<SolanaChain>,
    features: BTreeMap<&'static str, Capability>,
}

impl WalletCapabilities {
    pub fn new(wallet_name: impl Into<String>) -> Self {
        Self {
            wallet_name: wallet_name.into(),
            chains: Vec::new(),
            features: BTreeMap::new(),
        }
    }

    pub fn with_chain(mut self, chain: SolanaChain) -> Self {
        if !self.chains.contains(&chain) {
            self.chains.push(chain);
        }
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.features.insert(capability.feature_name(), capability);
        self
    }

    pub fn has_feature(&self, feature_name: &str) -> bool {
        self.features.contains_key(feature_name)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.keys().copied()
    }

    pub fn sign_and_send_transaction(&self) -> Result<Arc<dyn TransactionSendingSigner>> {
        match self.features.get(SIGN_AND_SEND_TRANSACTION) {
            Some(Capability::SignAndSendTransaction(signer)) => Ok(signer.clone()),
            _ => Err(self.unimplemented(SIGN_AND_SEND_TRANSACTION)),
        }
    }

    pub fn sign_transaction(&self) -> Result<Arc<dyn TransactionSigner>> {
        match self.features.get(SIGN_TRANSACTION) {
            Some(Capability::SignTransaction(signer)) => Ok(signer.clone()),
            _ => Err(self.unimplemented(SIGN_TRANSACTION)),
        }
    }

    pub fn sign_message(&self) -> Result<Arc<dyn MessageSigner>> {
        match self.features.get(SIGN_MESSAGE) {
            Some(Capability::SignMessage(signer)) => Ok(signer.clone()),
            _ => Err(self.unimplemented(SIGN_MESSAGE)),
        }
    }

    pub fn sign_in(&self) -> Result<Arc<dyn SignInSigner>> {
        match self.features.get(SIGN_IN) {
            Some(Capability::SignIn(signer)) => Ok(signer.clone()),
            _ => Err(self.unimplemented(SIGN_IN)),
        }
    }

    fn unimplemented(&self, feature_name: &str) -> WalletKitError {
        WalletKitError::wallet_feature_unimplemented(
            self.wallet_name.as_str(),
            feature_name,
            self.chains.iter().map(|c| c.as_str()),
            self.feature_names(),
        )
    }
}

/// Error codes wallet integrations attach to their failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStandardErrorCode {
    AccountFeatureUnimplemented,
    AccountChainUnsupported,
    WalletFeatureUnimplemented,
    UserRejected,
    Other,
}

impl WalletStandardErrorCode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::AccountFeatureUnimplemented => "The account does not support the requested feature",
            Self::AccountChainUnsupported => "The account does not support the requested chain",
            Self::WalletFeatureUnimplemented => "The wallet does not support the requested feature",
            Self::UserRejected => "The request was rejected in the wallet",
            Self::Other => "The wallet reported an error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletStandardErrorContext {
    pub feature_name: Option<String>,
    pub chain: Option<String>,
    pub wallet_name: Option<String>,
    pub supported_chains: Vec<String>,
    pub supported_features: Vec<String>,
}

/// Marker error raised by wallet integrations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .code.description())]
pub struct WalletStandardError {
    pub code: WalletStandardErrorCode,
    pub context: WalletStandardErrorContext,
}

impl WalletStandardError {
    pub fn new(code: WalletStandardErrorCode, context: WalletStandardErrorContext) -> Self {
        Self { code, context }
    }

    /// Convert into the taxonomy. Codes without a dedicated variant become `Unknown`.
    pub fn to_typed(&self) -> WalletKitError {
        let ctx = &self.context;
        let feature = ctx.feature_name.clone().unwrap_or_default();
        match self.code {
            WalletStandardErrorCode::AccountFeatureUnimplemented => {
                WalletKitError::capability_unimplemented(feature)
            },
            WalletStandardErrorCode::AccountChainUnsupported => WalletKitError::chain_unsupported(
                ctx.chain.clone().unwrap_or_default(),
                ctx.supported_chains.clone(),
            ),
            WalletStandardErrorCode::WalletFeatureUnimplemented => {
                WalletKitError::wallet_feature_unimplemented(
                    ctx.wallet_name.clone().unwrap_or_default(),
                    feature,
                    ctx.supported_chains.clone(),
                    ctx.supported_features.clone(),
                )
            },
            WalletStandardErrorCode::UserRejected | WalletStandardErrorCode::Other => {
                WalletKitError::Unknown {
                    message: self.to_string(),
                }
            },
        }
    }
}
